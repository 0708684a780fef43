//! Synthetic message generation for streamsim.
//!
//! This crate produces the JSON payloads the load generator delivers: each
//! message carries a microsecond-precision UTC timestamp, a symbol drawn from
//! the configured symbol set, and enough randomly-typed `field_N` entries to
//! land the serialized size inside the configured tolerance window.
//!
//! Generation is deterministic for a given seed and profile, which keeps
//! load-test runs reproducible.
//!
//! # Example
//!
//! ```
//! use streamsim_generator::{MessageProfile, MessageSynthesizer};
//!
//! let profile = MessageProfile::default();
//! let mut synthesizer = MessageSynthesizer::new(profile, 42).unwrap();
//! let message = synthesizer.generate();
//! let payload = message.to_json();
//! assert!(payload.starts_with("{\"timestamp\":\""));
//! ```

pub mod message;
pub mod synthesizer;

pub use message::{FieldValue, Message};
pub use synthesizer::{MessageProfile, MessageSynthesizer, SynthesisError, MIN_SIZE_TOLERANCE};
