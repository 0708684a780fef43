//! streamsim: adaptive-rate synthetic load generation for streaming
//! ingestion endpoints.
//!
//! The engine converts a single target rate (messages/second) into per-worker
//! rate shares and correctly-sized batches, synthesizes size-accurate JSON
//! payloads, delivers them through a retrying batch client, and reports live
//! throughput while a coordinator owns the duration/cancellation contract.

pub mod config;
pub mod engine;

pub use config::{Config, ConfigError, EndpointConfig, SimulatorConfig};
pub use engine::{run, RunSummary};
