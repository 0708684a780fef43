//! Size-targeted message synthesis.
//!
//! The synthesizer appends randomly-typed fields to a message until its
//! serialized size lands inside `[message_size_bytes - size_tolerance,
//! message_size_bytes + size_tolerance]`. The tolerance window is the
//! contract, not an exact byte count: fields that would overshoot are
//! truncated or swapped for smaller values, and a run that falls short is
//! padded through the last string field.

use crate::message::{FieldValue, Message};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Smallest accepted size tolerance.
///
/// Padding may have to append one minimal string field; the window must be
/// wide enough to absorb that field's scaffolding (`,"field_NNN":"x"`).
pub const MIN_SIZE_TOLERANCE: usize = 16;

/// Status words used by one of the string field templates.
const STATUS_WORDS: &[&str] = &["active", "inactive", "pending", "completed", "failed"];

/// Errors from an unsatisfiable message profile.
///
/// These surface only at construction time; once a synthesizer is built,
/// generation cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// No symbols to draw `stockName` from.
    #[error("symbol set must not be empty")]
    EmptySymbolSet,

    /// Message size target of zero.
    #[error("message size target must be positive")]
    ZeroMessageSize,

    /// Tolerance window too narrow to absorb per-field overhead.
    #[error("size tolerance {0} is below the minimum of {MIN_SIZE_TOLERANCE} bytes")]
    ToleranceTooSmall(usize),

    /// Invalid string length range.
    #[error("string length range [{0}, {1}] is invalid (need 1 <= min <= max)")]
    InvalidStringRange(usize, usize),

    /// Invalid numeric range.
    #[error("number range [{0}, {1}] is invalid (need min <= max)")]
    InvalidNumberRange(i64, i64),

    /// The two fixed fields alone exceed the size window.
    #[error("fixed fields need {overhead} bytes but the size window ceiling is {ceiling}")]
    UnsatisfiableSize { overhead: usize, ceiling: usize },
}

/// Knobs controlling synthetic message shape and size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageProfile {
    /// Target serialized size in bytes.
    pub message_size_bytes: usize,
    /// Accepted deviation from the target size, in bytes.
    pub size_tolerance: usize,
    /// Preferred number of generated fields.
    pub target_field_count: usize,
    /// Uniform variance applied to the field count per message.
    pub field_count_variance: usize,
    /// Inclusive length range for generated string values.
    pub string_length_range: (usize, usize),
    /// Inclusive range for generated integer values.
    pub number_range: (i64, i64),
    /// Decimal places kept on generated float values.
    pub float_precision: u32,
    /// Ordered symbol set `stockName` is drawn from.
    pub symbols: Vec<String>,
}

impl Default for MessageProfile {
    fn default() -> Self {
        Self {
            message_size_bytes: 500,
            size_tolerance: 50,
            target_field_count: 100,
            field_count_variance: 5,
            string_length_range: (5, 15),
            number_range: (1, 100_000),
            float_precision: 2,
            symbols: ["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Serialized size of a message with the given symbol and no generated fields.
///
/// The timestamp encoding has constant length, so this depends only on the
/// escaped symbol length.
fn fixed_overhead(symbol: &str) -> usize {
    Message::new(symbol).json_len()
}

/// Deterministic, size-targeted message generator.
///
/// Each worker owns one synthesizer seeded with `seed + worker_id`, so a run
/// is reproducible for a given seed without sharing RNG state across tasks.
pub struct MessageSynthesizer {
    profile: MessageProfile,
    rng: StdRng,
}

impl MessageSynthesizer {
    /// Create a synthesizer, validating the profile up front.
    pub fn new(profile: MessageProfile, seed: u64) -> Result<Self, SynthesisError> {
        Self::validate(&profile)?;
        Ok(Self {
            profile,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Check that the profile can produce messages inside its size window.
    pub fn validate(profile: &MessageProfile) -> Result<(), SynthesisError> {
        if profile.symbols.is_empty() {
            return Err(SynthesisError::EmptySymbolSet);
        }
        if profile.message_size_bytes == 0 {
            return Err(SynthesisError::ZeroMessageSize);
        }
        if profile.size_tolerance < MIN_SIZE_TOLERANCE {
            return Err(SynthesisError::ToleranceTooSmall(profile.size_tolerance));
        }
        let (min_len, max_len) = profile.string_length_range;
        if min_len == 0 || min_len > max_len {
            return Err(SynthesisError::InvalidStringRange(min_len, max_len));
        }
        let (min_num, max_num) = profile.number_range;
        if min_num > max_num {
            return Err(SynthesisError::InvalidNumberRange(min_num, max_num));
        }

        // Escaping can make a symbol's serialized form longer than its byte
        // length, so measure each symbol as it will actually render.
        let overhead = profile
            .symbols
            .iter()
            .map(|s| fixed_overhead(s))
            .max()
            .unwrap_or(0);
        let ceiling = profile.message_size_bytes + profile.size_tolerance;
        if overhead > ceiling {
            return Err(SynthesisError::UnsatisfiableSize { overhead, ceiling });
        }

        Ok(())
    }

    /// Produce one message whose serialized size falls within the tolerance
    /// window.
    pub fn generate(&mut self) -> Message {
        let floor = self
            .profile
            .message_size_bytes
            .saturating_sub(self.profile.size_tolerance);
        let ceiling = self.profile.message_size_bytes + self.profile.size_tolerance;

        let symbol = self.profile.symbols[self.rng.gen_range(0..self.profile.symbols.len())].clone();
        let mut message = Message::new(symbol);
        let mut current = message.json_len();

        let variance = self.profile.field_count_variance as i64;
        let max_fields = (self.profile.target_field_count as i64
            + self.rng.gen_range(-variance..=variance))
        .max(0) as usize;

        let mut index = 0;
        while current < floor && index < max_fields {
            let name = format!("field_{index}");
            let mut value = self.random_value();
            let mut added = entry_len(&name, &value);

            if current + added > ceiling {
                // Shrink a string to fit; other types can't shrink predictably.
                let budget = ceiling - current;
                match &value {
                    FieldValue::String(s) => {
                        let scaffold = entry_len(&name, &FieldValue::String(String::new()));
                        if budget <= scaffold {
                            break;
                        }
                        let keep = budget - scaffold;
                        let truncated: String = s.chars().take(keep).collect();
                        if truncated.is_empty() {
                            break;
                        }
                        value = FieldValue::String(truncated);
                        added = entry_len(&name, &value);
                    }
                    _ => {
                        value = FieldValue::Integer(self.rng.gen_range(1..=99));
                        added = entry_len(&name, &value);
                        if current + added > ceiling {
                            break;
                        }
                    }
                }
            }

            message.fields.push((name, value));
            current += added;
            index += 1;
        }

        if current < floor {
            self.pad_to_floor(&mut message, floor - current);
        }

        message
    }

    /// Extend the last string field (or append one) so the serialized size
    /// reaches the window floor.
    fn pad_to_floor(&mut self, message: &mut Message, deficit: usize) {
        let existing = message.fields.iter_mut().rev().find_map(|(_, v)| match v {
            FieldValue::String(s) => Some(s),
            _ => None,
        });

        match existing {
            Some(s) => {
                let pad = self.random_chars(deficit);
                s.push_str(&pad);
            }
            None => {
                let name = format!("field_{}", message.fields.len());
                let scaffold = entry_len(&name, &FieldValue::String(String::new()));
                let content = deficit.saturating_sub(scaffold).max(1);
                let value = FieldValue::String(self.random_chars(content));
                message.fields.push((name, value));
            }
        }
    }

    /// Random ASCII-alphanumeric string of exactly `len` bytes.
    fn random_chars(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| self.rng.sample(Alphanumeric) as char)
            .collect()
    }

    /// Pick a field value from the weighted set of templates.
    fn random_value(&mut self) -> FieldValue {
        let (min_len, max_len) = self.profile.string_length_range;
        let (min_num, max_num) = self.profile.number_range;

        match self.rng.gen_range(0..9u8) {
            0 => FieldValue::Integer(self.rng.gen_range(min_num..=max_num)),
            1 => {
                let scale = 10f64.powi(self.profile.float_precision as i32);
                let upper = (max_num as f64 / 100.0).max(0.02);
                let raw = self.rng.gen_range(0.01..upper);
                FieldValue::Float((raw * scale).round() / scale)
            }
            2 => FieldValue::Boolean(self.rng.gen_bool(0.5)),
            3 | 4 => {
                let len = self.rng.gen_range(min_len..=max_len);
                FieldValue::String(self.random_chars(len))
            }
            5 => {
                let word = STATUS_WORDS[self.rng.gen_range(0..STATUS_WORDS.len())];
                FieldValue::String(word.to_string())
            }
            6 => FieldValue::String(format!("user_{}", self.rng.gen_range(1000..10_000))),
            7 => FieldValue::String(format!("session_{}", self.rng.gen_range(100_000..1_000_000))),
            // Large numbers shaped like epoch timestamps or numeric IDs.
            _ => FieldValue::Integer(self.rng.gen_range(1_000_000_000..=9_999_999_999)),
        }
    }
}

/// Serialized size a `,"name":value` entry adds to a message.
fn entry_len(name: &str, value: &FieldValue) -> usize {
    4 + name.len() + value.json_len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesizer(profile: MessageProfile) -> MessageSynthesizer {
        MessageSynthesizer::new(profile, 42).unwrap()
    }

    #[test]
    fn test_sizes_stay_within_tolerance() {
        let profile = MessageProfile::default();
        let target = profile.message_size_bytes;
        let tolerance = profile.size_tolerance;
        let mut synth = synthesizer(profile);

        for _ in 0..200 {
            let len = synth.generate().json_len();
            assert!(
                len >= target - tolerance && len <= target + tolerance,
                "serialized size {len} outside [{}, {}]",
                target - tolerance,
                target + tolerance
            );
        }
    }

    #[test]
    fn test_small_messages_stay_within_tolerance() {
        let profile = MessageProfile {
            message_size_bytes: 120,
            size_tolerance: 20,
            target_field_count: 10,
            ..MessageProfile::default()
        };
        let mut synth = synthesizer(profile);

        for _ in 0..200 {
            let len = synth.generate().json_len();
            assert!((100..=140).contains(&len), "serialized size {len}");
        }
    }

    #[test]
    fn test_large_messages_stay_within_tolerance() {
        let profile = MessageProfile {
            message_size_bytes: 4096,
            size_tolerance: 64,
            target_field_count: 400,
            ..MessageProfile::default()
        };
        let mut synth = synthesizer(profile);

        for _ in 0..50 {
            let len = synth.generate().json_len();
            assert!((4032..=4160).contains(&len), "serialized size {len}");
        }
    }

    #[test]
    fn test_symbols_come_from_configured_set() {
        let profile = MessageProfile {
            symbols: vec!["ONE".to_string(), "TWO".to_string()],
            ..MessageProfile::default()
        };
        let mut synth = synthesizer(profile);

        for _ in 0..50 {
            let message = synth.generate();
            assert!(message.stock_name == "ONE" || message.stock_name == "TWO");
        }
    }

    #[test]
    fn test_escaped_symbols_stay_within_tolerance() {
        let profile = MessageProfile {
            message_size_bytes: 200,
            size_tolerance: 30,
            target_field_count: 20,
            symbols: vec!["A\"B\\C".to_string()],
            ..MessageProfile::default()
        };
        let mut synth = synthesizer(profile);

        for _ in 0..100 {
            let message = synth.generate();
            let json = message.to_json();
            assert!(json.contains("\"stockName\":\"A\\\"B\\\\C\""));
            assert!((170..=230).contains(&json.len()), "serialized size {}", json.len());
        }
    }

    #[test]
    fn test_overhead_measured_on_escaped_symbol() {
        // Ten quote characters escape to twenty bytes; the window admits the
        // raw length but not the escaped form.
        let profile = MessageProfile {
            message_size_bytes: 60,
            size_tolerance: 16,
            symbols: vec!["\"".repeat(10)],
            ..MessageProfile::default()
        };
        assert!(matches!(
            MessageSynthesizer::new(profile, 42),
            Err(SynthesisError::UnsatisfiableSize { .. })
        ));
    }

    #[test]
    fn test_field_names_are_sequential() {
        let mut synth = synthesizer(MessageProfile::default());
        let message = synth.generate();

        assert!(!message.fields.is_empty());
        for (i, (name, _)) in message.fields.iter().enumerate() {
            assert_eq!(name, &format!("field_{i}"));
        }
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let profile = MessageProfile::default();
        let mut a = MessageSynthesizer::new(profile.clone(), 7).unwrap();
        let mut b = MessageSynthesizer::new(profile, 7).unwrap();

        for _ in 0..20 {
            let ma = a.generate();
            let mb = b.generate();
            assert_eq!(ma.stock_name, mb.stock_name);
            assert_eq!(ma.fields, mb.fields);
        }
    }

    #[test]
    fn test_empty_symbol_set_rejected() {
        let profile = MessageProfile {
            symbols: Vec::new(),
            ..MessageProfile::default()
        };
        assert!(matches!(
            MessageSynthesizer::new(profile, 42),
            Err(SynthesisError::EmptySymbolSet)
        ));
    }

    #[test]
    fn test_tiny_tolerance_rejected() {
        let profile = MessageProfile {
            size_tolerance: 4,
            ..MessageProfile::default()
        };
        assert!(matches!(
            MessageSynthesizer::new(profile, 42),
            Err(SynthesisError::ToleranceTooSmall(4))
        ));
    }

    #[test]
    fn test_unsatisfiable_size_rejected() {
        // The two fixed fields alone cannot fit in 40 bytes.
        let profile = MessageProfile {
            message_size_bytes: 20,
            size_tolerance: 20,
            ..MessageProfile::default()
        };
        assert!(matches!(
            MessageSynthesizer::new(profile, 42),
            Err(SynthesisError::UnsatisfiableSize { .. })
        ));
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let profile = MessageProfile {
            string_length_range: (10, 5),
            ..MessageProfile::default()
        };
        assert!(matches!(
            MessageSynthesizer::new(profile, 42),
            Err(SynthesisError::InvalidStringRange(10, 5))
        ));

        let profile = MessageProfile {
            number_range: (100, 1),
            ..MessageProfile::default()
        };
        assert!(matches!(
            MessageSynthesizer::new(profile, 42),
            Err(SynthesisError::InvalidNumberRange(100, 1))
        ));
    }

    #[test]
    fn test_generation_never_fails_after_validation() {
        // Window floor of zero: everything down to the fixed fields is fine.
        let profile = MessageProfile {
            message_size_bytes: 80,
            size_tolerance: 80,
            target_field_count: 2,
            field_count_variance: 2,
            ..MessageProfile::default()
        };
        let mut synth = synthesizer(profile);
        for _ in 0..100 {
            let len = synth.generate().json_len();
            assert!(len <= 160, "serialized size {len}");
        }
    }
}
