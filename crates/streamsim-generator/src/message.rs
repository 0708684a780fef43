//! Typed message payloads and their compact JSON encoding.

use chrono::{DateTime, SecondsFormat, Utc};

/// A generated field value.
///
/// The synthesizer emits a tagged union over the four JSON scalar types
/// rather than a dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

/// Append `s` as a JSON string literal, escaping `"`, `\` and control
/// characters.
fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl FieldValue {
    /// Append the compact JSON encoding of this value to `out`.
    pub fn write_json(&self, out: &mut String) {
        match self {
            FieldValue::String(s) => write_json_string(s, out),
            FieldValue::Integer(v) => out.push_str(&v.to_string()),
            FieldValue::Float(v) => out.push_str(&v.to_string()),
            FieldValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
        }
    }

    /// Serialized length in bytes of the compact JSON encoding.
    pub fn json_len(&self) -> usize {
        let mut buf = String::new();
        self.write_json(&mut buf);
        buf.len()
    }
}

/// One synthetic message: the two fixed fields plus generated `field_N`
/// entries, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Generation time, serialized as ISO-8601 with microsecond precision.
    pub timestamp: DateTime<Utc>,
    /// Symbol drawn from the configured symbol set.
    pub stock_name: String,
    /// Generated fields, named `field_0..field_{k-1}`.
    pub fields: Vec<(String, FieldValue)>,
}

impl Message {
    /// Create a message with the fixed fields and no generated fields.
    pub fn new(stock_name: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            stock_name: stock_name.into(),
            fields: Vec::new(),
        }
    }

    /// Compact JSON encoding with the fixed fields first.
    ///
    /// The timestamp is always rendered with six fractional digits and a `Z`
    /// suffix, so its serialized length is constant and the size of a
    /// field-free message depends only on the escaped symbol length.
    pub fn to_json(&self) -> String {
        let mut out = String::with_capacity(64 + self.fields.len() * 24);
        out.push_str("{\"timestamp\":\"");
        out.push_str(&self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true));
        out.push_str("\",\"stockName\":");
        write_json_string(&self.stock_name, &mut out);
        for (name, value) in &self.fields {
            out.push_str(",\"");
            out.push_str(name);
            out.push_str("\":");
            value.write_json(&mut out);
        }
        out.push('}');
        out
    }

    /// Serialized length in bytes of [`Message::to_json`].
    pub fn json_len(&self) -> usize {
        self.to_json().len()
    }
}
