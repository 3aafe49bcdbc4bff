//! Addressed discrete events.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Content of a [`Message`].
///
/// A closed set of payload kinds, so receivers match on it instead of
/// guessing at types.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Content-free trigger: "do your next action now"
    Bang,
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    List(Vec<f64>),
}

impl Payload {
    /// Numeric view of the payload, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Payload::Float(f) => Some(*f),
            Payload::Int(i) => Some(*i as f64),
            Payload::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    #[inline]
    pub fn is_bang(&self) -> bool {
        matches!(self, Payload::Bang)
    }
}

/// A payload delivered to everything registered under `address`.
///
/// Addresses are dotted paths such as `"voice.osc"` or names registered with
/// the [`Environment`](crate::Environment).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub address: String,
    pub payload: Payload,
}

impl Message {
    pub fn new(address: impl Into<String>, payload: Payload) -> Self {
        Self {
            address: address.into(),
            payload,
        }
    }

    pub fn bang(address: impl Into<String>) -> Self {
        Self::new(address, Payload::Bang)
    }

    pub fn float(address: impl Into<String>, value: f64) -> Self {
        Self::new(address, Payload::Float(value))
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn messages_deserialize_from_json() {
        let json = r#"{"address": "lead.cutoff", "payload": {"Float": 800.0}}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg, Message::float("lead.cutoff", 800.0));

        let json = r#"{"address": "kick", "payload": "Bang"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.payload.is_bang());
    }
}
