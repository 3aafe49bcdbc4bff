//! Constant value source

use crate::buffer::Buffer;
use crate::control::ControlValue;
use crate::message::{Message, Payload};
use crate::node::{AudioNode, ProcessContext};

/// Writes the same value to every sample of every output.
///
/// Control index 0 (or a numeric message) changes the value.
pub struct Constant {
    value: f32,
    channels: usize,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value, channels: 1 }
    }

    /// Same value on `channels` outputs.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels.max(1);
        self
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }
}

impl AudioNode for Constant {
    fn process(&mut self, _ctx: &ProcessContext, _inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
        for buffer in outputs.iter_mut() {
            buffer.fill(self.value);
        }
        true
    }

    #[inline]
    fn num_inputs(&self) -> usize { 0 }

    #[inline]
    fn num_outputs(&self) -> usize { self.channels }

    #[inline]
    fn num_controls(&self) -> usize { 1 }

    fn receive_control_value(&mut self, value: &ControlValue, _index: usize) {
        self.value = value.as_f64() as f32;
    }

    /// Panics on text or list payloads. A bang is ignored.
    fn receive_message(&mut self, message: &Message) -> Vec<Message> {
        match message.payload {
            Payload::Bang => {}
            Payload::Float(v) => self.value = v as f32,
            Payload::Int(v) => self.value = v as f32,
            Payload::Bool(on) => self.value = if on { 1.0 } else { 0.0 },
            Payload::Text(_) | Payload::List(_) => panic!(
                "constant at `{}` cannot take payload {:?}",
                message.address, message.payload
            ),
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn fills_every_output() {
        let ctx = ProcessContext::new(Config::new(48_000.0, 4), 0);
        let mut dc = Constant::new(0.5).with_channels(2);
        let mut outputs = vec![Buffer::new(4), Buffer::new(4)];

        assert!(dc.process(&ctx, &[], &mut outputs));
        assert!(outputs.iter().all(|b| b.iter().all(|&s| s == 0.5)));

        dc.receive_message(&Message::float("dc", -1.0));
        dc.process(&ctx, &[], &mut outputs);
        assert!(outputs.iter().all(|b| b.iter().all(|&s| s == -1.0)));

        dc.receive_message(&Message::bang("dc"));
        assert_eq!(dc.value(), -1.0);
        dc.receive_message(&Message::new("dc", Payload::Int(3)));
        assert_eq!(dc.value(), 3.0);
    }

    #[test]
    #[should_panic(expected = "cannot take payload")]
    fn list_payload_panics() {
        Constant::new(0.0).receive_message(&Message::new("dc", Payload::List(vec![1.0, 2.0])));
    }
}
