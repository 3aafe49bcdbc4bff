//! Gain/volume control effect

use crate::buffer::Buffer;
use crate::control::ControlValue;
use crate::message::{Message, Payload};
use crate::node::{AudioNode, ProcessContext};

/// Scales its input by a gain factor (1.0 = unity, 0.0 = silence).
///
/// The gain is set through control index 0 or a numeric message, and takes
/// effect on the next processed buffer.
pub struct Gain {
    gain: f32,
}

impl Gain {
    /// Create a new gain node with the specified gain value
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl AudioNode for Gain {
    fn process(&mut self, _ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
        let (Some(input), Some(out)) = (inputs.first(), outputs.first_mut()) else {
            return false;
        };

        let gain = self.gain;
        for (out_sample, &in_sample) in out.iter_mut().zip(input.iter()) {
            *out_sample = in_sample * gain;
        }
        true
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }

    #[inline]
    fn num_controls(&self) -> usize { 1 }

    fn receive_control_value(&mut self, value: &ControlValue, _index: usize) {
        self.gain = value.as_f64() as f32;
    }

    /// Numeric payloads set the gain. A bang is ignored.
    ///
    /// # Panics
    ///
    /// Panics on text or list payloads.
    fn receive_message(&mut self, message: &Message) -> Vec<Message> {
        match message.payload {
            Payload::Bang => {}
            Payload::Float(v) => self.gain = v as f32,
            Payload::Int(v) => self.gain = v as f32,
            Payload::Bool(on) => self.gain = if on { 1.0 } else { 0.0 },
            Payload::Text(_) | Payload::List(_) => panic!(
                "gain at `{}` cannot take payload {:?}",
                message.address, message.payload
            ),
        }
        Vec::new()
    }
}
