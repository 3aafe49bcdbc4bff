//! Pass-through

use crate::buffer::Buffer;
use crate::node::{AudioNode, ProcessContext};

/// Copies each input to the output with the same index.
///
/// Every patch uses one as its input pass-through and one as its output
/// pass-through.
pub struct Thru {
    channels: usize,
}

impl Thru {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }

    pub fn mono() -> Self {
        Self::new(1)
    }
}

impl AudioNode for Thru {
    fn process(&mut self, _ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
        for (out, input) in outputs.iter_mut().zip(inputs) {
            out.copy_from(input);
        }
        true
    }

    #[inline]
    fn num_inputs(&self) -> usize { self.channels }

    #[inline]
    fn num_outputs(&self) -> usize { self.channels }
}
