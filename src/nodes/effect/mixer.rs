//! Mixer effect - sums multiple inputs together

use crate::buffer::Buffer;
use crate::node::{AudioNode, ProcessContext};

/// A mixer that sums its inputs into one output.
///
/// Several connections into a single input are already summed by the patch;
/// a `Mixer` is for keeping sources on separate, individually addressable
/// inputs.
pub struct Mixer {
    inputs: usize,
}

impl Mixer {
    /// Create a mixer with `inputs` inputs
    pub fn new(inputs: usize) -> Self {
        Self { inputs }
    }
}

impl AudioNode for Mixer {
    fn process(&mut self, _ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
        let Some(out) = outputs.first_mut() else {
            return false;
        };

        out.clear();
        for input in inputs {
            out.mix_from(input, 1.0);
        }
        true
    }

    fn num_inputs(&self) -> usize {
        self.inputs
    }

    fn num_outputs(&self) -> usize {
        1
    }
}
