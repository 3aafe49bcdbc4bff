//! Edge weights of a patch graph.

use crate::buffer::Buffer;

/// A directed edge from output `output` of its source node into input
/// `input` of its destination node.
///
/// The endpoints are the edge's ends in the patch graph. The weight is fixed
/// when the connection is made.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connection {
    pub output: usize,
    pub input: usize,
    pub weight: f32,
}

impl Connection {
    pub fn new(output: usize, input: usize) -> Self {
        Self {
            output,
            input,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Add the weighted source output this edge carries into its input.
    ///
    /// `inputs` are the destination's summed input buffers, `source` the
    /// source node's outputs.
    #[inline]
    pub fn mix_into(&self, inputs: &mut [Buffer], source: &[Buffer]) {
        inputs[self.input].mix_from(&source[self.output], self.weight);
    }
}
