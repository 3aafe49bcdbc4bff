//! Core node trait and context types.

use petgraph::stable_graph::NodeIndex;

use crate::buffer::Buffer;
use crate::config::Config;
use crate::control::ControlValue;
use crate::message::Message;
use crate::patch::Patch;

/// Information available during audio processing.
///
/// Passed to every [`AudioNode::process`] call.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the patch being processed, in Hz
    pub sample_rate: f64,
    /// Number of samples per buffer
    pub buffer_size: usize,
    /// Index of the first sample of the buffer being rendered
    pub frame: u64,
}

impl ProcessContext {
    pub fn new(config: Config, frame: u64) -> Self {
        Self {
            sample_rate: config.sample_rate,
            buffer_size: config.buffer_size,
            frame,
        }
    }
}

/// Identifier of a node within its owning [`Patch`]: its index in the
/// patch graph.
///
/// Ids are only meaningful for the patch that handed them out.
pub type NodeId = NodeIndex;

/// A node reached through zero or more nested patches, resolved from a
/// dotted identifier such as `"voice.osc"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodePath(pub(crate) Vec<NodeId>);

impl NodePath {
    /// The ids walked from the outermost patch inward.
    #[inline]
    pub fn ids(&self) -> &[NodeId] {
        &self.0
    }

    /// Id of the node inside the innermost patch.
    #[inline]
    pub fn leaf(&self) -> NodeId {
        self.0[self.0.len() - 1]
    }
}

impl From<NodeId> for NodePath {
    fn from(id: NodeId) -> Self {
        NodePath(vec![id])
    }
}

/// The core trait for audio-rate processing units.
///
/// A node has a fixed number of inputs and outputs. The owning [`Patch`]
/// drives it: each tick it sums whatever is connected to every input into one
/// buffer per input and calls [`process`](Self::process) at most once, no
/// matter how many consumers read the outputs.
///
/// Parameters arrive outside the audio path, through
/// [`receive_control_value`](Self::receive_control_value) and
/// [`receive_message`](Self::receive_message). Both must apply the change
/// immediately; they are called before the pull of the tick they belong to.
///
/// ```
/// use schall::{AudioNode, Buffer, ControlValue, ProcessContext};
///
/// /// Multiplies its input by a settable factor
/// struct Scale {
///     factor: f32,
/// }
///
/// impl AudioNode for Scale {
///     fn process(&mut self, _ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
///         for (out, &x) in outputs[0].iter_mut().zip(inputs[0].iter()) {
///             *out = x * self.factor;
///         }
///         true
///     }
///
///     fn num_inputs(&self) -> usize { 1 }
///     fn num_controls(&self) -> usize { 1 }
///
///     fn receive_control_value(&mut self, value: &ControlValue, _index: usize) {
///         self.factor = value.as_f64() as f32;
///     }
/// }
/// ```
pub trait AudioNode: Send + 'static {
    /// Render one buffer.
    ///
    /// `inputs` holds one summed buffer per input (silence if unconnected),
    /// `outputs` one buffer per output. Return `false` to report that the node
    /// had nothing to do this tick (an idle voice, say); its outputs are then
    /// read as silence.
    fn process(&mut self, ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool;

    /// Number of audio inputs (0 for sources).
    fn num_inputs(&self) -> usize {
        0
    }

    /// Number of audio outputs.
    fn num_outputs(&self) -> usize {
        1
    }

    /// Number of control indices accepted by
    /// [`receive_control_value`](Self::receive_control_value).
    fn num_controls(&self) -> usize {
        0
    }

    /// Apply a control-rate value to parameter `index`.
    fn receive_control_value(&mut self, _value: &ControlValue, _index: usize) {}

    /// Handle a discrete message, optionally answering with more messages to
    /// be routed by the environment.
    fn receive_message(&mut self, _message: &Message) -> Vec<Message> {
        Vec::new()
    }

    /// Called while the owning patch resets memoization for a new tick.
    fn prepare(&mut self) {}

    fn as_patch(&self) -> Option<&Patch> {
        None
    }

    fn as_patch_mut(&mut self) -> Option<&mut Patch> {
        None
    }
}
