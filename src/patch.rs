//! Patches: graphs of nodes that are themselves nodes.
//!
//! A [`Patch`] owns its child nodes in a graph and evaluates them on demand,
//! pulling from its output pass-through. Evaluation is two-phase:
//!
//! 1. [`prepare`](Patch::prepare) walks upstream from the output and clears
//!    each node's `ran` flag, stopping at nodes whose flag is already clear.
//! 2. [`synthesize`](Patch::synthesize) walks upstream again. A node whose
//!    flag is set returns its last outputs untouched; otherwise the flag is
//!    set *before* its sources are pulled, then its inputs are summed and it
//!    processes.
//!
//! Setting the flag before recursing is what makes feedback legal: a node
//! reached again through a cycle during the same tick hands out the buffer
//! it produced on the previous tick. No node processes twice in one tick,
//! however many consumers read it.

use hashbrown::HashMap;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, NodeIndexable};
use petgraph::Direction::Incoming;
use tracing::debug;

use crate::buffer::Buffer;
use crate::config::Config;
use crate::control::{Control, ControlChange, ControlId, ControlValue, Controls, ListenerId, Setter};
use crate::error::{Error, Result};
use crate::message::{Message, Payload};
use crate::node::{AudioNode, NodeId, NodePath, ProcessContext};
use crate::nodes::Thru;
use crate::port::Connection;

/// Identifier of the input pass-through inside every patch.
pub const INLET_ID: &str = "in";
/// Identifier of the output pass-through inside every patch.
pub const OUTLET_ID: &str = "out";

/// A control inside a (possibly nested) patch, resolved from a dotted path
/// such as `"voice.cutoff"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlPath {
    pub(crate) patch: Vec<NodeId>,
    pub(crate) control: ControlId,
}

/// Per-node state kept by the owning patch.
struct NodeData {
    identifier: String,
    module: Box<dyn AudioNode>,
    /// Summed input of each input port, rebuilt every tick
    inputs: Vec<Buffer>,
    outputs: Vec<Buffer>,
    ran: bool,
    active: bool,
}

impl NodeData {
    fn new(identifier: String, module: Box<dyn AudioNode>, buffer_size: usize) -> Self {
        let num_inputs = module.num_inputs();
        let num_outputs = module.num_outputs();
        Self {
            identifier,
            module,
            inputs: (0..num_inputs).map(|_| Buffer::new(buffer_size)).collect(),
            outputs: (0..num_outputs).map(|_| Buffer::new(buffer_size)).collect(),
            ran: false,
            active: false,
        }
    }
}

/// Children are the node weights, connections the edge weights. Removing
/// edges never invalidates a `NodeIndex`.
type ChildGraph = StableGraph<NodeData, Connection>;

/// A composite node: child nodes, the connections between them, and the
/// controls that drive them.
///
/// Every patch holds two pass-through nodes. [`input`](Self::input) mirrors
/// the patch's own inputs, so children connect to it like to any source;
/// [`output`](Self::output) is where the patch author connects whatever should
/// come out of the patch. Connections never leave a patch other than through
/// these two.
///
/// ```
/// use schall::{Config, Patch};
/// use schall::nodes::{Constant, Gain};
///
/// # fn main() -> schall::Result<()> {
/// let mut patch = Patch::new(Config::new(44_100.0, 8), 0, 1);
/// let dc = patch.add("dc", Constant::new(0.5))?;
/// let gain = patch.add("gain", Gain::new(2.0))?;
/// patch.connect(dc, 0, gain, 0)?;
/// patch.connect(gain, 0, patch.output(), 0)?;
///
/// patch.prepare();
/// patch.synthesize(0);
/// assert!(patch.outputs()[0].iter().all(|&s| s == 1.0));
/// # Ok(())
/// # }
/// ```
pub struct Patch {
    config: Config,
    graph: ChildGraph,
    names: HashMap<String, NodeId>,
    controls: Controls,
}

impl Patch {
    /// Create an empty patch with `num_inputs` inputs and `num_outputs`
    /// outputs, running under `config`.
    pub fn new(config: Config, num_inputs: usize, num_outputs: usize) -> Self {
        let mut patch = Self {
            config,
            graph: ChildGraph::with_capacity(16, 32),
            names: HashMap::new(),
            controls: Controls::new(),
        };
        patch.insert(INLET_ID.into(), Box::new(Thru::new(num_inputs)));
        patch.insert(OUTLET_ID.into(), Box::new(Thru::new(num_outputs)));
        patch
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The input pass-through: its outputs carry the patch inputs.
    #[inline]
    pub fn input(&self) -> NodeId {
        NodeIndex::new(0)
    }

    /// The output pass-through: its inputs become the patch outputs.
    #[inline]
    pub fn output(&self) -> NodeId {
        NodeIndex::new(1)
    }

    /// Number of nodes, pass-throughs included.
    #[inline]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() <= 2
    }

    /// Add a child node under `identifier`, which must be unique in this
    /// patch and contain no `.`.
    pub fn add<N: AudioNode>(&mut self, identifier: &str, node: N) -> Result<NodeId> {
        if identifier.is_empty() || identifier.contains('.') {
            return Err(Error::InvalidIdentifier(identifier.into()));
        }
        if self.names.contains_key(identifier) {
            return Err(Error::DuplicateIdentifier(identifier.into()));
        }
        if let Some(child) = node.as_patch() {
            if child.config.buffer_size != self.config.buffer_size {
                return Err(Error::BufferSizeMismatch {
                    expected: self.config.buffer_size,
                    found: child.config.buffer_size,
                });
            }
        }

        let id = self.insert(identifier.into(), Box::new(node));
        debug!(node = identifier, id = id.index(), "node added");
        Ok(id)
    }

    fn insert(&mut self, identifier: String, module: Box<dyn AudioNode>) -> NodeId {
        let name = identifier.clone();
        let id = self
            .graph
            .add_node(NodeData::new(identifier, module, self.config.buffer_size));
        self.names.insert(name, id);
        id
    }

    /// Connect output `output` of `source` to input `input` of `dest`.
    ///
    /// Cycles are allowed; a node reached again within the same tick reads
    /// the previous tick's output.
    pub fn connect(&mut self, source: NodeId, output: usize, dest: NodeId, input: usize) -> Result<()> {
        self.connect_weighted(source, output, dest, input, 1.0)
    }

    /// Like [`connect`](Self::connect), scaling the source by `weight`.
    pub fn connect_weighted(
        &mut self,
        source: NodeId,
        output: usize,
        dest: NodeId,
        input: usize,
        weight: f32,
    ) -> Result<()> {
        let source_node = self
            .graph
            .node_weight(source)
            .ok_or(Error::InvalidNode(source.index()))?;
        let dest_node = self
            .graph
            .node_weight(dest)
            .ok_or(Error::InvalidNode(dest.index()))?;

        if dest == self.input() {
            return Err(Error::ConnectToInlet);
        }
        if output >= source_node.outputs.len() {
            return Err(Error::OutputOutOfRange {
                node: source_node.identifier.clone(),
                index: output,
                available: source_node.outputs.len(),
            });
        }
        if input >= dest_node.inputs.len() {
            return Err(Error::InputOutOfRange {
                node: dest_node.identifier.clone(),
                index: input,
                available: dest_node.inputs.len(),
            });
        }

        debug!(
            from = %source_node.identifier,
            output,
            to = %dest_node.identifier,
            input,
            weight,
            "connected"
        );
        self.graph.add_edge(
            source,
            dest,
            Connection::new(output, input).with_weight(weight),
        );
        Ok(())
    }

    /// Connect two children by identifier.
    pub fn connect_named(&mut self, source: &str, output: usize, dest: &str, input: usize) -> Result<()> {
        let source = self.find(source)?;
        let dest = self.find(dest)?;
        self.connect(source, output, dest, input)
    }

    /// Remove every connection from `source` into any input of `dest`.
    pub fn disconnect(&mut self, source: NodeId, dest: NodeId) -> Result<()> {
        for id in [source, dest] {
            if !self.graph.contains_node(id) {
                return Err(Error::InvalidNode(id.index()));
            }
        }
        while let Some(edge) = self.graph.find_edge(source, dest) {
            self.graph.remove_edge(edge);
        }
        Ok(())
    }

    /// Sources connected to input `input` of `node`, with their connections.
    pub fn connections(&self, node: NodeId, input: usize) -> Vec<(NodeId, Connection)> {
        if !self.graph.contains_node(node) {
            return Vec::new();
        }
        self.graph
            .edges_directed(node, Incoming)
            .filter(|edge| edge.weight().input == input)
            .map(|edge| (edge.source(), *edge.weight()))
            .collect()
    }

    /// Id of the direct child called `identifier`.
    pub fn find(&self, identifier: &str) -> Result<NodeId> {
        self.names
            .get(identifier)
            .copied()
            .ok_or_else(|| Error::NotFound(identifier.into()))
    }

    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        self.graph.node_weight(id).map(|n| n.identifier.as_str())
    }

    /// Resolve a dotted path such as `"voice.env"`, descending into nested
    /// patches.
    pub fn lookup(&self, path: &str) -> Result<NodePath> {
        let mut ids = Vec::new();
        let mut patch = self;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let id = patch
                .names
                .get(segment)
                .copied()
                .ok_or_else(|| Error::NotFound(path.into()))?;
            ids.push(id);

            if segments.peek().is_some() {
                patch = patch.graph[id]
                    .module
                    .as_patch()
                    .ok_or_else(|| Error::NotAPatch(segment.into()))?;
            }
        }

        Ok(NodePath(ids))
    }

    /// The node at `path`.
    pub fn node(&self, path: &str) -> Result<&dyn AudioNode> {
        let resolved = self.lookup(path)?;
        self.node_at(&resolved)
            .ok_or_else(|| Error::NotFound(path.into()))
    }

    pub fn node_mut(&mut self, path: &str) -> Result<&mut dyn AudioNode> {
        let resolved = self.lookup(path)?;
        node_at_mut(&mut self.graph, resolved.ids()).ok_or_else(|| Error::NotFound(path.into()))
    }

    pub fn node_at(&self, path: &NodePath) -> Option<&dyn AudioNode> {
        let (last, parents) = path.ids().split_last()?;
        let mut patch = self;
        for id in parents {
            patch = patch.graph.node_weight(*id)?.module.as_patch()?;
        }
        patch.graph.node_weight(*last).map(|n| &*n.module)
    }

    pub fn node_at_mut(&mut self, path: &NodePath) -> Option<&mut dyn AudioNode> {
        node_at_mut(&mut self.graph, path.ids())
    }

    /// Output buffers of a direct child, as left by the last tick.
    pub fn outputs_of(&self, id: NodeId) -> Option<&[Buffer]> {
        self.graph.node_weight(id).map(|n| n.outputs.as_slice())
    }

    /// The patch outputs, as left by the last [`synthesize`](Self::synthesize).
    #[inline]
    pub fn outputs(&self) -> &[Buffer] {
        &self.graph[self.output()].outputs
    }

    /// Deliver `message` to the node at `path`, returning its replies.
    pub fn send(&mut self, path: &NodePath, message: &Message) -> Result<Vec<Message>> {
        let node = node_at_mut(&mut self.graph, path.ids())
            .ok_or_else(|| Error::NotFound(message.address.clone()))?;
        Ok(node.receive_message(message))
    }

    // --- two-phase evaluation ---------------------------------------------

    /// Reset memoization for a new tick, starting at the output pass-through.
    pub fn prepare(&mut self) {
        self.prepare_node(self.output());
    }

    /// Clear the `ran` flag of `id` and everything upstream of it.
    ///
    /// A node whose flag is already clear is left alone, which is also what
    /// stops the walk on cycles.
    pub fn prepare_node(&mut self, id: NodeId) {
        let node = &mut self.graph[id];
        if !node.ran {
            return;
        }
        node.ran = false;
        node.module.prepare();

        let mut sources = self.graph.neighbors_directed(id, Incoming).detach();
        while let Some(source) = sources.next_node(&self.graph) {
            self.prepare_node(source);
        }
    }

    /// Pull one buffer through the patch. Returns whether the output
    /// pass-through ran.
    pub fn synthesize(&mut self, frame: u64) -> bool {
        let ctx = ProcessContext::new(self.config, frame);
        self.synthesize_node(self.output(), &ctx)
    }

    /// Evaluate `id` for the current tick, pulling its sources first.
    ///
    /// Returns whether the node produced output; a node already evaluated
    /// this tick reports its earlier result without running again.
    pub fn synthesize_node(&mut self, id: NodeId, ctx: &ProcessContext) -> bool {
        let node = &mut self.graph[id];
        if node.ran {
            return node.active;
        }
        // Set before recursing: a cycle back to this node must see it as done.
        node.ran = true;

        let mut sources = self.graph.neighbors_directed(id, Incoming).detach();
        while let Some(source) = sources.next_node(&self.graph) {
            self.synthesize_node(source, ctx);
        }

        // Unconnected inputs stay silent.
        let mut inputs = core::mem::take(&mut self.graph[id].inputs);
        inputs.iter_mut().for_each(Buffer::clear);
        for edge in self.graph.edges_directed(id, Incoming) {
            edge.weight()
                .mix_into(&mut inputs, &self.graph[edge.source()].outputs);
        }

        let node = &mut self.graph[id];
        let active = node.module.process(ctx, &inputs, &mut node.outputs);
        if !active {
            node.outputs.iter_mut().for_each(Buffer::clear);
        }
        node.active = active;
        node.inputs = inputs;
        active
    }

    // --- controls ----------------------------------------------------------

    /// Add a control owned by this patch.
    pub fn add_control(&mut self, control: Control) -> Result<ControlId> {
        self.controls.add(control)
    }

    #[inline]
    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// The control at a dotted path; all but the last segment name nested
    /// patches.
    pub fn control(&self, path: &str) -> Result<&Control> {
        let resolved = self.lookup_control(path)?;
        let mut patch = self;
        for id in &resolved.patch {
            patch = patch.graph[*id]
                .module
                .as_patch()
                .ok_or_else(|| Error::NotAPatch(path.into()))?;
        }
        patch
            .controls
            .get(resolved.control)
            .ok_or_else(|| Error::NotFound(path.into()))
    }

    pub fn lookup_control(&self, path: &str) -> Result<ControlPath> {
        match path.rsplit_once('.') {
            None => {
                let control = self
                    .controls
                    .find(path)
                    .ok_or_else(|| Error::NotFound(path.into()))?;
                Ok(ControlPath {
                    patch: Vec::new(),
                    control,
                })
            }
            Some((parent, name)) => {
                let parent_path = self.lookup(parent)?;
                let patch = self
                    .node_at(&parent_path)
                    .and_then(|node| node.as_patch())
                    .ok_or_else(|| Error::NotAPatch(parent.into()))?;
                let control = patch
                    .controls
                    .find(name)
                    .ok_or_else(|| Error::NotFound(path.into()))?;
                Ok(ControlPath {
                    patch: parent_path.0,
                    control,
                })
            }
        }
    }

    /// Forward changes of control `control` to control index `index` of the
    /// node at `node` (a dotted path relative to this patch).
    pub fn bind_control(&mut self, control: &str, node: &str, index: usize) -> Result<ListenerId> {
        let id = self
            .controls
            .find(control)
            .ok_or_else(|| Error::NotFound(control.into()))?;
        let path = self.lookup(node)?;
        let target = self
            .node_at(&path)
            .ok_or_else(|| Error::NotFound(node.into()))?;
        if index >= target.num_controls() {
            return Err(Error::ControlIndexOutOfRange {
                node: node.into(),
                index,
                available: target.num_controls(),
            });
        }
        self.controls.bind(id, path, index)
    }

    /// Forward changes of control `from` to control `to`, both owned by this
    /// patch, optionally through `map`.
    pub fn link_controls(
        &mut self,
        from: &str,
        to: &str,
        map: Option<Box<dyn Fn(&ControlValue) -> ControlValue + Send>>,
    ) -> Result<ListenerId> {
        let from_id = self.controls.find(from).ok_or_else(|| Error::NotFound(from.into()))?;
        let to_id = self.controls.find(to).ok_or_else(|| Error::NotFound(to.into()))?;
        self.controls.link(from_id, to_id, map)
    }

    /// Call `callback` on every change of the control named `control`.
    pub fn listen<F>(&mut self, control: &str, callback: F) -> Result<ListenerId>
    where
        F: FnMut(&ControlChange) + Send + 'static,
    {
        let id = self
            .controls
            .find(control)
            .ok_or_else(|| Error::NotFound(control.into()))?;
        self.controls.listen(id, callback)
    }

    /// Set the control at `path` as an external setter. Returns whether the
    /// value changed.
    pub fn set_control(&mut self, path: &str, value: impl Into<ControlValue>) -> Result<bool> {
        self.set_control_as(path, value, Setter::External)
    }

    /// Set the control at `path` on behalf of `setter`; listeners identified
    /// by `setter` are skipped.
    pub fn set_control_as(&mut self, path: &str, value: impl Into<ControlValue>, setter: Setter) -> Result<bool> {
        let resolved = self.lookup_control(path)?;
        let patch = self
            .patch_at_mut(&resolved.patch)
            .ok_or_else(|| Error::NotFound(path.into()))?;
        Ok(patch.set_control_by_id(resolved.control, value.into(), setter))
    }

    /// Apply a message payload to a resolved control.
    pub(crate) fn receive_control_payload(&mut self, path: &ControlPath, payload: &Payload) -> bool {
        let Some(patch) = self.patch_at_mut(&path.patch) else {
            return false;
        };
        let nodes = &mut patch.graph;
        patch.controls.receive(path.control, payload, &mut |target, index, value| {
            if let Some(node) = node_at_mut(nodes, target.ids()) {
                node.receive_control_value(value, index);
            }
        })
    }

    fn set_control_by_id(&mut self, id: ControlId, value: ControlValue, setter: Setter) -> bool {
        let nodes = &mut self.graph;
        self.controls.set(id, value, setter, &mut |target, index, value| {
            if let Some(node) = node_at_mut(nodes, target.ids()) {
                node.receive_control_value(value, index);
            }
        })
    }

    fn patch_at_mut(&mut self, ids: &[NodeId]) -> Option<&mut Patch> {
        match ids.split_first() {
            None => Some(self),
            Some((first, rest)) => self
                .graph
                .node_weight_mut(*first)?
                .module
                .as_patch_mut()?
                .patch_at_mut(rest),
        }
    }
}

fn node_at_mut<'a>(graph: &'a mut ChildGraph, ids: &[NodeId]) -> Option<&'a mut dyn AudioNode> {
    let (first, rest) = ids.split_first()?;
    let module: &'a mut dyn AudioNode = &mut *graph.node_weight_mut(*first)?.module;
    if rest.is_empty() {
        Some(module)
    } else {
        node_at_mut(&mut module.as_patch_mut()?.graph, rest)
    }
}

impl AudioNode for Patch {
    fn process(&mut self, ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
        let inlet = self.input();
        let inlet = &mut self.graph[inlet];
        for (mirror, input) in inlet.outputs.iter_mut().zip(inputs) {
            mirror.copy_from(input);
        }
        inlet.ran = true;
        inlet.active = true;

        let active = self.synthesize(ctx.frame);
        for (out, result) in outputs.iter_mut().zip(self.outputs()) {
            out.copy_from(result);
        }
        active
    }

    fn num_inputs(&self) -> usize {
        self.graph[self.input()].outputs.len()
    }

    fn num_outputs(&self) -> usize {
        self.graph[self.output()].outputs.len()
    }

    /// One index per owned control, in the order they were added.
    fn num_controls(&self) -> usize {
        self.controls.len()
    }

    fn receive_control_value(&mut self, value: &ControlValue, index: usize) {
        if let Some(id) = self.controls.nth(index) {
            self.set_control_by_id(id, value.clone(), Setter::External);
        }
    }

    /// Forwarded to every child in insertion order.
    fn receive_message(&mut self, message: &Message) -> Vec<Message> {
        let mut replies = Vec::new();
        for index in 2..self.graph.node_bound() {
            if let Some(node) = self.graph.node_weight_mut(NodeIndex::new(index)) {
                replies.extend(node.module.receive_message(message));
            }
        }
        replies
    }

    fn prepare(&mut self) {
        self.prepare_node(self.output());
    }

    fn as_patch(&self) -> Option<&Patch> {
        Some(self)
    }

    fn as_patch_mut(&mut self) -> Option<&mut Patch> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Constant, Gain, Mixer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config() -> Config {
        Config::new(44_100.0, 8)
    }

    fn tick(patch: &mut Patch, frame: u64) -> Vec<f32> {
        patch.prepare();
        patch.synthesize(frame);
        patch.outputs()[0].to_vec()
    }

    /// Sums its inputs and counts how often it ran
    struct Counted {
        inputs: usize,
        runs: Arc<AtomicUsize>,
    }

    impl AudioNode for Counted {
        fn process(&mut self, _ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
            self.runs.fetch_add(1, Ordering::Relaxed);
            outputs[0].fill(1.0);
            for input in inputs {
                outputs[0].mix_from(input, 1.0);
            }
            true
        }

        fn num_inputs(&self) -> usize {
            self.inputs
        }
    }

    /// Outputs silence and reports itself idle
    struct Idle;

    impl AudioNode for Idle {
        fn process(&mut self, _ctx: &ProcessContext, _inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
            outputs[0].fill(7.0);
            false
        }
    }

    #[test]
    fn diamond_source_runs_once_per_tick() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut patch = Patch::new(config(), 0, 1);
        let a = patch
            .add("a", Counted { inputs: 0, runs: runs.clone() })
            .unwrap();
        let b = patch.add("b", Gain::new(1.0)).unwrap();
        let c = patch.add("c", Gain::new(1.0)).unwrap();
        let d = patch.add("d", Mixer::new(2)).unwrap();
        patch.connect(a, 0, b, 0).unwrap();
        patch.connect(a, 0, c, 0).unwrap();
        patch.connect(b, 0, d, 0).unwrap();
        patch.connect(c, 0, d, 1).unwrap();
        patch.connect(d, 0, patch.output(), 0).unwrap();

        for n in 1..=3 {
            let out = tick(&mut patch, 0);
            assert_eq!(runs.load(Ordering::Relaxed), n);
            assert!(out.iter().all(|&s| s == 2.0));
        }
    }

    #[test]
    fn self_feedback_converges() {
        let mut patch = Patch::new(config(), 0, 1);
        let one = patch.add("one", Constant::new(1.0)).unwrap();
        let mix = patch.add("mix", Mixer::new(2)).unwrap();
        patch.connect(one, 0, mix, 0).unwrap();
        patch.connect_weighted(mix, 0, mix, 1, 0.5).unwrap();
        patch.connect(mix, 0, patch.output(), 0).unwrap();

        let mut expected = 0.0f32;
        for _ in 0..24 {
            expected = expected * 0.5 + 1.0;
            let out = tick(&mut patch, 0);
            assert!(out.iter().all(|&s| (s - expected).abs() < 1e-6));
        }
        assert!((expected - 2.0).abs() < 1e-5);
    }

    #[test]
    fn mutual_feedback_terminates() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut patch = Patch::new(config(), 0, 1);
        let a = patch
            .add("a", Counted { inputs: 1, runs: runs.clone() })
            .unwrap();
        let b = patch.add("b", Gain::new(0.0)).unwrap();
        patch.connect(a, 0, b, 0).unwrap();
        patch.connect(b, 0, a, 0).unwrap();
        patch.connect(a, 0, patch.output(), 0).unwrap();

        for _ in 0..4 {
            assert_eq!(tick(&mut patch, 0), vec![1.0; 8]);
        }
        assert_eq!(runs.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn nested_patch_is_transparent() {
        let mut direct = Patch::new(config(), 0, 1);
        let dc = direct.add("dc", Constant::new(0.25)).unwrap();
        let gain = direct.add("gain", Gain::new(3.0)).unwrap();
        direct.connect(dc, 0, gain, 0).unwrap();
        direct.connect(gain, 0, direct.output(), 0).unwrap();

        let mut inner = Patch::new(config(), 1, 1);
        let inner_gain = inner.add("gain", Gain::new(3.0)).unwrap();
        inner.connect(inner.input(), 0, inner_gain, 0).unwrap();
        inner.connect(inner_gain, 0, inner.output(), 0).unwrap();

        let mut outer = Patch::new(config(), 0, 1);
        let dc = outer.add("dc", Constant::new(0.25)).unwrap();
        let sub = outer.add("sub", inner).unwrap();
        outer.connect(dc, 0, sub, 0).unwrap();
        outer.connect(sub, 0, outer.output(), 0).unwrap();

        for _ in 0..3 {
            assert_eq!(tick(&mut direct, 0), tick(&mut outer, 0));
        }
        assert!(tick(&mut outer, 0).iter().all(|&s| s == 0.75));
    }

    #[test]
    fn feedback_across_patch_boundary() {
        let mut inner = Patch::new(config(), 1, 1);
        let half = inner.add("half", Gain::new(0.5)).unwrap();
        inner.connect(inner.input(), 0, half, 0).unwrap();
        inner.connect(half, 0, inner.output(), 0).unwrap();

        let mut outer = Patch::new(config(), 0, 1);
        let one = outer.add("one", Constant::new(1.0)).unwrap();
        let mix = outer.add("mix", Mixer::new(2)).unwrap();
        let sub = outer.add("sub", inner).unwrap();
        outer.connect(one, 0, mix, 0).unwrap();
        outer.connect(sub, 0, mix, 1).unwrap();
        outer.connect(mix, 0, sub, 0).unwrap();
        outer.connect(mix, 0, outer.output(), 0).unwrap();

        assert!(tick(&mut outer, 0).iter().all(|&s| s == 1.0));
        assert!(tick(&mut outer, 0).iter().all(|&s| s == 1.5));
        assert!(tick(&mut outer, 0).iter().all(|&s| s == 1.75));
    }

    #[test]
    fn disconnect_removes_every_edge_between_two_nodes() {
        let mut patch = Patch::new(config(), 0, 1);
        let dc = patch.add("dc", Constant::new(1.0)).unwrap();
        let mix = patch.add("mix", Mixer::new(2)).unwrap();
        patch.connect(dc, 0, mix, 0).unwrap();
        patch.connect_weighted(dc, 0, mix, 1, 0.5).unwrap();
        patch.connect(mix, 0, patch.output(), 0).unwrap();

        assert_eq!(patch.connections(mix, 1), vec![(dc, Connection::new(0, 1).with_weight(0.5))]);
        assert!(tick(&mut patch, 0).iter().all(|&s| s == 1.5));

        patch.disconnect(dc, mix).unwrap();
        assert!(patch.connections(mix, 0).is_empty());
        assert!(patch.connections(mix, 1).is_empty());
        assert!(tick(&mut patch, 0).iter().all(|&s| s == 0.0));
        assert_eq!(
            patch.disconnect(NodeIndex::new(9), mix).err(),
            Some(Error::InvalidNode(9))
        );
    }

    #[test]
    fn idle_nodes_read_as_silence() {
        let mut patch = Patch::new(config(), 0, 1);
        let idle = patch.add("idle", Idle).unwrap();
        patch.connect(idle, 0, patch.output(), 0).unwrap();
        assert_eq!(tick(&mut patch, 0), vec![0.0; 8]);
    }

    #[test]
    fn unconnected_output_is_silent() {
        let mut patch = Patch::new(config(), 0, 2);
        patch.add("dc", Constant::new(1.0)).unwrap();
        patch.prepare();
        patch.synthesize(0);
        assert_eq!(patch.outputs().len(), 2);
        assert!(patch.outputs().iter().all(|b| b.iter().all(|&s| s == 0.0)));
    }

    #[test]
    fn dotted_lookup() {
        let mut voice = Patch::new(config(), 0, 1);
        voice.add("osc", Constant::new(1.0)).unwrap();
        let mut synth = Patch::new(config(), 0, 1);
        let voice_id = synth.add("voice", voice).unwrap();
        synth.add("dc", Constant::new(0.0)).unwrap();

        let path = synth.lookup("voice.osc").unwrap();
        assert_eq!(path.ids()[0], voice_id);
        assert_eq!(path.ids().len(), 2);
        assert!(synth.node("voice.osc").is_ok());
        assert!(synth.node("voice.out").is_ok());

        assert_eq!(
            synth.lookup("voice.nope").err(),
            Some(Error::NotFound("voice.nope".into()))
        );
        assert_eq!(synth.lookup("ghost").err(), Some(Error::NotFound("ghost".into())));
        assert_eq!(
            synth.lookup("dc.osc").err(),
            Some(Error::NotAPatch("dc".into()))
        );
    }

    #[test]
    fn construction_errors() {
        let mut patch = Patch::new(config(), 1, 1);
        let dc = patch.add("dc", Constant::new(1.0)).unwrap();
        let gain = patch.add("gain", Gain::new(1.0)).unwrap();

        assert_eq!(
            patch.add("dc", Constant::new(1.0)).err(),
            Some(Error::DuplicateIdentifier("dc".into()))
        );
        assert_eq!(
            patch.add("out", Constant::new(1.0)).err(),
            Some(Error::DuplicateIdentifier("out".into()))
        );
        assert!(matches!(
            patch.add("a.b", Constant::new(1.0)),
            Err(Error::InvalidIdentifier(_))
        ));
        assert!(matches!(
            patch.connect(dc, 1, gain, 0),
            Err(Error::OutputOutOfRange { index: 1, available: 1, .. })
        ));
        assert!(matches!(
            patch.connect(dc, 0, gain, 1),
            Err(Error::InputOutOfRange { index: 1, available: 1, .. })
        ));
        assert_eq!(
            patch.connect(dc, 0, patch.input(), 0).err(),
            Some(Error::ConnectToInlet)
        );
        assert_eq!(
            patch.connect(NodeIndex::new(42), 0, gain, 0).err(),
            Some(Error::InvalidNode(42))
        );
        assert_eq!(
            patch.add("sub", Patch::new(config().with_buffer_size(16), 0, 1)).err(),
            Some(Error::BufferSizeMismatch { expected: 8, found: 16 })
        );
        // a different sample rate is fine
        assert!(patch
            .add("fast", Patch::new(config().oversampled(2), 0, 1))
            .is_ok());
    }

    #[test]
    fn bound_control_applies_immediately() {
        let mut patch = Patch::new(config(), 0, 1);
        let dc = patch.add("dc", Constant::new(1.0)).unwrap();
        let gain = patch.add("gain", Gain::new(1.0)).unwrap();
        patch.connect(dc, 0, gain, 0).unwrap();
        patch.connect(gain, 0, patch.output(), 0).unwrap();

        patch.add_control(Control::float("level", 1.0, 0.0, 4.0)).unwrap();
        patch.bind_control("level", "gain", 0).unwrap();
        assert!(matches!(
            patch.bind_control("level", "gain", 1),
            Err(Error::ControlIndexOutOfRange { .. })
        ));

        assert!(patch.set_control("level", 3.0).unwrap());
        assert!(tick(&mut patch, 0).iter().all(|&s| s == 3.0));
        // out of range: ignored
        assert!(!patch.set_control("level", 9.0).unwrap());
        assert!(tick(&mut patch, 0).iter().all(|&s| s == 3.0));
    }

    #[test]
    fn nested_controls_resolve_by_path() {
        let mut voice = Patch::new(config(), 0, 1);
        let dc = voice.add("dc", Constant::new(0.0)).unwrap();
        voice.connect(dc, 0, voice.output(), 0).unwrap();
        voice.add_control(Control::float("level", 0.0, 0.0, 1.0)).unwrap();
        voice.bind_control("level", "dc", 0).unwrap();

        let mut synth = Patch::new(config(), 0, 1);
        let voice = synth.add("voice", voice).unwrap();
        synth.connect(voice, 0, synth.output(), 0).unwrap();

        assert!(synth.set_control("voice.level", 0.5).unwrap());
        assert_eq!(synth.control("voice.level").unwrap().value(), &ControlValue::Float(0.5));
        assert!(tick(&mut synth, 0).iter().all(|&s| s == 0.5));

        // the nested patch exposes its control as index 0
        synth
            .node_mut("voice")
            .unwrap()
            .receive_control_value(&ControlValue::Float(0.25), 0);
        assert!(tick(&mut synth, 0).iter().all(|&s| s == 0.25));

        assert!(matches!(synth.set_control("voice.nope", 1.0), Err(Error::NotFound(_))));
    }
}
