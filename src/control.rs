//! Control-rate parameters.
//!
//! Controls form a graph of their own, next to the audio graph: a [`Control`]
//! holds a value and a list of listeners, and a change is pushed synchronously
//! to every listener. A listener may be a node parameter of the owning patch,
//! another control, or a callback. Controls are evaluated once per tick, never
//! per sample.
//!
//! Each change carries a [`Setter`]. A listener whose identity equals the
//! setter is skipped, so two controls linked in both directions do not bounce
//! a change back and forth.

use hashbrown::HashMap;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::message::Payload;
use crate::node::NodePath;

/// Identifier of a control within its owning [`Controls`] set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ControlId(pub(crate) usize);

/// Identifier of a listener registered on a control.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(pub(crate) usize);

/// Value held by a control.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ControlValue {
    Float(f64),
    /// Index into the options of an enumerated control
    Choice(usize),
    Toggle(bool),
}

impl ControlValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ControlValue::Float(f) => *f,
            ControlValue::Choice(i) => *i as f64,
            ControlValue::Toggle(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl From<f64> for ControlValue {
    fn from(value: f64) -> Self {
        ControlValue::Float(value)
    }
}

impl From<bool> for ControlValue {
    fn from(value: bool) -> Self {
        ControlValue::Toggle(value)
    }
}

/// Shape and bounds of a control's value.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlKind {
    Float { min: f64, max: f64 },
    Choice { options: Vec<String> },
    Toggle,
}

/// Who caused a control change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Setter {
    /// A message, the environment, or user code
    External,
    /// Another control forwarding its own change
    Control(ControlId),
    /// A callback listener writing back
    Listener(ListenerId),
}

/// Passed to every listener when a control changes.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlChange {
    pub control: ControlId,
    pub old: ControlValue,
    pub new: ControlValue,
    pub setter: Setter,
}

type Mapping = Box<dyn Fn(&ControlValue) -> ControlValue + Send>;
type Callback = Box<dyn FnMut(&ControlChange) + Send>;

enum Target {
    /// Control index of a node inside the owning patch
    Node { path: NodePath, index: usize },
    Control { target: ControlId, map: Option<Mapping> },
    Callback(Callback),
}

struct Listener {
    id: ListenerId,
    target: Target,
}

impl Listener {
    /// The setter value that identifies this listener's own writes.
    fn identity(&self) -> Setter {
        match self.target {
            Target::Control { target, .. } => Setter::Control(target),
            _ => Setter::Listener(self.id),
        }
    }
}

/// A named, typed value with change notification.
pub struct Control {
    name: String,
    kind: ControlKind,
    value: ControlValue,
    listeners: Vec<Listener>,
}

impl Control {
    /// A float control bounded to `[min, max]`. `default` is clamped into
    /// the range.
    ///
    /// # Panics
    ///
    /// Panics if `min > max` or either bound is NaN.
    pub fn float(name: impl Into<String>, default: f64, min: f64, max: f64) -> Self {
        let name = name.into();
        assert!(
            min <= max,
            "control `{name}` has an empty range [{min}, {max}]"
        );
        Self {
            name,
            kind: ControlKind::Float { min, max },
            value: ControlValue::Float(default.clamp(min, max)),
            listeners: Vec::new(),
        }
    }

    /// An enumerated control selecting one of `options`.
    pub fn choice<S: Into<String>>(
        name: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        default: usize,
    ) -> Self {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let default = default.min(options.len().saturating_sub(1));
        Self {
            name: name.into(),
            kind: ControlKind::Choice { options },
            value: ControlValue::Choice(default),
            listeners: Vec::new(),
        }
    }

    pub fn toggle(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            kind: ControlKind::Toggle,
            value: ControlValue::Toggle(default),
            listeners: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    #[inline]
    pub fn value(&self) -> &ControlValue {
        &self.value
    }

    /// Label of the selected option of an enumerated control.
    pub fn selected(&self) -> Option<&str> {
        match (&self.kind, &self.value) {
            (ControlKind::Choice { options }, ControlValue::Choice(i)) => {
                options.get(*i).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Whether `value` has this control's shape and lies within its bounds.
    pub fn accepts(&self, value: &ControlValue) -> bool {
        match (&self.kind, value) {
            (ControlKind::Float { min, max }, ControlValue::Float(v)) => *v >= *min && *v <= *max,
            (ControlKind::Choice { options }, ControlValue::Choice(i)) => *i < options.len(),
            (ControlKind::Toggle, ControlValue::Toggle(_)) => true,
            _ => false,
        }
    }

    /// Convert a message payload into a value for this control.
    ///
    /// # Panics
    ///
    /// Panics if the payload has no meaning for this control's kind, e.g.
    /// text sent to a float control. That is a wiring bug, not a runtime
    /// condition.
    pub fn value_from_payload(&self, payload: &Payload) -> ControlValue {
        match (&self.kind, payload) {
            (ControlKind::Float { .. }, Payload::Float(f)) => ControlValue::Float(*f),
            (ControlKind::Float { .. }, Payload::Int(i)) => ControlValue::Float(*i as f64),
            (ControlKind::Choice { .. }, Payload::Int(i)) if *i >= 0 => ControlValue::Choice(*i as usize),
            (ControlKind::Choice { .. }, Payload::Float(f)) if *f >= 0.0 => {
                ControlValue::Choice(f.round() as usize)
            }
            (ControlKind::Choice { options }, Payload::Text(label)) => {
                match options.iter().position(|o| o == label) {
                    Some(i) => ControlValue::Choice(i),
                    None => panic!("control `{}` has no option `{}`", self.name, label),
                }
            }
            (ControlKind::Toggle, Payload::Bool(b)) => ControlValue::Toggle(*b),
            (ControlKind::Toggle, p) if p.as_f64().is_some() => {
                ControlValue::Toggle(p.as_f64().is_some_and(|v| v != 0.0))
            }
            (kind, payload) => panic!(
                "control `{}` ({:?}) cannot take payload {:?}",
                self.name, kind, payload
            ),
        }
    }
}

/// The controls owned by one patch, addressable by name.
#[derive(Default)]
pub struct Controls {
    controls: Vec<Control>,
    names: HashMap<String, ControlId>,
    next_listener: usize,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, control: Control) -> Result<ControlId> {
        if control.name.is_empty() || control.name.contains('.') {
            return Err(Error::InvalidIdentifier(control.name));
        }
        if self.names.contains_key(&control.name) {
            return Err(Error::DuplicateControl(control.name));
        }

        let id = ControlId(self.controls.len());
        debug!(control = %control.name, "control added");
        self.names.insert(control.name.clone(), id);
        self.controls.push(control);
        Ok(id)
    }

    #[inline]
    pub fn find(&self, name: &str) -> Option<ControlId> {
        self.names.get(name).copied()
    }

    #[inline]
    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id.0)
    }

    /// Control at position `index` in insertion order.
    #[inline]
    pub fn nth(&self, index: usize) -> Option<ControlId> {
        (index < self.controls.len()).then_some(ControlId(index))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControlId, &Control)> {
        self.controls.iter().enumerate().map(|(i, c)| (ControlId(i), c))
    }

    /// Call `callback` on every change of `control`.
    pub fn listen<F>(&mut self, control: ControlId, callback: F) -> Result<ListenerId>
    where
        F: FnMut(&ControlChange) + Send + 'static,
    {
        self.push_listener(control, Target::Callback(Box::new(callback)))
    }

    /// Forward every change of `control` to control index `index` of the
    /// node at `path`.
    pub(crate) fn bind(&mut self, control: ControlId, path: NodePath, index: usize) -> Result<ListenerId> {
        self.push_listener(control, Target::Node { path, index })
    }

    /// Forward every change of `from` to `to`, through `map` if given.
    pub fn link(
        &mut self,
        from: ControlId,
        to: ControlId,
        map: Option<Box<dyn Fn(&ControlValue) -> ControlValue + Send>>,
    ) -> Result<ListenerId> {
        if to.0 >= self.controls.len() {
            return Err(Error::NotFound(format!("control #{}", to.0)));
        }
        self.push_listener(from, Target::Control { target: to, map })
    }

    fn push_listener(&mut self, control: ControlId, target: Target) -> Result<ListenerId> {
        let id = ListenerId(self.next_listener);
        let control = self
            .controls
            .get_mut(control.0)
            .ok_or_else(|| Error::NotFound(format!("control #{}", control.0)))?;
        self.next_listener += 1;
        control.listeners.push(Listener { id, target });
        Ok(id)
    }

    /// Store `value` and notify listeners, if it differs from the current
    /// value and is accepted by the control. Returns whether it changed.
    ///
    /// `deliver` applies a value to a node's control index; it is how the
    /// owning patch reaches its nodes.
    pub fn set<F>(&mut self, id: ControlId, value: ControlValue, setter: Setter, deliver: &mut F) -> bool
    where
        F: FnMut(&NodePath, usize, &ControlValue),
    {
        let Some(control) = self.controls.get_mut(id.0) else {
            return false;
        };
        if control.value == value {
            return false;
        }
        if !control.accepts(&value) {
            debug!(control = %control.name, ?value, "value rejected");
            return false;
        }

        let old = core::mem::replace(&mut control.value, value.clone());
        self.notify(
            ControlChange {
                control: id,
                old,
                new: value,
                setter,
            },
            deliver,
        );
        true
    }

    /// Re-deliver the current value of `id` to every listener.
    pub fn bang<F>(&mut self, id: ControlId, setter: Setter, deliver: &mut F)
    where
        F: FnMut(&NodePath, usize, &ControlValue),
    {
        let Some(control) = self.controls.get(id.0) else {
            return;
        };
        let value = control.value.clone();
        self.notify(
            ControlChange {
                control: id,
                old: value.clone(),
                new: value,
                setter,
            },
            deliver,
        );
    }

    /// Apply a message payload: a bang re-delivers, anything else is set.
    pub fn receive<F>(&mut self, id: ControlId, payload: &Payload, deliver: &mut F) -> bool
    where
        F: FnMut(&NodePath, usize, &ControlValue),
    {
        if payload.is_bang() {
            self.bang(id, Setter::External, deliver);
            return true;
        }
        let Some(control) = self.controls.get(id.0) else {
            return false;
        };
        let value = control.value_from_payload(payload);
        self.set(id, value, Setter::External, deliver)
    }

    fn notify<F>(&mut self, change: ControlChange, deliver: &mut F)
    where
        F: FnMut(&NodePath, usize, &ControlValue),
    {
        let id = change.control;
        // Listeners are detached while they run; a change that loops back to
        // this control stores its value without notifying again.
        let mut listeners = core::mem::take(&mut self.controls[id.0].listeners);

        for listener in listeners.iter_mut() {
            if listener.identity() == change.setter {
                continue;
            }
            match &mut listener.target {
                Target::Node { path, index } => deliver(path, *index, &change.new),
                Target::Control { target, map } => {
                    let value = match map {
                        Some(map) => map(&change.new),
                        None => change.new.clone(),
                    };
                    self.set(*target, value, Setter::Control(id), deliver);
                }
                Target::Callback(callback) => callback(&change),
            }
        }

        self.controls[id.0].listeners = listeners;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn ignore(_: &NodePath, _: usize, _: &ControlValue) {}

    #[test]
    fn set_notifies_only_on_change() {
        let mut controls = Controls::new();
        let cutoff = controls.add(Control::float("cutoff", 440.0, 20.0, 20_000.0)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        controls
            .listen(cutoff, move |change| sink.lock().unwrap().push(change.new.clone()))
            .unwrap();

        assert!(controls.set(cutoff, 880.0.into(), Setter::External, &mut ignore));
        assert!(!controls.set(cutoff, 880.0.into(), Setter::External, &mut ignore));
        // out of bounds
        assert!(!controls.set(cutoff, 5.0.into(), Setter::External, &mut ignore));
        // wrong shape
        assert!(!controls.set(cutoff, true.into(), Setter::External, &mut ignore));

        assert_eq!(*seen.lock().unwrap(), vec![ControlValue::Float(880.0)]);
        assert_eq!(controls.get(cutoff).unwrap().value(), &ControlValue::Float(880.0));
    }

    #[test]
    fn listener_is_not_told_about_its_own_write() {
        let mut controls = Controls::new();
        let level = controls.add(Control::float("level", 0.0, 0.0, 1.0)).unwrap();

        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let listener = controls
            .listen(level, move |_| *counter.lock().unwrap() += 1)
            .unwrap();

        controls.set(level, 0.5.into(), Setter::Listener(listener), &mut ignore);
        assert_eq!(*calls.lock().unwrap(), 0);

        controls.set(level, 0.25.into(), Setter::External, &mut ignore);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn bidirectional_links_do_not_loop() {
        let mut controls = Controls::new();
        let a = controls.add(Control::float("a", 0.0, -100.0, 100.0)).unwrap();
        let b = controls.add(Control::float("b", 0.0, -100.0, 100.0)).unwrap();

        // each direction adds one, so values never settle on their own
        let plus_one = || -> Option<Box<dyn Fn(&ControlValue) -> ControlValue + Send>> {
            Some(Box::new(|v: &ControlValue| ControlValue::Float(v.as_f64() + 1.0)))
        };
        controls.link(a, b, plus_one()).unwrap();
        controls.link(b, a, plus_one()).unwrap();

        assert!(controls.set(a, 10.0.into(), Setter::External, &mut ignore));
        assert_eq!(controls.get(a).unwrap().value(), &ControlValue::Float(10.0));
        assert_eq!(controls.get(b).unwrap().value(), &ControlValue::Float(11.0));

        assert!(controls.set(b, 20.0.into(), Setter::External, &mut ignore));
        assert_eq!(controls.get(a).unwrap().value(), &ControlValue::Float(21.0));
    }

    #[test]
    fn bound_nodes_receive_values_and_bangs() {
        let mut controls = Controls::new();
        let mode = controls
            .add(Control::choice("mode", ["sine", "saw", "square"], 0))
            .unwrap();
        controls.bind(mode, NodePath::from(crate::node::NodeId::new(3)), 1).unwrap();

        let mut delivered = Vec::new();
        let mut deliver = |path: &NodePath, index: usize, value: &ControlValue| {
            delivered.push((path.leaf().index(), index, value.clone()));
        };

        assert!(controls.receive(mode, &Payload::Text("saw".into()), &mut deliver));
        assert!(controls.receive(mode, &Payload::Bang, &mut deliver));
        assert_eq!(controls.get(mode).unwrap().selected(), Some("saw"));
        assert_eq!(
            delivered,
            vec![(3, 1, ControlValue::Choice(1)), (3, 1, ControlValue::Choice(1))]
        );
    }

    #[test]
    #[should_panic]
    fn text_to_float_control_panics() {
        let mut controls = Controls::new();
        let gain = controls.add(Control::float("gain", 1.0, 0.0, 2.0)).unwrap();
        controls.receive(gain, &Payload::Text("loud".into()), &mut ignore);
    }

    #[test]
    #[should_panic(expected = "control `cutoff` has an empty range [1, 0]")]
    fn inverted_range_panics() {
        Control::float("cutoff", 0.5, 1.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "control `q` has an empty range")]
    fn nan_bound_panics() {
        Control::float("q", 0.5, f64::NAN, 1.0);
    }

    #[test]
    fn names_are_unique() {
        let mut controls = Controls::new();
        controls.add(Control::toggle("on", true)).unwrap();
        assert_eq!(
            controls.add(Control::toggle("on", false)).err(),
            Some(Error::DuplicateControl("on".into()))
        );
        assert!(matches!(
            controls.add(Control::toggle("a.b", false)),
            Err(Error::InvalidIdentifier(_))
        ));
    }
}
