//! Root driver: the tick clock, message routing and the pull of the root
//! patch.

use std::collections::VecDeque;

use hashbrown::HashMap;
use tracing::{debug, trace, trace_span, warn};

use crate::buffer::Buffer;
use crate::config::Config;
use crate::error::Result;
use crate::message::Message;
use crate::messengers::Messenger;
use crate::node::NodePath;
use crate::nodes::Sink;
use crate::patch::{ControlPath, Patch};

/// Replies that may be routed on top of a tick's initial messages before
/// the rest are dropped.
const MAX_REPLIES: usize = 1024;

/// Something a message can be delivered to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Receiver {
    /// A node (or nested patch) in the root patch
    Node(NodePath),
    /// A control owned by the root patch or a nested one
    Control(ControlPath),
}

/// Owns the root [`Patch`] and drives it one buffer at a time.
///
/// Each [`run_once`](Self::run_once):
///
/// 1. advances the timestamp by one buffer,
/// 2. collects the messages every [`Messenger`] has due before the new
///    timestamp, after any queued with [`send`](Self::send),
/// 3. routes them by address, along with whatever the receivers answer,
/// 4. pulls one buffer from the root patch.
///
/// ```
/// use schall::{Config, Environment, Patch};
/// use schall::nodes::Constant;
///
/// # fn main() -> schall::Result<()> {
/// let mut root = Patch::new(Config::new(44_100.0, 8), 0, 1);
/// let dc = root.add("dc", Constant::new(0.5))?;
/// root.connect(dc, 0, root.output(), 0)?;
///
/// let mut env = Environment::new(root);
/// let outputs = env.run_once();
/// assert_eq!(&outputs[0][..], &[0.5f32; 8]);
/// assert_eq!(env.timestamp(), 8);
/// # Ok(())
/// # }
/// ```
pub struct Environment {
    config: Config,
    root: Patch,
    messengers: Vec<Box<dyn Messenger>>,
    routes: HashMap<String, Vec<Receiver>>,
    pending: VecDeque<Message>,
    timestamp: u64,
}

impl Environment {
    pub fn new(root: Patch) -> Self {
        Self {
            config: *root.config(),
            root,
            messengers: Vec::new(),
            routes: HashMap::new(),
            pending: VecDeque::new(),
            timestamp: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Samples rendered so far.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    #[inline]
    pub fn root(&self) -> &Patch {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut Patch {
        &mut self.root
    }

    /// The root patch outputs of the last tick.
    #[inline]
    pub fn outputs(&self) -> &[Buffer] {
        self.root.outputs()
    }

    /// Deliver messages sent to `address` to the node or control at the dotted
    /// `path`. Nodes take precedence over controls of the same name. Several
    /// receivers may share an address; each gets every message.
    pub fn register(&mut self, address: impl Into<String>, path: &str) -> Result<()> {
        let receiver = match self.root.lookup(path) {
            Ok(node) => Receiver::Node(node),
            Err(not_a_node) => Receiver::Control(
                self.root
                    .lookup_control(path)
                    .map_err(|_| not_a_node)?,
            ),
        };
        let address = address.into();
        debug!(%address, path, ?receiver, "receiver registered");
        self.routes.entry(address).or_default().push(receiver);
        Ok(())
    }

    /// Receivers registered under `address`.
    pub fn receivers(&self, address: &str) -> &[Receiver] {
        self.routes.get(address).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_messenger(&mut self, messenger: impl Messenger + 'static) {
        self.messengers.push(Box::new(messenger));
    }

    /// Queue `message` for delivery at the start of the next tick.
    pub fn send(&mut self, message: Message) {
        self.pending.push_back(message);
    }

    /// Render one tick and return the root patch outputs.
    pub fn run_once(&mut self) -> &[Buffer] {
        let frame = self.timestamp;
        self.timestamp += self.config.buffer_size as u64;

        let span = trace_span!("tick", frame);
        let _enter = span.enter();

        for messenger in self.messengers.iter_mut() {
            self.pending
                .extend(messenger.messages(self.timestamp, &self.config));
        }
        self.dispatch();

        self.root.prepare();
        self.root.synthesize(frame);
        self.root.outputs()
    }

    /// Run `ticks` ticks, handing each one to `sink`.
    ///
    /// Stops at the first sink error; the graph keeps the state of the last
    /// rendered tick.
    pub fn render<S: Sink>(&mut self, mut sink: S, ticks: usize) -> Result<()> {
        for _ in 0..ticks {
            self.run_once();
            sink.write(self.root.outputs(), &self.config)?;
        }
        Ok(())
    }

    fn dispatch(&mut self) {
        let mut budget = self.pending.len() + MAX_REPLIES;
        // taken so receivers can be walked while the root is borrowed mutably
        let routes = core::mem::take(&mut self.routes);

        while let Some(message) = self.pending.pop_front() {
            if budget == 0 {
                warn!(
                    dropped = self.pending.len() + 1,
                    "reply limit reached, dropping messages"
                );
                self.pending.clear();
                break;
            }
            budget -= 1;

            trace!(address = %message.address, payload = ?message.payload, "dispatch");
            match routes.get(&message.address) {
                Some(receivers) => {
                    for receiver in receivers {
                        self.deliver(receiver, &message);
                    }
                }
                None => match self.resolve(&message.address) {
                    Some(receiver) => self.deliver(&receiver, &message),
                    None => warn!(address = %message.address, "no receiver, message dropped"),
                },
            }
        }

        self.routes = routes;
    }

    /// An unregistered address is read as a dotted path.
    fn resolve(&self, address: &str) -> Option<Receiver> {
        if let Ok(node) = self.root.lookup(address) {
            return Some(Receiver::Node(node));
        }
        self.root.lookup_control(address).ok().map(Receiver::Control)
    }

    fn deliver(&mut self, receiver: &Receiver, message: &Message) {
        match receiver {
            Receiver::Node(path) => match self.root.send(path, message) {
                Ok(replies) => self.pending.extend(replies),
                Err(error) => warn!(%error, "message not delivered"),
            },
            Receiver::Control(path) => {
                self.root.receive_control_payload(path, &message.payload);
            }
        }
    }
}
