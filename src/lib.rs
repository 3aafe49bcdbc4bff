//! Schall - dual-rate audio dataflow engine
//!
//! Design principles:
//! - Audio runs in fixed-size buffers, pulled from the root patch once per tick
//! - Every node processes at most once per tick, however many consumers it has
//! - Feedback connections are legal and read the previous tick's output
//! - Patches are nodes, so graphs nest to any depth
//! - Controls and messages run at tick rate and land before the pull
//! - No globals: a [`Config`] is passed to every patch that is built
//!
//! ```
//! use schall::{Config, Control, Environment, Message, Patch};
//! use schall::nodes::{BufferSink, Constant, Gain};
//!
//! # fn main() -> schall::Result<()> {
//! let mut root = Patch::new(Config::new(44_100.0, 8), 0, 1);
//! let dc = root.add("dc", Constant::new(1.0))?;
//! let gain = root.add("gain", Gain::new(1.0))?;
//! root.connect(dc, 0, gain, 0)?;
//! root.connect(gain, 0, root.output(), 0)?;
//! root.add_control(Control::float("volume", 1.0, 0.0, 1.0))?;
//! root.bind_control("volume", "gain", 0)?;
//!
//! let mut env = Environment::new(root);
//! env.send(Message::float("volume", 0.25));
//!
//! let mut sink = BufferSink::new();
//! env.render(&mut sink, 2)?;
//! assert_eq!(sink.channel(0), &[0.25f32; 16]);
//! # Ok(())
//! # }
//! ```

mod buffer;
mod config;
mod control;
mod environment;
mod error;
mod message;
mod node;
mod patch;
mod port;
mod scheduler;
pub mod messengers;
pub mod nodes;
pub mod value;

pub use buffer::Buffer;
pub use config::Config;
pub use control::{Control, ControlChange, ControlId, ControlKind, ControlValue, Controls, ListenerId, Setter};
pub use environment::{Environment, Receiver};
pub use error::{Error, Result};
pub use message::{Message, Payload};
pub use messengers::Messenger;
pub use node::{AudioNode, NodeId, NodePath, ProcessContext};
pub use patch::{ControlPath, Patch, INLET_ID, OUTLET_ID};
pub use port::Connection;
pub use scheduler::{Scheduler, Slot};
pub use value::Generator;
