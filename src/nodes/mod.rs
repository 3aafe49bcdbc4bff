//! Built-in nodes and sinks.
//!
//! These are graph plumbing, not instruments:
//!
//! ## Sources ([`source`])
//! - [`Constant`] - A settable DC value on every output
//!
//! ## Effects ([`effect`])
//! - [`Thru`] - Copy n inputs to n outputs (also the patch pass-throughs)
//! - [`Mixer`] - Sum n inputs into one output
//! - [`Gain`] - Scale one input
//!
//! ## Sinks ([`sink`])
//!
//! Sinks are not nodes: they consume the root patch outputs once a tick has
//! completed.
//! - [`Sink`] - The capability
//! - [`RtrbSink`] - Interleave into an `rtrb` ring buffer for another thread
//! - [`BufferSink`] - Collect every channel in memory
//!
//! # Parameters
//!
//! [`Constant`] and [`Gain`] take their value on control index 0 and accept
//! a numeric message payload for the same purpose.

pub mod source;
pub mod effect;
pub mod sink;

// Re-export common types at the top level for convenience
pub use source::Constant;
pub use effect::{Gain, Mixer, Thru};
pub use sink::{BufferSink, RtrbSink, Sink};
