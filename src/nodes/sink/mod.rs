//! Sinks: consumers of completed ticks.

mod buffer_sink;
mod rtrb_sink;

pub use buffer_sink::*;
pub use rtrb_sink::*;

use crate::buffer::Buffer;
use crate::config::Config;
use crate::error::Result;

/// Consumes the root patch outputs of a completed tick.
///
/// The engine hands a sink read-only buffers and knows nothing of where the
/// samples go. A sink that cannot take a tick returns an error, which ends
/// the render call that fed it without touching the graph.
pub trait Sink {
    fn write(&mut self, outputs: &[Buffer], config: &Config) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write(&mut self, outputs: &[Buffer], config: &Config) -> Result<()> {
        (**self).write(outputs, config)
    }
}
