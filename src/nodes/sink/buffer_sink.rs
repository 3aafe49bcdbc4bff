//! In-memory sink for offline rendering

use crate::buffer::Buffer;
use crate::config::Config;
use crate::error::Result;
use crate::nodes::sink::Sink;

/// Appends every tick to one growing `Vec<f32>` per channel.
#[derive(Clone, Debug, Default)]
pub struct BufferSink {
    channels: Vec<Vec<f32>>,
    ticks: usize,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples collected for `channel`.
    pub fn channel(&self, channel: usize) -> &[f32] {
        self.channels.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of ticks written so far.
    #[inline]
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Take the collected channels, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Vec<f32>> {
        self.ticks = 0;
        core::mem::take(&mut self.channels)
    }
}

impl Sink for BufferSink {
    fn write(&mut self, outputs: &[Buffer], _config: &Config) -> Result<()> {
        if self.channels.len() < outputs.len() {
            self.channels.resize_with(outputs.len(), Vec::new);
        }
        for (collected, buffer) in self.channels.iter_mut().zip(outputs) {
            collected.extend_from_slice(buffer);
        }
        self.ticks += 1;
        Ok(())
    }
}
