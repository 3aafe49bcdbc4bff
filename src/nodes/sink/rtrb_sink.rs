//! Ring buffer sink for handing audio to another thread

use rtrb::Producer;

use crate::buffer::Buffer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::nodes::sink::Sink;

/// A sink that pushes interleaved audio into an rtrb ring buffer
///
/// This is the handoff between the thread running ticks and whoever plays
/// or records them (an audio callback, a file writer). The consumer only
/// ever sees completed ticks.
pub struct RtrbSink {
    producer: Producer<f32>,
    channels: usize,
}

impl RtrbSink {
    /// Create a sink that writes interleaved samples to the given producer
    pub fn new(producer: Producer<f32>, channels: usize) -> Self {
        Self {
            producer,
            channels: channels.max(1),
        }
    }

    /// Create a sink for mono audio
    pub fn mono(producer: Producer<f32>) -> Self {
        Self::new(producer, 1)
    }

    /// Create a sink for stereo audio
    pub fn stereo(producer: Producer<f32>) -> Self {
        Self::new(producer, 2)
    }

    /// Returns how many sample slots are available
    #[inline]
    pub fn available(&self) -> usize {
        self.producer.slots()
    }
}

impl Sink for RtrbSink {
    fn write(&mut self, outputs: &[Buffer], config: &Config) -> Result<()> {
        let buffer_len = outputs.first().map_or(config.buffer_size, |b| b.len());
        let needed = buffer_len * self.channels;

        // All or nothing, never a partial tick
        let available = self.producer.slots();
        if available < needed {
            return Err(Error::SinkOverflow { needed, available });
        }

        // Interleave channels; missing channels repeat the last one, no
        // outputs at all is silence
        for i in 0..buffer_len {
            for ch in 0..self.channels {
                let sample = match outputs.len() {
                    0 => 0.0,
                    n => outputs[ch.min(n - 1)][i],
                };
                let _ = self.producer.push(sample);
            }
        }
        Ok(())
    }
}
