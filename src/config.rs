//! Sample rate and buffer size, threaded explicitly through graph construction.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sample rate and buffer size shared by a patch and every node inside it.
///
/// There is no ambient global: each [`Patch`](crate::Patch) is built with a
/// `Config`, and a sub-patch that should run under a different configuration
/// (e.g. oversampled) is simply built with a different value.
///
/// ```
/// use schall::Config;
///
/// let config = Config::new(48_000.0, 128);
/// let oversampled = config.oversampled(4);
/// assert_eq!(oversampled.sample_rate, 192_000.0);
/// assert_eq!(oversampled.buffer_size, 128);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Sample rate in Hz (e.g. 44100, 48000)
    pub sample_rate: f64,
    /// Number of samples rendered per tick
    pub buffer_size: usize,
}

impl Config {
    /// # Panics
    ///
    /// Panics if `buffer_size` is zero.
    pub fn new(sample_rate: f64, buffer_size: usize) -> Self {
        Self {
            sample_rate,
            buffer_size: non_zero(buffer_size),
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Panics if `buffer_size` is zero.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = non_zero(buffer_size);
        self
    }

    /// Same buffer size, sample rate multiplied by `factor`.
    pub fn oversampled(self, factor: u32) -> Self {
        self.with_sample_rate(self.sample_rate * factor.max(1) as f64)
    }

    /// Duration of one tick in seconds.
    #[inline]
    pub fn tick_duration(&self) -> f64 {
        self.buffer_size as f64 / self.sample_rate
    }
}

fn non_zero(buffer_size: usize) -> usize {
    assert!(buffer_size > 0, "buffer size must be at least one sample");
    buffer_size
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            buffer_size: 64,
        }
    }
}
