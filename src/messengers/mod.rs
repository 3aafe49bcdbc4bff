//! Messengers: timestamp-driven producers of addressed messages.
//!
//! The [`Environment`](crate::Environment) asks every registered messenger
//! for its messages once per tick, before the tick's pull, and routes them by
//! address.

mod euclid;
mod lfo;
mod sequencer;
mod stepper;
mod timer;

pub use euclid::*;
pub use lfo::*;
pub use sequencer::*;
pub use stepper::*;
pub use timer::*;

use crate::config::Config;
use crate::message::Message;

/// Produces the messages due at a point in time.
pub trait Messenger: Send {
    /// Messages due before `timestamp` (in samples) that have not been
    /// produced yet, in emission order.
    fn messages(&mut self, timestamp: u64, config: &Config) -> Vec<Message>;
}

impl<M: Messenger + ?Sized> Messenger for Box<M> {
    fn messages(&mut self, timestamp: u64, config: &Config) -> Vec<Message> {
        (**self).messages(timestamp, config)
    }
}

/// Fixed-interval step counter driving the rhythmic messengers.
#[derive(Clone, Debug)]
pub(crate) struct Pulse {
    interval: u64,
    next: u64,
    step: u64,
}

impl Pulse {
    pub(crate) fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            next: 0,
            step: 0,
        }
    }

    pub(crate) fn starting_at(mut self, offset: u64) -> Self {
        self.next = offset;
        self
    }

    /// Indices of the steps that fall before `timestamp`.
    pub(crate) fn due(&mut self, timestamp: u64) -> impl Iterator<Item = u64> + '_ {
        core::iter::from_fn(move || {
            if self.next >= timestamp {
                return None;
            }
            let step = self.step;
            self.next += self.interval;
            self.step += 1;
            Some(step)
        })
    }
}

/// Samples in `seconds`, rounded to the nearest sample.
pub(crate) fn seconds_to_samples(seconds: f64, config: &Config) -> u64 {
    (seconds * config.sample_rate).round().max(0.0) as u64
}
