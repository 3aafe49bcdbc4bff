use core::f64::consts::TAU;

use crate::config::Config;
use crate::message::Message;
use crate::messengers::Messenger;

/// Control-rate sine: once per tick, sends
/// `center + depth * sin(2π · frequency · t)` to `address`, where `t` is the
/// tick's timestamp in seconds.
#[derive(Clone, Debug)]
pub struct Lfo {
    address: String,
    frequency: f64,
    center: f64,
    depth: f64,
}

impl Lfo {
    pub fn new(address: impl Into<String>, frequency: f64) -> Self {
        Self {
            address: address.into(),
            frequency,
            center: 0.0,
            depth: 1.0,
        }
    }

    /// Oscillate around `center`, `depth` either way.
    pub fn with_range(mut self, center: f64, depth: f64) -> Self {
        self.center = center;
        self.depth = depth;
        self
    }

    pub fn value_at(&self, timestamp: u64, config: &Config) -> f64 {
        let t = timestamp as f64 / config.sample_rate;
        self.center + self.depth * (TAU * self.frequency * t).sin()
    }
}

impl Messenger for Lfo {
    fn messages(&mut self, timestamp: u64, config: &Config) -> Vec<Message> {
        vec![Message::float(&self.address, self.value_at(timestamp, config))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_value_per_tick() {
        let config = Config::new(100.0, 25);
        let mut lfo = Lfo::new("cutoff", 1.0).with_range(1_000.0, 500.0);

        let values: Vec<f64> = [25, 50, 75, 100]
            .into_iter()
            .map(|t| {
                let messages = lfo.messages(t, &config);
                assert_eq!(messages.len(), 1);
                messages[0].payload.as_f64().unwrap()
            })
            .collect();

        let expected = [1_500.0, 1_000.0, 500.0, 1_000.0];
        for (value, expected) in values.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-6, "{value} != {expected}");
        }
    }
}
