use crate::config::Config;
use crate::message::Message;
use crate::messengers::{seconds_to_samples, Messenger, Pulse};

/// Bangs `address` every `interval` samples, starting at sample 0.
#[derive(Clone, Debug)]
pub struct Timer {
    address: String,
    pulse: Pulse,
}

impl Timer {
    pub fn new(address: impl Into<String>, interval: u64) -> Self {
        Self {
            address: address.into(),
            pulse: Pulse::new(interval),
        }
    }

    /// Interval given in seconds under `config`.
    pub fn every_seconds(address: impl Into<String>, seconds: f64, config: &Config) -> Self {
        Self::new(address, seconds_to_samples(seconds, config))
    }

    /// Delay the first bang to sample `offset`.
    pub fn starting_at(mut self, offset: u64) -> Self {
        self.pulse = self.pulse.starting_at(offset);
        self
    }
}

impl Messenger for Timer {
    fn messages(&mut self, timestamp: u64, _config: &Config) -> Vec<Message> {
        self.pulse
            .due(timestamp)
            .map(|_| Message::bang(&self.address))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bangs_on_interval() {
        let config = Config::new(1_000.0, 8);
        let mut timer = Timer::every_seconds("tick", 0.005, &config);

        assert_eq!(timer.messages(8, &config), vec![Message::bang("tick"), Message::bang("tick")]);
        assert_eq!(timer.messages(16, &config).len(), 2);
        assert_eq!(timer.messages(16, &config).len(), 0);
    }
}
