use crate::config::Config;
use crate::message::Message;
use crate::messengers::{Messenger, Pulse};
use crate::value::Generator;

/// Every `interval` samples, sends the next value of a [`Generator`] to
/// `address`. Falls silent once the generator is exhausted.
pub struct Stepper<G> {
    address: String,
    generator: G,
    pulse: Pulse,
}

impl<G: Generator> Stepper<G> {
    pub fn new(address: impl Into<String>, generator: G, interval: u64) -> Self {
        Self {
            address: address.into(),
            generator,
            pulse: Pulse::new(interval),
        }
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }
}

impl<G: Generator> Messenger for Stepper<G> {
    fn messages(&mut self, timestamp: u64, _config: &Config) -> Vec<Message> {
        let mut out = Vec::new();
        for _ in self.pulse.due(timestamp) {
            if let Some(payload) = self.generator.next_value() {
                out.push(Message::new(&self.address, payload));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Sequence;

    #[test]
    fn steps_through_generator() {
        let config = Config::new(44_100.0, 4);
        let mut stepper = Stepper::new("pitch", Sequence::floats([1.0, 2.0, 3.0]), 2);

        assert_eq!(
            stepper.messages(4, &config),
            vec![Message::float("pitch", 1.0), Message::float("pitch", 2.0)]
        );
        assert_eq!(stepper.messages(8, &config), vec![Message::float("pitch", 3.0)]);
        assert!(stepper.messages(12, &config).is_empty());

        stepper.generator_mut().reset();
        assert_eq!(stepper.messages(14, &config), vec![Message::float("pitch", 1.0)]);
    }
}
