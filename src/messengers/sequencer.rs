use crate::config::Config;
use crate::message::Message;
use crate::messengers::Messenger;
use crate::scheduler::Scheduler;

/// Plays a [`Scheduler`] of messages, optionally looping every `length`
/// samples.
///
/// Slot timestamps are relative to the start of the sequence (or of the
/// current loop pass). In a loop, slots at or past `length` never play.
///
/// ```
/// use schall::{Config, Message, Scheduler};
/// use schall::messengers::{Messenger, Sequencer};
///
/// let config = Config::new(44_100.0, 4);
/// let mut sequencer = Sequencer::new(Scheduler::from_pairs([
///     (0, Message::float("freq", 220.0)),
///     (5, Message::float("freq", 330.0)),
/// ]))
/// .looping(8);
///
/// assert_eq!(sequencer.messages(4, &config).len(), 1);
/// assert_eq!(sequencer.messages(8, &config).len(), 1);
/// // the second pass starts at sample 8
/// assert_eq!(sequencer.messages(12, &config), vec![Message::float("freq", 220.0)]);
/// ```
#[derive(Clone, Debug)]
pub struct Sequencer {
    scheduler: Scheduler<Message>,
    length: Option<u64>,
    /// Start of the current pass
    origin: u64,
}

impl Sequencer {
    pub fn new(mut scheduler: Scheduler<Message>) -> Self {
        scheduler.sort();
        scheduler.reset();
        Self {
            scheduler,
            length: None,
            origin: 0,
        }
    }

    pub fn looping(mut self, length: u64) -> Self {
        self.length = Some(length.max(1));
        self
    }

    /// Begin the sequence at sample `origin` instead of 0.
    pub fn starting_at(mut self, origin: u64) -> Self {
        self.origin = origin;
        self
    }

    pub fn scheduler(&self) -> &Scheduler<Message> {
        &self.scheduler
    }
}

impl Messenger for Sequencer {
    fn messages(&mut self, timestamp: u64, _config: &Config) -> Vec<Message> {
        let mut out = Vec::new();
        if timestamp <= self.origin {
            return out;
        }
        loop {
            let local = timestamp - self.origin;
            match self.length {
                Some(length) if local >= length => {
                    out.extend(self.scheduler.schedule(length).cloned());
                    self.scheduler.reset();
                    self.origin += length;
                }
                _ => {
                    out.extend(self.scheduler.schedule(local).cloned());
                    return out;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> Scheduler<Message> {
        Scheduler::from_pairs([
            (6, Message::bang("c")),
            (0, Message::bang("a")),
            (3, Message::bang("b")),
        ])
    }

    fn addresses(messages: Vec<Message>) -> Vec<String> {
        messages.into_iter().map(|m| m.address).collect()
    }

    #[test]
    fn plays_once() {
        let config = Config::new(44_100.0, 4);
        let mut sequencer = Sequencer::new(scheduler());
        assert_eq!(addresses(sequencer.messages(4, &config)), vec!["a", "b"]);
        assert_eq!(addresses(sequencer.messages(8, &config)), vec!["c"]);
        assert!(sequencer.messages(100, &config).is_empty());
    }

    #[test]
    fn loops_across_several_passes_in_one_call() {
        let config = Config::new(44_100.0, 4);
        let mut sequencer = Sequencer::new(scheduler()).looping(4);
        // passes at 0, 4 and 8, then 12..14: "c" at 6 is past the loop
        assert_eq!(
            addresses(sequencer.messages(14, &config)),
            vec!["a", "b", "a", "b", "a", "b", "a"]
        );
    }

    #[test]
    fn delayed_start() {
        let config = Config::new(44_100.0, 4);
        let mut sequencer = Sequencer::new(scheduler()).starting_at(8);
        assert!(sequencer.messages(8, &config).is_empty());
        assert_eq!(addresses(sequencer.messages(12, &config)), vec!["a", "b"]);
    }
}
