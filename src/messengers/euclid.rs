use crate::config::Config;
use crate::message::Message;
use crate::messengers::{Messenger, Pulse};

/// Euclidean rhythm: `pulses` hits spread as evenly as possible over `steps`
/// steps of `interval` samples each, repeating. Hits bang `address`.
#[derive(Clone, Debug)]
pub struct Euclid {
    address: String,
    pattern: Vec<bool>,
    pulse: Pulse,
}

impl Euclid {
    pub fn new(address: impl Into<String>, pulses: usize, steps: usize, interval: u64) -> Self {
        Self {
            address: address.into(),
            pattern: pattern(pulses, steps),
            pulse: Pulse::new(interval),
        }
    }

    /// Shift the pattern `rotation` steps earlier (negative: later).
    pub fn rotated(mut self, rotation: i64) -> Self {
        let steps = self.pattern.len();
        if steps > 0 {
            let shift = rotation.rem_euclid(steps as i64) as usize;
            self.pattern.rotate_left(shift);
        }
        self
    }

    pub fn pattern(&self) -> &[bool] {
        &self.pattern
    }
}

/// Step `i` is a hit when `(i * pulses) % steps < pulses`.
fn pattern(pulses: usize, steps: usize) -> Vec<bool> {
    let pulses = pulses.min(steps);
    (0..steps).map(|i| (i * pulses) % steps < pulses).collect()
}

impl Messenger for Euclid {
    fn messages(&mut self, timestamp: u64, _config: &Config) -> Vec<Message> {
        let pattern = &self.pattern;
        let address = &self.address;
        self.pulse
            .due(timestamp)
            .filter(|step| {
                !pattern.is_empty() && pattern[(*step % pattern.len() as u64) as usize]
            })
            .map(|_| Message::bang(address))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(pattern: &[bool]) -> String {
        pattern.iter().map(|&hit| if hit { 'x' } else { '.' }).collect()
    }

    #[test]
    fn classic_patterns() {
        assert_eq!(hits(Euclid::new("k", 3, 8, 1).pattern()), "x..x..x.");
        assert_eq!(hits(Euclid::new("k", 4, 4, 1).pattern()), "xxxx");
        assert_eq!(hits(Euclid::new("k", 0, 4, 1).pattern()), "....");
        assert_eq!(hits(Euclid::new("k", 9, 4, 1).pattern()), "xxxx");
        assert_eq!(hits(Euclid::new("k", 3, 8, 1).rotated(3).pattern()), "x..x.x..");
        assert_eq!(hits(Euclid::new("k", 3, 8, 1).rotated(-5).pattern()), "x..x.x..");
    }

    #[test]
    fn bangs_on_hits_only() {
        let config = Config::new(44_100.0, 8);
        let mut euclid = Euclid::new("kick", 3, 8, 2);
        // steps 0..=7 fall before 16; hits at 0, 3, 6
        assert_eq!(euclid.messages(16, &config).len(), 3);
        // steps 8..=11 fall before 24; the pattern wraps, hits at 8 and 11
        assert_eq!(euclid.messages(24, &config).len(), 2);
    }

    #[test]
    fn empty_pattern_is_silent() {
        let config = Config::default();
        let mut euclid = Euclid::new("kick", 3, 0, 1);
        assert!(euclid.messages(100, &config).is_empty());
    }
}
