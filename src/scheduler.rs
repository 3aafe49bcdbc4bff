//! Sorted time-slot queue.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A value due at `timestamp` (in samples).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Slot<T> {
    pub timestamp: u64,
    pub value: T,
}

/// Values ordered by timestamp, released as time passes.
///
/// [`schedule`](Self::schedule) moves a cursor forward and hands out every
/// value whose timestamp lies before the given time. The cursor never moves
/// back on its own, so no value is released twice until
/// [`reset`](Self::reset) rewinds it (to loop a pattern, say).
///
/// ```
/// use schall::Scheduler;
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add(5, "a");
/// scheduler.add(1, "b");
/// scheduler.add(9, "c");
/// scheduler.sort();
///
/// assert_eq!(scheduler.schedule(6).collect::<Vec<_>>(), [&"b", &"a"]);
/// assert_eq!(scheduler.schedule(10).collect::<Vec<_>>(), [&"c"]);
/// assert_eq!(scheduler.schedule(6).count(), 0);
///
/// scheduler.reset();
/// assert_eq!(scheduler.schedule(10).collect::<Vec<_>>(), [&"b", &"a", &"c"]);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Scheduler<T> {
    slots: Vec<Slot<T>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    cursor: usize,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(timestamp, value)` pairs in any order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, T)>) -> Self {
        let mut scheduler = Self {
            slots: pairs
                .into_iter()
                .map(|(timestamp, value)| Slot { timestamp, value })
                .collect(),
            cursor: 0,
        };
        scheduler.sort();
        scheduler
    }

    /// Append a slot. Call [`sort`](Self::sort) before the next
    /// [`schedule`](Self::schedule) unless slots are added in order.
    pub fn add(&mut self, timestamp: u64, value: T) {
        self.slots.push(Slot { timestamp, value });
    }

    /// Order slots by timestamp. Slots sharing a timestamp keep the order
    /// they were added in.
    pub fn sort(&mut self) {
        self.slots.sort_by_key(|slot| slot.timestamp);
    }

    /// Release, in order, every value with a timestamp before `time` that has
    /// not been released yet.
    pub fn schedule(&mut self, time: u64) -> impl Iterator<Item = &T> + '_ {
        let start = self.cursor;
        let due = self.slots[start..].partition_point(|slot| slot.timestamp < time);
        self.cursor = start + due;
        self.slots[start..self.cursor].iter().map(|slot| &slot.value)
    }

    /// Rewind the cursor to the first slot.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Whether every slot has been released.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Timestamp of the next slot to be released.
    pub fn next_timestamp(&self) -> Option<u64> {
        self.slots.get(self.cursor).map(|slot| slot.timestamp)
    }

    pub fn slots(&self) -> &[Slot<T>] {
        &self.slots
    }
}

impl<T> FromIterator<(u64, T)> for Scheduler<T> {
    fn from_iter<I: IntoIterator<Item = (u64, T)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_is_monotonic() {
        let mut scheduler = Scheduler::new();
        scheduler.add(5, "a");
        scheduler.add(1, "b");
        scheduler.add(9, "c");
        scheduler.sort();

        assert_eq!(scheduler.schedule(6).copied().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(scheduler.schedule(10).copied().collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(scheduler.schedule(6).count(), 0);
        assert!(scheduler.is_done());

        scheduler.reset();
        assert_eq!(
            scheduler.schedule(10).copied().collect::<Vec<_>>(),
            vec!["b", "a", "c"]
        );
    }

    #[test]
    fn boundary_is_exclusive() {
        let mut scheduler = Scheduler::from_pairs([(4, 'x'), (8, 'y')]);
        assert_eq!(scheduler.schedule(4).count(), 0);
        assert_eq!(scheduler.next_timestamp(), Some(4));
        assert_eq!(scheduler.schedule(5).copied().collect::<Vec<_>>(), vec!['x']);
        assert_eq!(scheduler.next_timestamp(), Some(8));
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let scheduler: Scheduler<u8> = [(3, 1), (0, 0), (3, 2), (3, 3)].into_iter().collect();
        let values: Vec<u8> = scheduler.slots().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_scheduler() {
        let mut scheduler: Scheduler<()> = Scheduler::new();
        assert!(scheduler.is_done());
        assert_eq!(scheduler.schedule(u64::MAX).count(), 0);
    }
}
