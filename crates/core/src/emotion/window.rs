use std::collections::VecDeque;

use crate::emotion::Emotion;

/// Bounded, insertion-ordered window of recent emotion observations.
///
/// Strict FIFO: once `capacity` entries are held, every push evicts the
/// oldest entry first.
#[derive(Clone, Debug)]
pub struct ObservationWindow {
    entries: VecDeque<Emotion>,
    capacity: usize,
}

impl ObservationWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an observation, returning the evicted entry if the window
    /// was at capacity.
    pub fn push(&mut self, emotion: Emotion) -> Option<Emotion> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(emotion);
        evicted
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Emotion> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_evicts_oldest_at_capacity() {
        let mut w = ObservationWindow::new(3);
        assert!(w.is_empty());

        assert_eq!(w.push(Emotion::Happy), None);
        assert_eq!(w.push(Emotion::Sad), None);
        assert_eq!(w.push(Emotion::Angry), None);
        assert_eq!(w.len(), 3);

        let evicted = w.push(Emotion::Surprised);
        assert_eq!(evicted, Some(Emotion::Happy));
        assert_eq!(w.len(), 3);
        assert_eq!(
            w.iter().copied().collect::<Vec<_>>(),
            vec![Emotion::Sad, Emotion::Angry, Emotion::Surprised]
        );
    }

    #[test]
    fn window_retains_most_recent_entries_in_arrival_order() {
        let mut w = ObservationWindow::new(150);
        for _ in 0..200 {
            w.push(Emotion::Happy);
        }
        for _ in 0..10 {
            w.push(Emotion::Neutral);
        }
        assert_eq!(w.len(), 150);
        assert_eq!(w.iter().filter(|&&e| e == Emotion::Happy).count(), 140);
        assert_eq!(
            w.iter().skip(140).copied().collect::<Vec<_>>(),
            vec![Emotion::Neutral; 10]
        );
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = ObservationWindow::new(0);
    }
}
