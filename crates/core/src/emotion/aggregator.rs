use std::sync::Mutex;

use crate::config::WindowCapacity;
use crate::emotion::{Emotion, ObservationWindow};

/// Tracks recent per-face emotion observations and derives the dominant
/// emotion used to condition quote generation.
///
/// A single classification is noisy (lighting, pose, model jitter);
/// aggregating over a trailing window and deprioritizing the neutral
/// default yields a stable signal for the rate-limited generation call.
pub struct EmotionAggregator {
    window: Mutex<ObservationWindow>,
}

impl EmotionAggregator {
    pub fn new(capacity: WindowCapacity) -> Self {
        Self {
            window: Mutex::new(ObservationWindow::new(capacity.get())),
        }
    }

    /// Records one observation, evicting the oldest entry once the window
    /// is full. Safe to call concurrently with [`Self::dominant`].
    pub fn observe(&self, emotion: Emotion) {
        let mut window = self.window.lock().expect("observation window lock poisoned");
        window.push(emotion);
    }

    /// Number of observations currently held.
    pub fn len(&self) -> usize {
        self.window
            .lock()
            .expect("observation window lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most frequent non-neutral emotion in the window; `Neutral` when the
    /// window is empty or holds only neutral observations. Ties break to
    /// the earliest category in [`Emotion::ALL`].
    pub fn dominant(&self) -> Emotion {
        let window = self.window.lock().expect("observation window lock poisoned");

        let mut counts = [0usize; Emotion::ALL.len()];
        for &emotion in window.iter() {
            if emotion != Emotion::Neutral {
                counts[emotion as usize] += 1;
            }
        }

        let mut best = Emotion::Neutral;
        let mut best_count = 0usize;
        for (index, &count) in counts.iter().enumerate() {
            if count > best_count {
                best = Emotion::ALL[index];
                best_count = count;
            }
        }
        best
    }
}
