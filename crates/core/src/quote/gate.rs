use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::{GenerationTimeout, RefreshCooldown};
use crate::emotion::Emotion;
use crate::quote::{QuoteGenerator, QuoteRequest};

const LOG_TARGET: &str = "quote::gate";

/// Rate-limits quote generation and holds the last produced caption for
/// continuous display.
///
/// The first refresh attempt always runs; afterwards a new attempt is
/// admitted only once the cooldown has elapsed since the previous one,
/// successful or not. An in-flight flag keeps concurrent callers from
/// stacking requests, and every request runs under an explicit timeout so
/// a hung backend cannot freeze caption updates.
pub struct GenerationGate {
    cooldown: Duration,
    request_timeout: Duration,
    state: Mutex<GateState>,
}

#[derive(Debug)]
struct GateState {
    last_refresh: Option<Instant>,
    caption: String,
    in_flight: bool,
}

impl GenerationGate {
    pub fn new(cooldown: RefreshCooldown, request_timeout: GenerationTimeout) -> Self {
        Self {
            cooldown: cooldown.duration(),
            request_timeout: request_timeout.duration(),
            state: Mutex::new(GateState {
                last_refresh: None,
                caption: String::new(),
                in_flight: false,
            }),
        }
    }

    /// Current caption snapshot for rendering.
    pub fn caption(&self) -> String {
        self.state
            .lock()
            .expect("gate state lock poisoned")
            .caption
            .clone()
    }

    /// Whether a refresh attempt would run right now. Lets the capture
    /// loop decide to spawn a refresh without awaiting it.
    pub fn due(&self, now: Instant) -> bool {
        let state = self.state.lock().expect("gate state lock poisoned");
        !state.in_flight
            && state
                .last_refresh
                .is_none_or(|last| now.duration_since(last) >= self.cooldown)
    }

    /// Invokes the generator if the cooldown has elapsed and no request is
    /// in flight, storing the new caption on success. On failure or
    /// timeout the previous caption is kept and the cooldown is still
    /// stamped, so the next attempt happens at the next natural expiry.
    /// Returns the caption to display either way.
    pub async fn maybe_refresh(
        &self,
        now: Instant,
        emotion: Emotion,
        age: u32,
        generator: &dyn QuoteGenerator,
    ) -> String {
        {
            let mut state = self.state.lock().expect("gate state lock poisoned");
            let cooling = state
                .last_refresh
                .is_some_and(|last| now.duration_since(last) < self.cooldown);
            if state.in_flight || cooling {
                return state.caption.clone();
            }
            state.in_flight = true;
        }

        let request = QuoteRequest { emotion, age };
        let outcome = tokio::time::timeout(self.request_timeout, generator.generate(request)).await;

        let mut state = self.state.lock().expect("gate state lock poisoned");
        state.in_flight = false;
        state.last_refresh = Some(now);
        match outcome {
            Ok(Ok(quote)) => {
                tracing::info!(target: LOG_TARGET, emotion = %emotion, age, "caption refreshed");
                state.caption = quote.text;
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    error = %e,
                    "quote generation failed, keeping previous caption"
                );
            }
            Err(_) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "quote generation timed out, keeping previous caption"
                );
            }
        }
        state.caption.clone()
    }
}
