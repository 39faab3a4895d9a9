use futures::future::BoxFuture;
use futures::FutureExt;
use rand::seq::IndexedRandom;

use crate::emotion::Emotion;
use crate::quote::{GenerateError, Quote, QuoteGenerator, QuoteRequest};

/// Offline generator used when no API key is configured: picks a canned
/// line matching the dominant emotion.
#[derive(Clone)]
pub struct CannedQuoteGenerator;

impl CannedQuoteGenerator {
    pub fn new() -> Self {
        Self
    }

    fn lines_for(emotion: Emotion) -> &'static [&'static str] {
        match emotion {
            Emotion::Neutral => &[
                "Every ordinary moment is a fresh start.",
                "Stillness is its own kind of progress.",
            ],
            Emotion::Happy => &[
                "Keep that light, the room is brighter for it.",
                "Joy shared in a mirror comes back doubled.",
            ],
            Emotion::Sad => &[
                "Even the longest rain ends in clear sky.",
                "Heavy days teach what light ones cannot.",
            ],
            Emotion::Angry => &[
                "A storm passes faster when you stop feeding it.",
                "Strength is choosing which battles deserve you.",
            ],
            Emotion::Fearful => &[
                "Courage is fear that decided to stay anyway.",
                "The step you dread is smaller than it looks.",
            ],
            Emotion::Disgusted => &[
                "Not everything deserves a second glance, move on.",
                "Taste is knowing what to walk away from.",
            ],
            Emotion::Surprised => &[
                "The best chapters start unannounced.",
                "Wonder is the mind making room for something new.",
            ],
        }
    }
}

impl Default for CannedQuoteGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteGenerator for CannedQuoteGenerator {
    fn generate(&self, request: QuoteRequest) -> BoxFuture<'_, Result<Quote, GenerateError>> {
        async move {
            let lines = Self::lines_for(request.emotion);
            let line = lines
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or("The mirror sees you just fine.");
            Ok(Quote {
                text: line.to_owned(),
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_a_line_matching_the_emotion() {
        let generator = CannedQuoteGenerator::new();
        let quote = futures::executor::block_on(generator.generate(QuoteRequest {
            emotion: Emotion::Sad,
            age: 30,
        }))
        .unwrap();
        assert!(CannedQuoteGenerator::lines_for(Emotion::Sad).contains(&quote.text.as_str()));
    }

    #[test]
    fn every_emotion_has_lines() {
        for emotion in Emotion::ALL {
            assert!(!CannedQuoteGenerator::lines_for(emotion).is_empty());
        }
    }
}
