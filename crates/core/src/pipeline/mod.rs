use std::sync::Arc;
use std::time::Instant;

use crate::capture::{CaptureError, CaptureSource};
use crate::emotion::EmotionAggregator;
use crate::quote::{GenerationGate, QuoteGenerator};
use crate::render::{RenderError, RenderEvent, RenderSink};
use crate::vision::{crop_face, FaceAnalysis, FaceClassifier, FaceLocator, FaceOverlay};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("frame capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

/// The per-frame driver wiring capture, detection, classification,
/// aggregation, gated generation and rendering together.
///
/// Collaborator failures are contained per the recovery taxonomy: a
/// capture failure ends the loop, everything else degrades within the
/// iteration so every frame renders something.
pub struct MirrorPipeline<C, L, F, R> {
    pub capture: C,
    pub locator: L,
    pub classifier: F,
    pub generator: Arc<dyn QuoteGenerator>,
    pub render: R,
    pub aggregator: Arc<EmotionAggregator>,
    pub gate: Arc<GenerationGate>,
}

impl<C, L, F, R> MirrorPipeline<C, L, F, R>
where
    C: CaptureSource,
    L: FaceLocator,
    F: FaceClassifier,
    R: RenderSink,
{
    /// Runs until the sink requests quit or the capture source fails.
    pub async fn run(&mut self) -> Result<(), PipelineError> {
        // Age from the most recently classified face, carried across
        // frames with no face. Generation context only; not aggregated.
        let mut last_age: u32 = 0;

        loop {
            let frame = match self.capture.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "frame capture failed, stopping");
                    return Err(PipelineError::Capture(e));
                }
            };

            let boxes = match self.locator.locate(&frame) {
                Ok(boxes) => boxes,
                Err(e) => {
                    tracing::warn!(error = %e, "face detection failed");
                    Vec::new()
                }
            };

            let mut overlays = Vec::with_capacity(boxes.len());
            for bounding_box in boxes {
                let Some(face) = crop_face(&frame, bounding_box) else {
                    tracing::debug!(?bounding_box, "skipping degenerate face region");
                    continue;
                };
                let analysis = match self.classifier.classify(face).await {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        tracing::warn!(error = %e, "face classification failed");
                        FaceAnalysis::fallback()
                    }
                };
                self.aggregator.observe(analysis.emotion);
                last_age = analysis.age;
                overlays.push(FaceOverlay {
                    bounding_box,
                    emotion: analysis.emotion,
                    age: analysis.age,
                });
            }

            let now = Instant::now();
            if self.gate.due(now) {
                let gate = self.gate.clone();
                let generator = self.generator.clone();
                let emotion = self.aggregator.dominant();
                let age = last_age;
                tokio::spawn(async move {
                    gate.maybe_refresh(now, emotion, age, generator.as_ref())
                        .await;
                });
            }

            let caption = self.gate.caption();
            tracing::trace!(
                sequence = frame.sequence,
                faces = overlays.len(),
                "frame processed"
            );
            match self.render.present(&frame, &overlays, &caption)? {
                RenderEvent::Continue => {}
                RenderEvent::QuitRequested => {
                    tracing::info!("quit requested, stopping");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{SyntheticCaptureSource, VideoFrame};
    use crate::config::{GenerationTimeout, RefreshCooldown, WindowCapacity};
    use crate::emotion::Emotion;
    use crate::quote::{GenerateError, Quote, QuoteRequest};
    use crate::vision::{BoundingBox, ClassifyError, DetectError, FaceCrop};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedLocator {
        boxes: Vec<BoundingBox>,
    }

    impl FaceLocator for FixedLocator {
        fn locate(&self, _frame: &VideoFrame) -> Result<Vec<BoundingBox>, DetectError> {
            Ok(self.boxes.clone())
        }
    }

    /// Classifies every face as happy except one failing call.
    struct FlakyClassifier {
        calls: AtomicUsize,
        fail_on_call: usize,
    }

    impl FaceClassifier for FlakyClassifier {
        fn classify(
            &self,
            _face: FaceCrop,
        ) -> BoxFuture<'_, Result<FaceAnalysis, ClassifyError>> {
            async {
                let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call == self.fail_on_call {
                    Err(ClassifyError::Analysis("model rejected input".to_owned()))
                } else {
                    Ok(FaceAnalysis {
                        emotion: Emotion::Happy,
                        age: 30,
                    })
                }
            }
            .boxed()
        }
    }

    struct RecordingGenerator {
        calls: AtomicUsize,
        last_request: Mutex<Option<QuoteRequest>>,
        fail: bool,
    }

    impl RecordingGenerator {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                fail,
            }
        }
    }

    impl QuoteGenerator for RecordingGenerator {
        fn generate(
            &self,
            request: QuoteRequest,
        ) -> BoxFuture<'_, Result<Quote, GenerateError>> {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                *self.last_request.lock().expect("request lock") = Some(request);
                if self.fail {
                    Err(GenerateError::Api(500, "backend down".to_owned()))
                } else {
                    Ok(Quote {
                        text: "generated line".to_owned(),
                    })
                }
            }
            .boxed()
        }
    }

    /// Requests quit once `quit_after` frames have been presented.
    struct ScriptedSink {
        presented: usize,
        quit_after: usize,
    }

    impl RenderSink for ScriptedSink {
        fn present(
            &mut self,
            _frame: &VideoFrame,
            _overlays: &[FaceOverlay],
            _caption: &str,
        ) -> Result<RenderEvent, RenderError> {
            self.presented += 1;
            if self.presented >= self.quit_after {
                Ok(RenderEvent::QuitRequested)
            } else {
                Ok(RenderEvent::Continue)
            }
        }
    }

    fn face_box(x: i32) -> BoundingBox {
        BoundingBox {
            x,
            y: 8,
            width: 16,
            height: 16,
        }
    }

    fn pipeline_parts() -> (Arc<EmotionAggregator>, Arc<GenerationGate>) {
        let aggregator = Arc::new(EmotionAggregator::new(
            WindowCapacity::new(150).expect("nonzero"),
        ));
        let gate = Arc::new(GenerationGate::new(
            RefreshCooldown::new(5_000).expect("nonzero"),
            GenerationTimeout::new(10_000).expect("nonzero"),
        ));
        (aggregator, gate)
    }

    #[tokio::test]
    async fn one_failed_classification_does_not_drop_other_faces() {
        let (aggregator, gate) = pipeline_parts();
        let generator = Arc::new(RecordingGenerator::new(false));
        let mut pipeline = MirrorPipeline {
            capture: SyntheticCaptureSource::uniform(1, 64, 48, [0, 0, 0]),
            locator: FixedLocator {
                boxes: vec![face_box(0), face_box(20), face_box(40)],
            },
            classifier: FlakyClassifier {
                calls: AtomicUsize::new(0),
                fail_on_call: 2,
            },
            generator: generator.clone(),
            render: ScriptedSink {
                presented: 0,
                quit_after: 1,
            },
            aggregator: aggregator.clone(),
            gate: gate.clone(),
        };

        pipeline.run().await.expect("loop exits via quit");

        // Two happy observations plus the neutral default for the failed face.
        assert_eq!(aggregator.len(), 3);
        assert_eq!(aggregator.dominant(), Emotion::Happy);

        // The spawned refresh saw the dominant emotion and the last face's age.
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        let request = generator
            .last_request
            .lock()
            .expect("request lock")
            .expect("refresh ran");
        assert_eq!(request.emotion, Emotion::Happy);
        assert_eq!(request.age, 30);
        assert_eq!(gate.caption(), "generated line");
    }

    #[tokio::test]
    async fn capture_failure_terminates_loop() {
        let (aggregator, gate) = pipeline_parts();
        let mut pipeline = MirrorPipeline {
            capture: SyntheticCaptureSource::new(Vec::new()),
            locator: FixedLocator { boxes: Vec::new() },
            classifier: FlakyClassifier {
                calls: AtomicUsize::new(0),
                fail_on_call: 0,
            },
            generator: Arc::new(RecordingGenerator::new(false)),
            render: ScriptedSink {
                presented: 0,
                quit_after: usize::MAX,
            },
            aggregator,
            gate,
        };

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Capture(_)));
    }

    #[tokio::test]
    async fn quit_signal_stops_loop_with_frames_remaining() {
        let (aggregator, gate) = pipeline_parts();
        let mut pipeline = MirrorPipeline {
            capture: SyntheticCaptureSource::uniform(5, 64, 48, [0, 0, 0]),
            locator: FixedLocator { boxes: Vec::new() },
            classifier: FlakyClassifier {
                calls: AtomicUsize::new(0),
                fail_on_call: 0,
            },
            generator: Arc::new(RecordingGenerator::new(false)),
            render: ScriptedSink {
                presented: 0,
                quit_after: 2,
            },
            aggregator,
            gate,
        };

        pipeline.run().await.expect("loop exits via quit");
        assert_eq!(pipeline.capture.remaining(), 3);
    }

    #[tokio::test]
    async fn generation_failure_keeps_loop_running_with_empty_caption() {
        let (aggregator, gate) = pipeline_parts();
        let generator = Arc::new(RecordingGenerator::new(true));
        let mut pipeline = MirrorPipeline {
            capture: SyntheticCaptureSource::uniform(3, 64, 48, [0, 0, 0]),
            locator: FixedLocator {
                boxes: vec![face_box(0)],
            },
            classifier: FlakyClassifier {
                calls: AtomicUsize::new(0),
                fail_on_call: 0,
            },
            generator: generator.clone(),
            render: ScriptedSink {
                presented: 0,
                quit_after: 3,
            },
            aggregator,
            gate: gate.clone(),
        };

        pipeline.run().await.expect("loop exits via quit");

        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(generator.calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(gate.caption(), "");
    }
}
