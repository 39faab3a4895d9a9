use crate::capture::VideoFrame;
use crate::render::{RenderError, RenderEvent, RenderSink};
use crate::vision::FaceOverlay;

/// Sink that discards frames and never requests quit. Useful for headless
/// smoke runs.
#[derive(Clone, Debug, Default)]
pub struct NullRenderSink;

impl NullRenderSink {
    pub fn new() -> Self {
        Self
    }
}

impl RenderSink for NullRenderSink {
    fn present(
        &mut self,
        _frame: &VideoFrame,
        _overlays: &[FaceOverlay],
        _caption: &str,
    ) -> Result<RenderEvent, RenderError> {
        Ok(RenderEvent::Continue)
    }
}
