#[cfg(feature = "opencv")]
mod highgui;
mod null;

use crate::capture::VideoFrame;
use crate::vision::FaceOverlay;

#[cfg(feature = "opencv")]
pub use highgui::HighguiRenderSink;
pub use null::NullRenderSink;

/// Column count captions are wrapped to before display.
pub const CAPTION_WRAP_COLUMNS: usize = 55;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("display unavailable: {details}")]
    DisplayUnavailable { details: String },

    #[cfg(feature = "opencv")]
    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderEvent {
    Continue,
    QuitRequested,
}

/// Output sink for annotated frames. Also surfaces the user's quit
/// request, polled once per presented frame.
pub trait RenderSink {
    fn present(
        &mut self,
        frame: &VideoFrame,
        overlays: &[FaceOverlay],
        caption: &str,
    ) -> Result<RenderEvent, RenderError>;
}

/// Greedy word wrap; words longer than `columns` get their own line.
pub fn wrap_caption(caption: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in caption.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= columns {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
