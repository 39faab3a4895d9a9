use bytes::Bytes;
use std::time::SystemTime;

#[cfg(feature = "opencv")]
mod camera;
mod synthetic;

#[cfg(feature = "opencv")]
pub use camera::OpenCvCaptureSource;
pub use synthetic::{uniform_frame, SyntheticCaptureSource};

/// One captured video frame.
///
/// `data` is packed BGR24, row-major; `data.len() == width * height * 3`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    pub sequence: u64,
    pub captured_at: SystemTime,
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("failed to open capture device {index}")]
    DeviceUnavailable { index: i32 },

    #[error("failed to read frame from capture device")]
    FrameRead,

    #[error("capture source exhausted")]
    EndOfStream,

    #[cfg(feature = "opencv")]
    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),
}

/// Supplies frames to the capture loop. A returned error is fatal to the
/// loop; the source is released on drop.
pub trait CaptureSource {
    fn next_frame(&mut self) -> Result<VideoFrame, CaptureError>;
}
