use bytes::Bytes;
use opencv::core::{self, Mat};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use std::time::SystemTime;

use crate::capture::{CaptureError, CaptureSource, VideoFrame};
use crate::config::CameraConfig;

/// Webcam capture via OpenCV videoio. Frames are flipped horizontally for
/// the mirror effect before they enter the pipeline.
pub struct OpenCvCaptureSource {
    capture: VideoCapture,
    sequence: u64,
}

impl OpenCvCaptureSource {
    pub fn new(config: CameraConfig) -> Result<Self, CaptureError> {
        let mut capture = VideoCapture::new(config.device_index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(CaptureError::DeviceUnavailable {
                index: config.device_index,
            });
        }
        capture.set(
            videoio::CAP_PROP_FRAME_WIDTH,
            f64::from(config.frame_width),
        )?;
        capture.set(
            videoio::CAP_PROP_FRAME_HEIGHT,
            f64::from(config.frame_height),
        )?;

        Ok(Self {
            capture,
            sequence: 0,
        })
    }
}

impl CaptureSource for OpenCvCaptureSource {
    fn next_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        let mut raw = Mat::default();
        if !self.capture.read(&mut raw)? || raw.empty() {
            return Err(CaptureError::FrameRead);
        }

        let mut mirrored = Mat::default();
        core::flip(&raw, &mut mirrored, 1)?;

        let frame = VideoFrame {
            sequence: self.sequence,
            captured_at: SystemTime::now(),
            width: mirrored.cols() as u32,
            height: mirrored.rows() as u32,
            data: Bytes::copy_from_slice(mirrored.data_bytes()?),
        };
        self.sequence += 1;
        Ok(frame)
    }
}
