use bytes::Bytes;
use std::collections::VecDeque;
use std::time::SystemTime;

use crate::capture::{CaptureError, CaptureSource, VideoFrame};

/// Scripted capture source for tests and headless smoke runs. Yields its
/// frames in order, then fails with [`CaptureError::EndOfStream`].
#[derive(Clone, Debug, Default)]
pub struct SyntheticCaptureSource {
    frames: VecDeque<VideoFrame>,
}

impl SyntheticCaptureSource {
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// A source of `count` single-color frames.
    pub fn uniform(count: usize, width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let frames = (0..count)
            .map(|sequence| uniform_frame(sequence as u64, width, height, bgr))
            .collect();
        Self::new(frames)
    }

    /// Frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl CaptureSource for SyntheticCaptureSource {
    fn next_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        self.frames.pop_front().ok_or(CaptureError::EndOfStream)
    }
}

/// Builds a single-color BGR frame.
pub fn uniform_frame(sequence: u64, width: u32, height: u32, bgr: [u8; 3]) -> VideoFrame {
    let pixels = (width as usize) * (height as usize);
    let mut data = Vec::with_capacity(pixels * 3);
    for _ in 0..pixels {
        data.extend_from_slice(&bgr);
    }
    VideoFrame {
        sequence,
        captured_at: SystemTime::now(),
        width,
        height,
        data: Bytes::from(data),
    }
}
