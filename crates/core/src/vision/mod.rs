mod basic;
#[cfg(feature = "opencv")]
mod cascade;

use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::capture::VideoFrame;
use crate::emotion::Emotion;

pub use basic::BasicFaceClassifier;
#[cfg(feature = "opencv")]
pub use cascade::CascadeFaceLocator;

/// Edge length faces are downsampled to before classification, trading
/// accuracy for per-frame throughput.
pub const CLASSIFIER_INPUT_SIZE: u32 = 64;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One cropped face region, packed BGR24 like [`VideoFrame`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceCrop {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// Labels produced for one face.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaceAnalysis {
    pub emotion: Emotion,
    pub age: u32,
}

impl FaceAnalysis {
    /// Default observation substituted when classification fails.
    pub fn fallback() -> Self {
        Self {
            emotion: Emotion::Neutral,
            age: 0,
        }
    }
}

/// Per-frame, per-face render data.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaceOverlay {
    pub bounding_box: BoundingBox,
    pub emotion: Emotion,
    pub age: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("face model load failed: {0}")]
    ModelLoad(String),

    #[cfg(feature = "opencv")]
    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("face region too small to classify")]
    DegenerateInput,

    #[error("face analysis failed: {0}")]
    Analysis(String),
}

/// Locates faces in a frame. Pure function of the frame; called once per
/// loop iteration on the capture thread.
pub trait FaceLocator {
    fn locate(&self, frame: &VideoFrame) -> Result<Vec<BoundingBox>, DetectError>;
}

/// Classifies a cropped face. Best-effort: callers substitute
/// [`FaceAnalysis::fallback`] on failure rather than aborting the frame.
pub trait FaceClassifier {
    fn classify(&self, face: FaceCrop) -> BoxFuture<'_, Result<FaceAnalysis, ClassifyError>>;
}

/// Extracts the face region from a frame, clamped to frame bounds.
/// Returns `None` when the clamped region is empty.
pub fn crop_face(frame: &VideoFrame, bounding_box: BoundingBox) -> Option<FaceCrop> {
    let frame_width = frame.width as i64;
    let frame_height = frame.height as i64;

    let x0 = i64::from(bounding_box.x).clamp(0, frame_width);
    let y0 = i64::from(bounding_box.y).clamp(0, frame_height);
    let x1 = (i64::from(bounding_box.x) + i64::from(bounding_box.width)).clamp(0, frame_width);
    let y1 = (i64::from(bounding_box.y) + i64::from(bounding_box.height)).clamp(0, frame_height);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    debug_assert_eq!(
        frame.data.len(),
        (frame.width as usize) * (frame.height as usize) * 3
    );

    let width = (x1 - x0) as usize;
    let mut data = Vec::with_capacity(width * ((y1 - y0) as usize) * 3);
    for row in y0..y1 {
        let start = ((row * frame_width + x0) * 3) as usize;
        data.extend_from_slice(&frame.data[start..start + width * 3]);
    }

    Some(FaceCrop {
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
        data: Bytes::from(data),
    })
}

/// Nearest-neighbor downsample to a `size`×`size` square.
pub fn downsample(crop: &FaceCrop, size: u32) -> FaceCrop {
    let mut data = Vec::with_capacity((size as usize) * (size as usize) * 3);
    for target_y in 0..size {
        let source_y = (u64::from(target_y) * u64::from(crop.height) / u64::from(size)) as usize;
        for target_x in 0..size {
            let source_x =
                (u64::from(target_x) * u64::from(crop.width) / u64::from(size)) as usize;
            let offset = (source_y * crop.width as usize + source_x) * 3;
            data.extend_from_slice(&crop.data[offset..offset + 3]);
        }
    }
    FaceCrop {
        width: size,
        height: size,
        data: Bytes::from(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::uniform_frame;

    #[test]
    fn crop_inside_frame_has_requested_dimensions() {
        let frame = uniform_frame(0, 16, 12, [1, 2, 3]);
        let crop = crop_face(
            &frame,
            BoundingBox {
                x: 4,
                y: 2,
                width: 8,
                height: 6,
            },
        )
        .expect("crop");
        assert_eq!((crop.width, crop.height), (8, 6));
        assert_eq!(crop.data.len(), 8 * 6 * 3);
        assert_eq!(&crop.data[..3], &[1, 2, 3]);
    }

    #[test]
    fn crop_clamps_to_frame_edges() {
        let frame = uniform_frame(0, 16, 12, [0, 0, 0]);
        let crop = crop_face(
            &frame,
            BoundingBox {
                x: -4,
                y: 8,
                width: 8,
                height: 100,
            },
        )
        .expect("crop");
        assert_eq!((crop.width, crop.height), (4, 4));
    }

    #[test]
    fn crop_outside_frame_is_none() {
        let frame = uniform_frame(0, 16, 12, [0, 0, 0]);
        let outside = BoundingBox {
            x: 32,
            y: 0,
            width: 8,
            height: 8,
        };
        assert!(crop_face(&frame, outside).is_none());
    }

    #[test]
    fn downsample_preserves_uniform_content() {
        let frame = uniform_frame(0, 100, 80, [9, 8, 7]);
        let crop = crop_face(
            &frame,
            BoundingBox {
                x: 0,
                y: 0,
                width: 100,
                height: 80,
            },
        )
        .expect("crop");

        let small = downsample(&crop, CLASSIFIER_INPUT_SIZE);
        assert_eq!((small.width, small.height), (64, 64));
        assert_eq!(small.data.len(), 64 * 64 * 3);
        assert!(small.data.chunks_exact(3).all(|px| px == [9, 8, 7]));
    }
}
