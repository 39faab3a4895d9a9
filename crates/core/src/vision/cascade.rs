use opencv::core::{AlgorithmHint, Mat, Rect, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use std::sync::Mutex;

use crate::capture::VideoFrame;
use crate::vision::{BoundingBox, DetectError, FaceLocator};

/// Haar-cascade face locator backed by OpenCV objdetect.
pub struct CascadeFaceLocator {
    classifier: Mutex<CascadeClassifier>,
}

impl CascadeFaceLocator {
    pub fn new(cascade_path: &str) -> Result<Self, DetectError> {
        let classifier = CascadeClassifier::new(cascade_path)
            .map_err(|e| DetectError::ModelLoad(format!("cascade load failed: {e}")))?;
        if classifier
            .empty()
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
        {
            return Err(DetectError::ModelLoad(format!(
                "empty cascade model: {cascade_path}"
            )));
        }

        Ok(Self {
            classifier: Mutex::new(classifier),
        })
    }
}

impl FaceLocator for CascadeFaceLocator {
    fn locate(&self, frame: &VideoFrame) -> Result<Vec<BoundingBox>, DetectError> {
        let mat = Mat::from_slice(&frame.data)?;
        let mat = mat.reshape(3, frame.height as i32)?;

        let mut gray = Mat::default();
        imgproc::cvt_color(
            &mat,
            &mut gray,
            imgproc::COLOR_BGR2GRAY,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;

        let mut faces = Vector::<Rect>::new();
        let mut classifier = self.classifier.lock().expect("cascade lock poisoned");
        classifier.detect_multi_scale(
            &gray,
            &mut faces,
            1.1,
            5,
            0,
            Size::new(30, 30),
            Size::new(0, 0),
        )?;

        Ok(faces
            .iter()
            .map(|rect| BoundingBox {
                x: rect.x,
                y: rect.y,
                width: rect.width.max(0) as u32,
                height: rect.height.max(0) as u32,
            })
            .collect())
    }
}
