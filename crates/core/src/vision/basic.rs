use futures::future::BoxFuture;
use futures::FutureExt;

use crate::emotion::Emotion;
use crate::vision::{
    downsample, ClassifyError, FaceAnalysis, FaceClassifier, FaceCrop, CLASSIFIER_INPUT_SIZE,
};

/// Luminance-statistics classifier: a crude threshold heuristic standing
/// in for a real emotion/age model, which stays a black box behind the
/// [`FaceClassifier`] trait.
#[derive(Clone)]
pub struct BasicFaceClassifier;

impl BasicFaceClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BasicFaceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceClassifier for BasicFaceClassifier {
    fn classify(&self, face: FaceCrop) -> BoxFuture<'_, Result<FaceAnalysis, ClassifyError>> {
        async move {
            if face.width == 0 || face.height == 0 {
                return Err(ClassifyError::DegenerateInput);
            }

            let small = downsample(&face, CLASSIFIER_INPUT_SIZE);
            let (mean, stddev) = luma_stats(&small);

            let emotion = if stddev > 72.0 {
                Emotion::Surprised
            } else if mean > 150.0 {
                Emotion::Happy
            } else if mean < 60.0 {
                Emotion::Sad
            } else {
                Emotion::Neutral
            };

            // Rough proxy: smoother regions read as younger faces.
            let age = (18.0 + stddev * 0.6).round().min(80.0) as u32;

            Ok(FaceAnalysis { emotion, age })
        }
        .boxed()
    }
}

/// Mean and standard deviation of BT.601 luma over a BGR crop.
fn luma_stats(crop: &FaceCrop) -> (f64, f64) {
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0.0f64;

    for px in crop.data.chunks_exact(3) {
        let luma =
            0.114 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.299 * f64::from(px[2]);
        sum += luma;
        sum_sq += luma * luma;
        count += 1.0;
    }

    if count == 0.0 {
        return (0.0, 0.0);
    }
    let mean = sum / count;
    let variance = (sum_sq / count - mean * mean).max(0.0);
    (mean, variance.sqrt())
}
