use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::prelude::*;
use opencv::{highgui, imgproc};

use crate::capture::VideoFrame;
use crate::render::{wrap_caption, RenderError, RenderEvent, RenderSink, CAPTION_WRAP_COLUMNS};
use crate::vision::FaceOverlay;

const QUIT_KEY: i32 = b'q' as i32;
const CAPTION_TOP: i32 = 40;
const CAPTION_LINE_STEP: i32 = 30;

/// On-screen sink backed by OpenCV highgui: face rectangles, per-face
/// emotion/age labels and the wrapped caption block, with `q` polled as
/// the quit key.
pub struct HighguiRenderSink {
    window_name: String,
}

impl HighguiRenderSink {
    pub fn new(window_name: &str, width: u32, height: u32) -> Result<Self, RenderError> {
        highgui::named_window(window_name, highgui::WINDOW_NORMAL)?;
        highgui::resize_window(window_name, width as i32, height as i32)?;
        Ok(Self {
            window_name: window_name.to_owned(),
        })
    }
}

impl RenderSink for HighguiRenderSink {
    fn present(
        &mut self,
        frame: &VideoFrame,
        overlays: &[FaceOverlay],
        caption: &str,
    ) -> Result<RenderEvent, RenderError> {
        let face_box_color = Scalar::new(0.0, 0.0, 255.0, 0.0);
        let label_color = Scalar::new(52.0, 189.0, 252.0, 0.0);
        let caption_color = Scalar::new(0.0, 255.0, 0.0, 0.0);

        let mat = Mat::from_slice(&frame.data)?;
        let mat = mat.reshape(3, frame.height as i32)?;
        let mut canvas = mat.try_clone()?;

        for overlay in overlays {
            let rect = Rect::new(
                overlay.bounding_box.x,
                overlay.bounding_box.y,
                overlay.bounding_box.width as i32,
                overlay.bounding_box.height as i32,
            );
            imgproc::rectangle(&mut canvas, rect, face_box_color, 2, imgproc::LINE_8, 0)?;
            imgproc::put_text(
                &mut canvas,
                overlay.emotion.label(),
                Point::new(rect.x, rect.y - 10),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.9,
                label_color,
                2,
                imgproc::LINE_8,
                false,
            )?;
            imgproc::put_text(
                &mut canvas,
                &format!("Age: {}", overlay.age),
                Point::new(rect.x, rect.y - 30),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.9,
                label_color,
                2,
                imgproc::LINE_8,
                false,
            )?;
        }

        let mut y = CAPTION_TOP;
        for line in wrap_caption(caption, CAPTION_WRAP_COLUMNS) {
            imgproc::put_text(
                &mut canvas,
                &line,
                Point::new(20, y),
                imgproc::FONT_HERSHEY_TRIPLEX,
                1.2,
                caption_color,
                2,
                imgproc::LINE_8,
                false,
            )?;
            y += CAPTION_LINE_STEP;
        }

        highgui::imshow(&self.window_name, &canvas)?;
        if highgui::wait_key(1)? & 0xff == QUIT_KEY {
            return Ok(RenderEvent::QuitRequested);
        }
        Ok(RenderEvent::Continue)
    }
}

impl Drop for HighguiRenderSink {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(&self.window_name);
    }
}
