use anyhow::{anyhow, Context, Result};
use opencv::{prelude::*, videoio};

use super::frame_source::FrameSource;

/// OpenCV-backed decoder yielding BGR frames at native resolution.
pub struct VideoDecoder {
    capture: videoio::VideoCapture,
    path: String,
    fps: f64,
    released: bool,
}

impl VideoDecoder {
    pub fn open(path: &str) -> Result<Self> {
        crate::utils::logger::debug(&format!("Opening video with OpenCV: {}", path));

        // CAP_ANY lets OpenCV pick the backend (FFmpeg/GStreamer/AVFoundation)
        let capture = videoio::VideoCapture::from_file(path, videoio::CAP_ANY)
            .with_context(|| format!("Could not open video file {}", path))?;

        if !capture.is_opened()? {
            let err_msg = format!("Could not open video file {}", path);
            crate::utils::logger::error(&err_msg);
            return Err(anyhow!(err_msg));
        }

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;

        crate::utils::logger::info(&format!(
            "VideoCapture opened: {}x{} @ {} fps, ~{} frames (container estimate)",
            width, height, fps, frame_count
        ));

        Ok(Self {
            capture,
            path: path.to_string(),
            fps,
            released: false,
        })
    }
}

impl FrameSource for VideoDecoder {
    type Frame = Mat;

    fn fps(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? {
            return Ok(None); // EOF
        }
        if frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.capture
            .release()
            .with_context(|| format!("failed to release {}", self.path))?;
        self.released = true;
        crate::utils::logger::debug(&format!("Released video handle: {}", self.path));
        Ok(())
    }
}
