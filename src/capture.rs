//! Photo Capture Protocol
//!
//! The camera is an external capability. A capture session pulls frames from
//! a `FrameSource`, shows each one through a `PreviewSink`, and stops on
//! confirm, cancel, or timeout.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera not found (device {0})")]
    CameraUnavailable(u32),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Preview error: {0}")]
    Preview(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Operator reaction to one previewed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSignal {
    Continue,
    Confirm,
    Cancel,
}

pub trait FrameSource {
    fn next_frame(&mut self) -> Result<RgbImage, CaptureError>;
}

pub trait Camera {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, CaptureError>;
}

pub trait PreviewSink {
    fn present(&mut self, frame: &RgbImage) -> Result<PreviewSignal, CaptureError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Previewing,
    Captured(RgbImage),
    Cancelled,
}

impl CaptureState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Captured(_) | CaptureState::Cancelled)
    }
}

pub struct CaptureSession {
    state: CaptureState,
    timeout: Option<Duration>,
}

impl CaptureSession {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            state: CaptureState::Idle,
            timeout,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Drive the session to a terminal state and return it.
    pub fn run(
        mut self,
        source: &mut dyn FrameSource,
        preview: &mut dyn PreviewSink,
    ) -> Result<CaptureState, CaptureError> {
        self.state = CaptureState::Previewing;
        let started = Instant::now();
        debug!("capture previewing");

        while !self.state.is_terminal() {
            let frame = source.next_frame()?;
            self.state = match preview.present(&frame)? {
                PreviewSignal::Confirm => CaptureState::Captured(frame),
                PreviewSignal::Cancel => CaptureState::Cancelled,
                PreviewSignal::Continue => match self.timeout {
                    Some(limit) if started.elapsed() >= limit => {
                        info!(?limit, "capture timed out");
                        CaptureState::Cancelled
                    }
                    _ => CaptureState::Previewing,
                },
            };
        }
        Ok(self.state)
    }
}

/// No camera driver; every open fails.
pub struct NoCamera;

impl Camera for NoCamera {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
        Err(CaptureError::CameraUnavailable(index))
    }
}

/// Serves a still image file as every frame of device 0.
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Camera for StillImageCamera {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
        if index != 0 || !self.path.is_file() {
            return Err(CaptureError::CameraUnavailable(index));
        }
        let frame = image::open(&self.path)?.to_rgb8();
        Ok(Box::new(StillFrames { frame }))
    }
}

struct StillFrames {
    frame: RgbImage,
}

impl FrameSource for StillFrames {
    fn next_frame(&mut self) -> Result<RgbImage, CaptureError> {
        Ok(self.frame.clone())
    }
}
