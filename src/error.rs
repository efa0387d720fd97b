//! Error types for the segmentation engine

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Identifier of a managed camera
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CameraId(pub usize);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cam{}", self.0 + 1)
    }
}

/// Failures of a single segmentation call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("frame is empty")]
    EmptyFrame,

    #[error("background channels not initialized: {0}")]
    UninitializedBackground(String),
}

/// Failures of a video source fetch
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("frame fetch exceeded {waited:?} (limit {limit:?})")]
    Timeout { waited: Duration, limit: Duration },

    #[error("frame {index} out of range, source has {available} frames")]
    OutOfRange { index: usize, available: usize },

    #[error("no frames found in {0}")]
    NoFrames(PathBuf),

    #[error("decoder for {0} stopped without a frame")]
    DecoderStopped(PathBuf),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-camera failure surfaced in a tick report
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("{camera}: {source}")]
    Segment {
        camera: CameraId,
        #[source]
        source: SegmentError,
    },

    #[error("{camera}: {source}")]
    Capture {
        camera: CameraId,
        #[source]
        source: CaptureError,
    },

    #[error("{camera}: tick cancelled, previous mask kept")]
    Cancelled { camera: CameraId },
}

impl CameraError {
    /// Camera the failure belongs to
    pub fn camera(&self) -> CameraId {
        match self {
            CameraError::Segment { camera, .. }
            | CameraError::Capture { camera, .. }
            | CameraError::Cancelled { camera } => *camera,
        }
    }

    /// Decoder timeouts may be retried by the caller
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CameraError::Capture {
                source: CaptureError::Timeout { .. },
                ..
            }
        )
    }
}

/// Scene / view errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("unknown camera {0}, scene has {1} cameras")]
    UnknownCamera(usize, usize),

    #[error("invalid floor grid: {0}")]
    InvalidGrid(String),
}

/// Non-fatal problem while loading calibration config; defaults are used instead
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "calibration config {} not loaded ({}), using zeroed defaults",
            self.path.display(),
            self.reason
        )
    }
}
