//! Per-camera foreground segmentation for multi-view voxel reconstruction
//!
//! Each camera frame is compared against a static background capture and
//! turned into a binary mask, either with fixed per-channel HSV thresholds
//! or with a perceptual difference score and automatic thresholds.

pub mod camera;
pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
pub mod floor;
pub mod output;
pub mod scene;
pub mod segmentation;

pub use camera::{CameraOutcome, CameraView, FetchKind};
pub use capture::{ImageSequenceSource, MemorySource, VideoSource};
pub use config::CalibrationConfig;
pub use controller::{CancelToken, FrameController, TickReport, DEFAULT_FETCH_TIMEOUT};
pub use error::{CameraError, CameraId, CaptureError, ConfigWarning, SceneError, SegmentError};
pub use floor::FloorGrid;
pub use output::{MaskDirectory, MaskSink};
pub use scene::{Scene, SceneView, Vec3, ViewTarget, Viewpoint};
pub use segmentation::{
    BackgroundChannels, ForegroundSegmenter, Mask, Pipeline, SegmentationParameters, SharedParameters,
};
