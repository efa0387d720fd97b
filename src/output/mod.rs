mod directory;

pub use directory::MaskDirectory;

use crate::error::CameraId;
use crate::segmentation::Mask;
use anyhow::Result;

/// Trait for destinations of computed masks
pub trait MaskSink {
    /// Store the mask of one camera for one frame
    fn write_mask(&mut self, camera: CameraId, frame_index: usize, mask: &Mask) -> Result<()>;
}
