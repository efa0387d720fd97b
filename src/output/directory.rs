use super::MaskSink;
use crate::error::CameraId;
use crate::segmentation::Mask;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Writes masks as `<root>/camN/mask_NNNNNN.png`
pub struct MaskDirectory {
    root: PathBuf,
    written: usize,
}

impl MaskDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create output directory {}", root.display()))?;
        tracing::info!("Writing masks to {}", root.display());
        Ok(Self { root, written: 0 })
    }

    pub fn mask_path(&self, camera: CameraId, frame_index: usize) -> PathBuf {
        self.root
            .join(camera.to_string())
            .join(format!("mask_{frame_index:06}.png"))
    }

    /// Masks written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl MaskSink for MaskDirectory {
    fn write_mask(&mut self, camera: CameraId, frame_index: usize, mask: &Mask) -> Result<()> {
        let path = self.mask_path(camera, frame_index);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        mask.save(&path)
            .with_context(|| format!("Failed to write mask to {}", path.display()))?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_write_mask_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = MaskDirectory::new(tmp.path().join("out")).unwrap();
        let mask = Mask::from_pixel(3, 3, Luma([255]));
        sink.write_mask(CameraId(1), 7, &mask).unwrap();

        let path = tmp.path().join("out").join("cam2").join("mask_000007.png");
        assert!(path.is_file());
        let read = image::open(&path).unwrap().to_luma8();
        assert_eq!(read, mask);
        assert_eq!(sink.written(), 1);
    }
}
