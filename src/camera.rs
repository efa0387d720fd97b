//! Per-camera state mutated by the frame controller

use crate::capture::VideoSource;
use crate::controller::CancelToken;
use crate::error::{CameraError, CameraId, SegmentError};
use crate::segmentation::{BackgroundChannels, Mask, Pipeline, SegmentationParameters};
use std::time::Duration;

/// How a requested frame index is reached from the loaded one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Requested index is the loaded index + 1
    Advance,
    /// Any other jump, forward or backward
    Seek,
    /// Frame already loaded
    None,
}

impl FetchKind {
    /// No loaded frame counts as index -1, so frame 0 is reached by advancing
    pub fn between(loaded: Option<usize>, requested: usize) -> Self {
        match loaded {
            Some(l) if l == requested => FetchKind::None,
            Some(l) if l + 1 == requested => FetchKind::Advance,
            None if requested == 0 => FetchKind::Advance,
            _ => FetchKind::Seek,
        }
    }
}

/// What a camera did during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraOutcome {
    /// A new mask replaced the previous one
    Segmented(FetchKind),
    /// Mask already computed for this frame, nothing touched
    Unchanged,
}

/// One physical camera feed
pub struct CameraView {
    id: CameraId,
    source: Box<dyn VideoSource>,
    background: Option<BackgroundChannels>,
    mask: Option<Mask>,
    loaded_frame: Option<usize>,
    processed_frame: Option<usize>,
}

impl CameraView {
    /// Background channels are taken from the source when it has them
    pub fn new(id: CameraId, source: Box<dyn VideoSource>) -> Self {
        let background = source.background_channels();
        if background.is_none() {
            tracing::warn!("{}: no background channels yet", id);
        }
        Self {
            id,
            source,
            background,
            mask: None,
            loaded_frame: None,
            processed_frame: None,
        }
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    pub fn background(&self) -> Option<&BackgroundChannels> {
        self.background.as_ref()
    }

    /// Install background channels captured by an external calibration step
    pub fn set_background(&mut self, background: BackgroundChannels) {
        self.background = Some(background);
    }

    /// Latest foreground mask; stable until the next successful segmentation
    pub fn foreground_mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    /// Index of the frame held by the source
    pub fn loaded_frame(&self) -> Option<usize> {
        self.loaded_frame
    }

    /// Index of the frame the current mask was computed from
    pub fn processed_frame(&self) -> Option<usize> {
        self.processed_frame
    }

    pub fn frames_amount(&self) -> usize {
        self.source.frames_amount()
    }

    fn ensure_frame(&mut self, index: usize, timeout: Duration) -> Result<FetchKind, CameraError> {
        let kind = FetchKind::between(self.loaded_frame, index);
        let fetched = match kind {
            FetchKind::Advance => self.source.advance_frame(timeout),
            FetchKind::Seek => self.source.seek_frame(index, timeout),
            FetchKind::None => Ok(()),
        };
        fetched.map_err(|source| CameraError::Capture {
            camera: self.id,
            source,
        })?;
        self.loaded_frame = Some(index);
        Ok(kind)
    }

    /// Segment the loaded frame without touching the stored mask
    fn compute_mask(&self, pipeline: &Pipeline, params: &SegmentationParameters) -> Result<Mask, CameraError> {
        let segment_err = |source| CameraError::Segment {
            camera: self.id,
            source,
        };

        let frame = self.source.current_frame();
        if frame.is_empty() {
            return Err(segment_err(SegmentError::EmptyFrame));
        }
        let background = self.background.as_ref().ok_or_else(|| {
            segment_err(SegmentError::UninitializedBackground(
                "no background captured".to_string(),
            ))
        })?;

        pipeline.segment_frame(frame, background, params).map_err(segment_err)
    }

    /// Bring the camera to `index` and refresh its mask
    ///
    /// Returns [`CameraOutcome::Unchanged`] without fetching when the mask
    /// already belongs to `index`. On any error the previous mask is kept.
    pub fn process(
        &mut self,
        index: usize,
        pipeline: &Pipeline,
        params: &SegmentationParameters,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<CameraOutcome, CameraError> {
        if self.processed_frame == Some(index) {
            return Ok(CameraOutcome::Unchanged);
        }
        if cancel.is_cancelled() {
            return Err(CameraError::Cancelled { camera: self.id });
        }

        let kind = self.ensure_frame(index, timeout)?;
        let mask = self.compute_mask(pipeline, params)?;

        if cancel.is_cancelled() {
            return Err(CameraError::Cancelled { camera: self.id });
        }
        self.mask = Some(mask);
        self.processed_frame = Some(index);
        Ok(CameraOutcome::Segmented(kind))
    }
}

impl std::fmt::Debug for CameraView {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CameraView")
            .field("id", &self.id)
            .field("has_background", &self.background.is_some())
            .field("loaded_frame", &self.loaded_frame)
            .field("processed_frame", &self.processed_frame)
            .finish()
    }
}
