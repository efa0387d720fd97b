//! Drives every camera to a frame index and refreshes its mask

use crate::camera::{CameraOutcome, CameraView};
use crate::error::{CameraError, CameraId};
use crate::segmentation::{ForegroundSegmenter, Pipeline, SharedParameters};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default bound on a single frame fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(500);

/// Shared flag to abort a running tick
///
/// Cameras that have not committed their mask when the flag is raised keep
/// the previous one. The flag stays raised until [`CancelToken::reset`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Result of one controller tick
#[derive(Debug)]
pub struct TickReport {
    pub frame_index: usize,
    /// Cameras whose mask was replaced
    pub segmented: Vec<CameraId>,
    /// Cameras already at this frame, left untouched
    pub unchanged: Vec<CameraId>,
    pub failures: Vec<CameraError>,
    pub elapsed: Duration,
}

impl TickReport {
    /// True when no camera failed
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_cameras(&self) -> Vec<CameraId> {
        self.failures.iter().map(CameraError::camera).collect()
    }
}

/// Frame / camera iteration controller
pub struct FrameController {
    cameras: Vec<CameraView>,
    pipeline: Pipeline,
    parameters: SharedParameters,
    fetch_timeout: Duration,
    cancel: CancelToken,
}

impl FrameController {
    pub fn new(cameras: Vec<CameraView>, pipeline: Pipeline, parameters: SharedParameters) -> Self {
        tracing::info!(
            "Frame controller: {} cameras, {} pipeline",
            cameras.len(),
            pipeline.name()
        );
        Self {
            cameras,
            pipeline,
            parameters,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Token that aborts the running tick when cancelled
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    /// Switch strategy; masks already stored are kept until the next frame
    pub fn set_pipeline(&mut self, pipeline: Pipeline) {
        tracing::info!("Switching to {} pipeline", pipeline.name());
        self.pipeline = pipeline;
    }

    pub fn parameters(&self) -> &SharedParameters {
        &self.parameters
    }

    pub fn cameras(&self) -> &[CameraView] {
        &self.cameras
    }

    /// Camera carrying `id`, wherever it sits in the list
    pub fn camera(&self, id: CameraId) -> Option<&CameraView> {
        self.cameras.iter().find(|c| c.id() == id)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut CameraView> {
        self.cameras.iter_mut().find(|c| c.id() == id)
    }

    /// Frames every camera can deliver
    pub fn frames_amount(&self) -> usize {
        self.cameras
            .iter()
            .map(CameraView::frames_amount)
            .min()
            .unwrap_or(0)
    }

    /// Bring every camera to `frame_index` and refresh its mask
    ///
    /// Cameras run in parallel and independently: a failing camera keeps its
    /// previous mask and is listed in the report, the others carry on.
    /// Parameters are read once, before any camera starts.
    pub fn advance_and_segment_all(&mut self, frame_index: usize) -> TickReport {
        let _span = tracing::debug_span!("tick", frame = frame_index).entered();
        let start = Instant::now();

        let params = self.parameters.snapshot();
        let pipeline = self.pipeline;
        let timeout = self.fetch_timeout;
        let cancel = &self.cancel;

        let outcomes: Vec<(CameraId, Result<CameraOutcome, CameraError>)> = self
            .cameras
            .par_iter_mut()
            .map(|camera| {
                let _span = tracing::debug_span!("camera", camera = %camera.id()).entered();
                let outcome = camera.process(frame_index, &pipeline, &params, timeout, cancel);
                (camera.id(), outcome)
            })
            .collect();

        let mut report = TickReport {
            frame_index,
            segmented: Vec::new(),
            unchanged: Vec::new(),
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(CameraOutcome::Segmented(kind)) => {
                    tracing::debug!("{}: frame {} segmented ({:?})", id, frame_index, kind);
                    report.segmented.push(id);
                }
                Ok(CameraOutcome::Unchanged) => report.unchanged.push(id),
                Err(err) => {
                    tracing::warn!("Frame {}: {}", frame_index, err);
                    report.failures.push(err);
                }
            }
        }
        report.elapsed = start.elapsed();

        tracing::debug!(
            "Frame {}: {} segmented, {} unchanged, {} failed in {:?}",
            frame_index,
            report.segmented.len(),
            report.unchanged.len(),
            report.failures.len(),
            report.elapsed
        );
        report
    }
}
