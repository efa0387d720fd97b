use super::{check_index, next_index, VideoSource};
use crate::error::CaptureError;
use crate::segmentation::BackgroundChannels;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Function turning one frame file into pixels, run on a decode thread
pub type FrameDecoder = fn(&Path) -> Result<RgbImage, CaptureError>;

/// Default decoder: any format the `image` crate reads, converted to RGB
pub fn decode_frame(path: &Path) -> Result<RgbImage, CaptureError> {
    Ok(image::open(path)?.to_rgb8())
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

/// Decode still running on its thread
struct PendingFrame {
    index: usize,
    rx: Receiver<Result<RgbImage, CaptureError>>,
}

/// Camera recording stored as a directory of image files
///
/// Layout:
/// ```text
/// camN/
///   background.png     # optional, empty scene
///   frames/            # frames sorted by file name
///     000000.png
///     000001.png
/// ```
/// When `frames/` is missing the images directly inside the directory are
/// used, the background file excluded.
///
/// Frames are decoded on a worker thread and the fetch waits at most
/// `timeout` for the result. A decode that overruns keeps running; asking
/// for the same frame again picks up its result instead of starting over.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    background: Option<BackgroundChannels>,
    position: Option<usize>,
    current: RgbImage,
    width: u32,
    height: u32,
    decoder: FrameDecoder,
    pending: Option<PendingFrame>,
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, CaptureError> {
        let dir = dir.as_ref();
        tracing::info!("Opening image sequence at {}", dir.display());

        let background_path = FRAME_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("background.{ext}")))
            .find(|p| p.is_file());

        let frames_dir = dir.join("frames");
        let frames_dir = if frames_dir.is_dir() { frames_dir } else { dir.to_path_buf() };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&frames_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_frame_file(p) && Some(p) != background_path.as_ref())
            .collect();
        paths.sort();

        let first = paths
            .first()
            .ok_or_else(|| CaptureError::NoFrames(frames_dir.clone()))?;
        let (width, height) = image::image_dimensions(first)?;

        let background = match &background_path {
            Some(path) => {
                let frame = decode_frame(path)?;
                match BackgroundChannels::from_frame(&frame) {
                    Ok(channels) => Some(channels),
                    Err(err) => {
                        tracing::warn!("Background {} rejected: {}", path.display(), err);
                        None
                    }
                }
            }
            None => {
                tracing::warn!("No background image in {}", dir.display());
                None
            }
        };

        tracing::info!("Image sequence: {} frames at {}x{}", paths.len(), width, height);

        Ok(Self {
            paths,
            background,
            position: None,
            current: RgbImage::new(0, 0),
            width,
            height,
            decoder: decode_frame,
            pending: None,
        })
    }

    /// Replace the frame decoder
    pub fn with_decoder(mut self, decoder: FrameDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    fn spawn_decode(&self, index: usize) -> Result<PendingFrame, CaptureError> {
        let (tx, rx) = bounded(1);
        let path = self.paths[index].clone();
        let decoder = self.decoder;
        thread::Builder::new()
            .name(format!("decode-{index}"))
            .spawn(move || {
                // receiver may be gone if the source moved on
                let _ = tx.send(decoder(&path));
            })?;
        Ok(PendingFrame { index, rx })
    }

    fn load(&mut self, index: usize, timeout: Duration) -> Result<(), CaptureError> {
        check_index(index, self.paths.len())?;

        let start = Instant::now();
        let pending = match self.pending.take() {
            Some(pending) if pending.index == index => pending,
            Some(stale) => {
                tracing::debug!("Abandoning decode of frame {}", stale.index);
                self.spawn_decode(index)?
            }
            None => self.spawn_decode(index)?,
        };

        match pending.rx.recv_timeout(timeout) {
            Ok(frame) => {
                self.current = frame?;
                self.position = Some(index);
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                self.pending = Some(pending);
                Err(CaptureError::Timeout {
                    waited: start.elapsed(),
                    limit: timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::DecoderStopped(self.paths[index].clone())),
        }
    }
}

impl VideoSource for ImageSequenceSource {
    fn current_frame(&self) -> &RgbImage {
        &self.current
    }

    fn advance_frame(&mut self, timeout: Duration) -> Result<(), CaptureError> {
        self.load(next_index(self.position), timeout)
    }

    fn seek_frame(&mut self, index: usize, timeout: Duration) -> Result<(), CaptureError> {
        self.load(index, timeout)
    }

    fn background_channels(&self) -> Option<BackgroundChannels> {
        self.background.clone()
    }

    fn frames_amount(&self) -> usize {
        self.paths.len()
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
