use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use voxcut::{
    CalibrationConfig, CameraId, CameraView, FrameController, ImageSequenceSource, MaskDirectory, MaskSink,
    Pipeline, Scene, SegmentationParameters,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory with one sub-directory per camera (cam1, cam2, ...)
    #[arg(short, long)]
    data: PathBuf,

    /// Directory the masks are written to; nothing is written when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use the adaptive pipeline instead of the fixed thresholds
    #[arg(long)]
    adaptive: bool,

    /// Hue difference threshold
    #[arg(long, default_value_t = 10)]
    hue: u8,

    /// Saturation difference threshold
    #[arg(long, default_value_t = 20)]
    sat: u8,

    /// Value difference threshold
    #[arg(long, default_value_t = 50)]
    val: u8,

    /// Erosion kernel radius
    #[arg(long, default_value_t = 1)]
    erosion: u32,

    /// Dilation kernel radius
    #[arg(long, default_value_t = 3)]
    dilation: u32,

    /// First frame to process
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Frame to stop before (defaults to the shortest camera)
    #[arg(long)]
    end: Option<usize>,

    /// Frame step; anything above 1 makes every fetch a seek
    #[arg(long, default_value_t = 1)]
    step: usize,

    /// Bound on a single frame fetch, milliseconds
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,

    /// Calibration file (defaults to <data>/checkerboard.toml)
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Width of the reconstruction volume, used for the floor grid
    #[arg(long, default_value_t = 2048)]
    reconstruction_width: i32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("voxcut starting");

    let calibration_path = args
        .calibration
        .clone()
        .unwrap_or_else(|| args.data.join("checkerboard.toml"));
    let (calibration, _warning) = CalibrationConfig::load(&calibration_path);

    let params = SegmentationParameters::new(args.hue, args.sat, args.val, args.erosion, args.dilation);
    let scene = Scene::new(calibration, args.reconstruction_width, params)
        .context("Failed to set up scene")?;
    tracing::info!(
        "Floor grid spacing {}, view {:?}",
        scene.floor().spacing(),
        scene.view().target()
    );

    let cameras = open_cameras(&args.data)?;
    let pipeline = if args.adaptive {
        Pipeline::adaptive()
    } else {
        Pipeline::fixed()
    };
    let mut controller = FrameController::new(cameras, pipeline, scene.parameters().clone())
        .with_fetch_timeout(Duration::from_millis(args.timeout_ms));

    let mut sink = match &args.output {
        Some(dir) => Some(MaskDirectory::new(dir)?),
        None => {
            tracing::info!("No output directory, masks are not saved");
            None
        }
    };

    let end = args.end.unwrap_or_else(|| controller.frames_amount());
    if args.start >= end {
        bail!("Empty frame range {}..{}", args.start, end);
    }

    run(&mut controller, sink.as_mut(), args.start, end, args.step.max(1))
}

/// Every `cam*` sub-directory becomes one camera, in name order
fn open_cameras(data: &Path) -> Result<Vec<CameraView>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(data)
        .with_context(|| format!("Failed to read data directory {}", data.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("cam"))
                    .unwrap_or(false)
        })
        .collect();
    dirs.sort();

    if dirs.is_empty() {
        bail!("No camera directories in {}", data.display());
    }

    dirs.iter()
        .enumerate()
        .map(|(i, dir)| {
            let source = ImageSequenceSource::open(dir)
                .with_context(|| format!("Failed to open camera at {}", dir.display()))?;
            Ok(CameraView::new(CameraId(i), Box::new(source)))
        })
        .collect()
}

fn run(
    controller: &mut FrameController,
    mut sink: Option<&mut MaskDirectory>,
    start: usize,
    end: usize,
    step: usize,
) -> Result<()> {
    let mut frame_count = 0u64;
    let mut failed_ticks = 0u64;
    let mut total_tick_time = Duration::ZERO;

    tracing::info!("Processing frames {}..{} (step {})", start, end, step);

    for frame_index in (start..end).step_by(step) {
        let report = controller.advance_and_segment_all(frame_index);
        total_tick_time += report.elapsed;
        frame_count += 1;
        if !report.success() {
            failed_ticks += 1;
            tracing::warn!(
                "Frame {}: failed cameras {:?}",
                frame_index,
                report.failed_cameras()
            );
        }

        if let Some(sink) = sink.as_deref_mut() {
            for id in &report.segmented {
                if let Some(mask) = controller.camera(*id).and_then(|c| c.foreground_mask()) {
                    sink.write_mask(*id, frame_index, mask)
                        .context("Failed to write mask")?;
                }
            }
        }

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_tick_ms = total_tick_time.as_secs_f64() * 1000.0 / frame_count as f64;
            tracing::info!(
                "Frame {}: tick={:.1}ms, fps={:.1}, failed ticks={}",
                frame_index,
                avg_tick_ms,
                1000.0 / avg_tick_ms,
                failed_ticks
            );
        }
    }

    tracing::info!(
        "Done: {} frames, {} with failures",
        frame_count,
        failed_ticks
    );
    Ok(())
}
