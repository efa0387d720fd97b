//! Viewpoint bookkeeping and scene-wide state

use crate::config::CalibrationConfig;
use crate::error::SceneError;
use crate::floor::{FloorGrid, DEFAULT_DIVISIONS};
use crate::segmentation::{SegmentationParameters, SharedParameters};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Eye, look-at centre and up direction; always replaced as a whole
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub eye: Vec3,
    pub centre: Vec3,
    pub up: Vec3,
}

impl Viewpoint {
    /// Bird's eye view over the world origin
    pub const TOP: Viewpoint = Viewpoint {
        eye: Vec3::new(0.0, 0.0, 10000.0),
        centre: Vec3::ZERO,
        up: Vec3::new(0.0, 1.0, 0.0),
    };

    /// Looking from a camera position towards the origin, world z up
    pub fn from_camera(position: Vec3) -> Self {
        Self {
            eye: position,
            centre: Vec3::ZERO,
            up: Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Which view is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTarget {
    Camera(usize),
    Top,
}

/// Active viewpoint plus the view it replaced
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView {
    target: ViewTarget,
    previous: ViewTarget,
    viewpoint: Viewpoint,
    camera_positions: Vec<Vec3>,
}

impl SceneView {
    /// Starts in top view
    pub fn new(camera_positions: Vec<Vec3>) -> Self {
        Self {
            target: ViewTarget::Top,
            previous: ViewTarget::Top,
            viewpoint: Viewpoint::TOP,
            camera_positions,
        }
    }

    /// Switch to the view of camera `id`; no-op if it is already active
    pub fn select_camera(&mut self, id: usize) -> Result<(), SceneError> {
        let position = *self
            .camera_positions
            .get(id)
            .ok_or(SceneError::UnknownCamera(id, self.camera_positions.len()))?;

        if self.target == ViewTarget::Camera(id) {
            return Ok(());
        }
        self.previous = self.target;
        self.target = ViewTarget::Camera(id);
        self.viewpoint = Viewpoint::from_camera(position);
        tracing::debug!("View: camera {} (previous {:?})", id, self.previous);
        Ok(())
    }

    /// Switch to the free top view; repeated calls leave the state unchanged
    pub fn select_top_view(&mut self) {
        if let ViewTarget::Camera(_) = self.target {
            self.previous = self.target;
        }
        self.target = ViewTarget::Top;
        self.viewpoint = Viewpoint::TOP;
    }

    pub fn target(&self) -> ViewTarget {
        self.target
    }

    pub fn previous(&self) -> ViewTarget {
        self.previous
    }

    pub fn viewpoint(&self) -> Viewpoint {
        self.viewpoint
    }

    pub fn is_camera_view(&self) -> bool {
        matches!(self.target, ViewTarget::Camera(_))
    }

    pub fn camera_count(&self) -> usize {
        self.camera_positions.len()
    }
}

/// State owned by the scene controller for the lifetime of the application
#[derive(Debug)]
pub struct Scene {
    parameters: SharedParameters,
    view: SceneView,
    floor: FloorGrid,
    calibration: CalibrationConfig,
}

impl Scene {
    /// Build the floor grid, adopt the calibration and start in top view
    pub fn new(
        calibration: CalibrationConfig,
        reconstruction_width: i32,
        parameters: SegmentationParameters,
    ) -> Result<Self, SceneError> {
        let floor = FloorGrid::build(reconstruction_width, DEFAULT_DIVISIONS)?;
        if !calibration.is_configured() {
            tracing::warn!("Checkerboard geometry unconfigured, geometry overlays disabled");
        }
        let mut view = SceneView::new(calibration.camera_positions());
        view.select_top_view();

        Ok(Self {
            parameters: SharedParameters::new(parameters),
            view,
            floor,
            calibration,
        })
    }

    /// Handle for the control surface and the frame controller
    pub fn parameters(&self) -> &SharedParameters {
        &self.parameters
    }

    pub fn view(&self) -> &SceneView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut SceneView {
        &mut self.view
    }

    pub fn floor(&self) -> &FloorGrid {
        &self.floor
    }

    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }
}
