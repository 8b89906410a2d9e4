//! Camera of the cell. The [`Camera`] trait is what the inspection sequence talks to;
//! [`SimulatedCamera`] produces blank frames tagged with the pose they were taken from.

use crate::catalog::CameraSpec;
use crate::kinematic_traits::Pose;
use nalgebra::Vector3;
use tracing::{debug, warn};

/// Grayscale frame together with the circumstances it was taken in.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// Row major, one byte per pixel
    pub pixels: Vec<u8>,
    pub pose: Pose,
    pub scene_description: String,
}

impl Image {
    pub fn blank(width: u32, height: u32, pose: Pose, scene_description: &str) -> Self {
        Image {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            pose,
            scene_description: scene_description.to_string(),
        }
    }
}

pub trait Camera {
    /// Takes an image from the given pose. None means the capture failed.
    fn capture(
        &mut self,
        position: &Vector3<f64>,
        orientation: &Vector3<f64>,
        scene_description: &str,
    ) -> Option<Image>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// Milliseconds
    pub exposure_time: f64,
    pub gain: f64,
    pub resolution: (u32, u32),
}

impl Default for CameraSettings {
    fn default() -> Self {
        CameraSettings {
            exposure_time: 10.0,
            gain: 1.0,
            resolution: (640, 480),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraStatus {
    pub is_capturing: bool,
    pub settings: CameraSettings,
    pub frames_captured: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedCamera {
    settings: CameraSettings,
    is_capturing: bool,
    frames_captured: u64,
}

impl SimulatedCamera {
    pub fn new(settings: CameraSettings) -> Self {
        SimulatedCamera {
            settings,
            ..Default::default()
        }
    }

    /// Camera with the resolution of the camera spec.
    pub fn from_spec(spec: &CameraSpec) -> Self {
        Self::new(CameraSettings {
            resolution: spec.resolution,
            ..Default::default()
        })
    }

    pub fn set_exposure(&mut self, exposure_time: f64) {
        self.settings.exposure_time = exposure_time;
    }

    pub fn set_gain(&mut self, gain: f64) {
        self.settings.gain = gain;
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.settings.resolution = (width, height);
    }

    pub fn settings(&self) -> CameraSettings {
        self.settings
    }

    pub fn status(&self) -> CameraStatus {
        CameraStatus {
            is_capturing: self.is_capturing,
            settings: self.settings,
            frames_captured: self.frames_captured,
        }
    }

    /// Back to default settings, frame counter cleared.
    pub fn reset(&mut self) {
        *self = SimulatedCamera::default();
    }
}

impl Camera for SimulatedCamera {
    fn capture(
        &mut self,
        position: &Vector3<f64>,
        orientation: &Vector3<f64>,
        scene_description: &str,
    ) -> Option<Image> {
        let (width, height) = self.settings.resolution;
        if width == 0 || height == 0 {
            warn!("Capture with zero resolution");
            return None;
        }
        if !position.iter().chain(orientation.iter()).all(|v| v.is_finite()) {
            warn!("Capture from invalid pose {position:?} {orientation:?}");
            return None;
        }

        self.is_capturing = true;
        let image = Image::blank(width, height, Pose::new(*position, *orientation), scene_description);
        self.frames_captured += 1;
        self.is_capturing = false;
        debug!("Captured frame {} for '{scene_description}'", self.frames_captured);
        Some(image)
    }
}
