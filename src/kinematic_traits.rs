extern crate nalgebra as na;

use na::{Matrix4, Vector3};

/// Six rotary joints of the arm, angles in radians. Index 0 is the base.
pub type Joints = [f64; 6];

/// All joints at zero, the home position of the arm.
pub const JOINTS_AT_ZERO: Joints = [0.0; 6];

/// Homogeneous 4x4 transform as produced by forward kinematics.
pub type Transform = Matrix4<f64>;

/// Pose of the end effector (or camera) as used by the inspection cell.
/// Position is Cartesian, orientation is roll, pitch, yaw in radians.
/// ```
/// use nalgebra::Vector3;
/// use inspection_cell::kinematic_traits::Pose;
///
/// let pose = Pose::new(Vector3::new(0.4, 0.1, 0.3), Vector3::zeros());
/// assert_eq!(pose.position.x, 0.4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: Vector3<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: Vector3<f64>) -> Self {
        Pose { position, orientation }
    }

    /// Build from plain arrays, as they come from recorded poses and the grid.
    pub fn from_arrays(position: [f64; 3], orientation: [f64; 3]) -> Self {
        Pose {
            position: Vector3::from(position),
            orientation: Vector3::from(orientation),
        }
    }
}

pub trait Kinematics {
    /// Closed form approximation of the joint angles for the given pose.
    /// None is returned if the approximation violates joint limits.
    fn inverse(&self, pose: &Pose) -> Option<Joints>;

    /// Transform of the end effector for the given joint angles.
    fn forward(&self, qs: &Joints) -> Transform;
}
