//! Helper functions

use crate::kinematic_traits::{Joints, Pose, Transform};
use nalgebra::{Matrix3, Vector3};

/// Checks the joint angles for validity.
pub(crate) mod arm_kinematics {
    use crate::kinematic_traits::Joints;

    /// Checks if all elements in the array are finite
    pub fn is_valid(qs: &Joints) -> bool {
        qs.iter().all(|&q| q.is_finite())
    }
}

/// Translation column of a homogeneous transform.
pub fn translation(t: &Transform) -> Vector3<f64> {
    Vector3::new(t[(0, 3)], t[(1, 3)], t[(2, 3)])
}

/// Rotation block of a homogeneous transform.
pub fn rotation(t: &Transform) -> Matrix3<f64> {
    t.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Roll, pitch, yaw of a rotation matrix (Z-Y-X decomposition).
/// Near pitch = ±90° the decomposition degenerates (gimbal lock); this is not corrected.
pub fn euler_angles(r: &Matrix3<f64>) -> Vector3<f64> {
    let roll = f64::atan2(r[(2, 1)], r[(2, 2)]);
    let pitch = f64::atan2(-r[(2, 0)], (r[(2, 1)].powi(2) + r[(2, 2)].powi(2)).sqrt());
    let yaw = f64::atan2(r[(1, 0)], r[(0, 0)]);
    Vector3::new(roll, pitch, yaw)
}

/// Position and roll/pitch/yaw of a homogeneous transform.
pub fn pose_of(t: &Transform) -> Pose {
    Pose::new(translation(t), euler_angles(&rotation(t)))
}

/// Print joint values, converting radians to degrees.
#[allow(dead_code)]
pub fn dump_joints(joints: &Joints) {
    let mut row_str = String::new();
    for joint_idx in 0..6 {
        let computed = joints[joint_idx];
        row_str.push_str(&format!("{:5.2} ", computed.to_degrees()));
    }
    println!("[{}]", row_str.trim_end());
}

pub fn dump_pose(pose: &Pose) {
    let p = pose.position;
    let o = pose.orientation;
    println!(
        "x: {:.5}, y: {:.5}, z: {:.5},  rpy: {:.3},{:.3},{:.3}",
        p.x,
        p.y,
        p.z,
        o.x.to_degrees(),
        o.y.to_degrees(),
        o.z.to_degrees()
    );
}

/// formatting for YAML output
pub(crate) fn deg(x: &f64) -> String {
    if *x == 0.0 {
        return "0".to_string();
    }
    format!("deg({:.4})", x.to_degrees())
}

pub fn assert_pose_eq(ta: &Pose, tb: &Pose, distance_tolerance: f64, angular_tolerance: f64) -> bool {
    fn bad(ta: &Pose, tb: &Pose) {
        dump_pose(ta);
        dump_pose(tb);
    }

    let translation_distance = (ta.position - tb.position).norm();
    let angular_distance = (ta.orientation - tb.orientation).amax();

    if translation_distance.abs() > distance_tolerance {
        bad(ta, tb);
        panic!("Poses have too different translations");
    }

    if angular_distance > angular_tolerance {
        bad(ta, tb);
        panic!("Poses have too different angles");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::arm_kinematics::*;
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_is_valid_with_all_finite() {
        let qs = [0.0, 1.0, -1.0, 0.5, -0.5, PI];
        assert!(is_valid(&qs));
    }

    #[test]
    fn test_is_valid_with_nan() {
        let qs = [0.0, f64::NAN, 1.0, -1.0, 0.5, -0.5];
        assert!(!is_valid(&qs));
    }

    #[test]
    fn test_euler_of_identity() {
        let rpy = euler_angles(&Matrix3::identity());
        assert_eq!(rpy, Vector3::zeros());
    }

    #[test]
    fn test_euler_yaw_only() {
        let r = nalgebra::Rotation3::from_euler_angles(0.0, 0.0, 0.7);
        let rpy = euler_angles(r.matrix());
        assert!((rpy.z - 0.7).abs() < 1e-12);
        assert!(rpy.x.abs() < 1e-12 && rpy.y.abs() < 1e-12);
    }
}
