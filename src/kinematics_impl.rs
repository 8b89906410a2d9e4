//! Kinematic model of the cell arm: DH forward kinematics, the simplified geometric
//! inverse kinematics and joint state tracking.
//!
//! The inverse kinematics is an approximation. `move_to_pose` solves a planar two-link
//! problem for base, shoulder and elbow and copies the target orientation into the wrist
//! joints. `calculate_inverse_kinematics` is cruder still (elbow mirrors the shoulder,
//! wrist at zero) and is what inspection sequences drive the arm with.

use crate::constraints::{Constraints, ENFORCED_JOINTS};
use crate::kinematic_traits::{Joints, Kinematics, Pose, Transform, JOINTS_AT_ZERO};
use crate::parameters::arm_kinematics::{ArmParameters, JointSpec};
use crate::pid::JointPid;
use crate::utils::{arm_kinematics::is_valid, pose_of, translation};
use nalgebra::{Matrix4, Vector3};
use tracing::{debug, warn};

/// Default position tolerance of `move_to_pose`.
pub const POSE_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct ArmKinematics {
    parameters: ArmParameters,
    constraints: Constraints,
    joint_angles: Joints,
    controllers: [JointPid; 6],
}

/// Transform of a single link for the given joint angle.
#[rustfmt::skip]
pub fn dh_transform(joint: &JointSpec, theta: f64) -> Transform {
    let (st, ct) = theta.sin_cos();
    let (sa, ca) = joint.alpha.sin_cos();
    Matrix4::new(
        ct, -st * ca, st * sa, joint.a * ct,
        st, ct * ca, -ct * sa, joint.a * st,
        0.0, sa, ca, joint.d,
        0.0, 0.0, 0.0, 1.0,
    )
}

impl ArmKinematics {
    /// Creates the arm at the home position (all joints at zero).
    pub fn new(parameters: ArmParameters) -> Self {
        ArmKinematics {
            constraints: Constraints::from_parameters(&parameters),
            parameters,
            joint_angles: JOINTS_AT_ZERO,
            controllers: std::array::from_fn(|_| JointPid::joint_default()),
        }
    }

    pub fn parameters(&self) -> &ArmParameters {
        &self.parameters
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Current joint angles.
    pub fn joint_angles(&self) -> Joints {
        self.joint_angles
    }

    /// Per-joint regulators, for a host loop driving the joints towards their setpoints.
    pub fn joint_controllers_mut(&mut self) -> &mut [JointPid; 6] {
        &mut self.controllers
    }

    /// Chains the link transforms for the given joint angles.
    pub fn forward_kinematics(&self, qs: &Joints) -> Transform {
        self.parameters
            .joints
            .iter()
            .zip(qs.iter())
            .fold(Transform::identity(), |t, (joint, &theta)| t * dh_transform(joint, theta))
    }

    /// Position and roll/pitch/yaw of the end effector at the current joint angles.
    pub fn end_effector_pose(&self) -> Pose {
        pose_of(&self.forward_kinematics(&self.joint_angles))
    }

    /// Origins of the base and of every joint frame (7 points), for the current state.
    pub fn joint_positions(&self) -> Vec<Vector3<f64>> {
        let mut t = Transform::identity();
        let mut positions = Vec::with_capacity(7);
        positions.push(translation(&t));
        for (joint, &theta) in self.parameters.joints.iter().zip(self.joint_angles.iter()) {
            t *= dh_transform(joint, theta);
            positions.push(translation(&t));
        }
        positions
    }

    /// Moves a single joint. Base, shoulder and elbow reject angles outside their limits
    /// and keep their state. The wrist joints accept any angle.
    pub fn move_joint(&mut self, index: usize, angle: f64) -> bool {
        if index >= 6 || !angle.is_finite() {
            warn!("Joint {index} cannot be set to {angle}");
            return false;
        }
        if index < ENFORCED_JOINTS && !self.constraints.compliant_joint(index, angle) {
            warn!(
                "Joint {index} angle {angle} out of limits ({}, {})",
                self.constraints.from[index], self.constraints.to[index]
            );
            return false;
        }
        self.joint_angles[index] = angle;
        debug!("Joint {index} set to {angle}");
        true
    }

    /// Applies all six angles at once. Rejected without any change if base, shoulder or
    /// elbow would leave their limits.
    pub fn move_to_joints(&mut self, qs: &Joints) -> bool {
        if !is_valid(qs) || !self.constraints.compliant_enforced(qs) {
            warn!("Joint angles {qs:?} rejected");
            return false;
        }
        self.joint_angles = *qs;
        true
    }

    /// Moves the end effector towards the target using the geometric approximation,
    /// succeeding if the reached position is closer than `POSE_TOLERANCE`.
    pub fn move_to_pose(&mut self, position: &Vector3<f64>, orientation: &Vector3<f64>) -> bool {
        self.move_to_pose_with_tolerance(position, orientation, POSE_TOLERANCE)
    }

    /// Solves base, shoulder and elbow for the target position and copies roll, pitch and
    /// yaw into the wrist joints. The attempted solution stays applied even if the
    /// target is missed; only a solution that would break base, shoulder or elbow limits
    /// is not applied.
    pub fn move_to_pose_with_tolerance(
        &mut self,
        position: &Vector3<f64>,
        orientation: &Vector3<f64>,
        tolerance: f64,
    ) -> bool {
        let (x, y) = (position.x, position.y);
        let r = (x * x + y * y).sqrt();
        let z = position.z - self.parameters.base_height();

        let l1 = self.parameters.upper_arm();
        let l2 = self.parameters.forearm();

        let cos_elbow = ((r * r + z * z - l1 * l1 - l2 * l2) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
        let elbow = cos_elbow.acos();

        let k1 = l1 + l2 * elbow.cos();
        let k2 = l2 * elbow.sin();
        let shoulder = f64::atan2(z, r) - f64::atan2(k2, k1);

        let attempt: Joints = [
            f64::atan2(y, x),
            shoulder,
            elbow,
            orientation.x,
            orientation.y,
            orientation.z,
        ];

        if !self.move_to_joints(&attempt) {
            return false;
        }

        let reached = translation(&self.forward_kinematics(&self.joint_angles));
        let error = (position - reached).norm();
        debug!("move_to_pose position error {error}");
        error < tolerance
    }

    /// Crude closed form: base yaw, shoulder pointing at the target, elbow mirroring the
    /// shoulder and the wrist at zero. None if any joint would leave its limits.
    pub fn calculate_inverse_kinematics(
        &self,
        position: &Vector3<f64>,
        _orientation: &Vector3<f64>,
    ) -> Option<Joints> {
        let (x, y, z) = (position.x, position.y, position.z);

        let theta1 = f64::atan2(y, x);
        let r = (x * x + y * y).sqrt();
        let d = z - self.parameters.base_height();

        let theta2 = f64::atan2(d, r);
        let theta3 = -theta2;

        let qs = [theta1, theta2, theta3, 0.0, 0.0, 0.0];
        if is_valid(&qs) && self.constraints.compliant(&qs) {
            Some(qs)
        } else {
            debug!("Solution {qs:?} outside joint limits");
            None
        }
    }

    /// Home position, all regulators reset.
    pub fn reset(&mut self) {
        self.joint_angles = JOINTS_AT_ZERO;
        for controller in self.controllers.iter_mut() {
            controller.reset();
        }
    }
}

impl Default for ArmKinematics {
    fn default() -> Self {
        ArmKinematics::new(ArmParameters::inspection_arm())
    }
}

impl Kinematics for ArmKinematics {
    fn inverse(&self, pose: &Pose) -> Option<Joints> {
        self.calculate_inverse_kinematics(&pose.position, &pose.orientation)
    }

    fn forward(&self, qs: &Joints) -> Transform {
        self.forward_kinematics(qs)
    }
}
