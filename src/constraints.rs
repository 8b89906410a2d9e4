use crate::kinematic_traits::Joints;
use crate::parameters::arm_kinematics::ArmParameters;

/// Number of leading joints whose limits are enforced on every move. The wrist joints
/// (3, 4, 5) follow a simplified model and accept any angle when moved.
pub const ENFORCED_JOINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Constraints {
    /// Lower limit, inclusive
    pub from: [f64; 6],

    /// Upper limit, inclusive
    pub to: [f64; 6],
}

impl Constraints {
    pub fn new(from: [f64; 6], to: [f64; 6]) -> Self {
        Constraints { from, to }
    }

    /// Collects the limits of all joints of the arm.
    pub fn from_parameters(parameters: &ArmParameters) -> Self {
        Constraints {
            from: parameters.joints.map(|j| j.limits.0),
            to: parameters.joints.map(|j| j.limits.1),
        }
    }

    /// Checks a single joint against its limits, regardless of whether the joint is enforced.
    pub fn compliant_joint(&self, index: usize, angle: f64) -> bool {
        index < 6 && self.from[index] <= angle && angle <= self.to[index]
    }

    /// All six joints within limits.
    pub fn compliant(&self, angles: &Joints) -> bool {
        (0..6).all(|i| self.compliant_joint(i, angles[i]))
    }

    /// Only the enforced joints (base, shoulder, elbow) within limits.
    pub fn compliant_enforced(&self, angles: &Joints) -> bool {
        (0..ENFORCED_JOINTS).all(|i| self.compliant_joint(i, angles[i]))
    }
}
