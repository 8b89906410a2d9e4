//! Hardcoded DH parameters for the inspection cell arm

pub mod arm_kinematics {
    use crate::parameters::arm_kinematics::{ArmParameters, JointSpec};
    use std::f64::consts::PI;

    impl ArmParameters {
        /// The arm installed in the inspection cell (UR5e-like geometry, meters).
        pub fn inspection_arm() -> Self {
            ArmParameters {
                joints: [
                    JointSpec::new(0.0, 0.0, 0.1625, (-PI, PI)),           // Base
                    JointSpec::new(0.0, -PI / 2.0, 0.0, (-PI / 2.0, PI / 2.0)), // Shoulder
                    JointSpec::new(0.425, 0.0, 0.0, (-PI, PI)),            // Elbow
                    JointSpec::new(0.3922, 0.0, 0.1333, (-PI, PI)),        // Wrist 1
                    JointSpec::new(0.0, -PI / 2.0, 0.0997, (-PI / 2.0, PI / 2.0)), // Wrist 2
                    JointSpec::new(0.0, PI / 2.0, 0.0996, (-PI, PI)),      // Wrist 3
                ],
            }
        }
    }

    impl Default for ArmParameters {
        fn default() -> Self {
            Self::inspection_arm()
        }
    }
}
