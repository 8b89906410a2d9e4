//! Defines the DH parameter data structure of the arm

pub mod arm_kinematics {
    use crate::utils::deg;

    /// Geometry and limits of a single rotary joint, Denavit–Hartenberg convention.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct JointSpec {
        /// Link length, distance along the common normal.
        pub a: f64,

        /// Link twist, angle about the common normal.
        pub alpha: f64,

        /// Link offset along the previous z axis.
        pub d: f64,

        /// Allowed rotation range (min, max), radians.
        pub limits: (f64, f64),
    }

    impl JointSpec {
        pub const fn new(a: f64, alpha: f64, d: f64, limits: (f64, f64)) -> Self {
            JointSpec { a, alpha, d, limits }
        }
    }

    /// Parameters of the arm. See [parameters_robots.rs](parameters_robots.rs) for the
    /// cell arm preset.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ArmParameters {
        /// One entry per joint, base first.
        pub joints: [JointSpec; 6],
    }

    impl ArmParameters {
        /// Height of the shoulder above the base plate.
        pub fn base_height(&self) -> f64 {
            self.joints[0].d
        }

        /// Upper arm length (shoulder to elbow).
        pub fn upper_arm(&self) -> f64 {
            self.joints[2].a
        }

        /// Forearm length (elbow to wrist).
        pub fn forearm(&self) -> f64 {
            self.joints[3].a
        }

        /// Convert to string yaml representation (quick viewing, etc).
        pub fn to_yaml(&self) -> String {
            let mut yaml = String::from("arm_dh_parameters:\n");
            for (i, j) in self.joints.iter().enumerate() {
                yaml.push_str(&format!(
                    "  - joint: {}\n    a: {}\n    alpha: {}\n    d: {}\n    limits: [{}, {}]\n",
                    i,
                    j.a,
                    deg(&j.alpha),
                    j.d,
                    deg(&j.limits.0),
                    deg(&j.limits.1)
                ));
            }
            yaml
        }
    }
}
