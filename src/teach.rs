//! Teach-by-touch: poses recorded from the arm by an operator, grouped into custom scenes
//! that can be replayed as inspection sequences. Custom scenes are stored as JSON:
//!
//! ```json
//! {
//!   "name": "Fixture check",
//!   "description": "Two corners of the fixture",
//!   "poses": [{
//!     "joint_positions": [[0, 0, 0], [0, 0, 0.1625]],
//!     "joint_angles": [0.1, 0.2, 0.3, 0, 0, 0],
//!     "end_effector_position": [0.4, 0.1, 0.3],
//!     "end_effector_orientation": [0, 0, 0],
//!     "description": "Left corner",
//!     "scene_config": {
//!       "inspection_type": "fingerprints",
//!       "view_type": "front_view",
//!       "lighting": "ring",
//!       "camera_settings": "high_gain"
//!     }
//!   }]
//! }
//! ```

use crate::analysis::InspectionType;
use crate::config_error::ConfigError;
use crate::grid::ViewType;
use crate::kinematic_traits::{Joints, Pose};
use crate::kinematics_impl::ArmKinematics;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a recorded pose is inspected. Missing fields take the custom scene defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub inspection_type: InspectionType,
    pub view_type: ViewType,
    pub lighting: String,
    pub camera_settings: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            inspection_type: InspectionType::CustomScene,
            view_type: ViewType::Custom,
            lighting: "standard".to_string(),
            camera_settings: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPose {
    /// Origins of the base and joint frames when the pose was recorded
    pub joint_positions: Vec<[f64; 3]>,
    pub joint_angles: Joints,
    pub end_effector_position: [f64; 3],
    pub end_effector_orientation: [f64; 3],
    pub description: String,
    #[serde(default)]
    pub scene_config: SceneConfig,
}

impl RecordedPose {
    /// Records the current state of the arm.
    pub fn record(arm: &ArmKinematics, description: &str, scene_config: SceneConfig) -> Self {
        let pose = arm.end_effector_pose();
        RecordedPose {
            joint_positions: arm.joint_positions().iter().map(|p| [p.x, p.y, p.z]).collect(),
            joint_angles: arm.joint_angles(),
            end_effector_position: pose.position.into(),
            end_effector_orientation: pose.orientation.into(),
            description: description.to_string(),
            scene_config,
        }
    }

    pub fn end_effector_pose(&self) -> Pose {
        Pose::from_arrays(self.end_effector_position, self.end_effector_orientation)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomScene {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub poses: Vec<RecordedPose>,
}

impl CustomScene {
    pub fn new(name: &str, description: &str) -> Self {
        CustomScene {
            name: name.to_string(),
            description: description.to_string(),
            poses: Vec::new(),
        }
    }

    pub fn push(&mut self, pose: RecordedPose) {
        self.poses.push(pose);
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
