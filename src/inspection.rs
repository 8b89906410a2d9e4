//! Inspection sequencing.
//!
//! An [`InspectionOrchestrator`] exclusively owns one arm and one safety machine, plus the
//! camera and analyzer it drives. A sequence of steps is built from the part geometry
//! (optionally narrowed by a named scene) or from poses taught by an operator, then
//! advanced one step per [`InspectionOrchestrator::execute_step`] call. Every start and
//! every step is gated by [`SafetyMachine::is_safe`]; a safety event aborts the active
//! sequence outright.
//!
//! ```
//! use inspection_cell::analysis::InspectionType;
//! use inspection_cell::inspection::InspectionOrchestrator;
//!
//! let mut cell = InspectionOrchestrator::simulated(42);
//! let steps = cell.start_inspection("Small Part", &InspectionType::ScratchesSmall).unwrap();
//! for _ in 0..steps {
//!     cell.execute_step().unwrap();
//! }
//! assert_eq!(cell.results().len(), steps);
//! ```

use crate::analysis::{AnalysisStatus, DefectSimulator, ImageAnalyzer, InspectionType};
use crate::camera::{Camera, SimulatedCamera};
use crate::catalog::{CameraSpec, PartCatalog, PartDimensions};
use crate::grid::{calculate_inspection_grid, InspectionPoint, ViewType};
use crate::kinematic_traits::{Joints, Pose};
use crate::kinematics_impl::ArmKinematics;
use crate::safety::{SafetyMachine, SafetyStatus};
use crate::teach::{CustomScene, SceneConfig};
use nalgebra::Vector3;
use std::fmt;
use tracing::{debug, info, warn};

/// Safety incidents that can be raised through the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyTrigger {
    LightCurtain,
    Door,
    EmergencyStop,
}

/// Named scene narrowing the part grid to some views and fixing inspection type and lighting.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInfo {
    pub name: String,
    pub inspection_type: InspectionType,
    /// Views to keep. Empty keeps the whole grid.
    pub camera_angles: Vec<ViewType>,
    pub lighting: String,
}

impl SceneInfo {
    pub fn new(name: &str) -> Self {
        SceneInfo {
            name: name.to_string(),
            inspection_type: InspectionType::Comprehensive,
            camera_angles: Vec::new(),
            lighting: "standard".to_string(),
        }
    }
}

/// Scene metadata stamped onto grid steps of a scene based sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStamp {
    pub name: String,
    pub inspection_type: InspectionType,
    pub lighting: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InspectionStep {
    /// Viewpoint from the part grid, reached through inverse kinematics.
    Grid {
        point: InspectionPoint,
        scene: Option<SceneStamp>,
    },
    /// Pose taught by an operator, replayed from its joint angles.
    Taught {
        joint_angles: Joints,
        pose: Pose,
        description: String,
        scene_config: SceneConfig,
        scene_name: String,
    },
}

impl InspectionStep {
    pub fn description(&self) -> &str {
        match self {
            InspectionStep::Grid { point, .. } => &point.description,
            InspectionStep::Taught { description, .. } => description,
        }
    }

    /// Where the camera looks from.
    pub fn pose(&self) -> Pose {
        match self {
            InspectionStep::Grid { point, .. } => point.pose(),
            InspectionStep::Taught { pose, .. } => *pose,
        }
    }

    pub fn view_type(&self) -> ViewType {
        match self {
            InspectionStep::Grid { point, .. } => point.view_type,
            InspectionStep::Taught { scene_config, .. } => scene_config.view_type,
        }
    }

    /// Inspection type the step is analyzed with: taught and scene steps carry their own,
    /// plain grid steps use the one of the sequence.
    pub fn effective_inspection_type<'a>(&'a self, sequence_type: &'a InspectionType) -> &'a InspectionType {
        match self {
            InspectionStep::Grid { scene: Some(scene), .. } => &scene.inspection_type,
            InspectionStep::Grid { scene: None, .. } => sequence_type,
            InspectionStep::Taught { scene_config, .. } => &scene_config.inspection_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionSequence {
    pub part: String,
    pub inspection_type: InspectionType,
    pub steps: Vec<InspectionStep>,
    cursor: usize,
}

impl InspectionSequence {
    fn new(part: &str, inspection_type: InspectionType, steps: Vec<InspectionStep>) -> Self {
        InspectionSequence {
            part: part.to_string(),
            inspection_type,
            steps,
            cursor: 0,
        }
    }

    /// Index of the next step to execute.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.steps.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionResult {
    pub step: usize,
    pub inspection_type: InspectionType,
    pub view_type: ViewType,
    pub status: AnalysisStatus,
    pub defects: Vec<String>,
    pub description: String,
    /// Description of the step the result was taken at
    pub step_description: String,
    pub scene_name: Option<String>,
    pub lighting: Option<String>,
    pub camera_settings: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionStatus {
    pub is_running: bool,
    pub current_step: usize,
    pub total_steps: usize,
    pub results: Vec<InspectionResult>,
}

/// Pass/fail tally of the results collected so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionSummary {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    /// Every defect reported, in step order
    pub defects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InspectionError {
    /// Safety interlocks do not permit motion
    Unsafe,
    UnknownPart(String),
    UnsupportedInspection {
        part: String,
        inspection_type: InspectionType,
    },
    /// No steps left after planning
    EmptySequence,
    /// The camera spec cannot tile a part
    InvalidCamera { field: String, reason: String },
    /// The part needs more viewpoints than a grid may hold
    GridTooLarge(String),
}

impl fmt::Display for InspectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionError::Unsafe => write!(f, "Safety check failed"),
            InspectionError::UnknownPart(part) => write!(f, "Unknown part type: {}", part),
            InspectionError::UnsupportedInspection { part, inspection_type } => {
                write!(f, "Invalid inspection type {} for part {}", inspection_type, part)
            }
            InspectionError::EmptySequence => write!(f, "Inspection sequence has no steps"),
            InspectionError::InvalidCamera { field, reason } => {
                write!(f, "Invalid camera {}: {}", field, reason)
            }
            InspectionError::GridTooLarge(part) => {
                write!(f, "Inspection grid for part {} is too large", part)
            }
        }
    }
}

impl std::error::Error for InspectionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    NoActiveSequence,
    SequenceComplete,
    Unsafe,
    /// The arm could not reach the step, the step can be retried
    MotionFailed { step: usize },
    /// The camera returned no image, the step can be retried
    CaptureFailed { step: usize },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::NoActiveSequence => write!(f, "No active inspection sequence"),
            StepError::SequenceComplete => write!(f, "Inspection sequence completed"),
            StepError::Unsafe => write!(f, "Safety check failed"),
            StepError::MotionFailed { step } => write!(f, "Failed to move arm for step {}", step),
            StepError::CaptureFailed { step } => write!(f, "Failed to capture image for step {}", step),
        }
    }
}

impl std::error::Error for StepError {}

/// Views used by each inspection type. None means the whole grid.
fn views_for(inspection_type: &InspectionType) -> Option<&'static [ViewType]> {
    match inspection_type {
        InspectionType::ScratchesSmall => Some(&[ViewType::Top]),
        InspectionType::ScratchesLarge => Some(&[ViewType::Top, ViewType::Front, ViewType::Back]),
        InspectionType::Fingerprints | InspectionType::EdgeQuality => {
            Some(&[ViewType::Front, ViewType::Back])
        }
        _ => None,
    }
}

pub struct InspectionOrchestrator {
    arm: ArmKinematics,
    safety: SafetyMachine,
    catalog: PartCatalog,
    camera_spec: CameraSpec,
    camera: Box<dyn Camera>,
    analyzer: Box<dyn ImageAnalyzer>,
    sequence: Option<InspectionSequence>,
    results: Vec<InspectionResult>,
}

impl InspectionOrchestrator {
    pub fn new(
        arm: ArmKinematics,
        safety: SafetyMachine,
        catalog: PartCatalog,
        camera_spec: CameraSpec,
        camera: Box<dyn Camera>,
        analyzer: Box<dyn ImageAnalyzer>,
    ) -> Self {
        InspectionOrchestrator {
            arm,
            safety,
            catalog,
            camera_spec,
            camera,
            analyzer,
            sequence: None,
            results: Vec::new(),
        }
    }

    /// Default cell with the simulated camera and a seeded defect simulator.
    pub fn simulated(seed: u64) -> Self {
        let camera_spec = CameraSpec::default();
        InspectionOrchestrator::new(
            ArmKinematics::default(),
            SafetyMachine::new(),
            PartCatalog::default(),
            camera_spec,
            Box::new(SimulatedCamera::from_spec(&camera_spec)),
            Box::new(DefectSimulator::seeded(seed)),
        )
    }

    pub fn arm(&self) -> &ArmKinematics {
        &self.arm
    }

    pub fn safety(&self) -> &SafetyMachine {
        &self.safety
    }

    pub fn catalog(&self) -> &PartCatalog {
        &self.catalog
    }

    pub fn camera_spec(&self) -> &CameraSpec {
        &self.camera_spec
    }

    pub fn available_parts(&self) -> Vec<&str> {
        self.catalog.part_names()
    }

    pub fn sequence(&self) -> Option<&InspectionSequence> {
        self.sequence.as_ref()
    }

    pub fn results(&self) -> &[InspectionResult] {
        &self.results
    }

    /// Grid based sequence for the part, narrowed to the views the inspection type needs.
    /// Returns the number of steps.
    pub fn start_inspection(
        &mut self,
        part_type: &str,
        inspection_type: &InspectionType,
    ) -> Result<usize, InspectionError> {
        self.check_safety()?;
        let part = self
            .catalog
            .get(part_type)
            .ok_or_else(|| InspectionError::UnknownPart(part_type.to_string()))?;
        if !part.supports(inspection_type) {
            return Err(InspectionError::UnsupportedInspection {
                part: part_type.to_string(),
                inspection_type: inspection_type.clone(),
            });
        }

        let views = views_for(inspection_type);
        let steps: Vec<InspectionStep> = self
            .grid_for(part_type, &part.dimensions)?
            .into_iter()
            .filter(|p| views.is_none_or(|v| v.contains(&p.view_type)))
            .map(|point| InspectionStep::Grid { point, scene: None })
            .collect();

        info!("Starting inspection for part: {part_type}, type: {inspection_type}");
        self.accept(InspectionSequence::new(part_type, inspection_type.clone(), steps))
    }

    /// Grid based sequence narrowed to the views of a named scene, every step analyzed with
    /// the scene inspection type.
    pub fn start_inspection_from_scene(
        &mut self,
        part_type: &str,
        scene: &SceneInfo,
    ) -> Result<usize, InspectionError> {
        self.check_safety()?;
        let part = self
            .catalog
            .get(part_type)
            .ok_or_else(|| InspectionError::UnknownPart(part_type.to_string()))?;

        let stamp = SceneStamp {
            name: scene.name.clone(),
            inspection_type: scene.inspection_type.clone(),
            lighting: scene.lighting.clone(),
        };
        let steps: Vec<InspectionStep> = self
            .grid_for(part_type, &part.dimensions)?
            .into_iter()
            .filter(|p| scene.camera_angles.is_empty() || scene.camera_angles.contains(&p.view_type))
            .map(|point| InspectionStep::Grid {
                point,
                scene: Some(stamp.clone()),
            })
            .collect();

        info!(
            "Starting scene '{}' for part: {part_type}, type: {}, lighting: {}",
            scene.name, scene.inspection_type, scene.lighting
        );
        self.accept(InspectionSequence::new(part_type, scene.inspection_type.clone(), steps))
    }

    /// Sequence replaying the poses of a taught scene, one step per pose.
    pub fn start_inspection_from_custom_scene(
        &mut self,
        part_type: &str,
        custom_scene: &CustomScene,
    ) -> Result<usize, InspectionError> {
        self.check_safety()?;
        if self.catalog.get(part_type).is_none() {
            return Err(InspectionError::UnknownPart(part_type.to_string()));
        }

        let steps: Vec<InspectionStep> = custom_scene
            .poses
            .iter()
            .map(|pose| InspectionStep::Taught {
                joint_angles: pose.joint_angles,
                pose: pose.end_effector_pose(),
                description: pose.description.clone(),
                scene_config: pose.scene_config.clone(),
                scene_name: custom_scene.name.clone(),
            })
            .collect();

        info!("Starting custom scene '{}' for part: {part_type}", custom_scene.name);
        for (i, step) in steps.iter().enumerate() {
            if let InspectionStep::Taught { scene_config, .. } = step {
                debug!(
                    "  Step {}: {} - {} - {} - {}",
                    i + 1,
                    step.description(),
                    scene_config.inspection_type,
                    scene_config.view_type,
                    scene_config.lighting
                );
            }
        }
        self.accept(InspectionSequence::new(part_type, InspectionType::CustomScene, steps))
    }

    fn check_safety(&self) -> Result<(), InspectionError> {
        if self.safety.is_safe() {
            Ok(())
        } else {
            warn!("Safety check failed - cannot start inspection");
            Err(InspectionError::Unsafe)
        }
    }

    fn grid_for(
        &self,
        part_type: &str,
        dimensions: &PartDimensions,
    ) -> Result<Vec<InspectionPoint>, InspectionError> {
        self.camera_spec.validate().map_err(|(field, reason)| {
            warn!("Camera {field} rejected: {reason}");
            InspectionError::InvalidCamera {
                field: field.to_string(),
                reason,
            }
        })?;
        calculate_inspection_grid(dimensions, &self.camera_spec).ok_or_else(|| {
            warn!("Inspection grid for part {part_type} is too large");
            InspectionError::GridTooLarge(part_type.to_string())
        })
    }

    fn accept(&mut self, sequence: InspectionSequence) -> Result<usize, InspectionError> {
        if sequence.is_empty() {
            warn!("Inspection sequence for {} has no steps", sequence.part);
            return Err(InspectionError::EmptySequence);
        }
        let steps = sequence.len();
        info!("Inspection sequence created with {steps} steps");
        self.sequence = Some(sequence);
        self.results.clear();
        Ok(steps)
    }

    /// Moves to the current step, captures, analyzes and records the result, then advances.
    /// A failed move or capture leaves the cursor in place so the step can be retried.
    pub fn execute_step(&mut self) -> Result<InspectionResult, StepError> {
        let (index, step, sequence_type) = match &self.sequence {
            None => return Err(StepError::NoActiveSequence),
            Some(sequence) if sequence.is_complete() => return Err(StepError::SequenceComplete),
            Some(sequence) => (
                sequence.cursor,
                sequence.steps[sequence.cursor].clone(),
                sequence.inspection_type.clone(),
            ),
        };
        if !self.safety.is_safe() {
            warn!("Safety check failed - cannot execute step {index}");
            return Err(StepError::Unsafe);
        }

        let moved = match &step {
            InspectionStep::Taught { joint_angles, .. } => self.arm.move_to_joints(joint_angles),
            InspectionStep::Grid { point, .. } => self.drive_to_pose(&point.position, &point.orientation),
        };
        if !moved {
            warn!("Failed to move arm for step {index}");
            return Err(StepError::MotionFailed { step: index });
        }

        let pose = step.pose();
        let image = self
            .camera
            .capture(&pose.position, &pose.orientation, step.description())
            .ok_or(StepError::CaptureFailed { step: index })?;

        let inspection_type = step.effective_inspection_type(&sequence_type).clone();
        let analysis = self.analyzer.analyze(&image, &inspection_type);

        let (scene_name, lighting, camera_settings) = match &step {
            InspectionStep::Grid { scene: Some(scene), .. } => {
                (Some(scene.name.clone()), Some(scene.lighting.clone()), None)
            }
            InspectionStep::Grid { scene: None, .. } => (None, None, None),
            InspectionStep::Taught { scene_config, scene_name, .. } => (
                Some(scene_name.clone()),
                Some(scene_config.lighting.clone()),
                Some(scene_config.camera_settings.clone()),
            ),
        };

        let result = InspectionResult {
            step: index,
            inspection_type,
            view_type: step.view_type(),
            status: analysis.status,
            defects: analysis.defects,
            description: analysis.description,
            step_description: step.description().to_string(),
            scene_name,
            lighting,
            camera_settings,
        };
        self.results.push(result.clone());
        if let Some(sequence) = self.sequence.as_mut() {
            sequence.cursor += 1;
        }
        debug!("Step {index} completed: {:?}", result.status);
        Ok(result)
    }

    /// Ends the sequence. Results collected so far stay available.
    pub fn stop_inspection(&mut self) {
        if self.sequence.take().is_some() {
            info!("Inspection stopped");
        }
    }

    pub fn status(&self) -> InspectionStatus {
        InspectionStatus {
            is_running: self.sequence.is_some(),
            current_step: self.sequence.as_ref().map_or(0, |s| s.cursor),
            total_steps: self.sequence.as_ref().map_or(0, |s| s.len()),
            results: self.results.clone(),
        }
    }

    pub fn summary(&self) -> InspectionSummary {
        self.results.iter().fold(InspectionSummary::default(), |mut summary, r| {
            match r.status {
                AnalysisStatus::Pass => summary.passed += 1,
                AnalysisStatus::Fail => summary.failed += 1,
                AnalysisStatus::Error => summary.errors += 1,
            }
            summary.defects.extend(r.defects.iter().cloned());
            summary
        })
    }

    /// Raises a safety incident. Any active sequence is aborted.
    pub fn trigger_safety_event(&mut self, trigger: SafetyTrigger) {
        match trigger {
            SafetyTrigger::LightCurtain => self.safety.trigger_light_curtain_break(),
            SafetyTrigger::Door => self.safety.trigger_door_open(),
            SafetyTrigger::EmergencyStop => return self.trigger_emergency_stop(),
        }
        self.stop_inspection();
    }

    /// Emergency stop: aborts the sequence and discards its results.
    pub fn trigger_emergency_stop(&mut self) {
        self.safety.trigger_emergency_stop();
        self.sequence = None;
        self.results.clear();
    }

    pub fn reset_safety_system(&mut self) -> bool {
        self.safety.reset()
    }

    pub fn reset_emergency_stop(&mut self) {
        self.safety.reset_emergency_stop();
    }

    pub fn reset_light_curtain(&mut self) {
        self.safety.reset_light_curtain();
    }

    pub fn reset_door(&mut self) {
        self.safety.reset_door();
    }

    pub fn safety_status(&self) -> SafetyStatus {
        self.safety.status()
    }

    /// Manual jog of a single joint, refused when the cell is not safe.
    pub fn move_joint(&mut self, index: usize, angle: f64) -> bool {
        if !self.safety.is_safe() {
            warn!("Safety check failed - joint {index} not moved");
            return false;
        }
        self.arm.move_joint(index, angle)
    }

    /// Moves the arm to a Cartesian target (click-to-move, grid steps), refused when the
    /// cell is not safe.
    pub fn move_to_pose(&mut self, position: &Vector3<f64>, orientation: &Vector3<f64>) -> bool {
        if !self.safety.is_safe() {
            warn!("Safety check failed - arm not moved");
            return false;
        }
        self.drive_to_pose(position, orientation)
    }

    /// Back to home position, refused when the cell is not safe.
    pub fn reset_arm(&mut self) -> bool {
        if !self.safety.is_safe() {
            return false;
        }
        self.arm.reset();
        true
    }

    fn drive_to_pose(&mut self, position: &Vector3<f64>, orientation: &Vector3<f64>) -> bool {
        match self.arm.calculate_inverse_kinematics(position, orientation) {
            Some(qs) => self.arm.move_to_joints(&qs),
            None => {
                warn!("Failed to calculate inverse kinematics for {position:?}");
                false
            }
        }
    }
}

impl fmt::Debug for InspectionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectionOrchestrator")
            .field("arm", &self.arm)
            .field("safety", &self.safety)
            .field("sequence", &self.sequence)
            .field("results", &self.results.len())
            .finish()
    }
}
