use nalgebra::Vector3;

use crate::analysis::{AnalysisStatus, InspectionType};
use crate::camera::SimulatedCamera;
use crate::catalog::{CameraSpec, Part, PartCatalog, PartDimensions};
use crate::grid::ViewType;
use crate::inspection::{InspectionError, InspectionOrchestrator, SafetyTrigger, SceneInfo, StepError};
use crate::kinematic_traits::JOINTS_AT_ZERO;
use crate::kinematics_impl::ArmKinematics;
use crate::safety::SafetyMachine;
use crate::tests::test_utils::{always_defect, cell_with, clean_cell, never_defect, FlakyCamera};

fn run_to_end(cell: &mut InspectionOrchestrator) -> usize {
    let mut executed = 0;
    while cell.execute_step().is_ok() {
        executed += 1;
    }
    executed
}

#[test]
fn test_small_part_top_grid() {
    let mut cell = clean_cell();
    let steps = cell
        .start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");
    assert_eq!(steps, 4);
    let sequence = cell.sequence().expect("active sequence");
    assert!(sequence.steps.iter().all(|s| s.view_type() == ViewType::Top));
}

#[test]
fn test_views_per_inspection_type() {
    let mut cell = clean_cell();
    assert_eq!(cell.start_inspection("Small Part", &InspectionType::Fingerprints), Ok(4));
    assert_eq!(cell.start_inspection("Medium Part", &InspectionType::SurfaceQuality), Ok(9 + 2 * 3 * 2));
    assert_eq!(cell.start_inspection("Medium Part", &InspectionType::ScratchesLarge), Ok(9 + 2 * 3 * 2));
    assert_eq!(cell.start_inspection("Large Part", &InspectionType::EdgeQuality), Ok(2 * 6 * 3));
}

#[test]
fn test_execute_without_sequence() {
    let mut cell = clean_cell();
    assert_eq!(cell.execute_step(), Err(StepError::NoActiveSequence));
    assert_eq!(cell.arm().joint_angles(), JOINTS_AT_ZERO);
    assert!(cell.results().is_empty());
    let status = cell.status();
    assert!(!status.is_running);
    assert_eq!(status.current_step, 0);
    assert_eq!(status.total_steps, 0);
}

#[test]
fn test_full_run_records_every_step() {
    let mut cell = InspectionOrchestrator::simulated(11);
    let steps = cell
        .start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");

    assert_eq!(run_to_end(&mut cell), steps);
    let results = cell.results();
    assert_eq!(results.len(), steps);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.step, i);
        assert_eq!(result.inspection_type, InspectionType::ScratchesSmall);
        assert_eq!(result.view_type, ViewType::Top);
        assert_ne!(result.status, AnalysisStatus::Error);
    }

    let status = cell.status();
    assert!(status.is_running);
    assert_eq!(status.current_step, steps);
    assert_eq!(cell.execute_step(), Err(StepError::SequenceComplete));
    assert_eq!(cell.results().len(), steps);
}

#[test]
fn test_arm_follows_grid() {
    let mut cell = clean_cell();
    cell.start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");
    cell.execute_step().expect("first step");
    // First top point is at (-50, -50, 300)
    let qs = cell.arm().joint_angles();
    assert!((qs[0] - f64::atan2(-50.0, -50.0)).abs() < 1e-12);
    assert!(qs[1] > 0.0 && qs[1] < std::f64::consts::FRAC_PI_2);
    assert_eq!(qs[2], -qs[1]);
}

#[test]
fn test_deterministic_defects() {
    let mut cell = cell_with(SimulatedCamera::default(), always_defect());
    cell.start_inspection("Small Part", &InspectionType::Fingerprints)
        .expect("inspection started");
    run_to_end(&mut cell);
    assert!(cell.results().iter().all(|r| r.status == AnalysisStatus::Fail));
    assert!(cell.results().iter().all(|r| r.defects == vec!["fingerprint".to_string()]));

    let summary = cell.summary();
    assert_eq!(summary.failed, 4);
    assert_eq!(summary.passed, 0);
    assert_eq!(summary.defects.len(), 4);

    let mut clean = clean_cell();
    clean.start_inspection("Small Part", &InspectionType::Fingerprints)
        .expect("inspection started");
    run_to_end(&mut clean);
    assert_eq!(clean.summary().passed, 4);
}

#[test]
fn test_same_seed_same_results() {
    let run = || {
        let mut cell = InspectionOrchestrator::simulated(99);
        cell.start_inspection("Large Part", &InspectionType::SurfaceQuality)
            .expect("inspection started");
        run_to_end(&mut cell);
        cell.results().iter().map(|r| r.status).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_emergency_stop_mid_sequence() {
    let mut cell = clean_cell();
    cell.start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");
    cell.execute_step().expect("first step");
    cell.execute_step().expect("second step");

    cell.trigger_emergency_stop();
    assert!(cell.sequence().is_none());
    let status = cell.status();
    assert_eq!(status.current_step, 0);
    assert!(status.results.is_empty());
    assert_eq!(cell.execute_step(), Err(StepError::NoActiveSequence));

    // No new sequence while the emergency stop is active
    assert_eq!(
        cell.start_inspection("Small Part", &InspectionType::ScratchesSmall),
        Err(InspectionError::Unsafe)
    );
    assert!(!cell.reset_safety_system());

    cell.reset_emergency_stop();
    assert!(cell.reset_safety_system());
    assert_eq!(cell.start_inspection("Small Part", &InspectionType::ScratchesSmall), Ok(4));
    assert!(cell.execute_step().is_ok());
}

#[test]
fn test_safety_event_aborts_sequence() {
    let mut cell = clean_cell();
    cell.start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");
    cell.execute_step().expect("first step");

    cell.trigger_safety_event(SafetyTrigger::LightCurtain);
    assert!(cell.sequence().is_none());
    assert_eq!(cell.results().len(), 1);
    assert_eq!(cell.execute_step(), Err(StepError::NoActiveSequence));

    cell.reset_light_curtain();
    assert!(cell.safety().is_safe());
    assert!(cell.start_inspection("Small Part", &InspectionType::ScratchesSmall).is_ok());
    assert!(cell.results().is_empty());
}

#[test]
fn test_emergency_stop_as_safety_event() {
    let mut cell = clean_cell();
    cell.start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");
    cell.execute_step().expect("first step");
    cell.trigger_safety_event(SafetyTrigger::EmergencyStop);
    assert!(cell.sequence().is_none());
    assert!(cell.results().is_empty());
    assert!(cell.safety().emergency_stop_active());
}

#[test]
fn test_door_open_aborts_sequence() {
    let mut cell = clean_cell();
    cell.start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");
    cell.execute_step().expect("first step");
    let joints = cell.arm().joint_angles();

    cell.trigger_safety_event(SafetyTrigger::Door);
    assert_eq!(cell.execute_step(), Err(StepError::NoActiveSequence));
    assert_eq!(cell.arm().joint_angles(), joints);
    assert!(!cell.safety_status().door_closed);
}

#[test]
fn test_rejected_start_keeps_previous_sequence() {
    let mut cell = clean_cell();
    cell.start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");
    cell.execute_step().expect("first step");
    let before = cell.sequence().cloned();

    assert_eq!(
        cell.start_inspection("Tiny Part", &InspectionType::ScratchesSmall),
        Err(InspectionError::UnknownPart("Tiny Part".to_string()))
    );
    assert!(matches!(
        cell.start_inspection("Small Part", &InspectionType::EdgeQuality),
        Err(InspectionError::UnsupportedInspection { .. })
    ));
    assert!(matches!(
        cell.start_inspection_from_scene("Tiny Part", &SceneInfo::new("scene")),
        Err(InspectionError::UnknownPart(_))
    ));

    let mut custom_views = SceneInfo::new("nothing");
    custom_views.camera_angles = vec![ViewType::Custom];
    assert_eq!(
        cell.start_inspection_from_scene("Small Part", &custom_views),
        Err(InspectionError::EmptySequence)
    );

    assert_eq!(cell.sequence().cloned(), before);
    assert_eq!(cell.status().current_step, 1);
    assert_eq!(cell.results().len(), 1);
}

#[test]
fn test_scene_inspection() {
    let mut cell = clean_cell();
    let scene = SceneInfo {
        name: "Front lit".to_string(),
        inspection_type: InspectionType::EdgeQuality,
        camera_angles: vec![ViewType::Front],
        lighting: "low_angle".to_string(),
    };
    // The scene decides the inspection type, the part catalog is not consulted for it
    assert_eq!(cell.start_inspection_from_scene("Small Part", &scene), Ok(2));
    run_to_end(&mut cell);

    let results = cell.results();
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result.inspection_type, InspectionType::EdgeQuality);
        assert_eq!(result.view_type, ViewType::Front);
        assert_eq!(result.scene_name.as_deref(), Some("Front lit"));
        assert_eq!(result.lighting.as_deref(), Some("low_angle"));
    }
}

#[test]
fn test_scene_without_angles_uses_full_grid() {
    let mut cell = clean_cell();
    assert_eq!(cell.start_inspection_from_scene("Small Part", &SceneInfo::new("all")), Ok(8));
    let result = cell.execute_step().expect("first step");
    assert_eq!(result.inspection_type, InspectionType::Comprehensive);
}

#[test]
fn test_capture_failure_is_resumable() {
    let mut cell = cell_with(FlakyCamera::new(2), always_defect());
    cell.start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");

    assert_eq!(cell.execute_step(), Err(StepError::CaptureFailed { step: 0 }));
    assert_eq!(cell.execute_step(), Err(StepError::CaptureFailed { step: 0 }));
    assert_eq!(cell.status().current_step, 0);
    assert!(cell.results().is_empty());

    let result = cell.execute_step().expect("camera recovered");
    assert_eq!(result.step, 0);
    assert_eq!(cell.status().current_step, 1);
}

#[test]
fn test_manual_motion_gated_by_safety() {
    let mut cell = clean_cell();
    assert!(cell.move_joint(0, 0.4));

    cell.trigger_safety_event(SafetyTrigger::Door);
    assert!(!cell.move_joint(0, 0.8));
    assert!(!cell.move_to_pose(&Vector3::new(100.0, 0.0, 300.0), &Vector3::zeros()));
    assert!(!cell.reset_arm());
    assert_eq!(cell.arm().joint_angles()[0], 0.4);

    cell.reset_door();
    assert!(cell.move_to_pose(&Vector3::new(0.0, 100.0, 300.0), &Vector3::zeros()));
    assert!((cell.arm().joint_angles()[0] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    assert!(cell.reset_arm());
    assert_eq!(cell.arm().joint_angles(), JOINTS_AT_ZERO);
}

#[test]
fn test_stop_inspection() {
    let mut cell = clean_cell();
    cell.start_inspection("Small Part", &InspectionType::ScratchesSmall)
        .expect("inspection started");
    cell.execute_step().expect("first step");
    cell.stop_inspection();
    let status = cell.status();
    assert!(!status.is_running);
    assert_eq!(status.current_step, 0);
    assert_eq!(status.results.len(), 1);
    assert_eq!(cell.execute_step(), Err(StepError::NoActiveSequence));
}

#[test]
fn test_independent_cells() {
    let mut manual = clean_cell();
    let mut scenes = clean_cell();
    manual.trigger_emergency_stop();
    assert!(scenes.safety().is_safe());
    assert_eq!(scenes.start_inspection_from_scene("Small Part", &SceneInfo::new("all")), Ok(8));
    assert!(manual.sequence().is_none());
}

fn cell_with_optics(catalog: PartCatalog, camera_spec: CameraSpec) -> InspectionOrchestrator {
    InspectionOrchestrator::new(
        ArmKinematics::default(),
        SafetyMachine::new(),
        catalog,
        camera_spec,
        Box::new(SimulatedCamera::default()),
        Box::new(never_defect()),
    )
}

#[test]
fn test_untileable_camera_is_rejected() {
    for camera_spec in [
        CameraSpec { overlap_percentage: 100.0, ..Default::default() },
        CameraSpec { overlap_percentage: 150.0, ..Default::default() },
        CameraSpec { field_of_view: (0.0, 100.0), ..Default::default() },
    ] {
        let mut cell = cell_with_optics(PartCatalog::default(), camera_spec);
        assert!(matches!(
            cell.start_inspection("Small Part", &InspectionType::ScratchesSmall),
            Err(InspectionError::InvalidCamera { .. })
        ));
        assert!(matches!(
            cell.start_inspection_from_scene("Small Part", &SceneInfo::new("all")),
            Err(InspectionError::InvalidCamera { .. })
        ));
        assert!(cell.sequence().is_none());
        assert_eq!(cell.execute_step(), Err(StepError::NoActiveSequence));
    }
}

#[test]
fn test_oversized_part_is_rejected() {
    let mut catalog = PartCatalog::default();
    catalog.insert(Part::new(
        "Runway",
        PartDimensions { length: 1e12, width: 1e12, height: 10.0 },
        &[InspectionType::SurfaceQuality],
    ));
    let mut cell = cell_with_optics(catalog, CameraSpec::default());
    assert_eq!(cell.start_inspection("Small Part", &InspectionType::ScratchesSmall), Ok(4));

    assert_eq!(
        cell.start_inspection("Runway", &InspectionType::SurfaceQuality),
        Err(InspectionError::GridTooLarge("Runway".to_string()))
    );
    assert_eq!(cell.sequence().map(|s| s.part.as_str()), Some("Small Part"));
}
