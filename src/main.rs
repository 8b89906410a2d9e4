use anyhow::{bail, Context, Result};
use clap::Parser;
use inspection_cell::analysis::{DefectSimulator, InspectionType};
use inspection_cell::camera::SimulatedCamera;
use inspection_cell::config_from_file::CellConfig;
use inspection_cell::inspection::{InspectionOrchestrator, SceneInfo, StepError};
use inspection_cell::kinematics_impl::ArmKinematics;
use inspection_cell::parameters::arm_kinematics::ArmParameters;
use inspection_cell::safety::SafetyMachine;
use inspection_cell::teach::CustomScene;
use inspection_cell::utils::{dump_joints, dump_pose};
use std::path::PathBuf;
use tracing::{info, warn};

/// Runs a simulated inspection of one part and prints the results.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file with the part catalog and camera spec. Built-in defaults otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Part to inspect, as named in the catalog.
    #[arg(long, default_value = "Small Part")]
    part: String,

    /// Inspection type, e.g. scratches_small or comprehensive.
    #[arg(long, default_value = "scratches_small")]
    inspection: String,

    /// Seed of the simulated defect analysis.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSON file with taught poses. Replayed instead of the part grid.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Limit the grid to a named scene using all views with the given lighting.
    #[arg(long)]
    lighting: Option<String>,

    /// Print the DH parameters of the arm.
    #[arg(long)]
    show_arm: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CellConfig::from_yaml_file(path)
            .with_context(|| format!("Cannot read cell configuration {}", path.display()))?,
        None => CellConfig::default(),
    };

    let parameters = ArmParameters::inspection_arm();
    if args.show_arm {
        println!("{}", parameters.to_yaml());
    }

    let mut cell = InspectionOrchestrator::new(
        ArmKinematics::new(parameters),
        SafetyMachine::new(),
        config.catalog,
        config.camera,
        Box::new(SimulatedCamera::from_spec(&config.camera)),
        Box::new(DefectSimulator::seeded(args.seed)),
    );
    info!("Available parts: {:?}", cell.available_parts());

    let inspection_type = InspectionType::parse(&args.inspection);
    let steps = match (&args.scene, &args.lighting) {
        (Some(path), _) => {
            let scene = CustomScene::from_json_file(path)
                .with_context(|| format!("Cannot read taught poses {}", path.display()))?;
            cell.start_inspection_from_custom_scene(&args.part, &scene)?
        }
        (None, Some(lighting)) => {
            let mut scene = SceneInfo::new("command line");
            scene.inspection_type = inspection_type;
            scene.lighting = lighting.clone();
            cell.start_inspection_from_scene(&args.part, &scene)?
        }
        (None, None) => cell.start_inspection(&args.part, &inspection_type)?,
    };

    let mut completed = 0;
    while completed < steps {
        match cell.execute_step() {
            Ok(result) => {
                println!(
                    "Step {:3} {:<12} {:?}: {}",
                    result.step + 1,
                    result.view_type,
                    result.status,
                    result.description
                );
                dump_joints(&cell.arm().joint_angles());
                completed += 1;
            }
            Err(StepError::SequenceComplete) => break,
            Err(err @ (StepError::MotionFailed { .. } | StepError::CaptureFailed { .. })) => {
                warn!("{err}, skipping the rest of the inspection");
                break;
            }
            Err(err) => bail!("Inspection aborted: {err}"),
        }
    }

    print!("Final camera pose: ");
    dump_pose(&cell.arm().end_effector_pose());

    let summary = cell.summary();
    println!(
        "{} of {} steps: {} passed, {} failed, {} errors",
        completed, steps, summary.passed, summary.failed, summary.errors
    );
    if !summary.defects.is_empty() {
        println!("Defects: {}", summary.defects.join(", "));
    }
    Ok(())
}
