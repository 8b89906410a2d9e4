//! Simulated visual inspection cell: a six-joint arm carrying a camera over a part,
//! guarded by safety interlocks.
//!
//! The crate holds the parts of the cell that carry actual logic:
//!
//! - The kinematic model of the arm: Denavit–Hartenberg forward kinematics, a simplified
//!   geometric inverse kinematics, joint limit enforcement and per-joint PID regulators.
//! - The safety interlocks: emergency stop, light curtain and door, with an event log and
//!   the reset protocol.
//! - Inspection sequencing: viewpoint grids computed from part dimensions and camera
//!   field of view, sequences built from the grid, from named scenes or from taught poses,
//!   and stepwise execution gated by the interlocks.
//!
//! The camera and the defect analysis are simulated behind the [`camera::Camera`] and
//! [`analysis::ImageAnalyzer`] traits, so real devices can be plugged in.
//!
//! # Geometry
//!
//! The arm is described by six DH parameter sets (`a`, `alpha`, `d`) with joint limits,
//! see `ArmParameters::inspection_arm`. Base, shoulder and elbow always stay within their
//! limits. The wrist joints follow a simplified model and accept any angle.
//!
//! The inverse kinematics is an approximation:
//! `move_to_pose` solves the planar two-link problem for base, shoulder and elbow and
//! copies the requested roll, pitch, yaw into the wrist, reporting whether the reached
//! position is within tolerance. `calculate_inverse_kinematics` points the shoulder at the
//! target, mirrors it with the elbow and zeroes the wrist.
//!
//! ## Examples
//!
//! - **main.rs**: runs a complete simulated inspection of a catalog part.

pub mod parameters;
pub mod parameters_robots;

#[path = "utils/utils.rs"]
pub mod utils;
pub mod kinematic_traits;
pub mod kinematics_impl;

pub mod constraints;

pub mod pid;

pub mod safety;

pub mod analysis;
pub mod camera;
pub mod catalog;
pub mod grid;

pub mod config_error;
#[cfg(feature = "allow_filesystem")]
pub mod config_from_file;

pub mod teach;

pub mod inspection;

#[cfg(test)]
mod tests;
