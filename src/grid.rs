//! Inspection viewpoints planned from part dimensions and camera optics.
//!
//! The part is centered at the origin. The camera field of view, reduced by the
//! configured overlap, is tiled over three faces: a top grid at working distance
//! looking down, and front and back grids standing off the part faces along y. The
//! back grid is turned 180° about yaw to face the part.

use crate::catalog::{CameraSpec, PartDimensions};
use crate::kinematic_traits::Pose;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewType {
    Top,
    Front,
    Back,
    Custom,
}

impl ViewType {
    pub fn tag(&self) -> &'static str {
        match self {
            ViewType::Top => "top_view",
            ViewType::Front => "front_view",
            ViewType::Back => "back_view",
            ViewType::Custom => "custom_view",
        }
    }

    /// Any tag other than the three grid faces is a custom view.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "top_view" => ViewType::Top,
            "front_view" => ViewType::Front,
            "back_view" => ViewType::Back,
            _ => ViewType::Custom,
        }
    }
}

impl From<String> for ViewType {
    fn from(tag: String) -> Self {
        ViewType::parse(&tag)
    }
}

impl From<ViewType> for String {
    fn from(v: ViewType) -> Self {
        v.tag().to_string()
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionPoint {
    pub position: Vector3<f64>,
    pub orientation: Vector3<f64>,
    pub view_type: ViewType,
    pub description: String,
}

impl InspectionPoint {
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }
}

/// Upper bound on the viewpoints of a single part.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Number of tiles of width `coverage` needed along `dimension`. None if the
/// dimension cannot be tiled (non-positive coverage, negative or non-finite values)
/// or needs more than [`MAX_GRID_POINTS`] tiles.
pub fn points_along(dimension: f64, coverage: f64) -> Option<usize> {
    if !(coverage > 0.0 && dimension >= 0.0) {
        return None;
    }
    let tiles = (dimension / coverage).floor();
    if tiles.is_finite() && tiles < MAX_GRID_POINTS as f64 {
        Some(tiles as usize + 1)
    } else {
        None
    }
}

/// All viewpoints for the part: top grid first, then front, then back. None if the
/// camera cannot tile the part or the grid would exceed [`MAX_GRID_POINTS`].
pub fn calculate_inspection_grid(part: &PartDimensions, camera: &CameraSpec) -> Option<Vec<InspectionPoint>> {
    let (effective_x, effective_y) = camera.effective_coverage();

    let num_x = points_along(part.length, effective_x)?;
    let num_y = points_along(part.width, effective_y)?;
    let num_z = points_along(part.height, effective_y)?;

    let total = num_z
        .checked_mul(2)
        .and_then(|sides| sides.checked_add(num_y))
        .and_then(|per_column| per_column.checked_mul(num_x))
        .filter(|&total| total <= MAX_GRID_POINTS)?;

    let x_at = |i: usize| i as f64 * effective_x - part.length / 2.0;
    let mut points = Vec::with_capacity(total);

    for i in 0..num_x {
        for j in 0..num_y {
            points.push(InspectionPoint {
                position: Vector3::new(
                    x_at(i),
                    j as f64 * effective_y - part.width / 2.0,
                    camera.working_distance,
                ),
                orientation: Vector3::zeros(),
                view_type: ViewType::Top,
                description: format!("Top view inspection point ({},{})", i + 1, j + 1),
            });
        }
    }

    let stand_off = part.width / 2.0 + camera.working_distance;
    for (view_type, y, yaw, name) in [
        (ViewType::Front, stand_off, 0.0, "Front"),
        (ViewType::Back, -stand_off, PI, "Back"),
    ] {
        for i in 0..num_x {
            for k in 0..num_z {
                points.push(InspectionPoint {
                    position: Vector3::new(x_at(i), y, k as f64 * effective_y - part.height / 2.0),
                    orientation: Vector3::new(0.0, 0.0, yaw),
                    view_type,
                    description: format!("{} view inspection point ({},{})", name, i + 1, k + 1),
                });
            }
        }
    }

    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_part() -> PartDimensions {
        PartDimensions { length: 100.0, width: 100.0, height: 50.0 }
    }

    fn count(points: &[InspectionPoint], view: ViewType) -> usize {
        points.iter().filter(|p| p.view_type == view).count()
    }

    #[test]
    fn test_small_part_grid() {
        let points = calculate_inspection_grid(&small_part(), &CameraSpec::default()).expect("grid");
        assert_eq!(count(&points, ViewType::Top), 4);
        assert_eq!(count(&points, ViewType::Front), 2);
        assert_eq!(count(&points, ViewType::Back), 2);
        assert_eq!(points.len(), 8);
    }

    #[test]
    fn test_top_positions() {
        let points = calculate_inspection_grid(&small_part(), &CameraSpec::default()).expect("grid");
        let top: Vec<_> = points.iter().filter(|p| p.view_type == ViewType::Top).collect();
        assert_eq!(top[0].position, Vector3::new(-50.0, -50.0, 300.0));
        assert_eq!(top[1].position, Vector3::new(-50.0, 40.0, 300.0));
        assert_eq!(top[3].position, Vector3::new(40.0, 40.0, 300.0));
        assert_eq!(top[1].description, "Top view inspection point (1,2)");
        assert!(top.iter().all(|p| p.orientation == Vector3::zeros()));
    }

    #[test]
    fn test_front_and_back() {
        let points = calculate_inspection_grid(&small_part(), &CameraSpec::default()).expect("grid");
        let front = points.iter().find(|p| p.view_type == ViewType::Front).expect("front");
        let back = points.iter().find(|p| p.view_type == ViewType::Back).expect("back");
        assert_eq!(front.position, Vector3::new(-50.0, 350.0, -25.0));
        assert_eq!(back.position, Vector3::new(-50.0, -350.0, -25.0));
        assert_eq!(front.orientation.z, 0.0);
        assert_eq!(back.orientation.z, PI);
        assert_eq!(back.description, "Back view inspection point (1,1)");
    }

    #[test]
    fn test_large_part_counts() {
        let large = PartDimensions { length: 500.0, width: 500.0, height: 200.0 };
        let points = calculate_inspection_grid(&large, &CameraSpec::default()).expect("grid");
        // 500 / 90 -> 6 points per axis, 200 / 90 -> 3
        assert_eq!(count(&points, ViewType::Top), 36);
        assert_eq!(count(&points, ViewType::Front), 18);
        assert_eq!(count(&points, ViewType::Back), 18);
    }

    #[test]
    fn test_view_tags() {
        assert_eq!(ViewType::parse("back_view"), ViewType::Back);
        assert_eq!(ViewType::parse("side_view"), ViewType::Custom);
        assert_eq!(ViewType::Front.to_string(), "front_view");
    }

    #[test]
    fn test_untileable_grid() {
        let full_overlap = CameraSpec { overlap_percentage: 100.0, ..Default::default() };
        assert!(calculate_inspection_grid(&small_part(), &full_overlap).is_none());

        let negative = CameraSpec { field_of_view: (-100.0, 100.0), ..Default::default() };
        assert!(calculate_inspection_grid(&small_part(), &negative).is_none());

        let huge = PartDimensions { length: 1e12, width: 1e12, height: 1.0 };
        assert!(calculate_inspection_grid(&huge, &CameraSpec::default()).is_none());

        let flat = PartDimensions { length: 100.0, width: 100.0, height: 0.0 };
        let points = calculate_inspection_grid(&flat, &CameraSpec::default()).expect("grid");
        assert_eq!(count(&points, ViewType::Front), 2);
    }

    #[test]
    fn test_points_along() {
        assert_eq!(points_along(100.0, 90.0), Some(2));
        assert_eq!(points_along(0.0, 90.0), Some(1));
        assert_eq!(points_along(100.0, 0.0), None);
        assert_eq!(points_along(f64::NAN, 90.0), None);
        assert_eq!(points_along(f64::INFINITY, 90.0), None);
    }
}
