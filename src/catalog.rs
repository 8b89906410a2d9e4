//! Part catalog and camera spec, the read-only configuration the inspection sequences
//! are planned from. Both have built-in defaults matching the cell as delivered; see
//! [config_from_file.rs](config_from_file.rs) for reading them from YAML.

use crate::analysis::InspectionType;

/// Outer dimensions of a part, millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub dimensions: PartDimensions,
    /// Inspections this part may be started with
    pub inspection_types: Vec<InspectionType>,
}

impl Part {
    pub fn new(name: &str, dimensions: PartDimensions, inspection_types: &[InspectionType]) -> Self {
        Part {
            name: name.to_string(),
            dimensions,
            inspection_types: inspection_types.to_vec(),
        }
    }

    pub fn supports(&self, inspection_type: &InspectionType) -> bool {
        self.inspection_types.contains(inspection_type)
    }
}

/// Parts known to the cell, in the order they were configured.
#[derive(Debug, Clone, PartialEq)]
pub struct PartCatalog {
    parts: Vec<Part>,
}

impl PartCatalog {
    pub fn new(parts: Vec<Part>) -> Self {
        PartCatalog { parts }
    }

    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Part names, as offered to the operator.
    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Adds a part or replaces the one with the same name.
    pub fn insert(&mut self, part: Part) {
        match self.parts.iter_mut().find(|p| p.name == part.name) {
            Some(existing) => *existing = part,
            None => self.parts.push(part),
        }
    }
}

impl Default for PartCatalog {
    fn default() -> Self {
        use InspectionType::*;
        PartCatalog::new(vec![
            Part::new(
                "Small Part",
                PartDimensions { length: 100.0, width: 100.0, height: 50.0 },
                &[ScratchesSmall, Fingerprints],
            ),
            Part::new(
                "Medium Part",
                PartDimensions { length: 200.0, width: 200.0, height: 100.0 },
                &[ScratchesLarge, SurfaceQuality],
            ),
            Part::new(
                "Large Part",
                PartDimensions { length: 500.0, width: 500.0, height: 200.0 },
                &[EdgeQuality, SurfaceQuality, ScratchesLarge],
            ),
        ])
    }
}

/// Optics of the inspection camera. Lengths in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSpec {
    /// (horizontal, vertical) field of view at working distance
    pub field_of_view: (f64, f64),
    /// (width, height) pixels
    pub resolution: (u32, u32),
    pub focal_length: f64,
    pub working_distance: f64,
    /// Overlap between neighbouring inspection points, percent of the field of view
    pub overlap_percentage: f64,
}

impl CameraSpec {
    /// Field of view minus overlap, per axis (horizontal, vertical).
    pub fn effective_coverage(&self) -> (f64, f64) {
        let overlap = self.overlap_percentage / 100.0;
        (
            self.field_of_view.0 - self.field_of_view.0 * overlap,
            self.field_of_view.1 - self.field_of_view.1 * overlap,
        )
    }

    /// Checks that the optics can tile a part: positive finite field of view, overlap in
    /// [0, 100) and a finite working distance. Returns the offending field and the reason.
    pub fn validate(&self) -> Result<(), (&'static str, String)> {
        let (h, v) = self.field_of_view;
        if !(h.is_finite() && v.is_finite() && h > 0.0 && v > 0.0) {
            return Err(("field_of_view", format!("({}, {}) must be positive", h, v)));
        }
        if !(0.0..100.0).contains(&self.overlap_percentage) {
            return Err((
                "overlap_percentage",
                format!("{} is not in [0, 100)", self.overlap_percentage),
            ));
        }
        if !self.working_distance.is_finite() {
            return Err(("working_distance", format!("{} is not finite", self.working_distance)));
        }
        Ok(())
    }
}

impl Default for CameraSpec {
    fn default() -> Self {
        CameraSpec {
            field_of_view: (100.0, 100.0),
            resolution: (1920, 1080),
            focal_length: 50.0,
            working_distance: 300.0,
            overlap_percentage: 10.0,
        }
    }
}
