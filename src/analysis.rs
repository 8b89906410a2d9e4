//! Defect analysis of captured images.
//!
//! The cell does not run real vision. [`DefectSimulator`] draws defects with a fixed
//! probability per inspection type from an injected random source, so a seeded or mock
//! generator gives reproducible verdicts.

use crate::camera::Image;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an inspection looks for. Unknown tags are kept as `Other` and produce an
/// `Error` verdict when analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InspectionType {
    ScratchesSmall,
    ScratchesLarge,
    Fingerprints,
    SurfaceQuality,
    EdgeQuality,
    Comprehensive,
    CustomScene,
    Other(String),
}

impl InspectionType {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "scratches_small" => InspectionType::ScratchesSmall,
            "scratches_large" => InspectionType::ScratchesLarge,
            "fingerprints" => InspectionType::Fingerprints,
            "surface_quality" => InspectionType::SurfaceQuality,
            "edge_quality" => InspectionType::EdgeQuality,
            "comprehensive" => InspectionType::Comprehensive,
            "custom_scene" => InspectionType::CustomScene,
            other => InspectionType::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            InspectionType::ScratchesSmall => "scratches_small",
            InspectionType::ScratchesLarge => "scratches_large",
            InspectionType::Fingerprints => "fingerprints",
            InspectionType::SurfaceQuality => "surface_quality",
            InspectionType::EdgeQuality => "edge_quality",
            InspectionType::Comprehensive => "comprehensive",
            InspectionType::CustomScene => "custom_scene",
            InspectionType::Other(tag) => tag,
        }
    }
}

impl From<&str> for InspectionType {
    fn from(tag: &str) -> Self {
        InspectionType::parse(tag)
    }
}

impl From<String> for InspectionType {
    fn from(tag: String) -> Self {
        InspectionType::parse(&tag)
    }
}

impl From<InspectionType> for String {
    fn from(t: InspectionType) -> Self {
        t.tag().to_string()
    }
}

impl fmt::Display for InspectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisStatus {
    Pass,
    Fail,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub status: AnalysisStatus,
    pub defects: Vec<String>,
    pub description: String,
}

impl Analysis {
    fn single(defect: Option<&str>, passed: &str, failed: &str) -> Self {
        match defect {
            None => Analysis {
                status: AnalysisStatus::Pass,
                defects: vec![],
                description: passed.to_string(),
            },
            Some(tag) => Analysis {
                status: AnalysisStatus::Fail,
                defects: vec![tag.to_string()],
                description: failed.to_string(),
            },
        }
    }
}

pub trait ImageAnalyzer {
    fn analyze(&mut self, image: &Image, inspection_type: &InspectionType) -> Analysis;
}

/// Defect tags a custom scene inspection may report, chosen uniformly.
pub const CUSTOM_SCENE_DEFECTS: [&str; 4] =
    ["scratch", "fingerprint", "surface_imperfection", "edge_imperfection"];

/// Simulated analyzer. Probabilities of a defect per inspection:
///
/// | type | probability | defect |
/// |------|-------------|--------|
/// | scratches_small | 20% | small_scratch |
/// | scratches_large | 10% | large_scratch |
/// | fingerprints | 15% | fingerprint |
/// | surface_quality | 5% | surface_imperfection |
/// | edge_quality | 8% | edge_imperfection |
/// | comprehensive | 10/5/3/2% independent | scratch, fingerprint, surface_imperfection, edge_imperfection |
/// | custom_scene | 12% | one of [`CUSTOM_SCENE_DEFECTS`] |
#[derive(Debug, Clone)]
pub struct DefectSimulator<R: Rng> {
    rng: R,
}

impl<R: Rng> DefectSimulator<R> {
    pub fn new(rng: R) -> Self {
        DefectSimulator { rng }
    }

    fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }
}

impl DefectSimulator<StdRng> {
    /// Reproducible simulator for a given seed.
    pub fn seeded(seed: u64) -> Self {
        DefectSimulator::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ImageAnalyzer for DefectSimulator<R> {
    fn analyze(&mut self, _image: &Image, inspection_type: &InspectionType) -> Analysis {
        match inspection_type {
            InspectionType::ScratchesSmall => Analysis::single(
                self.chance(0.2).then_some("small_scratch"),
                "No small scratches detected",
                "Small scratch detected",
            ),
            InspectionType::ScratchesLarge => Analysis::single(
                self.chance(0.1).then_some("large_scratch"),
                "No large scratches detected",
                "Large scratch detected",
            ),
            InspectionType::Fingerprints => Analysis::single(
                self.chance(0.15).then_some("fingerprint"),
                "No fingerprints detected",
                "Fingerprint detected",
            ),
            InspectionType::SurfaceQuality => Analysis::single(
                self.chance(0.05).then_some("surface_imperfection"),
                "Surface quality acceptable",
                "Surface quality issues detected",
            ),
            InspectionType::EdgeQuality => Analysis::single(
                self.chance(0.08).then_some("edge_imperfection"),
                "Edge quality acceptable",
                "Edge quality issues detected",
            ),
            InspectionType::Comprehensive => {
                let checks = [
                    (0.1, "scratch"),
                    (0.05, "fingerprint"),
                    (0.03, "surface_imperfection"),
                    (0.02, "edge_imperfection"),
                ];
                // Every check draws, so the random stream does not depend on earlier hits
                let defects: Vec<String> = checks
                    .iter()
                    .filter_map(|&(p, tag)| self.chance(p).then(|| tag.to_string()))
                    .collect();
                if defects.is_empty() {
                    Analysis {
                        status: AnalysisStatus::Pass,
                        defects,
                        description: "Comprehensive inspection passed".to_string(),
                    }
                } else {
                    let description = format!("Defects found: {}", defects.join(", "));
                    Analysis {
                        status: AnalysisStatus::Fail,
                        defects,
                        description,
                    }
                }
            }
            InspectionType::CustomScene => {
                if self.chance(0.12) {
                    let tag = CUSTOM_SCENE_DEFECTS[self.rng.gen_range(0..CUSTOM_SCENE_DEFECTS.len())];
                    Analysis {
                        status: AnalysisStatus::Fail,
                        defects: vec![tag.to_string()],
                        description: format!("Defect found: {tag}"),
                    }
                } else {
                    Analysis::single(None, "Custom scene inspection passed", "")
                }
            }
            InspectionType::Other(tag) => Analysis {
                status: AnalysisStatus::Error,
                defects: vec![],
                description: format!("Unknown inspection type: {tag}"),
            },
        }
    }
}
