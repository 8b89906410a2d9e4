//! Supports reading the part catalog and camera spec from YAML (optional)

use std::path::Path;
use yaml_rust2::{Yaml, YamlLoader};

use crate::analysis::InspectionType;
use crate::catalog::{CameraSpec, Part, PartCatalog, PartDimensions};
use crate::config_error::ConfigError;

/// Everything the inspection sequences are planned from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellConfig {
    pub catalog: PartCatalog,
    pub camera: CameraSpec,
}

impl CellConfig {
    /// Read the cell configuration from YAML file. YAML file like this is supported:
    /// ```yaml
    /// parts:
    ///   Small Part:
    ///     dimensions: { length: 100, width: 100, height: 50 }
    ///     inspection_types: [scratches_small, fingerprints]
    /// camera:
    ///   field_of_view: { horizontal: 100, vertical: 100 }
    ///   resolution: { width: 1920, height: 1080 }
    ///   focal_length: 50
    ///   working_distance: 300
    ///   overlap_percentage: 10
    /// ```
    /// Either section may be omitted, the built-in default is used then.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let docs = YamlLoader::load_from_str(contents)
            .map_err(|e| ConfigError::ParseError(format!("{}", e)))?;
        let doc = docs
            .first()
            .ok_or_else(|| ConfigError::ParseError("Empty YAML document".to_string()))?;

        let catalog = match &doc["parts"] {
            Yaml::BadValue => PartCatalog::default(),
            parts => read_catalog(parts)?,
        };
        let camera = match &doc["camera"] {
            Yaml::BadValue => CameraSpec::default(),
            camera => read_camera(camera)?,
        };
        Ok(CellConfig { catalog, camera })
    }
}

impl PartCatalog {
    /// Reads only the `parts` section, see [`CellConfig::from_yaml_file`].
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(CellConfig::from_yaml_file(path)?.catalog)
    }
}

impl CameraSpec {
    /// Reads only the `camera` section, see [`CellConfig::from_yaml_file`].
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(CellConfig::from_yaml_file(path)?.camera)
    }
}

fn read_catalog(parts: &Yaml) -> Result<PartCatalog, ConfigError> {
    let hash = parts.as_hash().ok_or_else(|| ConfigError::InvalidValue {
        field: "parts".to_string(),
        reason: "expected a mapping from part name".to_string(),
    })?;

    let mut catalog = Vec::with_capacity(hash.len());
    for (name, part) in hash {
        let name = name.as_str().ok_or_else(|| ConfigError::InvalidValue {
            field: "parts".to_string(),
            reason: "part name must be a string".to_string(),
        })?;
        let field = |f: &str| format!("parts.{}.{}", name, f);

        let dims = &part["dimensions"];
        let dimensions = PartDimensions {
            length: number(&dims["length"], &field("dimensions.length"))?,
            width: number(&dims["width"], &field("dimensions.width"))?,
            height: number(&dims["height"], &field("dimensions.height"))?,
        };
        for (value, f) in [
            (dimensions.length, "length"),
            (dimensions.width, "width"),
            (dimensions.height, "height"),
        ] {
            if value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field(&format!("dimensions.{}", f)),
                    reason: format!("negative dimension {}", value),
                });
            }
        }

        let inspection_types = part["inspection_types"]
            .as_vec()
            .ok_or_else(|| ConfigError::MissingField(field("inspection_types")))?
            .iter()
            .map(|t| {
                t.as_str()
                    .map(InspectionType::parse)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        field: field("inspection_types"),
                        reason: "inspection type must be a string".to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        catalog.push(Part::new(name, dimensions, &inspection_types));
    }
    Ok(PartCatalog::new(catalog))
}

fn read_camera(camera: &Yaml) -> Result<CameraSpec, ConfigError> {
    let defaults = CameraSpec::default();
    let fov = &camera["field_of_view"];
    let resolution = &camera["resolution"];

    let spec = CameraSpec {
        field_of_view: (
            number(&fov["horizontal"], "camera.field_of_view.horizontal")?,
            number(&fov["vertical"], "camera.field_of_view.vertical")?,
        ),
        resolution: match resolution {
            Yaml::BadValue => defaults.resolution,
            _ => (
                pixels(&resolution["width"], "camera.resolution.width")?,
                pixels(&resolution["height"], "camera.resolution.height")?,
            ),
        },
        focal_length: optional_number(&camera["focal_length"], "camera.focal_length")?
            .unwrap_or(defaults.focal_length),
        working_distance: number(&camera["working_distance"], "camera.working_distance")?,
        overlap_percentage: optional_number(&camera["overlap_percentage"], "camera.overlap_percentage")?
            .unwrap_or(defaults.overlap_percentage),
    };

    spec.validate().map_err(|(field, reason)| ConfigError::InvalidValue {
        field: format!("camera.{}", field),
        reason,
    })?;
    Ok(spec)
}

fn optional_number(value: &Yaml, field: &str) -> Result<Option<f64>, ConfigError> {
    match value {
        Yaml::Real(s) => s.parse::<f64>().map(Some).map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a number", s),
        }),
        Yaml::Integer(i) => Ok(Some(*i as f64)),
        Yaml::BadValue | Yaml::Null => Ok(None),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a number, found {:?}", other),
        }),
    }
}

fn number(value: &Yaml, field: &str) -> Result<f64, ConfigError> {
    optional_number(value, field)?.ok_or_else(|| ConfigError::MissingField(field.to_string()))
}

fn pixels(value: &Yaml, field: &str) -> Result<u32, ConfigError> {
    match value {
        Yaml::Integer(i) => u32::try_from(*i).map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("{} pixels is out of range", i),
        }),
        Yaml::BadValue => Err(ConfigError::MissingField(field.to_string())),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected whole pixels, found {:?}", other),
        }),
    }
}
