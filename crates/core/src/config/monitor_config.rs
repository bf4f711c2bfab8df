use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::config_error::ConfigError;
use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CONFIDENCE, DEFAULT_MIN_FACE_SIZE,
    DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR, DEFAULT_WORKING_HEIGHT, DEFAULT_WORKING_WIDTH,
    DEFAULT_ZONES,
};
use crate::zones::domain::zone::ZoneBounds;
use crate::zones::domain::zone_registry::ZoneRegistry;

/// One zone entry: name and two corners in working-resolution pixels.
/// `capacity`, when set, enables the crowd level for the zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl ZoneConfig {
    pub fn bounds(&self) -> ZoneBounds {
        ZoneBounds::new(self.x1, self.y1, self.x2, self.y2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORKING_WIDTH,
            height: DEFAULT_WORKING_HEIGHT,
        }
    }
}

/// Tuning shared by the detector backends. The cascade uses the first
/// three; the ONNX backend only uses `confidence`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParameters {
    pub scale_factor: f64,
    pub min_neighbors: u32,
    pub min_size: u32,
    pub confidence: f64,
}

impl Default for DetectorParameters {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_size: DEFAULT_MIN_FACE_SIZE,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Startup configuration. Every field is optional in the JSON file; missing
/// fields take the built-in store layout and detector defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub zones: Vec<ZoneConfig>,
    pub working_resolution: Resolution,
    pub detector: DetectorParameters,
    pub font_path: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            zones: DEFAULT_ZONES
                .iter()
                .map(|&(name, x1, y1, x2, y2)| ZoneConfig {
                    name: name.to_string(),
                    x1,
                    y1,
                    x2,
                    y2,
                    capacity: None,
                })
                .collect(),
            working_resolution: Resolution::default(),
            detector: DetectorParameters::default(),
            font_path: None,
        }
    }
}

impl MonitorConfig {
    /// `<config dir>/crowd-zones/config.json` for the current user.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An explicit path must load. Otherwise the per-user file is used when
    /// present, and the built-in defaults when not.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::info!("Loading configuration from {}", path.display());
            return Self::load(path);
        }
        match Self::default_path().filter(|p| p.is_file()) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            None => {
                log::info!("No configuration file found; using built-in store layout");
                Ok(Self::default())
            }
        }
    }

    /// Checks every rule; returns the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Resolution { width, height } = self.working_resolution;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidResolution { width, height });
        }

        let d = &self.detector;
        if !(d.scale_factor.is_finite() && d.scale_factor > 1.0) {
            return Err(ConfigError::InvalidDetectorParameter(format!(
                "scale_factor must be greater than 1.0, got {}",
                d.scale_factor
            )));
        }
        if !(0.0..=1.0).contains(&d.confidence) {
            return Err(ConfigError::InvalidDetectorParameter(format!(
                "confidence must be within [0, 1], got {}",
                d.confidence
            )));
        }

        self.build_registry().map(|_| ())
    }

    /// Registers the zones in file order. Zones reaching outside the working
    /// resolution are kept; they are only partly visible.
    pub fn build_registry(&self) -> Result<ZoneRegistry, ConfigError> {
        let Resolution { width, height } = self.working_resolution;
        let mut registry = ZoneRegistry::new();
        for zone in &self.zones {
            let bounds = zone.bounds();
            registry.register_with_capacity(&zone.name, bounds, zone.capacity)?;
            if bounds.exceeds(width, height) {
                log::warn!(
                    "Zone '{}' extends beyond the {width}x{height} working frame",
                    zone.name
                );
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn write_config(json: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, json).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults_are_store_layout() {
        let config = MonitorConfig::default();
        let names: Vec<&str> = config.zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Zone A - Snacks", "Zone B - Checkout", "Zone C - Frozen"]
        );
        assert_eq!(config.zones[1].bounds(), ZoneBounds::new(320, 50, 600, 300));
        assert_eq!(config.working_resolution, Resolution { width: 640, height: 480 });
        assert_relative_eq!(config.detector.scale_factor, 1.1);
        assert_eq!(config.detector.min_neighbors, 5);
        assert_eq!(config.detector.min_size, 0);
        assert!(config.zones.iter().all(|z| z.capacity.is_none()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_full_file() {
        let (_dir, path) = write_config(
            r#"{
                "zones": [
                    { "name": "Entrance", "x1": 0, "y1": 0, "x2": 100, "y2": 100 },
                    { "name": "Aisle", "x1": 100, "y1": 0, "x2": 200, "y2": 100 }
                ],
                "working_resolution": { "width": 320, "height": 240 },
                "detector": { "scale_factor": 1.2, "min_neighbors": 3, "min_size": 24, "confidence": 0.7 },
                "font_path": "/opt/fonts/overlay.ttf"
            }"#,
        );

        let config = MonitorConfig::load(&path).unwrap();

        assert_eq!(config.zones.len(), 2);
        assert_eq!(config.zones[0].name, "Entrance");
        assert_eq!(config.working_resolution.width, 320);
        assert_eq!(config.detector.min_neighbors, 3);
        assert_eq!(config.detector.min_size, 24);
        assert_relative_eq!(config.detector.confidence, 0.7);
        assert_eq!(config.font_path, Some(PathBuf::from("/opt/fonts/overlay.ttf")));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let (_dir, path) = write_config(r#"{ "detector": { "min_neighbors": 8 } }"#);

        let config = MonitorConfig::load(&path).unwrap();

        assert_eq!(config.zones, MonitorConfig::default().zones);
        assert_eq!(config.detector.min_neighbors, 8);
        assert_relative_eq!(config.detector.scale_factor, 1.1);
        assert_eq!(config.working_resolution, Resolution::default());
    }

    #[test]
    fn test_explicit_empty_zone_list_is_kept() {
        let (_dir, path) = write_config(r#"{ "zones": [] }"#);
        let config = MonitorConfig::load(&path).unwrap();
        assert!(config.build_registry().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let (_dir, path) = write_config("{ zones: ");
        assert!(matches!(
            MonitorConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = MonitorConfig::load(Path::new("/nonexistent/crowd-zones.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_resolve_explicit_missing_path_fails() {
        let result = MonitorConfig::resolve(Some(Path::new("/nonexistent/crowd-zones.json")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_resolve_explicit_path() {
        let (_dir, path) = write_config(r#"{ "working_resolution": { "width": 800, "height": 600 } }"#);
        let config = MonitorConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.working_resolution.width, 800);
    }

    #[test]
    fn test_duplicate_zone_names_rejected() {
        let (_dir, path) = write_config(
            r#"{ "zones": [
                { "name": "A", "x1": 0, "y1": 0, "x2": 10, "y2": 10 },
                { "name": "A", "x1": 20, "y1": 0, "x2": 30, "y2": 10 }
            ] }"#,
        );
        let config = MonitorConfig::load(&path).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateZone(ref n)) if n == "A"
        ));
    }

    #[test]
    fn test_degenerate_zone_rejected() {
        let mut config = MonitorConfig::default();
        config.zones.push(ZoneConfig {
            name: "Flat".into(),
            x1: 10,
            y1: 50,
            x2: 90,
            y2: 50,
            capacity: None,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DegenerateZone { .. })
        ));
    }

    #[test]
    fn test_zone_outside_frame_accepted() {
        let mut config = MonitorConfig::default();
        config.zones.push(ZoneConfig {
            name: "Overflow".into(),
            x1: 500,
            y1: 400,
            x2: 900,
            y2: 700,
            capacity: None,
        });
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_zone_capacity_loaded_into_registry() {
        let (_dir, path) = write_config(
            r#"{ "zones": [
                { "name": "Frozen", "x1": 0, "y1": 0, "x2": 100, "y2": 100, "capacity": 20 },
                { "name": "Aisle", "x1": 100, "y1": 0, "x2": 200, "y2": 100 }
            ] }"#,
        );
        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.zones[0].capacity, Some(20));
        assert_eq!(config.zones[1].capacity, None);

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.get("Frozen").unwrap().capacity(), Some(20));
        assert_eq!(registry.get("Aisle").unwrap().capacity(), None);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = MonitorConfig::default();
        config.zones[0].capacity = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroCapacity(ref n)) if n == "Zone A - Snacks"
        ));
    }

    #[test]
    fn test_capacity_omitted_when_serialized() {
        let json = serde_json::to_string(&MonitorConfig::default()).unwrap();
        assert!(!json.contains("capacity"));
    }

    #[test]
    fn test_extreme_zone_coordinates_accepted() {
        let mut config = MonitorConfig::default();
        config.zones = vec![ZoneConfig {
            name: "Everything".into(),
            x1: i32::MIN,
            y1: i32::MIN,
            x2: i32::MAX,
            y2: i32::MAX,
            capacity: Some(u32::MAX),
        }];
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::zero_width(0, 480)]
    #[case::zero_height(640, 0)]
    fn test_zero_resolution_rejected(#[case] width: u32, #[case] height: u32) {
        let mut config = MonitorConfig::default();
        config.working_resolution = Resolution { width, height };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidResolution { .. })
        ));
    }

    #[rstest]
    #[case::scale_one(1.0, 0.5)]
    #[case::scale_below_one(0.9, 0.5)]
    #[case::scale_nan(f64::NAN, 0.5)]
    #[case::confidence_negative(1.1, -0.1)]
    #[case::confidence_above_one(1.1, 1.5)]
    fn test_invalid_detector_parameters(#[case] scale_factor: f64, #[case] confidence: f64) {
        let mut config = MonitorConfig::default();
        config.detector.scale_factor = scale_factor;
        config.detector.confidence = confidence;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDetectorParameter(_))
        ));
    }

    #[rstest]
    #[case::confidence_zero(0.0)]
    #[case::confidence_one(1.0)]
    fn test_confidence_bounds_inclusive(#[case] confidence: f64) {
        let mut config = MonitorConfig::default();
        config.detector.confidence = confidence;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serializes_back_to_loadable_json() {
        let json = serde_json::to_string_pretty(&MonitorConfig::default()).unwrap();
        let (_dir, path) = write_config(&json);
        assert_eq!(MonitorConfig::load(&path).unwrap(), MonitorConfig::default());
    }
}
