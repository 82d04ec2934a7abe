use crate::{MarkerShape, Position2};
use eyre::{bail, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;

pub const DEFAULT_ARRIVAL_THRESHOLD: f64 = 0.5;

/// Environment variable naming the TOML configuration file
pub const CONFIG_PATH_ENV: &str = "DELIVERY_CONFIG";

/// Target pose of a pickup or dropoff zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    pub x: f64,
    pub y: f64,
    pub orientation_w: f64,
}

impl ZoneConfig {
    pub fn new(x: f64, y: f64, orientation_w: f64) -> Self {
        Self { x, y, orientation_w }
    }

    pub fn position(&self) -> Position2 {
        Position2::new(self.x, self.y)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.x.is_finite() && self.y.is_finite() && self.orientation_w.is_finite()) {
            bail!(
                "{} zone has non-finite values: x={}, y={}, orientation_w={}",
                name,
                self.x,
                self.y,
                self.orientation_w
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerStyleConfig {
    #[serde(default = "default_frame_id")]
    pub frame_id: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub shape: MarkerShape,
    #[serde(default = "default_scale")]
    pub scale: [f64; 3], // x, y, z in meters
    #[serde(default = "default_color")]
    pub color: [f32; 4], // r, g, b, a
    #[serde(default)]
    pub lifetime_ms: Option<u64>,
}

impl Default for MarkerStyleConfig {
    fn default() -> Self {
        Self {
            frame_id: default_frame_id(),
            namespace: default_namespace(),
            id: 0,
            shape: MarkerShape::Cube,
            scale: default_scale(),
            color: default_color(),
            lifetime_ms: None,
        }
    }
}

impl MarkerStyleConfig {
    fn validate(&self) -> Result<()> {
        if self.frame_id.is_empty() {
            bail!("Marker frame_id must not be empty");
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            bail!("Marker scale must be finite and positive, got {:?}", self.scale);
        }
        if self.color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            bail!("Marker color components must be within [0, 1], got {:?}", self.color);
        }
        if self.color[3] <= 0.0 {
            bail!("Marker alpha must be non-zero or the marker is invisible");
        }
        Ok(())
    }
}

fn default_frame_id() -> String {
    "map".to_string()
}

fn default_namespace() -> String {
    "basic_shapes".to_string()
}

fn default_scale() -> [f64; 3] {
    [0.25, 0.25, 0.25]
}

fn default_color() -> [f32; 4] {
    [0.0, 1.0, 0.0, 1.0]
}

fn default_threshold() -> f64 {
    DEFAULT_ARRIVAL_THRESHOLD
}

fn default_true() -> bool {
    true
}

/// Zones, arrival policy and marker style for the delivery task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    #[serde(default = "default_threshold")]
    pub arrival_threshold: f64,
    /// When set, arrival also requires |w - zone_w| below this tolerance
    #[serde(default)]
    pub orientation_tolerance: Option<f64>,
    #[serde(default = "default_true")]
    pub wait_for_consumer: bool,
    pub pickup: ZoneConfig,
    pub dropoff: ZoneConfig,
    #[serde(default)]
    pub marker: MarkerStyleConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            arrival_threshold: DEFAULT_ARRIVAL_THRESHOLD,
            orientation_tolerance: None,
            wait_for_consumer: true,
            pickup: ZoneConfig::new(1.0, 0.0, 1.0),
            dropoff: ZoneConfig::new(-10.0, 0.0, 1.2),
            marker: MarkerStyleConfig::default(),
        }
    }
}

impl DeliveryConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read delivery config {}", path))?;
        Self::from_toml_str(&content).wrap_err_with(|| format!("Invalid delivery config {}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DeliveryConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load the configuration the node runs with.
    ///
    /// Reads the file named by `DELIVERY_CONFIG` if set, otherwise starts
    /// from the built-in zones. Environment overrides are applied on top
    /// and the result is validated.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ARRIVAL_THRESHOLD`, `ORIENTATION_TOLERANCE` and
    /// `WAIT_FOR_CONSUMER` overrides. Values that do not parse are errors.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ARRIVAL_THRESHOLD") {
            self.arrival_threshold = val
                .trim()
                .parse::<f64>()
                .wrap_err_with(|| format!("ARRIVAL_THRESHOLD is not a number: {:?}", val))?;
        }
        if let Some(val) = lookup("ORIENTATION_TOLERANCE") {
            let val = val.trim();
            self.orientation_tolerance = if val.is_empty() || val.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(val.parse::<f64>().wrap_err_with(|| {
                    format!("ORIENTATION_TOLERANCE is not a number: {:?}", val)
                })?)
            };
        }
        if let Some(val) = lookup("WAIT_FOR_CONSUMER") {
            self.wait_for_consumer = match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => bail!("WAIT_FOR_CONSUMER must be a boolean, got {:?}", other),
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.arrival_threshold.is_finite() || self.arrival_threshold <= 0.0 {
            bail!(
                "Arrival threshold must be finite and positive, got {}",
                self.arrival_threshold
            );
        }

        if let Some(tolerance) = self.orientation_tolerance {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                bail!(
                    "Orientation tolerance must be finite and positive, got {}",
                    tolerance
                );
            }
        }

        self.pickup.validate("Pickup")?;
        self.dropoff.validate("Dropoff")?;

        let separation = self.pickup.position().distance_to(&self.dropoff.position());
        if separation < self.arrival_threshold {
            bail!(
                "Pickup and dropoff are {:.3} apart, closer than the arrival threshold ({})",
                separation,
                self.arrival_threshold
            );
        }

        self.marker.validate()
    }
}
