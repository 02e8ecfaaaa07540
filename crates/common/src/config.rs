use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::Rgb;
use crate::error::ConfigError;

/// Everything the environment needs at mount time.
///
/// Missing fields take their defaults, so a config file only has to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Number of star particles, fixed for the lifetime of a mount.
    pub star_count: usize,
    /// Seed for star placement and jitter.
    pub star_seed: u64,
    /// Lane count used until the lane source reports otherwise.
    pub lane_count: u32,
    /// Width of one lane. Constant for the session.
    pub lane_width: f32,
    /// Radius of the horizon sun sphere.
    pub sun_radius: f32,
    /// Depth of the sun group along -Z.
    pub sun_depth: f32,
    pub palette: Palette,
    pub lighting: LightingConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            star_count: 4000,
            star_seed: 0x5eed_2077,
            lane_count: 3,
            lane_width: 4.0,
            sun_radius: 40.0,
            sun_depth: -150.0,
            palette: Palette::default(),
            lighting: LightingConfig::default(),
        }
    }
}

/// Layer colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Rgb,
    pub grid: Rgb,
    pub lane_floor: Rgb,
    pub lane_separator: Rgb,
    pub star: Rgb,
    pub sun_top: Rgb,
    pub sun_bottom: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::from_u32(0x050011),
            grid: Rgb::from_u32(0xff00ff),
            lane_floor: Rgb::from_u32(0x12002b),
            lane_separator: Rgb::from_u32(0x00ffff),
            star: Rgb::from_u32(0xffffff),
            sun_top: Rgb::from_u32(0xffd319),
            sun_bottom: Rgb::from_u32(0xff2975),
        }
    }
}

/// Fog range and the three fixed lights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub fog_near: f32,
    pub fog_far: f32,
    pub ambient_color: Rgb,
    pub ambient_intensity: f32,
    pub directional_color: Rgb,
    pub directional_intensity: f32,
    /// Direction the light travels towards; normalized at composition time.
    pub directional_direction: [f32; 3],
    pub point_color: Rgb,
    pub point_intensity: f32,
    pub point_position: [f32; 3],
    /// Distance at which the point light has fully attenuated.
    pub point_range: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            fog_near: 40.0,
            fog_far: 160.0,
            ambient_color: Rgb::from_u32(0xffffff),
            ambient_intensity: 0.4,
            directional_color: Rgb::from_u32(0xffffff),
            directional_intensity: 0.8,
            directional_direction: [-0.3, -1.0, -0.5],
            point_color: Rgb::from_u32(0xff00ff),
            point_intensity: 1.5,
            point_position: [0.0, 10.0, -20.0],
            point_range: 100.0,
        }
    }
}

impl EnvironmentConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file, then validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let config = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values the layers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.star_count == 0 {
            return Err(ConfigError::Invalid {
                field: "star_count",
                reason: "must be at least 1".into(),
            });
        }
        if self.lane_count == 0 {
            return Err(ConfigError::Invalid {
                field: "lane_count",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.lane_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "lane_width",
                reason: format!("must be positive, got {}", self.lane_width),
            });
        }
        if !(self.sun_radius > 0.0) {
            return Err(ConfigError::Invalid {
                field: "sun_radius",
                reason: format!("must be positive, got {}", self.sun_radius),
            });
        }
        let lighting = &self.lighting;
        if !(lighting.fog_near >= 0.0 && lighting.fog_near < lighting.fog_far) {
            return Err(ConfigError::Invalid {
                field: "lighting.fog_near",
                reason: format!(
                    "fog range [{}, {}] is empty or negative",
                    lighting.fog_near, lighting.fog_far
                ),
            });
        }
        Ok(())
    }
}
