use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Linear RGB color with components in `[0, 1]`.
///
/// Serializes as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub const fn from_u32(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return Err(ConfigError::InvalidColor(s.to_string()));
        }
        let packed =
            u32::from_str_radix(digits, 16).map_err(|_| ConfigError::InvalidColor(s.to_string()))?;
        Ok(Self::from_u32(packed))
    }

    pub fn to_hex(&self) -> String {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.r * k, self.g * k, self.b * k)
    }

    /// Component-wise blend towards `other`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            crate::mix(self.r, other.r, t),
            crate::mix(self.g, other.g, t),
            crate::mix(self.b, other.b, t),
        )
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// RGB plus an extra fourth lane, for std140-friendly uniform packing.
    pub fn extend(self, w: f32) -> [f32; 4] {
        [self.r, self.g, self.b, w]
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
