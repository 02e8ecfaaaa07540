//! Shared types for the neonway environment: transforms, colors, scalar math,
//! the external input sources, and environment configuration.
//!
//! # Invariants
//! - Input sources are read-only from the renderer's point of view.
//! - The fallback speed and wraparound math live here and nowhere else.

mod color;
mod config;
mod error;
mod math;
mod source;
mod types;

pub use color::Rgb;
pub use config::{EnvironmentConfig, LightingConfig, Palette};
pub use error::ConfigError;
pub use math::{mix, smoothstep, wrap};
pub use source::{
    FALLBACK_SPEED, LaneSource, SharedLanes, SharedVelocity, VelocitySource, effective_speed,
};
pub use types::Transform;

pub fn crate_info() -> &'static str {
    "neonway-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
