//! Developer tooling: read-only inspection of a running environment.
//!
//! # Invariants
//! - Tools never mutate the environment or its input sources.

mod inspector;

pub use inspector::{EnvironmentInspector, EnvironmentSummary, LaneInfo, SunInfo};

pub fn crate_info() -> &'static str {
    "neonway-tools v0.1.0"
}
