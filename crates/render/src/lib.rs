//! Rendering adapter: renderer-agnostic interface plus scene composition.
//!
//! # Invariants
//! - Renderers never mutate the environment or its input sources.
//! - The scene description is assembled once per mount and is static after.
//!
//! The text renderer runs the same shading math as the GPU backend on the
//! CPU, which makes it the reference for tests and headless runs.

mod renderer;
mod scene;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use scene::{Fog, LayerKind, Light, SceneDescription};

pub fn crate_info() -> &'static str {
    "neonway-render v0.1.0"
}
