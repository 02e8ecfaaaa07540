//! wgpu render backend for the corridor.
//!
//! Draws the horizon sun, the moving grid, the lane floor and the star field
//! from a mounted environment's layers.
//!
//! # Invariants
//! - Renderer never mutates the environment.
//! - Buffers are created once per mount; per frame only uniforms are written.
//! - Lane geometry is rebuilt only when the lane guides change revision.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::WgpuRenderer;
pub use mesh::{GridVertex, LaneVertex, SunVertex, grid_mesh, lane_mesh, sphere_mesh};
pub use shaders::{grid_shader, lane_shader, starfield_shader, sun_shader};
