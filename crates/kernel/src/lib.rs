//! Environment kernel: the looping corridor layers and the per-tick update
//! that keeps them in step with one external velocity signal.
//!
//! # Invariants
//! - Rendered star depth stays in [-600, 100); the grid offset stays in [0, 10).
//! - Lane separators are symmetric about X = 0 and regenerate only on a
//!   lane-count change.
//! - Ticks never allocate layer buffers; those exist from mount to unmount.
//! - Velocity and lane count are sampled once per tick and never written.

pub mod clock;
pub mod environment;
pub mod grid;
pub mod lanes;
pub mod starfield;
pub mod sun;

pub use clock::{FrameClock, FrameStats};
pub use environment::{Environment, FrameState, Layers, TickInputs};
pub use grid::MovingGrid;
pub use lanes::LaneGuides;
pub use starfield::{Particle, StarField, StarSample, StarUniforms};
pub use sun::HorizonSun;
