use std::fmt::Write;

use glam::{Mat4, Vec3};
use neonway_kernel::Environment;
use neonway_kernel::starfield::tunnel_lift;

/// Fixed chase view down the corridor. The camera itself is owned by the host.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 3.0, 10.0),
            target: Vec3::new(0.0, 6.0, -100.0),
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl RenderView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the environment's layers and a view, then produces
/// output. It never mutates the environment.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render the environment as of its last tick.
    fn render(&self, env: &Environment, view: &RenderView) -> Self::Output;
}

/// Text renderer for the CLI, logs, and tests.
///
/// Runs the star shading math on the CPU and reports aggregates instead of
/// pixels.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Aggregates over one projected star field.
#[derive(Debug, Default)]
struct StarStats {
    visible: usize,
    lifted: usize,
    min_depth: f32,
    max_depth: f32,
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, env: &Environment, view: &RenderView) -> String {
        let mut out = String::new();
        let Some(layers) = env.layers() else {
            out.push_str("=== Corridor (unmounted) ===\n");
            return out;
        };

        let elapsed = env.last_frame().map_or(0.0, |f| f.elapsed);
        let _ = writeln!(
            out,
            "=== Corridor (tick={}, elapsed={:.2}s) ===",
            env.tick_count(),
            elapsed
        );

        if let Some(frame) = env.last_frame() {
            let _ = writeln!(
                out,
                "Speed: velocity={:.2} effective={:.2}",
                frame.inputs.velocity, frame.star_speed
            );
        }

        let mut stats = StarStats {
            min_depth: f32::INFINITY,
            max_depth: f32::NEG_INFINITY,
            ..StarStats::default()
        };
        for sample in layers.stars.project(view.view_matrix()) {
            if sample.is_visible() {
                stats.visible += 1;
            }
            stats.min_depth = stats.min_depth.min(sample.position.z);
            stats.max_depth = stats.max_depth.max(sample.position.z);
        }
        stats.lifted = layers
            .stars
            .particles()
            .iter()
            .filter(|p| tunnel_lift(p.position[0], p.position[1]) > 0.0)
            .count();
        let _ = writeln!(
            out,
            "Stars: {} visible={} depth=[{:.1}, {:.1}] tunnel_lifted={}",
            layers.stars.len(),
            stats.visible,
            stats.min_depth,
            stats.max_depth,
            stats.lifted
        );

        let _ = writeln!(
            out,
            "Grid: offset={:.2} z={:.2}",
            layers.grid.offset(),
            layers.grid.z_position()
        );

        let separators: Vec<String> = layers
            .lanes
            .separators()
            .iter()
            .map(|x| format!("{x:.2}"))
            .collect();
        let _ = writeln!(
            out,
            "Lanes: {} x {:.1} separators=[{}] rev={}",
            layers.lanes.lane_count(),
            layers.lanes.lane_width(),
            separators.join(", "),
            layers.lanes.revision()
        );

        let _ = writeln!(
            out,
            "Sun: y={:.2} rot={:.3} rad",
            layers.sun.offset_y(),
            layers.sun.rotation_y()
        );

        out
    }
}
