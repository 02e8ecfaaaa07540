use std::sync::Arc;

use neonway_common::{EnvironmentConfig, LaneSource, Transform, VelocitySource, effective_speed};

use crate::grid::MovingGrid;
use crate::lanes::LaneGuides;
use crate::starfield::StarField;
use crate::sun::HorizonSun;

/// The four layers, alive only while the environment is mounted.
#[derive(Debug, Clone)]
pub struct Layers {
    pub stars: StarField,
    pub grid: MovingGrid,
    pub lanes: LaneGuides,
    pub sun: HorizonSun,
}

impl Layers {
    fn create(config: &EnvironmentConfig, lane_count: u32) -> Self {
        Self {
            stars: StarField::new(config.star_count, config.star_seed),
            grid: MovingGrid::new(),
            lanes: LaneGuides::new(lane_count, config.lane_width),
            sun: HorizonSun::new(
                config.sun_radius,
                config.sun_depth,
                config.palette.sun_top,
                config.palette.sun_bottom,
            ),
        }
    }
}

/// External inputs sampled once at the start of a tick. Every layer sees the
/// same values for the rest of that tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInputs {
    pub velocity: f32,
    pub lane_count: u32,
}

/// What one tick produced, for render backends and tooling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub tick: u64,
    pub elapsed: f32,
    pub delta: f32,
    pub inputs: TickInputs,
    /// Effective speed used by the star shader.
    pub star_speed: f32,
    /// Effective speed used to advance the grid. Always equal to `star_speed`;
    /// both come from the same velocity sample.
    pub grid_speed: f32,
    pub grid_offset: f32,
    pub grid_z: f32,
    pub sun: Transform,
    /// The lane separators were regenerated this tick.
    pub lanes_changed: bool,
}

/// The scrolling corridor environment.
///
/// Owns the layers between `mount` and `unmount` and advances them from an
/// explicit `tick(elapsed, delta)` driven by the host. Velocity and lane count
/// come from injected read-only sources and are never written here.
pub struct Environment {
    config: EnvironmentConfig,
    velocity: Arc<dyn VelocitySource>,
    lanes: Arc<dyn LaneSource>,
    layers: Option<Layers>,
    tick: u64,
    last_frame: Option<FrameState>,
}

impl Environment {
    /// Create an unmounted environment. No buffers exist until [`Environment::mount`].
    pub fn new(
        config: EnvironmentConfig,
        velocity: Arc<dyn VelocitySource>,
        lanes: Arc<dyn LaneSource>,
    ) -> Self {
        Self {
            config,
            velocity,
            lanes,
            layers: None,
            tick: 0,
            last_frame: None,
        }
    }

    /// Create every layer buffer. Mounting twice is a no-op.
    pub fn mount(&mut self) {
        if self.layers.is_some() {
            tracing::debug!("environment already mounted");
            return;
        }
        let lane_count = self.lanes.lane_count();
        let layers = Layers::create(&self.config, lane_count);
        tracing::info!(
            stars = layers.stars.len(),
            lanes = lane_count,
            grid_divisions = layers.grid.divisions(),
            "environment mounted"
        );
        self.layers = Some(layers);
        self.tick = 0;
        self.last_frame = None;
    }

    /// Release every layer buffer.
    pub fn unmount(&mut self) {
        if self.layers.take().is_some() {
            tracing::info!(ticks = self.tick, "environment unmounted");
        }
        self.last_frame = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.layers.is_some()
    }

    /// Advance every layer by one frame.
    ///
    /// Returns `None` without touching anything when not mounted.
    pub fn tick(&mut self, elapsed: f32, delta: f32) -> Option<FrameState> {
        let _span = tracing::trace_span!("environment_tick", elapsed, delta).entered();
        let Some(layers) = self.layers.as_mut() else {
            tracing::trace!("tick skipped, environment not mounted");
            return None;
        };

        let inputs = TickInputs {
            velocity: self.velocity.current_speed(),
            lane_count: self.lanes.lane_count(),
        };

        let star_speed = effective_speed(inputs.velocity);
        layers.stars.update(elapsed, star_speed);

        let grid_speed = effective_speed(inputs.velocity);
        layers.grid.advance(grid_speed, delta);

        let lanes_changed = layers.lanes.set_lane_count(inputs.lane_count);

        layers.sun.update(elapsed);

        self.tick += 1;
        let frame = FrameState {
            tick: self.tick,
            elapsed,
            delta,
            inputs,
            star_speed,
            grid_speed,
            grid_offset: layers.grid.offset(),
            grid_z: layers.grid.z_position(),
            sun: layers.sun.transform(),
            lanes_changed,
        };
        tracing::trace!(
            tick = frame.tick,
            speed = star_speed,
            grid_z = frame.grid_z,
            "environment tick complete"
        );
        self.last_frame = Some(frame);
        Some(frame)
    }

    pub fn layers(&self) -> Option<&Layers> {
        self.layers.as_ref()
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Ticks applied since the last mount.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn last_frame(&self) -> Option<&FrameState> {
        self.last_frame.as_ref()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("mounted", &self.is_mounted())
            .field("tick", &self.tick)
            .field("last_frame", &self.last_frame)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neonway_common::{SharedLanes, SharedVelocity};

    fn small_config() -> EnvironmentConfig {
        EnvironmentConfig {
            star_count: 64,
            ..EnvironmentConfig::default()
        }
    }

    fn mounted(velocity: f32, lanes: u32) -> Environment {
        let mut env = Environment::new(small_config(), Arc::new(velocity), Arc::new(lanes));
        env.mount();
        env
    }

    #[test]
    fn tick_before_mount_is_a_no_op() {
        let mut env = Environment::new(small_config(), Arc::new(10.0_f32), Arc::new(3_u32));
        assert!(env.tick(1.0, 0.016).is_none());
        assert_eq!(env.tick_count(), 0);
        assert!(env.layers().is_none());
        assert!(env.last_frame().is_none());
    }

    #[test]
    fn mount_creates_layers_from_config() {
        let env = mounted(10.0, 4);
        let layers = env.layers().unwrap();
        assert_eq!(layers.stars.len(), 64);
        assert_eq!(layers.lanes.lane_count(), 4);
        assert_eq!(layers.lanes.separators().len(), 5);
        assert_eq!(layers.grid.offset(), 0.0);
    }

    #[test]
    fn unmount_releases_layers() {
        let mut env = mounted(10.0, 3);
        env.tick(0.5, 0.5);
        env.unmount();
        assert!(!env.is_mounted());
        assert!(env.tick(1.0, 0.5).is_none());
    }

    #[test]
    fn zero_velocity_falls_back_for_both_layers() {
        let mut env = mounted(0.0, 3);
        let frame = env.tick(1.0, 1.0).unwrap();
        assert_eq!(frame.star_speed, 5.0);
        assert_eq!(frame.grid_speed, 5.0);
        assert_eq!(frame.grid_offset, 5.0);
        assert_eq!(frame.grid_z, -95.0);
        let stars = env.layers().unwrap().stars.uniforms();
        assert_eq!(stars.speed, 5.0);
        assert_eq!(stars.time, 1.0);
    }

    #[test]
    fn negative_velocity_falls_back() {
        let mut env = mounted(-12.0, 3);
        let frame = env.tick(0.0, 0.0).unwrap();
        assert_eq!(frame.inputs.velocity, -12.0);
        assert_eq!(frame.star_speed, 5.0);
    }

    #[test]
    fn stars_and_grid_share_one_effective_speed() {
        let velocity = Arc::new(SharedVelocity::new(0.0));
        let mut env = Environment::new(small_config(), velocity.clone(), Arc::new(3_u32));
        env.mount();
        for (i, v) in [0.0, -3.0, 0.5, 12.0, 250.0].into_iter().enumerate() {
            velocity.set(v);
            let frame = env.tick(i as f32 * 0.1, 0.1).unwrap();
            assert_eq!(frame.star_speed, frame.grid_speed, "velocity {v}");
            assert_eq!(env.layers().unwrap().stars.uniforms().speed, frame.grid_speed);
        }
    }

    #[test]
    fn velocity_changes_are_picked_up_next_tick() {
        let velocity = Arc::new(SharedVelocity::new(20.0));
        let mut env = Environment::new(small_config(), velocity.clone(), Arc::new(3_u32));
        env.mount();
        let first = env.tick(0.1, 0.1).unwrap();
        assert_eq!(first.star_speed, 20.0);
        velocity.set(40.0);
        let second = env.tick(0.2, 0.1).unwrap();
        assert_eq!(second.star_speed, 40.0);
        assert!((second.grid_offset - 6.0).abs() < 1e-5);
    }

    #[test]
    fn lane_change_regenerates_once() {
        let lanes = Arc::new(SharedLanes::new(3));
        let mut env = Environment::new(small_config(), Arc::new(10.0_f32), lanes.clone());
        env.mount();
        assert!(!env.tick(0.1, 0.1).unwrap().lanes_changed);
        lanes.set(5);
        assert!(env.tick(0.2, 0.1).unwrap().lanes_changed);
        assert!(!env.tick(0.3, 0.1).unwrap().lanes_changed);
        let guides = &env.layers().unwrap().lanes;
        assert_eq!(guides.separators(), &[-10.0, -6.0, -2.0, 2.0, 6.0, 10.0]);
        assert_eq!(guides.revision(), 1);
    }

    #[test]
    fn ticks_do_not_reallocate_particles() {
        let mut env = mounted(30.0, 3);
        let ptr = env.layers().unwrap().stars.particles().as_ptr();
        for i in 0..100 {
            env.tick(i as f32 * 0.016, 0.016);
        }
        assert_eq!(env.layers().unwrap().stars.particles().as_ptr(), ptr);
        assert_eq!(env.tick_count(), 100);
    }

    #[test]
    fn sun_follows_elapsed_time() {
        let mut env = mounted(10.0, 3);
        let frame = env.tick(0.0, 0.0).unwrap();
        assert_eq!(frame.sun.position.y, 30.0);
        let frame = env.tick(20.0, 0.016).unwrap();
        assert!((frame.sun.position.y - (30.0 + 4.0_f32.sin())).abs() < 1e-5);
    }

    #[test]
    fn remount_resets_state() {
        let mut env = mounted(10.0, 3);
        env.tick(1.0, 0.7);
        env.unmount();
        env.mount();
        assert_eq!(env.tick_count(), 0);
        assert_eq!(env.layers().unwrap().grid.offset(), 0.0);
    }
}
