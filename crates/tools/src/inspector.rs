use std::fmt;

use glam::Mat4;
use neonway_kernel::Environment;

/// Read-only queries against an environment for debugging and dev UI.
pub struct EnvironmentInspector;

impl EnvironmentInspector {
    /// Produce a one-line summary of the environment state.
    ///
    /// `view` is used to count the stars that would pass the shading stage.
    pub fn summary(env: &Environment, view: Mat4) -> EnvironmentSummary {
        let frame = env.last_frame();
        let (star_count, visible_stars, grid_z, lane_count) = match env.layers() {
            Some(layers) => (
                layers.stars.len(),
                layers.stars.project(view).filter(|s| s.is_visible()).count(),
                layers.grid.z_position(),
                layers.lanes.lane_count(),
            ),
            None => (0, 0, 0.0, 0),
        };
        EnvironmentSummary {
            mounted: env.is_mounted(),
            tick: env.tick_count(),
            elapsed: frame.map_or(0.0, |f| f.elapsed),
            velocity: frame.map_or(0.0, |f| f.inputs.velocity),
            effective_speed: frame.map_or(0.0, |f| f.star_speed),
            star_count,
            visible_stars,
            grid_z,
            lane_count,
        }
    }

    /// Lane layout, or `None` when unmounted.
    pub fn lanes(env: &Environment) -> Option<LaneInfo> {
        let lanes = &env.layers()?.lanes;
        Some(LaneInfo {
            lane_count: lanes.lane_count(),
            lane_width: lanes.lane_width(),
            separators: lanes.separators().to_vec(),
            centers: (0..lanes.lane_count())
                .filter_map(|i| lanes.lane_center(i))
                .collect(),
            revision: lanes.revision(),
        })
    }

    /// Sun placement, or `None` when unmounted.
    pub fn sun(env: &Environment) -> Option<SunInfo> {
        let sun = &env.layers()?.sun;
        let transform = sun.transform();
        Some(SunInfo {
            time: sun.time(),
            position: transform.position.to_array(),
            rotation_y: sun.rotation_y(),
            radius: sun.radius(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSummary {
    pub mounted: bool,
    pub tick: u64,
    pub elapsed: f32,
    pub velocity: f32,
    pub effective_speed: f32,
    pub star_count: usize,
    pub visible_stars: usize,
    pub grid_z: f32,
    pub lane_count: u32,
}

impl fmt::Display for EnvironmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.mounted {
            return write!(f, "Environment: unmounted");
        }
        write!(
            f,
            "Environment: tick={} t={:.2}s speed={:.2} (effective {:.2}) stars={}/{} grid_z={:.2} lanes={}",
            self.tick,
            self.elapsed,
            self.velocity,
            self.effective_speed,
            self.visible_stars,
            self.star_count,
            self.grid_z,
            self.lane_count
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaneInfo {
    pub lane_count: u32,
    pub lane_width: f32,
    pub separators: Vec<f32>,
    pub centers: Vec<f32>,
    pub revision: u64,
}

impl fmt::Display for LaneInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |xs: &[f32]| {
            xs.iter()
                .map(|x| format!("{x:.2}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "Lanes: {} x {:.2} separators=[{}] centers=[{}] rev={}",
            self.lane_count,
            self.lane_width,
            join(&self.separators),
            join(&self.centers),
            self.revision
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SunInfo {
    pub time: f32,
    pub position: [f32; 3],
    pub rotation_y: f32,
    pub radius: f32,
}

impl fmt::Display for SunInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sun: t={:.2}s pos=({:.2}, {:.2}, {:.2}) rot={:.3} rad radius={:.1}",
            self.time,
            self.position[0],
            self.position[1],
            self.position[2],
            self.rotation_y,
            self.radius
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neonway_common::EnvironmentConfig;
    use std::sync::Arc;

    fn mounted(velocity: f32, lanes: u32) -> Environment {
        let config = EnvironmentConfig {
            star_count: 200,
            ..EnvironmentConfig::default()
        };
        let mut env = Environment::new(config, Arc::new(velocity), Arc::new(lanes));
        env.mount();
        env
    }

    fn view() -> Mat4 {
        Mat4::look_at_rh(
            glam::Vec3::new(0.0, 3.0, 10.0),
            glam::Vec3::new(0.0, 6.0, -100.0),
            glam::Vec3::Y,
        )
    }

    #[test]
    fn summary_of_unmounted() {
        let env = Environment::new(EnvironmentConfig::default(), Arc::new(1.0f32), Arc::new(3u32));
        let summary = EnvironmentInspector::summary(&env, view());
        assert!(!summary.mounted);
        assert_eq!(summary.star_count, 0);
        assert_eq!(summary.to_string(), "Environment: unmounted");
        assert!(EnvironmentInspector::lanes(&env).is_none());
        assert!(EnvironmentInspector::sun(&env).is_none());
    }

    #[test]
    fn summary_after_ticks() {
        let mut env = mounted(-3.0, 4);
        env.tick(0.5, 0.5);
        env.tick(1.0, 0.5);
        let summary = EnvironmentInspector::summary(&env, view());
        assert!(summary.mounted);
        assert_eq!(summary.tick, 2);
        assert_eq!(summary.velocity, -3.0);
        assert_eq!(summary.effective_speed, 5.0);
        assert_eq!(summary.star_count, 200);
        assert!(summary.visible_stars <= 200);
        assert_eq!(summary.lane_count, 4);
        // 2.5 + 2.5 units travelled
        assert!((summary.grid_z - -95.0).abs() < 1e-4);
        assert!(summary.to_string().contains("lanes=4"));
    }

    #[test]
    fn lane_info_centers() {
        let env = mounted(5.0, 2);
        let info = EnvironmentInspector::lanes(&env).unwrap();
        assert_eq!(info.separators, vec![-4.0, 0.0, 4.0]);
        assert_eq!(info.centers, vec![-2.0, 2.0]);
        assert!(info.to_string().contains("centers=[-2.00, 2.00]"));
    }

    #[test]
    fn sun_info_tracks_time() {
        let mut env = mounted(5.0, 3);
        env.tick(2.0, 0.016);
        let info = EnvironmentInspector::sun(&env).unwrap();
        assert_eq!(info.time, 2.0);
        assert_eq!(info.position[2], -150.0);
        assert!((info.rotation_y - 0.1).abs() < 1e-6);
        assert_eq!(info.radius, 40.0);
    }
}
