//! Star field layer: a fixed point cloud that flies towards the viewer forever.
//!
//! The host writes the particle buffer once at mount and afterwards publishes
//! only two scalars per tick ([`StarUniforms`]). Depth wraparound, tunnel
//! avoidance, point size and fade are all computed per particle in the
//! shading stage. The functions in this module are the CPU mirror of that
//! shader and must stay in lockstep with the WGSL star shader.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use neonway_common::{smoothstep, wrap};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Default particle count.
pub const STAR_COUNT: usize = 4000;

/// Spawn volume half extents along X and Y.
pub const SPAWN_HALF_WIDTH: f32 = 300.0;
pub const SPAWN_HALF_HEIGHT: f32 = 200.0;

/// Farthest rendered depth. Particles spawn in `[DEPTH_FAR, 0)`.
pub const DEPTH_FAR: f32 = -600.0;
/// Length of the depth loop; rendered depth lies in `[DEPTH_FAR, DEPTH_FAR + DEPTH_SPAN)`.
pub const DEPTH_SPAN: f32 = 700.0;

/// Corridor kept clear in front of the camera.
pub const TUNNEL_HALF_WIDTH: f32 = 20.0;
pub const TUNNEL_Y_MIN: f32 = -10.0;
pub const TUNNEL_Y_MAX: f32 = 30.0;
pub const TUNNEL_LIFT: f32 = 50.0;

pub const SIZE_SCALE: f32 = 400.0;
pub const FADE_START: f32 = -600.0;
pub const FADE_END: f32 = -400.0;

/// One star as uploaded to the GPU. Never mutated after creation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Initial placement.
    pub position: [f32; 3],
    /// Per-star variance in `[0, 1)`.
    pub jitter: f32,
}

/// The two per-tick inputs of the star shader.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StarUniforms {
    pub time: f32,
    pub speed: f32,
}

/// A particle as the shading stage sees it for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StarSample {
    /// World position after wraparound and tunnel avoidance.
    pub position: Vec3,
    /// Depth in view space; negative in front of the camera.
    pub view_z: f32,
    /// Point diameter in pixels.
    pub size: f32,
    pub alpha: f32,
}

impl StarSample {
    /// False for particles at or behind the camera plane.
    pub fn is_visible(&self) -> bool {
        self.view_z < 0.0 && self.alpha > 0.0
    }
}

/// Depth after `time` seconds at `speed`, wrapped into `[-600, 100)`.
pub fn wrapped_depth(initial_z: f32, time: f32, speed: f32) -> f32 {
    wrap(initial_z + time * speed, DEPTH_SPAN) + DEPTH_FAR
}

/// Vertical push applied to particles inside the corridor ahead of the player.
pub fn tunnel_lift(x: f32, y: f32) -> f32 {
    if x.abs() < TUNNEL_HALF_WIDTH && y > TUNNEL_Y_MIN && y < TUNNEL_Y_MAX {
        TUNNEL_LIFT
    } else {
        0.0
    }
}

/// Perspective point size with per-particle variance.
pub fn point_size(view_z: f32, jitter: f32) -> f32 {
    (SIZE_SCALE / -view_z) * (0.5 + jitter)
}

/// Fade-in from maximum depth, scaled by jitter.
pub fn star_alpha(depth: f32, jitter: f32) -> f32 {
    smoothstep(FADE_START, FADE_END, depth) * (0.5 + jitter * 0.5)
}

/// Run one particle through the shading-stage math.
pub fn shade_particle(particle: &Particle, uniforms: StarUniforms, view: &Mat4) -> StarSample {
    let [x, y, z0] = particle.position;
    let z = wrapped_depth(z0, uniforms.time, uniforms.speed);
    let position = Vec3::new(x, y + tunnel_lift(x, y), z);
    let view_z = view.transform_point3(position).z;
    StarSample {
        position,
        view_z,
        size: point_size(view_z, particle.jitter),
        alpha: star_alpha(z, particle.jitter),
    }
}

/// Uniformly scatter `count` particles through the spawn volume.
pub fn generate_particles(count: usize, seed: u64) -> Vec<Particle> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x = rng.random_range(-SPAWN_HALF_WIDTH..SPAWN_HALF_WIDTH);
            let y = rng.random_range(-SPAWN_HALF_HEIGHT..SPAWN_HALF_HEIGHT);
            let z = rng.random_range(DEPTH_FAR..0.0);
            Particle {
                position: [x, y, z],
                jitter: rng.random::<f32>(),
            }
        })
        .collect()
}

/// Star field layer state: the immutable particle buffer plus this tick's uniforms.
#[derive(Debug, Clone)]
pub struct StarField {
    particles: Vec<Particle>,
    uniforms: StarUniforms,
}

impl StarField {
    /// Scatter `count` particles from `seed`. The same seed always yields the
    /// same buffer.
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            particles: generate_particles(count, seed),
            uniforms: StarUniforms::default(),
        }
    }

    /// Publish this tick's shader inputs. `speed` is already the effective speed.
    pub fn update(&mut self, time: f32, speed: f32) {
        self.uniforms = StarUniforms { time, speed };
    }

    /// The immutable buffer uploaded once at mount.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Inputs published by the last `update`.
    pub fn uniforms(&self) -> StarUniforms {
        self.uniforms
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Lazily shade every particle for the current uniforms.
    pub fn project(&self, view: Mat4) -> impl Iterator<Item = StarSample> + '_ {
        let uniforms = self.uniforms;
        self.particles
            .iter()
            .map(move |p| shade_particle(p, uniforms, &view))
    }

    /// Shade into a caller-owned flat array across the rayon pool. Returns how
    /// many slots were written; extra slots on either side are left untouched.
    pub fn resolve_into(&self, view: Mat4, out: &mut [StarSample]) -> usize {
        let uniforms = self.uniforms;
        out.par_iter_mut()
            .zip(self.particles.par_iter())
            .for_each(|(slot, particle)| *slot = shade_particle(particle, uniforms, &view));
        out.len().min(self.particles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_view() -> Mat4 {
        Mat4::look_at_rh(Vec3::new(0.0, 3.0, 10.0), Vec3::new(0.0, 3.0, -100.0), Vec3::Y)
    }

    #[test]
    fn generation_respects_spawn_volume() {
        let particles = generate_particles(STAR_COUNT, 7);
        assert_eq!(particles.len(), STAR_COUNT);
        for p in &particles {
            let [x, y, z] = p.position;
            assert!((-SPAWN_HALF_WIDTH..=SPAWN_HALF_WIDTH).contains(&x));
            assert!((-SPAWN_HALF_HEIGHT..=SPAWN_HALF_HEIGHT).contains(&y));
            assert!((DEPTH_FAR..0.0).contains(&z));
            assert!((0.0..1.0).contains(&p.jitter));
        }
    }

    #[test]
    fn generation_is_seeded() {
        assert_eq!(generate_particles(64, 1), generate_particles(64, 1));
        assert_ne!(generate_particles(64, 1), generate_particles(64, 2));
    }

    #[test]
    fn wrapped_depth_stays_in_loop() {
        let particles = generate_particles(500, 3);
        for speed in [0.1, 5.0, 37.3, 120.0] {
            for step in 0..400 {
                let time = step as f32 * 0.37;
                for p in &particles {
                    let z = wrapped_depth(p.position[2], time, speed);
                    assert!((-600.0..100.0).contains(&z), "z={z} t={time} v={speed}");
                }
            }
        }
    }

    #[test]
    fn full_cycle_returns_to_start() {
        // 140 s at speed 5 covers exactly one 700-unit loop.
        for p in generate_particles(200, 11) {
            let z0 = p.position[2];
            let start = wrapped_depth(z0, 0.0, 5.0);
            let end = wrapped_depth(z0, 140.0, 5.0);
            assert!((start - end).abs() < 1e-3, "start={start} end={end}");
        }
    }

    #[test]
    fn depth_advances_towards_viewer() {
        let z = wrapped_depth(-300.0, 2.0, 10.0);
        assert!((z - (-300.0 + 20.0 + 700.0 - 600.0)).abs() < 1e-4);
    }

    #[test]
    fn tunnel_lift_inside_band() {
        let view = camera_view();
        let uniforms = StarUniforms { time: 0.0, speed: 5.0 };
        let inside = Particle { position: [5.0, 0.0, -100.0], jitter: 0.5 };
        let outside = Particle { position: [5.0, 40.0, -100.0], jitter: 0.5 };
        let a = shade_particle(&inside, uniforms, &view);
        let b = shade_particle(&outside, uniforms, &view);
        assert_eq!(a.position.y, 50.0);
        assert_eq!(b.position.y, 40.0);
        assert_eq!(a.position.z, b.position.z);
    }

    #[test]
    fn tunnel_band_is_exclusive() {
        assert_eq!(tunnel_lift(19.9, 0.0), 50.0);
        assert_eq!(tunnel_lift(-19.9, 29.9), 50.0);
        assert_eq!(tunnel_lift(20.0, 0.0), 0.0);
        assert_eq!(tunnel_lift(0.0, -10.0), 0.0);
        assert_eq!(tunnel_lift(0.0, 30.0), 0.0);
    }

    #[test]
    fn point_size_scales_with_depth_and_jitter() {
        assert!((point_size(-400.0, 0.5) - 1.0).abs() < 1e-6);
        assert!((point_size(-100.0, 0.0) - 2.0).abs() < 1e-6);
        assert!(point_size(-50.0, 0.3) > point_size(-200.0, 0.3));
    }

    #[test]
    fn alpha_fades_in_from_far_plane() {
        assert_eq!(star_alpha(-600.0, 1.0), 0.0);
        assert!((star_alpha(-400.0, 1.0) - 1.0).abs() < 1e-6);
        assert!((star_alpha(0.0, 0.0) - 0.5).abs() < 1e-6);
        let mid = star_alpha(-500.0, 1.0);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn update_only_touches_uniforms() {
        let mut field = StarField::new(32, 5);
        let before = field.particles().to_vec();
        field.update(12.0, 8.0);
        assert_eq!(field.uniforms(), StarUniforms { time: 12.0, speed: 8.0 });
        assert_eq!(field.particles(), before.as_slice());
    }

    #[test]
    fn resolve_into_reuses_caller_buffer() {
        let mut field = StarField::new(256, 9);
        let mut samples = vec![StarSample::default(); field.len()];
        let ptr = samples.as_ptr();
        field.update(1.0, 5.0);
        assert_eq!(field.resolve_into(camera_view(), &mut samples), 256);
        field.update(2.0, 5.0);
        assert_eq!(field.resolve_into(camera_view(), &mut samples), 256);
        assert_eq!(samples.as_ptr(), ptr);
        assert!(samples.iter().all(|s| (-600.0..100.0).contains(&s.position.z)));
    }

    #[test]
    fn resolve_into_matches_lazy_projection() {
        let mut field = StarField::new(1000, 21);
        field.update(37.5, 12.0);
        let mut samples = vec![StarSample::default(); field.len()];
        field.resolve_into(camera_view(), &mut samples);
        for (resolved, lazy) in samples.iter().zip(field.project(camera_view())) {
            assert_eq!(*resolved, lazy);
        }
    }

    #[test]
    fn resolve_into_short_buffer_writes_prefix() {
        let mut field = StarField::new(64, 4);
        field.update(3.0, 5.0);
        let mut samples = vec![StarSample::default(); 10];
        assert_eq!(field.resolve_into(camera_view(), &mut samples), 10);
        let expected: Vec<StarSample> = field.project(camera_view()).take(10).collect();
        assert_eq!(samples, expected);

        let mut long = vec![StarSample::default(); 80];
        assert_eq!(field.resolve_into(camera_view(), &mut long), 64);
        assert!(long[64..].iter().all(|s| *s == StarSample::default()));
    }

    #[test]
    fn stars_behind_camera_are_hidden() {
        let view = camera_view();
        let uniforms = StarUniforms { time: 0.0, speed: 5.0 };
        // Initial z -50 wraps to +50, behind a camera at z = 10.
        let p = Particle { position: [100.0, 100.0, -50.0], jitter: 0.5 };
        let s = shade_particle(&p, uniforms, &view);
        assert!(s.view_z > 0.0);
        assert!(!s.is_visible());
    }
}
