//! Horizon sun layer.
//!
//! The host bobs and spins the sun group from elapsed time alone; horizontal
//! banding is computed in the shading stage. No state accumulates between
//! ticks, so the sun is a pure function of time.

use glam::{Quat, Vec3};
use neonway_common::{Rgb, Transform, smoothstep};

pub const SUN_BASE_Y: f32 = 30.0;
pub const SUN_BOB_RATE: f32 = 0.2;
pub const SUN_SPIN_RATE: f32 = 0.05;
pub const BAND_FREQUENCY: f32 = 40.0;
/// Brightness of the dark stripes relative to the gradient.
pub const BAND_DARKNESS: f32 = 0.1;

/// Vertical position of the sun group at `time`, oscillating in [29, 31].
pub fn sun_offset_y(time: f32) -> f32 {
    SUN_BASE_Y + (time * SUN_BOB_RATE).sin()
}

/// Rotation of the sun group about Y at `time`, in radians.
pub fn sun_rotation_y(time: f32) -> f32 {
    time * SUN_SPIN_RATE
}

/// CPU mirror of the sun fragment shader. `v` is the vertical texture
/// coordinate, 0 at the bottom pole and 1 at the top.
pub fn shade_sun(top: Rgb, bottom: Rgb, v: f32, time: f32) -> Rgb {
    let color = bottom.lerp(top, v);
    let bands = (v * BAND_FREQUENCY - time).sin();
    let band_mask = smoothstep(0.2, 0.3, bands);
    let fade_mask = smoothstep(0.7, 0.3, v);
    color.lerp(color.scale(BAND_DARKNESS), (1.0 - band_mask) * fade_mask)
}

/// Horizon sun layer state.
#[derive(Debug, Clone)]
pub struct HorizonSun {
    radius: f32,
    depth: f32,
    top: Rgb,
    bottom: Rgb,
    time: f32,
}

impl HorizonSun {
    /// Sun of `radius` at `depth`, shaded from `bottom` to `top`.
    pub fn new(radius: f32, depth: f32, top: Rgb, bottom: Rgb) -> Self {
        Self {
            radius,
            depth,
            top,
            bottom,
            time: 0.0,
        }
    }

    /// Move to `time` seconds since mount.
    pub fn update(&mut self, time: f32) {
        self.time = time;
    }

    /// Elapsed time fed to the band shader.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Current bob height.
    pub fn offset_y(&self) -> f32 {
        sun_offset_y(self.time)
    }

    /// Current spin about Y, in radians.
    pub fn rotation_y(&self) -> f32 {
        sun_rotation_y(self.time)
    }

    /// Sphere radius in world units.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Gradient endpoints as (top, bottom).
    pub fn colors(&self) -> (Rgb, Rgb) {
        (self.top, self.bottom)
    }

    /// Group transform; the sphere mesh is unit radius and scaled here.
    pub fn transform(&self) -> Transform {
        Transform {
            position: Vec3::new(0.0, self.offset_y(), self.depth),
            rotation: Quat::from_rotation_y(self.rotation_y()),
            scale: Vec3::splat(self.radius),
        }
    }

    /// Color at texture coordinate `v` for the current time.
    pub fn shade(&self, v: f32) -> Rgb {
        shade_sun(self.top, self.bottom, v, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    const TOP: Rgb = Rgb::new(1.0, 0.8, 0.1);
    const BOTTOM: Rgb = Rgb::new(1.0, 0.15, 0.45);

    #[test]
    fn offset_is_periodic() {
        let period = TAU / SUN_BOB_RATE;
        assert!((period - 31.4159).abs() < 1e-3);
        for i in 0..50 {
            let t = i as f32 * 0.73;
            assert!((sun_offset_y(t) - sun_offset_y(t + period)).abs() < 1e-4);
        }
    }

    #[test]
    fn offset_oscillates_between_29_and_31() {
        for i in 0..1000 {
            let y = sun_offset_y(i as f32 * 0.05);
            assert!((29.0..=31.0).contains(&y), "y={y}");
        }
        assert!((sun_offset_y(PI / 2.0 / SUN_BOB_RATE) - 31.0).abs() < 1e-5);
        assert!((sun_offset_y(3.0 * PI / 2.0 / SUN_BOB_RATE) - 29.0).abs() < 1e-5);
    }

    #[test]
    fn rotation_is_linear_in_time() {
        assert_eq!(sun_rotation_y(0.0), 0.0);
        assert!((sun_rotation_y(20.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn top_of_disc_is_pure_gradient() {
        // fade mask is zero above v = 0.7, so no stripes there.
        for i in 0..20 {
            let t = i as f32 * 0.4;
            assert_eq!(shade_sun(TOP, BOTTOM, 0.9, t), BOTTOM.lerp(TOP, 0.9));
        }
    }

    #[test]
    fn lower_disc_has_dark_bands() {
        // v = 0.1, t = 0: sin(4) < 0.2 so the band mask is off and the stripe is fully dark.
        let c = shade_sun(TOP, BOTTOM, 0.1, 0.0);
        let base = BOTTOM.lerp(TOP, 0.1);
        assert!((c.r - base.r * 0.1).abs() < 1e-5);
        assert!((c.g - base.g * 0.1).abs() < 1e-5);
    }

    #[test]
    fn bright_band_keeps_gradient() {
        // sin(v*40 - t) = 1 when v*40 - t = PI/2.
        let v = 0.1;
        let t = v * BAND_FREQUENCY - PI / 2.0;
        let c = shade_sun(TOP, BOTTOM, v, t);
        let base = BOTTOM.lerp(TOP, v);
        assert!((c.r - base.r).abs() < 1e-5);
        assert!((c.b - base.b).abs() < 1e-5);
    }

    #[test]
    fn transform_tracks_time() {
        let mut sun = HorizonSun::new(40.0, -150.0, TOP, BOTTOM);
        sun.update(0.0);
        let t0 = sun.transform();
        assert_eq!(t0.position, Vec3::new(0.0, 30.0, -150.0));
        assert_eq!(t0.scale, Vec3::splat(40.0));
        sun.update(10.0);
        let t1 = sun.transform();
        assert!((t1.position.y - (30.0 + 2.0_f32.sin())).abs() < 1e-5);
        assert!((sun.rotation_y() - 0.5).abs() < 1e-6);
    }
}
