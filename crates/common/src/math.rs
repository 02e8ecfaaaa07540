//! Scalar helpers shared by the host-side layers and the CPU mirrors of the
//! shading stage. Semantics match the WGSL built-ins of the same name.

/// Floor-style modulo into `[0, period)`.
///
/// Matches GLSL `mod` for positive periods. Tiny negative inputs can round up
/// to exactly `period` in `rem_euclid`; those fold back to zero so the result
/// never reaches the upper bound.
pub fn wrap(value: f32, period: f32) -> f32 {
    let r = value.rem_euclid(period);
    if r >= period { 0.0 } else { r }
}

/// Hermite interpolation between two edges.
///
/// Works with reversed edges (`edge0 > edge1`), which yields a falling ramp.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear blend, exactly `a` at `t = 0` and exactly `b` at `t = 1`.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
