//! Read-only capabilities the environment polls once per tick.
//!
//! Gameplay owns and mutates these values; the renderer only ever reads them.

use std::sync::atomic::{AtomicU32, Ordering};

/// Speed substituted whenever the velocity source reports a non-positive
/// value (the "not yet set" sentinel).
pub const FALLBACK_SPEED: f32 = 5.0;

/// Speed actually used for animation. NaN also falls back.
pub fn effective_speed(velocity: f32) -> f32 {
    if velocity > 0.0 {
        velocity
    } else {
        FALLBACK_SPEED
    }
}

/// Forward velocity, in depth units per second.
pub trait VelocitySource: Send + Sync {
    fn current_speed(&self) -> f32;
}

/// Number of parallel lanes. Callers guarantee at least one.
pub trait LaneSource: Send + Sync {
    fn lane_count(&self) -> u32;
}

impl VelocitySource for f32 {
    fn current_speed(&self) -> f32 {
        *self
    }
}

impl LaneSource for u32 {
    fn lane_count(&self) -> u32 {
        *self
    }
}

/// Velocity cell shared between gameplay (writer) and renderer (reader).
///
/// Stores the `f32` bit pattern in an atomic so reads never tear and need no
/// lock. Relaxed ordering: one tick of staleness is acceptable.
#[derive(Debug, Default)]
pub struct SharedVelocity(AtomicU32);

impl SharedVelocity {
    pub fn new(speed: f32) -> Self {
        Self(AtomicU32::new(speed.to_bits()))
    }

    pub fn set(&self, speed: f32) {
        self.0.store(speed.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl VelocitySource for SharedVelocity {
    fn current_speed(&self) -> f32 {
        self.get()
    }
}

/// Lane count cell shared between gameplay (writer) and renderer (reader).
#[derive(Debug)]
pub struct SharedLanes(AtomicU32);

impl SharedLanes {
    pub fn new(count: u32) -> Self {
        Self(AtomicU32::new(count))
    }

    pub fn set(&self, count: u32) {
        self.0.store(count, Ordering::Relaxed);
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

impl LaneSource for SharedLanes {
    fn lane_count(&self) -> u32 {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn positive_velocity_passes_through() {
        assert_eq!(effective_speed(12.5), 12.5);
    }

    #[test]
    fn non_positive_velocity_falls_back() {
        assert_eq!(effective_speed(0.0), 5.0);
        assert_eq!(effective_speed(-3.0), 5.0);
        assert_eq!(effective_speed(-0.0), 5.0);
        assert_eq!(effective_speed(f32::NAN), 5.0);
    }

    #[test]
    fn shared_velocity_round_trips_bits() {
        let v = SharedVelocity::default();
        assert_eq!(v.get(), 0.0);
        v.set(42.25);
        assert_eq!(v.current_speed(), 42.25);
    }

    #[test]
    fn shared_velocity_visible_across_threads() {
        let v = Arc::new(SharedVelocity::new(1.0));
        let writer = Arc::clone(&v);
        std::thread::spawn(move || writer.set(9.0)).join().unwrap();
        assert_eq!(v.current_speed(), 9.0);
    }

    #[test]
    fn shared_lanes() {
        let lanes = SharedLanes::new(3);
        assert_eq!(lanes.lane_count(), 3);
        lanes.set(5);
        assert_eq!(lanes.lane_count(), 5);
    }

    #[test]
    fn plain_values_are_sources() {
        assert_eq!(7.0_f32.current_speed(), 7.0);
        assert_eq!(4_u32.lane_count(), 4);
    }
}
