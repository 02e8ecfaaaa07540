//! Lane guide layer: a floor plane divided into equal-width lanes by thin
//! emissive separator strips.

/// Length of the lane floor and separator strips along Z.
pub const LANE_LENGTH: f32 = 200.0;
/// Depth of the floor's center; the floor runs a little behind the camera.
pub const LANE_CENTER_Z: f32 = -90.0;
/// Width of a separator strip.
pub const SEPARATOR_WIDTH: f32 = 0.1;

/// X coordinates of the `count + 1` lane boundaries, centered on X = 0.
pub fn lane_separators(count: u32, width: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(count as usize + 1);
    fill_separators(&mut out, count, width);
    out
}

fn fill_separators(out: &mut Vec<f32>, count: u32, width: f32) {
    let start = -(count as f32 * width) / 2.0;
    out.clear();
    out.extend((0..=count).map(|i| start + i as f32 * width));
}

/// Lane guide layer: floor plane plus separator strips.
///
/// Inert per tick. Geometry is regenerated only when the lane count changes;
/// each regeneration bumps [`LaneGuides::revision`] so render backends can
/// rebuild their lane buffers.
#[derive(Debug, Clone)]
pub struct LaneGuides {
    lane_count: u32,
    lane_width: f32,
    separators: Vec<f32>,
    revision: u64,
}

impl LaneGuides {
    /// `lane_count` must be at least 1.
    pub fn new(lane_count: u32, lane_width: f32) -> Self {
        Self {
            lane_count,
            lane_width,
            separators: lane_separators(lane_count, lane_width),
            revision: 0,
        }
    }

    /// Regenerate if the count changed. Returns whether anything changed.
    pub fn set_lane_count(&mut self, lane_count: u32) -> bool {
        if lane_count == self.lane_count {
            return false;
        }
        tracing::debug!(
            from = self.lane_count,
            to = lane_count,
            "regenerating lane separators"
        );
        self.lane_count = lane_count;
        fill_separators(&mut self.separators, lane_count, self.lane_width);
        self.revision += 1;
        true
    }

    /// Number of lanes currently laid out.
    pub fn lane_count(&self) -> u32 {
        self.lane_count
    }

    /// Fixed width of each lane.
    pub fn lane_width(&self) -> f32 {
        self.lane_width
    }

    /// Boundary X positions, `lane_count + 1` of them, left to right.
    pub fn separators(&self) -> &[f32] {
        &self.separators
    }

    /// Bumped on every regeneration.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Floor dimensions as (width along X, length along Z).
    pub fn floor_size(&self) -> (f32, f32) {
        (self.lane_count as f32 * self.lane_width, LANE_LENGTH)
    }

    /// X coordinate of a lane's center line.
    pub fn lane_center(&self, index: u32) -> Option<f32> {
        (index < self.lane_count).then(|| self.separators[index as usize] + self.lane_width / 2.0)
    }
}
