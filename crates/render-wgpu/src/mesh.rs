//! CPU-side geometry for the GPU layers. Everything here is built once per
//! mount, except the lane mesh which is rebuilt on a lane-count change.

use bytemuck::{Pod, Zeroable};
use neonway_common::Rgb;
use neonway_kernel::LaneGuides;
use neonway_kernel::lanes::{LANE_CENTER_Z, LANE_LENGTH, SEPARATOR_WIDTH};

/// Separator strips sit just above the floor to avoid z-fighting.
const SEPARATOR_LIFT: f32 = 0.01;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LaneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub emissive: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SunVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Square line grid in the XZ plane centered on the origin, for a line list.
///
/// `divisions` cells per side gives `divisions + 1` lines along each axis.
pub fn grid_mesh(extent: f32, divisions: u32) -> Vec<GridVertex> {
    let divisions = divisions.max(1);
    let half = extent / 2.0;
    let step = extent / divisions as f32;
    let mut verts = Vec::with_capacity((divisions as usize + 1) * 4);

    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        // Lines along X
        verts.push(GridVertex {
            position: [-half, 0.0, offset],
        });
        verts.push(GridVertex {
            position: [half, 0.0, offset],
        });
        // Lines along Z
        verts.push(GridVertex {
            position: [offset, 0.0, -half],
        });
        verts.push(GridVertex {
            position: [offset, 0.0, half],
        });
    }
    verts
}

fn push_quad(
    out: &mut Vec<LaneVertex>,
    x0: f32,
    x1: f32,
    y: f32,
    color: [f32; 3],
    emissive: f32,
) {
    let z_near = LANE_CENTER_Z + LANE_LENGTH / 2.0;
    let z_far = LANE_CENTER_Z - LANE_LENGTH / 2.0;
    let vertex = |x: f32, z: f32| LaneVertex {
        position: [x, y, z],
        normal: [0.0, 1.0, 0.0],
        color,
        emissive,
    };
    // Counter-clockwise seen from above.
    out.extend_from_slice(&[
        vertex(x0, z_near),
        vertex(x1, z_near),
        vertex(x1, z_far),
        vertex(x0, z_near),
        vertex(x1, z_far),
        vertex(x0, z_far),
    ]);
}

/// Floor quad plus one emissive strip per separator, as a triangle list.
pub fn lane_mesh(lanes: &LaneGuides, floor: Rgb, separator: Rgb) -> Vec<LaneVertex> {
    let separators = lanes.separators();
    let mut verts = Vec::with_capacity(6 * (1 + separators.len()));
    let (width, _) = lanes.floor_size();
    push_quad(
        &mut verts,
        -width / 2.0,
        width / 2.0,
        0.0,
        floor.to_array(),
        0.0,
    );
    let half = SEPARATOR_WIDTH / 2.0;
    for &x in separators {
        push_quad(
            &mut verts,
            x - half,
            x + half,
            SEPARATOR_LIFT,
            separator.to_array(),
            1.0,
        );
    }
    verts
}

fn sphere_vertex(lat: u32, lon: u32, n_lat: u32, n_lon: u32) -> SunVertex {
    let theta = std::f32::consts::PI * lat as f32 / n_lat as f32;
    let phi = std::f32::consts::TAU * lon as f32 / n_lon as f32;
    SunVertex {
        position: [
            theta.sin() * phi.cos(),
            theta.cos(),
            theta.sin() * phi.sin(),
        ],
        uv: [lon as f32 / n_lon as f32, 1.0 - lat as f32 / n_lat as f32],
    }
}

/// Unit UV sphere as a plain triangle list. `uv.y` is 1 at the north pole
/// and 0 at the south pole.
pub fn sphere_mesh(n_lat: u32, n_lon: u32) -> Vec<SunVertex> {
    let n_lat = n_lat.max(2);
    let n_lon = n_lon.max(3);
    let mut verts = Vec::with_capacity((n_lat * n_lon * 6) as usize);

    for lat in 0..n_lat {
        for lon in 0..n_lon {
            let p00 = sphere_vertex(lat, lon, n_lat, n_lon);
            let p10 = sphere_vertex(lat + 1, lon, n_lat, n_lon);
            let p01 = sphere_vertex(lat, lon + 1, n_lat, n_lon);
            let p11 = sphere_vertex(lat + 1, lon + 1, n_lat, n_lon);
            verts.extend_from_slice(&[p00, p10, p01, p10, p11, p01]);
        }
    }
    verts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_lines_on_cell_boundaries() {
        let verts = grid_mesh(200.0, 20);
        assert_eq!(verts.len(), 21 * 4);
        for v in &verts {
            assert_eq!(v.position[1], 0.0);
            for c in [v.position[0], v.position[2]] {
                assert!((-100.0..=100.0).contains(&c));
                let cells = c / 10.0;
                assert!((cells - cells.round()).abs() < 1e-4, "{c} not on a cell line");
            }
        }
    }

    #[test]
    fn lane_mesh_has_floor_and_strips() {
        let lanes = LaneGuides::new(3, 4.0);
        let floor = Rgb::from_u32(0x12002b);
        let sep = Rgb::from_u32(0x00ffff);
        let verts = lane_mesh(&lanes, floor, sep);
        assert_eq!(verts.len(), 6 * 5);

        let floor_verts = &verts[..6];
        assert!(floor_verts.iter().all(|v| v.emissive == 0.0));
        let min_x = floor_verts.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        assert_eq!(min_x, -6.0);

        for (strip, x) in verts[6..].chunks(6).zip(lanes.separators()) {
            assert!(strip.iter().all(|v| v.emissive == 1.0));
            let center = strip.iter().map(|v| v.position[0]).sum::<f32>() / 6.0;
            assert!((center - x).abs() < 1e-5);
        }
    }

    #[test]
    fn lane_mesh_spans_the_floor_length() {
        let verts = lane_mesh(&LaneGuides::new(1, 4.0), Rgb::BLACK, Rgb::WHITE);
        let zs: Vec<f32> = verts.iter().map(|v| v.position[2]).collect();
        let near = zs.iter().cloned().fold(f32::MIN, f32::max);
        let far = zs.iter().cloned().fold(f32::MAX, f32::min);
        assert_eq!(near, 10.0);
        assert_eq!(far, -190.0);
    }

    #[test]
    fn sphere_is_unit_with_top_at_v_one() {
        let verts = sphere_mesh(16, 32);
        assert_eq!(verts.len(), 16 * 32 * 6);
        for v in &verts {
            let [x, y, z] = v.position;
            assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-5);
            assert!((0.0..=1.0).contains(&v.uv[1]));
            if y > 0.999 {
                assert_eq!(v.uv[1], 1.0);
            }
            if y < -0.999 {
                assert_eq!(v.uv[1], 0.0);
            }
        }
    }
}
