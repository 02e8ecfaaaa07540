use glam::Vec3;
use neonway_common::{EnvironmentConfig, Rgb};

/// The four looping layers, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    HorizonSun,
    StarField,
    MovingGrid,
    LaneGuides,
}

impl LayerKind {
    /// Opaque layers first; the star field blends over them without
    /// writing depth, so it must come last.
    pub const DRAW_ORDER: [LayerKind; 4] = [
        LayerKind::HorizonSun,
        LayerKind::MovingGrid,
        LayerKind::LaneGuides,
        LayerKind::StarField,
    ];

    /// Whether this layer writes depth.
    pub fn opaque(self) -> bool {
        !matches!(self, LayerKind::StarField)
    }

    /// Whether scene fog applies to this layer. The sun and stars sit beyond
    /// the fog range and are drawn unfogged.
    pub fn fogged(self) -> bool {
        matches!(self, LayerKind::MovingGrid | LayerKind::LaneGuides)
    }
}

/// Linear distance fog, applied in the shading stage of fogged layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: Rgb,
        intensity: f32,
    },
    Directional {
        color: Rgb,
        intensity: f32,
        /// Unit vector the light travels along.
        direction: Vec3,
    },
    Point {
        color: Rgb,
        intensity: f32,
        position: Vec3,
        range: f32,
    },
}

/// Static scene description handed to a render backend once per mount.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub background: Rgb,
    pub fog: Fog,
    pub lights: Vec<Light>,
    pub layers: [LayerKind; 4],
    pub star_color: Rgb,
    pub grid_color: Rgb,
    pub lane_floor_color: Rgb,
    pub lane_separator_color: Rgb,
}

impl SceneDescription {
    /// Assemble the four layers, the lights and the fog from a config.
    pub fn compose(config: &EnvironmentConfig) -> Self {
        let palette = &config.palette;
        let lighting = &config.lighting;
        let lights = vec![
            Light::Ambient {
                color: lighting.ambient_color,
                intensity: lighting.ambient_intensity,
            },
            Light::Directional {
                color: lighting.directional_color,
                intensity: lighting.directional_intensity,
                direction: Vec3::from_array(lighting.directional_direction)
                    .try_normalize()
                    .unwrap_or(Vec3::NEG_Y),
            },
            Light::Point {
                color: lighting.point_color,
                intensity: lighting.point_intensity,
                position: Vec3::from_array(lighting.point_position),
                range: lighting.point_range,
            },
        ];
        tracing::debug!(lights = lights.len(), "scene composed");
        Self {
            background: palette.background,
            fog: Fog {
                color: palette.background,
                near: lighting.fog_near,
                far: lighting.fog_far,
            },
            lights,
            layers: LayerKind::DRAW_ORDER,
            star_color: palette.star,
            grid_color: palette.grid,
            lane_floor_color: palette.lane_floor,
            lane_separator_color: palette.lane_separator,
        }
    }

    /// Ambient term, summed over ambient lights.
    pub fn ambient(&self) -> Rgb {
        self.lights.iter().fold(Rgb::BLACK, |acc, light| match light {
            Light::Ambient { color, intensity } => {
                let c = color.scale(*intensity);
                Rgb::new(acc.r + c.r, acc.g + c.g, acc.b + c.b)
            }
            _ => acc,
        })
    }

    /// First directional light as (direction, premultiplied color).
    pub fn directional(&self) -> Option<(Vec3, Rgb)> {
        self.lights.iter().find_map(|light| match light {
            Light::Directional {
                color,
                intensity,
                direction,
            } => Some((*direction, color.scale(*intensity))),
            _ => None,
        })
    }

    /// First point light as (position, premultiplied color, range).
    pub fn point(&self) -> Option<(Vec3, Rgb, f32)> {
        self.lights.iter().find_map(|light| match light {
            Light::Point {
                color,
                intensity,
                position,
                range,
            } => Some((*position, color.scale(*intensity), *range)),
            _ => None,
        })
    }
}
