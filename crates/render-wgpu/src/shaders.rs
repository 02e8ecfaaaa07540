//! WGSL sources. Every layer binds the shared globals at group 0 and its own
//! `Layer` block at group 1.
//!
//! The star and sun math mirrors `neonway_kernel::starfield` and
//! `neonway_kernel::sun`; change both together.

/// Declarations shared by every layer shader.
const COMMON: &str = r#"
struct Globals {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    fog_color: vec4<f32>,
    // x = fog near, y = fog far, zw = viewport size in pixels
    fog_viewport: vec4<f32>,
    ambient: vec4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    // xyz = position, w = range
    point_pos: vec4<f32>,
    point_color: vec4<f32>,
};

struct Layer {
    model: mat4x4<f32>,
    color_a: vec4<f32>,
    color_b: vec4<f32>,
    // x = time, y = speed, z = fog weight
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> layer: Layer;

fn floor_mod(x: f32, y: f32) -> f32 {
    return x - y * floor(x / y);
}

// Accepts reversed edges, unlike the built-in.
fn hermite(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}

fn fog_amount(depth: f32) -> f32 {
    let near = globals.fog_viewport.x;
    let far = globals.fog_viewport.y;
    return clamp((depth - near) / (far - near), 0.0, 1.0);
}
"#;

const STARFIELD_BODY: &str = r#"
const DEPTH_FAR: f32 = -600.0;
const DEPTH_SPAN: f32 = 700.0;

struct StarInput {
    @location(0) position: vec3<f32>,
    @location(1) jitter: f32,
};

struct StarOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) corner: vec2<f32>,
    @location(1) alpha: f32,
};

@vertex
fn vs_star(@builtin(vertex_index) vertex_index: u32, star: StarInput) -> StarOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index];

    let depth_offset = layer.params.x * layer.params.y;
    var pos = star.position;
    pos.z = floor_mod(pos.z + depth_offset, DEPTH_SPAN) + DEPTH_FAR;
    if (abs(pos.x) < 20.0 && pos.y > -10.0 && pos.y < 30.0) {
        pos.y = pos.y + 50.0;
    }

    let view_pos = globals.view * vec4<f32>(pos, 1.0);
    let size = (400.0 / -view_pos.z) * (0.5 + star.jitter);
    let clip = globals.proj * view_pos;
    let half_extent = corner * size / globals.fog_viewport.zw;

    var out: StarOutput;
    out.clip_position = vec4<f32>(clip.xy + half_extent * clip.w, clip.zw);
    out.corner = corner;
    out.alpha = hermite(-600.0, -400.0, pos.z) * (0.5 + star.jitter * 0.5);
    if (view_pos.z >= 0.0) {
        // Behind the camera: park outside the clip volume.
        out.clip_position = vec4<f32>(0.0, 0.0, 2.0, 1.0);
    }
    return out;
}

@fragment
fn fs_star(in: StarOutput) -> @location(0) vec4<f32> {
    if (length(in.corner) > 1.0) {
        discard;
    }
    return vec4<f32>(layer.color_a.rgb, in.alpha);
}
"#;

const GRID_BODY: &str = r#"
struct GridVertex {
    @location(0) position: vec3<f32>,
};

struct GridOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) depth: f32,
};

@vertex
fn vs_grid(vertex: GridVertex) -> GridOutput {
    let view_pos = globals.view * layer.model * vec4<f32>(vertex.position, 1.0);
    var out: GridOutput;
    out.clip_position = globals.proj * view_pos;
    out.depth = -view_pos.z;
    return out;
}

@fragment
fn fs_grid(in: GridOutput) -> @location(0) vec4<f32> {
    let color = mix(layer.color_a.rgb, globals.fog_color.rgb, fog_amount(in.depth) * layer.params.z);
    return vec4<f32>(color, 1.0);
}
"#;

const LANE_BODY: &str = r#"
struct LaneVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) emissive: f32,
};

struct LaneOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) emissive: f32,
    @location(4) depth: f32,
};

@vertex
fn vs_lane(vertex: LaneVertex) -> LaneOutput {
    let world = layer.model * vec4<f32>(vertex.position, 1.0);
    let view_pos = globals.view * world;
    var out: LaneOutput;
    out.clip_position = globals.proj * view_pos;
    out.world_pos = world.xyz;
    out.normal = normalize((layer.model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = vertex.color;
    out.emissive = vertex.emissive;
    out.depth = -view_pos.z;
    return out;
}

@fragment
fn fs_lane(in: LaneOutput) -> @location(0) vec4<f32> {
    let diffuse = max(dot(in.normal, -globals.light_dir.xyz), 0.0);
    let to_point = globals.point_pos.xyz - in.world_pos;
    let falloff = clamp(1.0 - length(to_point) / globals.point_pos.w, 0.0, 1.0);
    let point = max(dot(in.normal, normalize(to_point)), 0.0) * falloff;
    let lighting = globals.ambient.rgb
        + globals.light_color.rgb * diffuse
        + globals.point_color.rgb * point;
    let lit = mix(in.color * lighting, in.color, in.emissive);
    let color = mix(lit, globals.fog_color.rgb, fog_amount(in.depth) * layer.params.z);
    return vec4<f32>(color, 1.0);
}
"#;

const SUN_BODY: &str = r#"
struct SunVertex {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct SunOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_sun(vertex: SunVertex) -> SunOutput {
    var out: SunOutput;
    out.clip_position = globals.proj * globals.view * layer.model * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_sun(in: SunOutput) -> @location(0) vec4<f32> {
    let v = in.uv.y;
    let time = layer.params.x;
    // color_a = top, color_b = bottom
    let color = mix(layer.color_b.rgb, layer.color_a.rgb, v);
    let bands = sin(v * 40.0 - time);
    let band_mask = hermite(0.2, 0.3, bands);
    let fade_mask = hermite(0.7, 0.3, v);
    let final_color = mix(color, color * 0.1, (1.0 - band_mask) * fade_mask);
    return vec4<f32>(final_color, 1.0);
}
"#;

fn with_common(body: &str) -> String {
    format!("{COMMON}{body}")
}

/// Star field: instanced screen-aligned quads, six vertices per particle.
pub fn starfield_shader() -> String {
    with_common(STARFIELD_BODY)
}

/// Moving grid: unlit fogged line list.
pub fn grid_shader() -> String {
    with_common(GRID_BODY)
}

/// Lane floor and separators: lit, fogged, separators emissive.
pub fn lane_shader() -> String {
    with_common(LANE_BODY)
}

/// Horizon sun: gradient with animated bands, unfogged and opaque.
pub fn sun_shader() -> String {
    with_common(SUN_BODY)
}
