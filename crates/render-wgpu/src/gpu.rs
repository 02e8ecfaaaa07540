use crate::mesh::{self, GridVertex, LaneVertex, SunVertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use neonway_common::Rgb;
use neonway_kernel::grid::GRID_EXTENT;
use neonway_kernel::{LaneGuides, Layers, Particle};
use neonway_render::{LayerKind, RenderView, SceneDescription};
use wgpu::util::DeviceExt;

const SUN_LATITUDES: u32 = 32;
const SUN_LONGITUDES: u32 = 64;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    fog_color: [f32; 4],
    fog_viewport: [f32; 4],
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    point_pos: [f32; 4],
    point_color: [f32; 4],
}

impl Globals {
    fn from_scene(scene: &SceneDescription) -> Self {
        let (dir, dir_color) = scene
            .directional()
            .unwrap_or((glam::Vec3::NEG_Y, Rgb::BLACK));
        let (point_pos, point_color, range) = scene
            .point()
            .unwrap_or((glam::Vec3::ZERO, Rgb::BLACK, 1.0));
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            fog_color: scene.fog.color.extend(1.0),
            fog_viewport: [scene.fog.near, scene.fog.far, 1.0, 1.0],
            ambient: scene.ambient().extend(0.0),
            light_dir: dir.extend(0.0).to_array(),
            light_color: dir_color.extend(0.0),
            point_pos: point_pos.extend(range).to_array(),
            point_color: point_color.extend(0.0),
        }
    }
}

/// Per-layer uniform block, bound at group 1.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LayerParams {
    model: [[f32; 4]; 4],
    color_a: [f32; 4],
    color_b: [f32; 4],
    params: [f32; 4],
}

impl LayerParams {
    fn new(model: Mat4, color_a: Rgb, color_b: Rgb, time: f32, speed: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color_a: color_a.extend(1.0),
            color_b: color_b.extend(1.0),
            params: [time, speed, 0.0, 0.0],
        }
    }

    /// Fog weight in `params.z`: 1 for layers that fade into the background.
    fn for_layer(mut self, kind: LayerKind) -> Self {
        self.params[2] = if kind.fogged() { 1.0 } else { 0.0 };
        self
    }
}

/// A uniform buffer and its bind group.
struct UniformBlock {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformBlock {
    fn new<T: Pod>(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        contents: &T,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(contents),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    fn write<T: Pod>(&self, queue: &wgpu::Queue, contents: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(contents));
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Fixed-function state that differs between layers.
struct PipelineSpec<'a> {
    label: &'a str,
    source: String,
    vs: &'a str,
    fs: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(spec.label),
        source: wgpu::ShaderSource::Wgsl(spec.source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(spec.vs),
            compilation_options: Default::default(),
            buffers: spec.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(spec.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn to_wgpu_color(c: Rgb) -> wgpu::Color {
    wgpu::Color {
        r: c.r as f64,
        g: c.g as f64,
        b: c.b as f64,
        a: 1.0,
    }
}

/// wgpu renderer for the four corridor layers.
///
/// All buffers are created in [`WgpuRenderer::new`]. Per frame only uniform
/// blocks are written; the lane vertex buffer is replaced when the lane
/// guides report a new revision.
pub struct WgpuRenderer {
    star_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    lane_pipeline: wgpu::RenderPipeline,
    sun_pipeline: wgpu::RenderPipeline,
    globals: Globals,
    globals_block: UniformBlock,
    star_block: UniformBlock,
    grid_block: UniformBlock,
    lane_block: UniformBlock,
    sun_block: UniformBlock,
    particle_buffer: wgpu::Buffer,
    particle_count: u32,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    lane_vertex_buffer: wgpu::Buffer,
    lane_vertex_count: u32,
    lane_revision: u64,
    sun_vertex_buffer: wgpu::Buffer,
    sun_vertex_count: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    scene: SceneDescription,
    width: u32,
    height: u32,
}

impl WgpuRenderer {
    /// Build pipelines and upload all static geometry for mounted `layers`.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: SceneDescription,
        layers: &Layers,
    ) -> Self {
        let globals_layout = uniform_layout(device, "globals_layout");
        let layer_layout = uniform_layout(device, "layer_layout");
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("corridor_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &layer_layout],
            push_constant_ranges: &[],
        });

        let mut globals = Globals::from_scene(&scene);
        globals.fog_viewport[2] = width.max(1) as f32;
        globals.fog_viewport[3] = height.max(1) as f32;
        let globals_block = UniformBlock::new(device, &globals_layout, "globals", &globals);

        let (sun_top, sun_bottom) = layers.sun.colors();
        let star_block = UniformBlock::new(
            device,
            &layer_layout,
            "star_params",
            &LayerParams::new(Mat4::IDENTITY, scene.star_color, scene.star_color, 0.0, 0.0)
                .for_layer(LayerKind::StarField),
        );
        let grid_block = UniformBlock::new(
            device,
            &layer_layout,
            "grid_params",
            &LayerParams::new(
                layers.grid.transform().to_matrix(),
                scene.grid_color,
                scene.grid_color,
                0.0,
                0.0,
            )
            .for_layer(LayerKind::MovingGrid),
        );
        let lane_block = UniformBlock::new(
            device,
            &layer_layout,
            "lane_params",
            &LayerParams::new(
                Mat4::IDENTITY,
                scene.lane_floor_color,
                scene.lane_separator_color,
                0.0,
                0.0,
            )
            .for_layer(LayerKind::LaneGuides),
        );
        let sun_block = UniformBlock::new(
            device,
            &layer_layout,
            "sun_params",
            &LayerParams::new(layers.sun.transform().to_matrix(), sun_top, sun_bottom, 0.0, 0.0)
                .for_layer(LayerKind::HorizonSun),
        );

        let star_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            PipelineSpec {
                label: "star_pipeline",
                source: shaders::starfield_shader(),
                vs: "vs_star",
                fs: "fs_star",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Particle>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32],
                }],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: LayerKind::StarField.opaque(),
            },
        );
        let grid_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            PipelineSpec {
                label: "grid_pipeline",
                source: shaders::grid_shader(),
                vs: "vs_grid",
                fs: "fs_grid",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GridVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                topology: wgpu::PrimitiveTopology::LineList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: LayerKind::MovingGrid.opaque(),
            },
        );
        let lane_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            PipelineSpec {
                label: "lane_pipeline",
                source: shaders::lane_shader(),
                vs: "vs_lane",
                fs: "fs_lane",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LaneVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x3,
                        3 => Float32,
                    ],
                }],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: LayerKind::LaneGuides.opaque(),
            },
        );
        let sun_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            PipelineSpec {
                label: "sun_pipeline",
                source: shaders::sun_shader(),
                vs: "vs_sun",
                fs: "fs_sun",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SunVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
                depth_write: LayerKind::HorizonSun.opaque(),
            },
        );

        // Particle buffer: written once, never touched again.
        let particles = layers.stars.particles();
        let particle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("particle_buffer"),
            contents: bytemuck::cast_slice(particles),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let grid_verts = mesh::grid_mesh(GRID_EXTENT, layers.grid.divisions());
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let lane_verts = Self::lane_vertices(&scene, &layers.lanes);
        let lane_vertex_buffer = Self::create_lane_buffer(device, &lane_verts);

        let sun_verts = mesh::sphere_mesh(SUN_LATITUDES, SUN_LONGITUDES);
        let sun_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sun_vertex_buffer"),
            contents: bytemuck::cast_slice(&sun_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        tracing::info!(
            particles = particles.len(),
            grid_vertices = grid_verts.len(),
            lane_vertices = lane_verts.len(),
            sun_vertices = sun_verts.len(),
            "gpu buffers created"
        );

        Self {
            star_pipeline,
            grid_pipeline,
            lane_pipeline,
            sun_pipeline,
            globals,
            globals_block,
            star_block,
            grid_block,
            lane_block,
            sun_block,
            particle_count: particles.len() as u32,
            particle_buffer,
            grid_vertex_count: grid_verts.len() as u32,
            grid_vertex_buffer,
            lane_vertex_count: lane_verts.len() as u32,
            lane_vertex_buffer,
            lane_revision: layers.lanes.revision(),
            sun_vertex_count: sun_verts.len() as u32,
            sun_vertex_buffer,
            depth_texture,
            surface_format,
            scene,
            width: width.max(1),
            height: height.max(1),
        }
    }

    fn lane_vertices(scene: &SceneDescription, lanes: &LaneGuides) -> Vec<LaneVertex> {
        mesh::lane_mesh(lanes, scene.lane_floor_color, scene.lane_separator_color)
    }

    fn create_lane_buffer(device: &wgpu::Device, verts: &[LaneVertex]) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lane_vertex_buffer"),
            contents: bytemuck::cast_slice(verts),
            usage: wgpu::BufferUsages::VERTEX,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    /// Replace the lane geometry if the guides were regenerated since the
    /// last call. Returns true when the buffer was rebuilt.
    pub fn sync_lanes(&mut self, device: &wgpu::Device, lanes: &LaneGuides) -> bool {
        if lanes.revision() == self.lane_revision {
            return false;
        }
        let verts = Self::lane_vertices(&self.scene, lanes);
        self.lane_vertex_buffer = Self::create_lane_buffer(device, &verts);
        self.lane_vertex_count = verts.len() as u32;
        self.lane_revision = lanes.revision();
        tracing::debug!(
            lanes = lanes.lane_count(),
            revision = self.lane_revision,
            "lane buffer rebuilt"
        );
        true
    }

    /// Render one frame of the corridor in the scene's layer order.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        camera: &RenderView,
        layers: &Layers,
    ) {
        self.sync_lanes(device, &layers.lanes);

        let camera = RenderView {
            aspect: self.width as f32 / self.height as f32,
            ..*camera
        };
        self.globals.view = camera.view_matrix().to_cols_array_2d();
        self.globals.proj = camera.projection_matrix().to_cols_array_2d();
        self.globals.fog_viewport[2] = self.width as f32;
        self.globals.fog_viewport[3] = self.height as f32;
        self.globals_block.write(queue, &self.globals);

        let stars = layers.stars.uniforms();
        self.star_block.write(
            queue,
            &LayerParams::new(
                Mat4::IDENTITY,
                self.scene.star_color,
                self.scene.star_color,
                stars.time,
                stars.speed,
            )
            .for_layer(LayerKind::StarField),
        );
        self.grid_block.write(
            queue,
            &LayerParams::new(
                layers.grid.transform().to_matrix(),
                self.scene.grid_color,
                self.scene.grid_color,
                0.0,
                0.0,
            )
            .for_layer(LayerKind::MovingGrid),
        );
        let (sun_top, sun_bottom) = layers.sun.colors();
        self.sun_block.write(
            queue,
            &LayerParams::new(
                layers.sun.transform().to_matrix(),
                sun_top,
                sun_bottom,
                layers.sun.time(),
                0.0,
            )
            .for_layer(LayerKind::HorizonSun),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("corridor_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("corridor_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(to_wgpu_color(self.scene.background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.globals_block.bind_group, &[]);

            for kind in self.scene.layers {
                match kind {
                    LayerKind::HorizonSun => {
                        pass.set_pipeline(&self.sun_pipeline);
                        pass.set_bind_group(1, &self.sun_block.bind_group, &[]);
                        pass.set_vertex_buffer(0, self.sun_vertex_buffer.slice(..));
                        pass.draw(0..self.sun_vertex_count, 0..1);
                    }
                    LayerKind::MovingGrid => {
                        pass.set_pipeline(&self.grid_pipeline);
                        pass.set_bind_group(1, &self.grid_block.bind_group, &[]);
                        pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
                        pass.draw(0..self.grid_vertex_count, 0..1);
                    }
                    LayerKind::LaneGuides => {
                        pass.set_pipeline(&self.lane_pipeline);
                        pass.set_bind_group(1, &self.lane_block.bind_group, &[]);
                        pass.set_vertex_buffer(0, self.lane_vertex_buffer.slice(..));
                        pass.draw(0..self.lane_vertex_count, 0..1);
                    }
                    LayerKind::StarField if self.particle_count > 0 => {
                        pass.set_pipeline(&self.star_pipeline);
                        pass.set_bind_group(1, &self.star_block.bind_group, &[]);
                        pass.set_vertex_buffer(0, self.particle_buffer.slice(..));
                        pass.draw(0..6, 0..self.particle_count);
                    }
                    LayerKind::StarField => {}
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neonway_common::EnvironmentConfig;

    #[test]
    fn uniform_blocks_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<Globals>() % 16, 0);
        assert_eq!(std::mem::size_of::<LayerParams>() % 16, 0);
        assert_eq!(std::mem::size_of::<Globals>(), 2 * 64 + 7 * 16);
    }

    #[test]
    fn globals_carry_fog_and_lights() {
        let scene = SceneDescription::compose(&EnvironmentConfig::default());
        let globals = Globals::from_scene(&scene);
        assert_eq!(globals.fog_viewport[0], 40.0);
        assert_eq!(globals.fog_viewport[1], 160.0);
        assert_eq!(globals.point_pos, [0.0, 10.0, -20.0, 100.0]);
        let dir = glam::Vec3::from_slice(&globals.light_dir[..3]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn layer_params_pack_time_and_speed() {
        let params = LayerParams::new(Mat4::IDENTITY, Rgb::WHITE, Rgb::BLACK, 2.0, 7.5);
        assert_eq!(params.params, [2.0, 7.5, 0.0, 0.0]);
        assert_eq!(params.color_a, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(params.color_b, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn only_ground_layers_carry_fog_weight() {
        let base = LayerParams::new(Mat4::IDENTITY, Rgb::WHITE, Rgb::WHITE, 1.0, 5.0);
        assert_eq!(base.for_layer(LayerKind::MovingGrid).params[2], 1.0);
        assert_eq!(base.for_layer(LayerKind::LaneGuides).params[2], 1.0);
        assert_eq!(base.for_layer(LayerKind::StarField).params[2], 0.0);
        assert_eq!(base.for_layer(LayerKind::HorizonSun).params, [1.0, 5.0, 0.0, 0.0]);
    }
}
