use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use neonway_common::{EnvironmentConfig, SharedLanes, SharedVelocity};
use neonway_kernel::{Environment, FrameClock, FrameStats};
use neonway_render::{RenderView, SceneDescription};
use neonway_render_wgpu::WgpuRenderer;
use neonway_tools::EnvironmentInspector;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const MAX_SPEED: f32 = 200.0;
const SPEED_STEP: f32 = 5.0;
const MAX_LANES: u32 = 12;
const STATS_WINDOW: usize = 120;

#[derive(Parser)]
#[command(name = "neonway-desktop", about = "Neonway corridor desktop host")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Environment config (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial velocity
    #[arg(short, long, default_value = "20.0")]
    speed: f32,

    /// Initial lane count (defaults to the config value)
    #[arg(short, long)]
    lanes: Option<u32>,
}

/// Host-side state: the environment plus the inputs it reads.
struct AppState {
    env: Environment,
    velocity: Arc<SharedVelocity>,
    lanes: Arc<SharedLanes>,
    clock: FrameClock,
    stats: FrameStats,
    last_frame: Instant,
    view: RenderView,
    show_panel: bool,
    /// The GPU buffers no longer match the environment's layers.
    renderer_stale: bool,
}

impl AppState {
    fn new(config: EnvironmentConfig, speed: f32, lanes: u32) -> Self {
        let velocity = Arc::new(SharedVelocity::new(speed));
        let lane_source = Arc::new(SharedLanes::new(lanes));
        let mut env = Environment::new(config, velocity.clone(), lane_source.clone());
        env.mount();
        Self {
            env,
            velocity,
            lanes: lane_source,
            clock: FrameClock::new(),
            stats: FrameStats::new(STATS_WINDOW),
            last_frame: Instant::now(),
            view: RenderView::default(),
            show_panel: true,
            renderer_stale: true,
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        self.stats.record(now - self.last_frame);
        self.last_frame = now;
        let (elapsed, delta) = self.clock.advance(now);
        self.env.tick(elapsed, delta);
    }

    fn set_speed(&mut self, speed: f32) {
        self.velocity.set(speed.clamp(0.0, MAX_SPEED));
    }

    fn set_lanes(&mut self, lanes: u32) {
        self.lanes.set(lanes.clamp(1, MAX_LANES));
    }

    fn toggle_mount(&mut self) {
        if self.env.is_mounted() {
            self.env.unmount();
        } else {
            self.env.mount();
            self.clock = FrameClock::new();
        }
        self.renderer_stale = true;
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::ArrowUp => self.set_speed(self.velocity.get() + SPEED_STEP),
            KeyCode::ArrowDown => self.set_speed(self.velocity.get() - SPEED_STEP),
            KeyCode::BracketRight => self.set_lanes(self.lanes.get().saturating_add(1)),
            KeyCode::BracketLeft => self.set_lanes(self.lanes.get().saturating_sub(1)),
            KeyCode::KeyM => self.toggle_mount(),
            KeyCode::F1 => self.show_panel = !self.show_panel,
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        let summary = EnvironmentInspector::summary(&self.env, self.view.view_matrix());

        egui::SidePanel::left("corridor")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Neonway");
                ui.separator();

                if summary.mounted {
                    ui.label(format!("Tick: {}  t={:.1}s", summary.tick, summary.elapsed));
                    ui.label(format!(
                        "Speed: {:.1} (effective {:.1})",
                        summary.velocity, summary.effective_speed
                    ));
                    ui.label(format!(
                        "Stars: {} / {} visible",
                        summary.visible_stars, summary.star_count
                    ));
                    ui.label(format!("Grid z: {:.2}", summary.grid_z));
                } else {
                    ui.label("Environment unmounted");
                }
                ui.separator();

                ui.heading("Inputs");
                let mut speed = self.velocity.get();
                if ui
                    .add(egui::Slider::new(&mut speed, 0.0..=MAX_SPEED).text("Speed"))
                    .changed()
                {
                    self.set_speed(speed);
                }
                let mut lanes = self.lanes.get();
                if ui
                    .add(egui::Slider::new(&mut lanes, 1..=MAX_LANES).text("Lanes"))
                    .changed()
                {
                    self.set_lanes(lanes);
                }
                let label = if self.env.is_mounted() {
                    "Unmount (M)"
                } else {
                    "Mount (M)"
                };
                if ui.button(label).clicked() {
                    self.toggle_mount();
                }

                ui.separator();
                ui.heading("Frame");
                ui.label(format!("FPS: {:.0}", self.stats.fps()));
                ui.label(format!(
                    "avg {:.2} ms  min {:.2} ms  max {:.2} ms",
                    self.stats.average().as_secs_f64() * 1000.0,
                    self.stats.min().as_secs_f64() * 1000.0,
                    self.stats.max().as_secs_f64() * 1000.0
                ));

                ui.separator();
                ui.small("F1: Panel | Up/Down: Speed | [ ]: Lanes | M: Mount");
            });
    }
}

/// Window, device and everything drawn into the surface.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: Option<WgpuRenderer>,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Neonway")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("neonway_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer: None,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(&self.device, self.config.width, self.config.height);
        }
    }

    /// Rebuild or drop the corridor renderer to match the environment.
    fn sync_renderer(&mut self, state: &mut AppState) {
        if state.renderer_stale {
            self.renderer = None;
            state.renderer_stale = false;
        }
        let has_renderer = self.renderer.is_some();
        match (state.env.layers(), has_renderer) {
            (Some(layers), false) => {
                let scene = SceneDescription::compose(state.env.config());
                self.renderer = Some(WgpuRenderer::new(
                    &self.device,
                    self.config.format,
                    self.config.width,
                    self.config.height,
                    scene,
                    layers,
                ));
            }
            (None, true) => self.renderer = None,
            _ => {}
        }
    }

    fn frame(&mut self, state: &mut AppState, egui_ctx: &EguiContext) {
        self.sync_renderer(state);

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let corridor_drawn = match (&mut self.renderer, state.env.layers()) {
            (Some(renderer), Some(layers)) => {
                renderer.render(&self.device, &self.queue, &view, &state.view, layers);
                true
            }
            _ => false,
        };

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let load = if corridor_drawn {
                wgpu::LoadOp::Load
            } else {
                wgpu::LoadOp::Clear(wgpu::Color::BLACK)
            };
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
        self.window.request_redraw();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.env.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => gpu.resize(new_size),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.state.handle_key(key),
            WindowEvent::RedrawRequested => {
                self.state.update();
                gpu.frame(&mut self.state, &self.egui_ctx);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => EnvironmentConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => EnvironmentConfig::default(),
    };
    let lanes = cli.lanes.unwrap_or(config.lane_count);
    anyhow::ensure!(lanes > 0, "lane count must be at least 1");

    tracing::info!(speed = cli.speed, lanes, "neonway-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(config, cli.speed, lanes));
    event_loop.run_app(&mut app)?;

    Ok(())
}
