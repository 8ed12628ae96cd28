mod app;
mod ui;

use anyhow::{Context, Result, anyhow};
use app::AppState;
use clap::Parser;
use egui::Context as EguiContext;
use garment_common::ViewerConfig;
use garment_input::{ShortcutKey, WheelDelta, shortcut_action};
use garment_render_wgpu::WgpuRenderer;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

const LONG_ABOUT: &str = "\
Paint directly onto a 3D garment.

Drag on the garment to paint with the current tool. Drag anywhere else to turn
the model about the vertical axis through its bounding-box centre. The wheel or
a two-finger pinch zooms. The tiled background box is scenery only and never
receives paint.

Keys: P pencil, E eraser, Delete clear, Ctrl+Z undo, Ctrl+Y redo,
F5 save session, F9 load latest session.";

#[derive(Parser)]
#[command(name = "garment-desktop", about = "Paint directly onto a 3D garment", long_about = LONG_ABOUT)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML viewer configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model URL or local .glb/.gltf path
    #[arg(short, long)]
    model: Option<String>,

    /// Directory for downloaded models
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Directory for saved sessions and PNG exports
    #[arg(long)]
    session_dir: Option<PathBuf>,
}

impl Cli {
    fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(dir) = &self.session_dir {
            config.session_dir = dir.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Window, device and everything created from them.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, state: &AppState) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Garment Paint")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

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
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("garment_device"),
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

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            &state.scene,
            &state.canvas,
        )?;

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
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Pick up a finished model, upload dirty paint, draw the scene then the UI.
    fn frame(&mut self, egui_ctx: &EguiContext, state: &mut AppState) {
        if let Some(model) = state.poll_loader() {
            self.renderer.upload_model(&self.device, &model);
            state.scene.set_model(model);
        }
        if let Err(e) = self
            .renderer
            .update_paint_texture(&self.device, &self.queue, &mut state.canvas)
        {
            tracing::error!("paint texture upload failed: {e}");
        }

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

        self.renderer
            .render(&self.device, &self.queue, &view, &state.camera, &state.scene);

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            ui::draw_ui(state, ctx);
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
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
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

struct ViewerApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    modifiers: ModifiersState,
}

impl ViewerApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
            modifiers: ModifiersState::empty(),
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let ctrl = self.modifiers.control_key() || self.modifiers.super_key();
        let shortcut = match key {
            KeyCode::F5 => return self.state.save_session(),
            KeyCode::F9 => return self.state.load_session(),
            KeyCode::Delete => ShortcutKey::Delete,
            KeyCode::KeyP => ShortcutKey::Char('p'),
            KeyCode::KeyE => ShortcutKey::Char('e'),
            KeyCode::KeyZ => ShortcutKey::Char('z'),
            KeyCode::KeyY => ShortcutKey::Char('y'),
            _ => return,
        };
        self.state.apply(shortcut_action(shortcut, ctrl));
    }

    fn handle_touch(&mut self, touch: Touch) {
        let pos = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        let id = touch.id;
        match touch.phase {
            TouchPhase::Started => self.state.gesture(|g, p| g.touch_start(id, pos, p)),
            TouchPhase::Moved => self.state.gesture(|g, p| g.touch_moved(id, pos, p)),
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.state.gesture(|g, _| g.touch_ended(id))
            }
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state) {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.state.set_viewport(size.width, size.height);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
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
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                self.state.set_viewport(new_size.width, new_size.height);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(key);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pos = Vec2::new(position.x as f32, position.y as f32);
                self.state.cursor = pos;
                self.state.gesture(|g, p| g.mouse_moved(pos, p));
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                let cursor = self.state.cursor;
                if btn_state == ElementState::Pressed {
                    self.state.gesture(|g, p| g.mouse_down(cursor, p));
                } else {
                    self.state.gesture(|g, _| g.mouse_up());
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.gesture(|g, _| g.mouse_left());
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => WheelDelta::Lines(y),
                    MouseScrollDelta::PixelDelta(p) => WheelDelta::Pixels(p.y as f32),
                };
                self.state.gesture(|g, _| g.scroll(delta));
            }
            WindowEvent::Touch(touch) => {
                self.handle_touch(touch);
            }
            WindowEvent::RedrawRequested => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.frame(&self.egui_ctx, &mut self.state);
                }
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
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("garment-desktop starting");

    let config = cli.viewer_config()?;
    let state = AppState::new(&config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
