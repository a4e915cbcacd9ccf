// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player window setup and event loop.

use crate::audio::TrailerAudio;
use crate::background::{Background, Intensity};
use crate::clock::{HostClock, RedrawScheduler};
use crate::config::AppConfig;
use crate::renderer::{self, SceneRenderer};
use crate::theme::TrailerTheme;
use egui::{Key, Rect, Sense, Vec2};
use egui_wgpu::wgpu;
use std::sync::Arc;
use thiserror::Error;
use trailer_timeline::{
    seek_bar, PlaybackPhase, SceneScript, SeekBarStyle, SeekControl, TimelineEngine,
    TimelineEvent,
};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

/// Player application errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, AppError>;

type Engine = TimelineEngine<TrailerAudio, RedrawScheduler>;

/// Height of the seek bar strip at the bottom of the window
const SEEK_STRIP_HEIGHT: f32 = 28.0;

/// Graphics state for wgpu rendering
struct GraphicsState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl GraphicsState {
    fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| AppError::RendererInit(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| AppError::RendererInit("no suitable GPU adapter".to_string()))?;

        tracing::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Trailer Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        ))
        .map_err(|e| AppError::RendererInit(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| AppError::RendererInit("surface has no formats".to_string()))?;

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

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn render(
        &mut self,
        egui_ctx: &egui::Context,
        full_output: egui::FullOutput,
        window: &Window,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Trailer Encoder"),
        });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Trailer Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        Ok(())
    }
}

/// Playback, presentation and input state
struct Player {
    config: AppConfig,
    engine: Engine,
    clock: HostClock,
    renderer: SceneRenderer,
    background: Option<Background>,
    intensity: Intensity,
    seek: SeekControl,
    theme: TrailerTheme,
    seek_style: SeekBarStyle,
    last_frame_ms: f64,
    /// Toggle borderless fullscreen on the next frame
    toggle_fullscreen: bool,
    /// Whether the app should exit
    request_exit: bool,
}

impl Player {
    fn new(config: AppConfig, script: SceneScript, window: Arc<Window>) -> Self {
        let audio = TrailerAudio::new(config.audio.clone());
        let scheduler = RedrawScheduler::with_waker(move || window.request_redraw());
        let engine = TimelineEngine::new(script, audio, scheduler);
        let theme = TrailerTheme::default();
        let seek_style = SeekBarStyle {
            fill: theme.accent,
            ..SeekBarStyle::default()
        };

        Self {
            config,
            engine,
            clock: HostClock::new(),
            renderer: SceneRenderer::new(),
            background: None,
            intensity: Intensity::default(),
            seek: SeekControl::new(),
            theme,
            seek_style,
            last_frame_ms: 0.0,
            toggle_fullscreen: false,
            request_exit: false,
        }
    }

    fn start(&mut self, now_ms: f64) {
        if self.engine.phase() == PlaybackPhase::NotStarted {
            self.engine.start(now_ms);
            if !self.engine.audio().is_available() {
                tracing::info!("Playing without sound");
            }
        }
    }

    fn nudge_volume(&mut self, delta: f32) {
        let audio = self.engine.audio_mut();
        let volume = audio.settings().master_volume + delta;
        audio.set_master_volume(volume);
        tracing::debug!("Master volume {:.1}", audio.settings().master_volume);
    }

    /// Run one frame: deliver the pending tick, handle input, draw.
    fn update(&mut self, ctx: &egui::Context) {
        let now = self.clock.now_ms();
        let dt = ((now - self.last_frame_ms) / 1000.0).clamp(0.0, 0.1) as f32;
        self.last_frame_ms = now;

        if self.engine.scheduler_mut().take_due().is_some() {
            self.engine.advance(now);
        }
        if self.engine.is_running() && !self.engine.scheduler().has_pending() {
            tracing::warn!("Playback running without a scheduled tick");
        }

        self.handle_keys(ctx, now);
        self.drain_events(now);
        self.intensity.decay(dt);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.background))
            .show(ctx, |ui| self.draw(ui, now, dt));
    }

    fn handle_keys(&mut self, ctx: &egui::Context, now: f64) {
        let (play, back, forward, escape, fullscreen, quieter, louder) = ctx.input(|i| {
            (
                i.key_pressed(Key::Space) || i.key_pressed(Key::Enter),
                i.key_pressed(Key::ArrowLeft),
                i.key_pressed(Key::ArrowRight),
                i.key_pressed(Key::Escape),
                i.key_pressed(Key::F11) || i.key_pressed(Key::F),
                i.key_pressed(Key::Minus),
                i.key_pressed(Key::Plus) || i.key_pressed(Key::Equals),
            )
        });

        if quieter {
            self.nudge_volume(-0.1);
        }
        if louder {
            self.nudge_volume(0.1);
        }

        if play {
            match self.engine.phase() {
                PlaybackPhase::NotStarted => self.start(now),
                PlaybackPhase::Finished => {
                    tracing::info!("Replaying from the start");
                    self.engine.seek(0.0, now);
                }
                PlaybackPhase::Running | PlaybackPhase::Disposed => {}
            }
        }

        let step = self.config.seek_step;
        if back || forward {
            let elapsed = self.engine.snapshot().elapsed;
            let target = if forward { elapsed + step } else { elapsed - step };
            self.engine.seek(target, now);
        }

        if fullscreen {
            self.toggle_fullscreen = true;
        }

        if escape {
            tracing::info!("Escape pressed, exiting...");
            self.request_exit = true;
        }
    }

    fn drain_events(&mut self, now: f64) {
        for event in self.engine.take_events() {
            match &event {
                TimelineEvent::CueFired { cue, .. } => self.intensity.bump(*cue),
                TimelineEvent::Finished { .. } => self.intensity = Intensity::default(),
                _ => {}
            }
            self.renderer.on_event(&event, self.engine.script(), now);
        }
    }

    fn draw(&mut self, ui: &mut egui::Ui, now: f64, dt: f32) {
        let rect = ui.max_rect();
        let painter = ui.painter().clone();
        let pointer = ui.input(|i| i.pointer.hover_pos());
        let level = self.intensity.level();

        let background = self.background.get_or_insert_with(|| {
            let bg = Background::new(self.config.background.clone(), rect);
            tracing::debug!("Background: {} particles", bg.len());
            bg
        });
        background.resize(rect);
        background.update(dt, pointer, level);
        background.paint(&painter, &self.theme, level);

        if self.engine.phase() == PlaybackPhase::NotStarted {
            if self.config.autostart {
                self.start(now);
                return;
            }
            let button = renderer::start_button_rect(rect);
            let response = ui.interact(button, ui.id().with("start"), Sense::click());
            if response.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            }
            renderer::paint_start_overlay(
                &painter,
                rect,
                response.hovered(),
                (now / 1000.0) as f32,
                &self.theme,
            );
            if response.clicked() {
                self.start(now);
            }
            return;
        }

        self.renderer
            .paint(&painter, rect, self.engine.script(), &self.theme, now);

        let snapshot = self.engine.snapshot();
        let (elapsed, progress, finished) = (snapshot.elapsed, snapshot.progress(), snapshot.finished);

        if self.config.show_timecode {
            renderer::paint_timecode(&painter, rect, elapsed, &self.theme);
        }
        if finished {
            renderer::paint_replay_hint(&painter, rect, &self.theme);
        }

        let strip = Rect::from_min_size(
            rect.left_bottom() - Vec2::new(0.0, SEEK_STRIP_HEIGHT),
            Vec2::new(rect.width(), SEEK_STRIP_HEIGHT),
        );
        ui.allocate_new_ui(egui::UiBuilder::new().max_rect(strip), |ui| {
            seek_bar(ui, &mut self.seek, &mut self.engine, progress, now, &self.seek_style);
        });
    }
}

/// Running state of the player
struct PlayerRunning {
    window: Arc<Window>,
    graphics: GraphicsState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    player: Player,
}

/// Main player application
pub struct TrailerApp {
    config: AppConfig,
    script: Option<SceneScript>,
    running: Option<PlayerRunning>,
    /// First fatal error, returned from [`run`](Self::run)
    error: Option<AppError>,
}

impl TrailerApp {
    /// Create a player for `script`
    pub fn new(config: AppConfig, script: SceneScript) -> Self {
        Self {
            config,
            script: Some(script),
            running: None,
            error: None,
        }
    }

    /// Open the window and play until it closes
    pub fn run(config: AppConfig, script: SceneScript) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = TrailerApp::new(config, script);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        tracing::error!("{error}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn create_running(&self, event_loop: &ActiveEventLoop, script: SceneScript) -> Result<PlayerRunning> {
        let settings = &self.config.window;
        let mut window_attrs = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(settings.width, settings.height))
            .with_min_inner_size(winit::dpi::LogicalSize::new(480, 270));
        if settings.fullscreen {
            window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| AppError::WindowCreation(e.to_string()))?,
        );

        tracing::info!("Initializing graphics...");
        let graphics = GraphicsState::new(window.clone())?;

        let egui_ctx = egui::Context::default();
        let player = Player::new(self.config.clone(), script, window.clone());
        player.theme.apply(&egui_ctx);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024), // max texture side
        );

        tracing::info!("Window size: {:?}", window.inner_size());

        Ok(PlayerRunning {
            window,
            graphics,
            egui_ctx,
            egui_state,
            player,
        })
    }
}

impl ApplicationHandler for TrailerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        let Some(script) = self.script.take() else {
            return;
        };

        tracing::info!("Creating player window...");
        match self.create_running(event_loop, script) {
            Ok(running) => self.running = Some(running),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_state.on_window_event(&running.window, &event);

        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting...");
                running.player.engine.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                running.graphics.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| {
                    running.player.update(ctx);
                });

                if running.player.request_exit {
                    running.player.engine.dispose();
                    event_loop.exit();
                    return;
                }

                if std::mem::take(&mut running.player.toggle_fullscreen) {
                    let next = match running.window.fullscreen() {
                        Some(_) => None,
                        None => Some(Fullscreen::Borderless(None)),
                    };
                    running.window.set_fullscreen(next);
                }

                running.egui_state.handle_platform_output(&running.window, full_output.platform_output.clone());

                match running.graphics.render(&running.egui_ctx, full_output, &running.window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = running.window.inner_size();
                        running.graphics.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                running.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // The particle field animates every frame; playback ticks wake the
        // window through the scheduler on their own.
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}
