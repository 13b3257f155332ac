#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod app;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use app::App;
use etfview_rs::config::{self, HeatmapConfig};
use etfview_rs::feed::{spawn_refresh, FeedEvent, SnapshotFile};
use etfview_rs::render::RenderState;
use etfview_rs::ui::input;

/// Events delivered to the event loop from other threads.
#[derive(Debug)]
enum AppEvent {
    Feed(FeedEvent),
}

/// Main application handler for winit's event loop.
struct EtfViewApp {
    app: App,
    render_state: Option<RenderState>,
    window: Option<Arc<Window>>,
}

impl EtfViewApp {
    fn new(config: HeatmapConfig) -> Self {
        Self {
            app: App::new(config),
            render_state: None,
            window: None,
        }
    }

    fn request_redraw_if_dirty(&self) {
        if !self.app.is_dirty() {
            return;
        }
        if let Some(window) = &self.window {
            window.set_title(&self.app.title());
            window.request_redraw();
        }
    }
}

impl ApplicationHandler<AppEvent> for EtfViewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("EtfView-rs")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(RenderState::new(window.clone())) {
            Ok(state) => {
                let size = window.inner_size();
                tracing::info!(
                    "Window initialized: scale_factor={:.3}, physical_size={}x{}",
                    window.scale_factor(),
                    size.width,
                    size.height
                );
                self.app.resize(size.width, size.height, Instant::now());
                self.render_state = Some(state);
                window.request_redraw();
            }
            Err(e) => {
                tracing::error!("Failed to initialize GPU: {}", e);
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Feed(event) => self.app.on_feed_event(event),
        }
        self.request_redraw_if_dirty();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let now = Instant::now();
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(render) = &mut self.render_state {
                    render.resize(size.width, size.height);
                }
                self.app.resize(size.width, size.height, now);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.app.mouse.x = position.x as f32;
                self.app.mouse.y = position.y as f32;
                if self.app.update_hover() {
                    self.app.mark_dirty();
                }
            }

            WindowEvent::CursorLeft { .. } => {
                self.app.hover = None;
                self.app.mark_dirty();
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let action = match self.app.frame() {
                    Some(frame) => input::process_mouse_button(button, state, &self.app.mouse, frame),
                    None => input::InputAction::None,
                };
                self.app.handle_action(action, now);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    let action = input::process_key(
                        &event.logical_key,
                        event.state,
                        !self.app.search_input.is_empty(),
                    );
                    self.app.handle_action(action, now);
                }
            }

            WindowEvent::RedrawRequested => {
                self.app.rebuild_scene();
                if let Some(render) = &mut self.render_state {
                    if let Err(e) = render.render(&self.app.scene) {
                        tracing::error!("Render error: {}", e);
                    }
                }
                return;
            }

            _ => {}
        }
        self.request_redraw_if_dirty();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.app.poll_timers(Instant::now());
        self.request_redraw_if_dirty();
        match self.app.next_deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("etfview_rs=info".parse()?),
        )
        .init();

    let cli = config::parse_args(std::env::args().skip(1))?;
    let (config, snapshot) = config::resolve(&cli)?;
    tracing::info!("EtfView-rs starting, snapshot: {:?}", snapshot);

    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let proxy = event_loop.create_proxy();
    let refresh = spawn_refresh(
        SnapshotFile::new(snapshot),
        config.refresh_interval(),
        config.retry_delay(),
        move |event| {
            if proxy.send_event(AppEvent::Feed(event)).is_err() {
                tracing::debug!("Event loop closed, dropping feed event");
            }
        },
    );

    let mut app = EtfViewApp::new(config);
    event_loop.run_app(&mut app)?;

    refresh.stop();
    Ok(())
}
