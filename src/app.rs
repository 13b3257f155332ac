use std::time::Instant;

use chrono::{DateTime, Local};
use vello::Scene;

use etfview_rs::config::HeatmapConfig;
use etfview_rs::feed::FeedEvent;
use etfview_rs::layout::Rect;
use etfview_rs::render::scene::{build_scene, updated_text, Overlay, HEADER_HEIGHT};
use etfview_rs::render::text::LabelRenderer;
use etfview_rs::ui::controller::{Controller, RenderSink};
use etfview_rs::ui::debounce::Debouncer;
use etfview_rs::ui::frame::{Frame, TileKind};
use etfview_rs::ui::input::{hit_test, InputAction, MouseState};
use etfview_rs::ui::tooltip::build_tooltip;

/// Keeps the latest presented frame for the next redraw.
#[derive(Default)]
pub struct LatestFrame {
    pub frame: Option<Frame>,
    pub dirty: bool,
}

impl RenderSink for LatestFrame {
    fn present(&mut self, frame: &Frame) {
        self.frame = Some(frame.clone());
        self.dirty = true;
    }
}

/// Top-level application state.
pub struct App {
    pub config: HeatmapConfig,
    controller: Controller<LatestFrame>,
    pub labels: LabelRenderer,
    pub mouse: MouseState,

    // Search box text as typed; applied after the debounce delay
    pub search_input: String,
    search_debounce: Debouncer<String>,
    resize_debounce: Debouncer<Rect>,

    pub status: Option<String>,
    /// Time of the last successful load or refresh
    pub last_updated: Option<DateTime<Local>>,
    /// Instrument under the cursor
    pub hover: Option<usize>,

    // Rendering
    pub scene: Scene,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl App {
    pub fn new(config: HeatmapConfig) -> Self {
        let mut labels = LabelRenderer::new();
        match labels.load_system_font(config.label_font_path.as_deref()) {
            Ok(()) => tracing::info!("Loaded label font"),
            Err(e) => tracing::warn!("{e}; text labels will not be available"),
        }

        let controller = Controller::new(
            &config.default_dimension,
            treemap_bounds(800.0, 600.0),
            config.layout.clone(),
            LatestFrame::default(),
        );

        Self {
            search_debounce: Debouncer::new(config.debounce()),
            resize_debounce: Debouncer::new(config.debounce()),
            config,
            controller,
            labels,
            mouse: MouseState::default(),
            search_input: String::new(),
            status: Some("Loading...".to_string()),
            last_updated: None,
            hover: None,
            scene: Scene::new(),
            viewport_width: 800.0,
            viewport_height: 600.0,
        }
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.controller.sink().frame.as_ref()
    }

    /// Whether something changed since the last scene rebuild.
    pub fn is_dirty(&self) -> bool {
        self.controller.sink().dirty
    }

    pub fn mark_dirty(&mut self) {
        self.controller.sink_mut().dirty = true;
    }

    pub fn title(&self) -> String {
        match self.frame().and_then(|f| f.active_group.as_ref()) {
            Some(group) => format!("EtfView-rs | {group}"),
            None => format!("EtfView-rs | by {}", self.controller.state().active_dimension()),
        }
    }

    pub fn on_feed_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Loaded(data) => {
                tracing::info!("Initial snapshot: {} instruments", data.len());
                self.status = None;
                self.last_updated = Some(Local::now());
                // Load resets the search; drop anything typed while loading.
                self.search_input.clear();
                self.search_debounce.cancel();
                self.controller.on_load(data);
            }
            FeedEvent::Refreshed(data) => {
                tracing::info!("Refreshed snapshot: {} instruments", data.len());
                self.status = None;
                self.last_updated = Some(Local::now());
                self.controller.on_refresh(data);
            }
            FeedEvent::Failed(message) => {
                self.status = Some(message);
                self.mark_dirty();
            }
        }
        self.hover = None;
    }

    /// Window resized. The first size applies at once, later ones are debounced.
    pub fn resize(&mut self, width: u32, height: u32, now: Instant) {
        self.viewport_width = width as f32;
        self.viewport_height = height as f32;
        let bounds = treemap_bounds(self.viewport_width, self.viewport_height);
        if self.frame().is_none() {
            self.controller.on_resize(bounds);
        } else {
            self.resize_debounce.push(bounds, now);
            // Header and background still follow the window immediately.
            self.mark_dirty();
        }
    }

    pub fn handle_action(&mut self, action: InputAction, now: Instant) {
        match action {
            InputAction::SelectGroup(key) => {
                self.controller.on_select_group(&key);
            }
            InputAction::Back => {
                self.controller.on_back();
            }
            InputAction::SearchInput(text) => {
                self.search_input.push_str(&text);
                self.search_debounce.push(self.search_input.clone(), now);
                self.mark_dirty();
            }
            InputAction::SearchBackspace => {
                if self.search_input.pop().is_some() {
                    self.search_debounce.push(self.search_input.clone(), now);
                    self.mark_dirty();
                }
            }
            InputAction::ClearSearch => {
                self.search_input.clear();
                self.search_debounce.cancel();
                self.controller.on_search("");
                self.mark_dirty();
            }
            InputAction::CycleDimension => {
                let next = self
                    .config
                    .next_dimension(self.controller.state().active_dimension())
                    .to_string();
                self.controller.on_change_dimension(&next);
            }
            InputAction::None => {}
        }
        self.hover = None;
    }

    /// Fire debounced triggers whose delay has passed.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(bounds) = self.resize_debounce.poll(now) {
            self.controller.on_resize(bounds);
        }
        if let Some(term) = self.search_debounce.poll(now) {
            self.controller.on_search(&term);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.resize_debounce.deadline(), self.search_debounce.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Track the instrument under the cursor. Returns true if it changed.
    pub fn update_hover(&mut self) -> bool {
        let hovered = self.frame().and_then(|frame| {
            hit_test(frame, self.mouse.x, self.mouse.y).and_then(|tile| match tile.kind {
                TileKind::Instrument { index } => Some(index),
                TileKind::Group { .. } => None,
            })
        });
        let changed = hovered != self.hover;
        self.hover = hovered;
        changed
    }

    /// Rebuild the Vello scene from the latest frame.
    pub fn rebuild_scene(&mut self) {
        let tooltip = self.hover.and_then(|index| {
            self.controller
                .state()
                .dataset()
                .get(index)
                .map(|inst| (self.mouse.x, self.mouse.y, build_tooltip(inst)))
        });
        let overlay = Overlay {
            show_labels: self.config.show_labels,
            search_input: self.search_input.clone(),
            status: self.status.clone(),
            updated: self.last_updated.as_ref().map(updated_text),
            tooltip,
        };

        let empty;
        let frame = match self.controller.sink().frame.as_ref() {
            Some(frame) => frame,
            None => {
                empty = self.controller.current_frame();
                &empty
            }
        };
        build_scene(&mut self.scene, frame, self.viewport_width, &overlay, &mut self.labels);
        self.controller.sink_mut().dirty = false;
    }
}

/// Treemap area: the window below the header strip.
pub fn treemap_bounds(width: f32, height: f32) -> Rect {
    Rect::new(0.0, HEADER_HEIGHT, width.max(0.0), height.max(HEADER_HEIGHT))
}
