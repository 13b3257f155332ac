use std::collections::VecDeque;

use compact_str::CompactString;

use crate::layout::{LayoutConfig, Rect};
use crate::model::Instrument;
use crate::ui::frame::{build_frame, Frame};
use crate::ui::navigation::{Command, NavigationState, Outcome};

/// Receives a fresh [`Frame`] after every transition that needs a redraw.
pub trait RenderSink {
    fn present(&mut self, frame: &Frame);
}

impl<F: FnMut(&Frame)> RenderSink for F {
    fn present(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// Owns the navigation state and drives the render sink.
///
/// Triggers are either dispatched immediately (`on_*`) or queued with
/// [`Controller::submit`] and drained in order by
/// [`Controller::process_pending`]. Every frame is derived from the current
/// state, the latest dataset and the latest bounds.
pub struct Controller<S: RenderSink> {
    state: NavigationState,
    bounds: Rect,
    config: LayoutConfig,
    sink: S,
    pending: VecDeque<Command>,
}

impl<S: RenderSink> Controller<S> {
    pub fn new(default_dimension: &str, bounds: Rect, config: LayoutConfig, sink: S) -> Self {
        Self {
            state: NavigationState::new(default_dimension),
            bounds,
            config,
            sink,
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Frame for the current state, without notifying the sink.
    pub fn current_frame(&self) -> Frame {
        build_frame(&self.state, self.bounds, &self.config)
    }

    /// Apply a command and redraw if it changed anything visible.
    pub fn dispatch(&mut self, command: Command) -> Outcome {
        let outcome = self.state.apply(command);
        if outcome == Outcome::Render {
            let frame = self.current_frame();
            tracing::debug!(
                "Presenting {:?} frame ({} tiles, group={:?})",
                frame.view_mode,
                frame.tiles.len(),
                frame.active_group
            );
            self.sink.present(&frame);
        }
        outcome
    }

    /// Queue a command for [`Controller::process_pending`].
    pub fn submit(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Apply all queued commands in arrival order. Returns how many ran.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Some(command) = self.pending.pop_front() {
            self.dispatch(command);
            processed += 1;
        }
        processed
    }

    pub fn on_load(&mut self, dataset: Vec<Instrument>) -> Outcome {
        self.dispatch(Command::Load(dataset))
    }

    pub fn on_refresh(&mut self, dataset: Vec<Instrument>) -> Outcome {
        self.dispatch(Command::Refresh(dataset))
    }

    pub fn on_resize(&mut self, bounds: Rect) -> Outcome {
        self.bounds = bounds;
        self.dispatch(Command::Resize)
    }

    pub fn on_search(&mut self, term: &str) -> Outcome {
        self.dispatch(Command::Search(term.to_string()))
    }

    pub fn on_select_group(&mut self, key: &str) -> Outcome {
        self.dispatch(Command::SelectGroup(CompactString::new(key)))
    }

    pub fn on_back(&mut self) -> Outcome {
        self.dispatch(Command::Back)
    }

    pub fn on_change_dimension(&mut self, dimension: &str) -> Outcome {
        self.dispatch(Command::ChangeDimension(CompactString::new(dimension)))
    }

    /// Swap layout settings and redraw the current view.
    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.dispatch(Command::Resize);
    }
}
