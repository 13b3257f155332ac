use compact_str::CompactString;

use crate::model::group::{find_group, group_by};
use crate::model::instrument::displayable;
use crate::model::{Group, Instrument};
use crate::ui::search::{self, Highlight, SearchResolution};

/// Which level of the heatmap is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// One tile per group
    Overview,
    /// One tile per instrument of the named group
    Detail(CompactString),
}

/// Discriminant of [`View`] without the group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Overview,
    Detail,
}

/// Every external trigger the navigation state reacts to.
#[derive(Debug, Clone)]
pub enum Command {
    /// Initial (or retried) dataset load
    Load(Vec<Instrument>),
    /// Periodic data refresh
    Refresh(Vec<Instrument>),
    /// Container bounds changed
    Resize,
    /// Free-text search (already debounced)
    Search(String),
    SelectGroup(CompactString),
    Back,
    ChangeDimension(CompactString),
}

/// Result of applying a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The current view must be (re)drawn
    Render,
    /// Nothing changed (invalid or redundant transition)
    Ignored,
}

/// Navigation state: current view, grouping, search and the cached dataset.
#[derive(Debug, Clone)]
pub struct NavigationState {
    view: View,
    active_dimension: CompactString,
    highlight: Highlight,
    /// Displayable instruments of the latest accepted dataset
    dataset: Vec<Instrument>,
    /// `dataset` grouped by `active_dimension`
    groups: Vec<Group>,
}

impl NavigationState {
    pub fn new(default_dimension: &str) -> Self {
        Self {
            view: View::Overview,
            active_dimension: CompactString::new(default_dimension),
            highlight: Highlight::none(),
            dataset: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mode(&self) -> ViewMode {
        match self.view {
            View::Overview => ViewMode::Overview,
            View::Detail(_) => ViewMode::Detail,
        }
    }

    /// Key of the zoomed group; `Some` iff the view is a detail view.
    pub fn active_group_key(&self) -> Option<&str> {
        match &self.view {
            View::Overview => None,
            View::Detail(key) => Some(key.as_str()),
        }
    }

    pub fn active_group(&self) -> Option<&Group> {
        self.active_group_key()
            .and_then(|key| find_group(&self.groups, key))
    }

    pub fn active_dimension(&self) -> &str {
        &self.active_dimension
    }

    pub fn search_term(&self) -> &str {
        self.highlight.term()
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn dataset(&self) -> &[Instrument] {
        &self.dataset
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Apply one command. All transitions go through here.
    pub fn apply(&mut self, command: Command) -> Outcome {
        match command {
            Command::Load(dataset) => self.load(dataset),
            Command::Refresh(dataset) => self.refresh(dataset),
            Command::Resize => Outcome::Render,
            Command::Search(term) => self.search(&term),
            Command::SelectGroup(key) => self.select_group(&key),
            Command::Back => self.back(),
            Command::ChangeDimension(dimension) => self.change_dimension(&dimension),
        }
    }

    fn load(&mut self, dataset: Vec<Instrument>) -> Outcome {
        self.dataset = displayable(dataset);
        self.regroup();
        self.view = View::Overview;
        self.highlight = Highlight::none();
        tracing::info!(
            "Loaded {} instruments into {} groups by '{}'",
            self.dataset.len(),
            self.groups.len(),
            self.active_dimension
        );
        Outcome::Render
    }

    fn refresh(&mut self, dataset: Vec<Instrument>) -> Outcome {
        let dataset = displayable(dataset);
        if dataset.is_empty() {
            tracing::warn!(
                "Refresh delivered no displayable instruments, keeping {} cached",
                self.dataset.len()
            );
            return Outcome::Ignored;
        }

        self.dataset = dataset;
        self.regroup();

        if let View::Detail(key) = &self.view {
            if find_group(&self.groups, key).is_none() {
                tracing::info!("Group '{}' vanished after refresh, returning to overview", key);
                self.view = View::Overview;
            }
        }
        Outcome::Render
    }

    fn change_dimension(&mut self, dimension: &str) -> Outcome {
        if self.active_dimension == dimension {
            return Outcome::Ignored;
        }
        tracing::info!("Grouping by '{}' (was '{}')", dimension, self.active_dimension);
        self.active_dimension = CompactString::new(dimension);
        self.regroup();
        self.view = View::Overview;
        Outcome::Render
    }

    fn select_group(&mut self, key: &str) -> Outcome {
        if self.view != View::Overview {
            return Outcome::Ignored;
        }
        if find_group(&self.groups, key).is_none() {
            tracing::debug!("Ignoring selection of unknown group '{}'", key);
            return Outcome::Ignored;
        }
        self.view = View::Detail(CompactString::new(key));
        Outcome::Render
    }

    fn back(&mut self) -> Outcome {
        if self.view == View::Overview {
            return Outcome::Ignored;
        }
        self.view = View::Overview;
        Outcome::Render
    }

    fn search(&mut self, term: &str) -> Outcome {
        match search::resolve(term, &self.dataset, &self.active_dimension, &self.view) {
            SearchResolution::Clear => {
                self.highlight = Highlight::none();
                Outcome::Render
            }
            SearchResolution::NoMatch => Outcome::Ignored,
            SearchResolution::Matched {
                drill_into,
                highlight,
            } => {
                self.highlight = highlight;
                if let Some(key) = drill_into {
                    self.select_group(&key);
                }
                Outcome::Render
            }
        }
    }

    fn regroup(&mut self) {
        self.groups = group_by(&self.dataset, &self.active_dimension);
    }
}

/// Pure form of [`NavigationState::apply`]: consume a state, return the next one.
pub fn step(mut state: NavigationState, command: Command) -> (NavigationState, Outcome) {
    let outcome = state.apply(command);
    (state, outcome)
}
