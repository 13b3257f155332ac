use compact_str::CompactString;

use crate::layout::{compute_layout, LayoutConfig, NodeKey, OverviewStyle, Rect, WeightedNode};
use crate::model::{compute_stats, SummaryStats};
use crate::ui::navigation::{NavigationState, View, ViewMode};

/// What a tile represents.
#[derive(Debug, Clone, PartialEq)]
pub enum TileKind {
    /// A whole group (overview)
    Group { key: CompactString, members: usize },
    /// One instrument; `index` points into the state's dataset
    Instrument { index: usize },
}

/// A positioned, labelled tile ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub rect: Rect,
    pub depth: u16,
    pub kind: TileKind,
    /// Ticker for instruments, group key for groups
    pub label: CompactString,
    /// Instrument change, or weighted-average change for groups
    pub change_percent: f64,
    /// Search de-emphasis; tiles are never removed, only dimmed
    pub dimmed: bool,
}

impl Tile {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, TileKind::Group { .. })
    }
}

/// Everything the renderer needs for one draw, derived from the navigation
/// state and the current container bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub bounds: Rect,
    pub view_mode: ViewMode,
    pub active_group: Option<CompactString>,
    pub dimension: CompactString,
    pub search_term: String,
    /// Parents precede their children
    pub tiles: Vec<Tile>,
    pub stats: SummaryStats,
}

impl Frame {
    /// Hit-test: the deepest tile containing the point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&Tile> {
        self.tiles.iter().rev().find(|t| t.rect.contains(x, y))
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Lay out the current view of `state` inside `bounds`.
pub fn build_frame(state: &NavigationState, bounds: Rect, config: &LayoutConfig) -> Frame {
    let dataset = state.dataset();
    let groups = state.groups();

    let (nodes, padding) = match state.view() {
        View::Overview => match config.overview_style {
            OverviewStyle::Tiles => (
                groups
                    .iter()
                    .enumerate()
                    .map(|(gi, g)| WeightedNode::leaf(NodeKey::Group(gi), g.total_weight))
                    .collect::<Vec<_>>(),
                config.flat_padding(),
            ),
            OverviewStyle::GroupedCells => (
                groups
                    .iter()
                    .enumerate()
                    .map(|(gi, g)| {
                        let children = g
                            .members
                            .iter()
                            .map(|&i| WeightedNode::leaf(NodeKey::Leaf(i), dataset[i].weight))
                            .collect();
                        WeightedNode::group(NodeKey::Group(gi), children)
                    })
                    .collect(),
                config.grouped_padding(),
            ),
        },
        View::Detail(_) => (
            state
                .active_group()
                .map(|g| {
                    g.members
                        .iter()
                        .map(|&i| WeightedNode::leaf(NodeKey::Leaf(i), dataset[i].weight))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
            config.flat_padding(),
        ),
    };

    let layout = compute_layout(&nodes, bounds, &padding);
    let highlight = state.highlight();

    let tiles = layout
        .rects
        .iter()
        .map(|lr| match lr.node {
            NodeKey::Group(gi) => {
                let group = &groups[gi];
                Tile {
                    rect: lr.rect,
                    depth: lr.depth,
                    kind: TileKind::Group {
                        key: group.key.clone(),
                        members: group.members.len(),
                    },
                    label: group.key.clone(),
                    change_percent: group.weighted_average_change,
                    dimmed: false,
                }
            }
            NodeKey::Leaf(index) => {
                let instrument = &dataset[index];
                Tile {
                    rect: lr.rect,
                    depth: lr.depth,
                    kind: TileKind::Instrument { index },
                    label: instrument.id.clone(),
                    change_percent: instrument.change_percent,
                    dimmed: !highlight.is_matched(instrument),
                }
            }
        })
        .collect();

    Frame {
        bounds,
        view_mode: state.view_mode(),
        active_group: state.active_group_key().map(CompactString::new),
        dimension: CompactString::new(state.active_dimension()),
        search_term: state.search_term().to_string(),
        tiles,
        stats: compute_stats(dataset),
    }
}
