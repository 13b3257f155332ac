pub mod squarify;

use std::collections::HashMap;

use serde::Deserialize;

pub use squarify::squarify;

/// Axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// True when the rectangle has no positive width or height.
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Shrink each side independently. Collapses to zero size instead of inverting.
    pub fn inset(&self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        let x0 = self.x0 + left;
        let y0 = self.y0 + top;
        let x1 = (self.x1 - right).max(x0);
        let y1 = (self.y1 - bottom).max(y0);
        Self { x0, y0, x1, y1 }
    }

    pub fn shrink(&self, amount: f32) -> Self {
        self.inset(amount, amount, amount, amount)
    }

    pub fn grow(&self, amount: f32) -> Self {
        Self::new(self.x0 - amount, self.y0 - amount, self.x1 + amount, self.y1 + amount)
    }

    /// Area shared with `other` (0 when disjoint or only touching).
    pub fn overlap_area(&self, other: &Rect) -> f32 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.y1.min(other.y1) - self.y0.max(other.y0);
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }
}

/// What a weighted node stands for: a group (index into the group list) or a
/// leaf (index into the dataset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Group(usize),
    Leaf(usize),
}

/// Input node for the layout engine. Groups carry children, leaves don't.
#[derive(Debug, Clone)]
pub struct WeightedNode {
    pub key: NodeKey,
    pub weight: f64,
    pub children: Vec<WeightedNode>,
}

impl WeightedNode {
    pub fn leaf(key: NodeKey, weight: f64) -> Self {
        Self {
            key,
            weight,
            children: Vec::new(),
        }
    }

    /// Group node; its weight is the sum of its children's weights.
    pub fn group(key: NodeKey, children: Vec<WeightedNode>) -> Self {
        let weight = children.iter().map(|c| c.weight).sum();
        Self {
            key,
            weight,
            children,
        }
    }
}

/// A positioned rectangle in the treemap layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRect {
    pub node: NodeKey,
    pub rect: Rect,
    /// 1 for top-level nodes, 2 for leaves inside a group
    pub depth: u16,
}

/// The full layout result (rects + fast lookup).
#[derive(Debug, Default)]
pub struct Layout {
    /// Parents always precede their children
    pub rects: Vec<LayoutRect>,
    /// node → index into `rects`
    pub node_to_rect: HashMap<NodeKey, usize>,
}

impl Layout {
    pub fn get(&self, node: NodeKey) -> Option<&LayoutRect> {
        self.node_to_rect.get(&node).map(|&i| &self.rects[i])
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// Padding applied while subdividing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    /// Around the whole region and inside every group
    pub outer: f32,
    /// Between siblings
    pub inner: f32,
    /// Label band reserved at the top of every group
    pub top: Option<f32>,
}

/// How the overview lays out groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverviewStyle {
    /// One tile per group
    #[default]
    Tiles,
    /// Group frames with a label band, containing one cell per instrument
    GroupedCells,
}

/// Configuration for treemap layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub outer_padding: f32,
    pub inner_padding: f32,
    /// Height of the group label band in grouped-cells overview
    pub top_padding: f32,
    pub overview_style: OverviewStyle,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            outer_padding: 2.0,
            inner_padding: 1.5,
            top_padding: 18.0,
            overview_style: OverviewStyle::Tiles,
        }
    }
}

impl LayoutConfig {
    /// Padding for a layout whose top level are groups with children.
    pub fn grouped_padding(&self) -> Padding {
        Padding {
            outer: self.outer_padding,
            inner: self.inner_padding,
            top: Some(self.top_padding),
        }
    }

    /// Padding for a flat layout (group tiles or one group's members).
    pub fn flat_padding(&self) -> Padding {
        Padding {
            outer: self.outer_padding,
            inner: self.inner_padding,
            top: None,
        }
    }
}

/// Compute a nested squarified layout of `nodes` inside `bounds`.
///
/// Siblings are sorted by weight (descending, stable) before partitioning.
/// Each sibling slot is shrunk by half the inner padding so neighbours end up
/// `inner` apart while the outermost edges stay exactly on the content rect.
/// Subdivision walks an explicit work list so deep or wide inputs never grow
/// the call stack.
pub fn compute_layout(nodes: &[WeightedNode], bounds: Rect, padding: &Padding) -> Layout {
    let mut layout = Layout::default();
    if nodes.is_empty() || bounds.is_empty() {
        return layout;
    }

    let half_inner = padding.inner.max(0.0) / 2.0;
    let outer = padding.outer.max(0.0);
    let top = padding.top.unwrap_or(0.0).max(0.0);

    let mut work: Vec<(&[WeightedNode], Rect, u16)> = vec![(nodes, bounds.shrink(outer), 1)];
    while let Some((siblings, content, depth)) = work.pop() {
        if content.is_empty() {
            continue;
        }

        let mut ordered: Vec<&WeightedNode> = siblings
            .iter()
            .filter(|n| n.weight.is_finite() && n.weight > 0.0)
            .collect();
        ordered.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        if ordered.is_empty() {
            continue;
        }

        let weights: Vec<f64> = ordered.iter().map(|n| n.weight).collect();
        let slots = squarify(&weights, content.grow(half_inner));

        let mut nested = Vec::new();
        for (node, slot) in ordered.iter().zip(slots) {
            let rect = slot.shrink(half_inner);
            if rect.is_empty() {
                tracing::debug!(?node.key, depth, "Slot collapsed after padding, skipping");
                continue;
            }

            layout.node_to_rect.insert(node.key, layout.rects.len());
            layout.rects.push(LayoutRect {
                node: node.key,
                rect,
                depth,
            });

            if !node.children.is_empty() {
                let inner = rect.inset(outer, outer + top, outer, outer);
                nested.push((node.children.as_slice(), inner, depth + 1));
            }
        }

        // Reverse so the heaviest group's children are laid out first.
        work.extend(nested.into_iter().rev());
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaves(weights: &[f64]) -> Vec<WeightedNode> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &w)| WeightedNode::leaf(NodeKey::Leaf(i), w))
            .collect()
    }

    fn assert_tiles(children: &[Rect], content: Rect, half_inner: f32) {
        let covered: f32 = children.iter().map(|r| r.grow(half_inner).area()).sum();
        let expected = content.grow(half_inner).area();
        assert!(
            (covered - expected).abs() <= expected * 1e-3,
            "covered {covered} vs {expected}"
        );
        for (i, a) in children.iter().enumerate() {
            for b in &children[i + 1..] {
                assert!(a.overlap_area(b) <= 1e-2, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        let layout = compute_layout(&[], Rect::from_size(100.0, 100.0), &Padding::default());
        assert!(layout.is_empty());
    }

    #[test]
    fn zero_area_bounds_yield_nothing() {
        let nodes = leaves(&[1.0, 2.0]);
        assert!(compute_layout(&nodes, Rect::from_size(0.0, 100.0), &Padding::default()).is_empty());
        assert!(compute_layout(&nodes, Rect::from_size(100.0, -5.0), &Padding::default()).is_empty());
    }

    #[test]
    fn single_node_fills_bounds_minus_outer_padding() {
        let padding = Padding {
            outer: 2.0,
            inner: 1.5,
            top: None,
        };
        let layout = compute_layout(&leaves(&[7.0]), Rect::from_size(200.0, 100.0), &padding);
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.rects[0].rect, Rect::new(2.0, 2.0, 198.0, 98.0));
    }

    #[test]
    fn siblings_are_separated_by_inner_padding() {
        let padding = Padding {
            outer: 0.0,
            inner: 4.0,
            top: None,
        };
        let bounds = Rect::from_size(400.0, 100.0);
        let layout = compute_layout(&leaves(&[1.0, 1.0]), bounds, &padding);
        let rects: Vec<Rect> = layout.rects.iter().map(|r| r.rect).collect();
        assert_eq!(rects.len(), 2);
        let (left, right) = if rects[0].x0 < rects[1].x0 {
            (rects[0], rects[1])
        } else {
            (rects[1], rects[0])
        };
        assert!((right.x0 - left.x1 - 4.0).abs() < 1e-3);
        assert!(left.x0.abs() < 1e-3);
        assert!((right.x1 - 400.0).abs() < 1e-3);
        assert_tiles(&rects, bounds, 2.0);
    }

    #[test]
    fn groups_reserve_top_band_and_contain_children() {
        let nodes = vec![
            WeightedNode::group(NodeKey::Group(0), leaves(&[5.0, 3.0, 2.0])),
            WeightedNode::group(
                NodeKey::Group(1),
                vec![WeightedNode::leaf(NodeKey::Leaf(3), 4.0)],
            ),
        ];
        let padding = Padding {
            outer: 2.0,
            inner: 1.0,
            top: Some(18.0),
        };
        let layout = compute_layout(&nodes, Rect::from_size(800.0, 600.0), &padding);
        assert_eq!(layout.len(), 6);

        // Heaviest group first, parents before children.
        assert_eq!(layout.rects[0].node, NodeKey::Group(0));
        assert_eq!(layout.rects[0].depth, 1);

        let group = layout.get(NodeKey::Group(0)).unwrap().rect;
        let content = group.inset(2.0, 20.0, 2.0, 2.0);
        let children: Vec<Rect> = (0..3)
            .map(|i| layout.get(NodeKey::Leaf(i)).unwrap().rect)
            .collect();
        for child in &children {
            assert!(child.y0 >= group.y0 + 20.0 - 1e-3);
            assert!(child.x0 >= group.x0 - 1e-3 && child.x1 <= group.x1 + 1e-3);
        }
        assert_tiles(&children, content, 0.5);

        let lone = layout.get(NodeKey::Leaf(3)).unwrap();
        assert_eq!(lone.depth, 2);
    }

    #[test]
    fn non_positive_weights_are_skipped() {
        let layout = compute_layout(
            &leaves(&[0.0, 3.0, f64::NAN]),
            Rect::from_size(50.0, 50.0),
            &Padding::default(),
        );
        assert_eq!(layout.len(), 1);
        assert!(layout.get(NodeKey::Leaf(1)).is_some());
    }

    proptest! {
        #[test]
        fn prop_partition_covers_content(
            weights in prop::collection::vec(1.0f64..1000.0, 1..40),
            width in 50.0f32..2000.0,
            height in 50.0f32..2000.0,
            outer in 0.0f32..4.0,
        ) {
            let padding = Padding { outer, inner: 0.0, top: None };
            let bounds = Rect::from_size(width, height);
            let layout = compute_layout(&leaves(&weights), bounds, &padding);
            let rects: Vec<Rect> = layout.rects.iter().map(|r| r.rect).collect();
            let content = bounds.shrink(outer);
            let covered: f32 = rects.iter().map(|r| r.area()).sum();
            prop_assert!((covered - content.area()).abs() <= content.area() * 1e-3);
            for (i, a) in rects.iter().enumerate() {
                prop_assert!(a.x0 >= content.x0 - 1e-2 && a.x1 <= content.x1 + 1e-2);
                prop_assert!(a.y0 >= content.y0 - 1e-2 && a.y1 <= content.y1 + 1e-2);
                for b in &rects[i + 1..] {
                    prop_assert!(a.overlap_area(b) <= content.area() * 1e-5);
                }
            }
        }

        #[test]
        fn prop_nested_groups_tile_their_content(
            groups in prop::collection::vec(prop::collection::vec(1.0f64..1000.0, 1..10), 1..8),
            width in 400.0f32..2000.0,
            height in 400.0f32..2000.0,
        ) {
            let padding = Padding { outer: 2.0, inner: 1.5, top: Some(18.0) };
            let half_inner = 0.75;
            let bounds = Rect::from_size(width, height);

            let mut next_leaf = 0;
            let mut members: Vec<Vec<usize>> = Vec::new();
            let nodes: Vec<WeightedNode> = groups
                .iter()
                .enumerate()
                .map(|(g, weights)| {
                    let ids: Vec<usize> = (next_leaf..next_leaf + weights.len()).collect();
                    next_leaf += weights.len();
                    let children = ids
                        .iter()
                        .zip(weights)
                        .map(|(&i, &w)| WeightedNode::leaf(NodeKey::Leaf(i), w))
                        .collect();
                    members.push(ids);
                    WeightedNode::group(NodeKey::Group(g), children)
                })
                .collect();
            let layout = compute_layout(&nodes, bounds, &padding);

            let region = bounds.shrink(2.0);
            let placed: Vec<Rect> = (0..groups.len())
                .filter_map(|g| layout.get(NodeKey::Group(g)).map(|r| r.rect))
                .collect();
            for (i, a) in placed.iter().enumerate() {
                prop_assert!(a.x0 >= region.x0 - 1e-2 && a.x1 <= region.x1 + 1e-2);
                prop_assert!(a.y0 >= region.y0 - 1e-2 && a.y1 <= region.y1 + 1e-2);
                for b in &placed[i + 1..] {
                    prop_assert!(a.overlap_area(b) <= 1e-2, "{a:?} overlaps {b:?}");
                }
            }
            if placed.len() == groups.len() {
                let covered: f32 = placed.iter().map(|r| r.grow(half_inner).area()).sum();
                let expected = region.grow(half_inner).area();
                prop_assert!((covered - expected).abs() <= expected * 1e-3);
            }

            for (g, ids) in members.iter().enumerate() {
                let Some(group) = layout.get(NodeKey::Group(g)) else { continue };
                let content = group.rect.inset(2.0, 20.0, 2.0, 2.0);
                let children: Vec<Rect> = ids
                    .iter()
                    .filter_map(|&i| layout.get(NodeKey::Leaf(i)))
                    .map(|lr| {
                        assert_eq!(lr.depth, 2);
                        lr.rect
                    })
                    .collect();
                for (i, a) in children.iter().enumerate() {
                    prop_assert!(a.x0 >= content.x0 - 1e-2 && a.x1 <= content.x1 + 1e-2);
                    prop_assert!(a.y0 >= content.y0 - 1e-2 && a.y1 <= content.y1 + 1e-2);
                    for b in &children[i + 1..] {
                        prop_assert!(a.overlap_area(b) <= 1e-2, "{a:?} overlaps {b:?}");
                    }
                }
                if children.len() == ids.len() && !content.is_empty() {
                    let covered: f32 = children.iter().map(|r| r.grow(half_inner).area()).sum();
                    let expected = content.grow(half_inner).area();
                    prop_assert!((covered - expected).abs() <= expected.max(1.0) * 1e-3);
                }
            }
        }

        #[test]
        fn prop_weight_increase_never_shrinks_tile(
            weights in prop::collection::vec(1.0f64..1000.0, 1..30),
            pick in any::<prop::sample::Index>(),
            extra in 0.0f64..5000.0,
        ) {
            let bounds = Rect::from_size(1200.0, 800.0);
            let padding = Padding::default();
            let target = pick.index(weights.len());

            let before = compute_layout(&leaves(&weights), bounds, &padding);
            let mut heavier = weights.clone();
            heavier[target] += extra;
            let after = compute_layout(&leaves(&heavier), bounds, &padding);

            let a0 = before.get(NodeKey::Leaf(target)).unwrap().rect.area();
            let a1 = after.get(NodeKey::Leaf(target)).unwrap().rect.area();
            prop_assert!(a1 >= a0 - a0.max(1.0) * 1e-3, "{a1} < {a0}");
        }
    }
}
