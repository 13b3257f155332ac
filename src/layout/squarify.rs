use super::Rect;

/// Squarified partition of `bounds` into one slot per weight.
///
/// `weights` must already be sorted descending. Slots come back in the same
/// order as `weights`. Rows are laid along the shorter side of the remaining
/// rectangle and grown while the worst aspect ratio keeps improving; the last
/// row and the last item of every row take the exact remainder so the slots
/// tile `bounds` without gaps.
pub fn squarify(weights: &[f64], bounds: Rect) -> Vec<Rect> {
    let n = weights.len();
    let empty = Rect::new(bounds.x0, bounds.y0, bounds.x0, bounds.y0);
    let mut slots = vec![empty; n];

    let total: f64 = weights.iter().copied().filter(|w| *w > 0.0).sum();
    if n == 0 || total <= 0.0 || bounds.is_empty() {
        return slots;
    }

    let mut x = bounds.x0 as f64;
    let mut y = bounds.y0 as f64;
    let mut w = bounds.width() as f64;
    let mut h = bounds.height() as f64;

    // Normalized areas
    let scale = (w * h) / total;
    let areas: Vec<f64> = weights.iter().map(|&wt| wt.max(0.0) * scale).collect();

    let mut start = 0;
    while start < n {
        // Guard against degenerate cases
        if w <= 1e-9 || h <= 1e-9 {
            break;
        }

        // A wide rectangle gets a column on its left edge, a tall one a row on top.
        let column = w >= h;
        let short = if column { h } else { w };
        let long = if column { w } else { h };

        // Grow the row while the worst aspect ratio does not get worse
        let mut end = start + 1;
        let mut row_sum = areas[start];
        let mut best = worst_aspect_ratio(&areas[start..end], row_sum, short);
        while end < n {
            let next_sum = row_sum + areas[end];
            let score = worst_aspect_ratio(&areas[start..=end], next_sum, short);
            if score > best {
                break;
            }
            best = score;
            row_sum = next_sum;
            end += 1;
        }

        let thickness = if end == n {
            long
        } else {
            (row_sum / short).min(long)
        };

        let mut offset = 0.0;
        for i in start..end {
            let length = if i + 1 == end {
                (short - offset).max(0.0)
            } else if row_sum > 0.0 {
                areas[i] / row_sum * short
            } else {
                0.0
            };

            slots[i] = if column {
                rect_f64(x, y + offset, x + thickness, y + offset + length)
            } else {
                rect_f64(x + offset, y, x + offset + length, y + thickness)
            };
            offset += length;
        }

        // Shrink remaining space
        if column {
            x += thickness;
            w = (w - thickness).max(0.0);
        } else {
            y += thickness;
            h = (h - thickness).max(0.0);
        }

        start = end;
    }

    slots
}

fn rect_f64(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
    Rect::new(x0 as f32, y0 as f32, x1 as f32, y1 as f32)
}

fn worst_aspect_ratio(row: &[f64], sum: f64, side: f64) -> f64 {
    if row.is_empty() || sum <= 0.0 || side <= 0.0 {
        return f64::MAX;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let max_r = row.iter().copied().fold(0.0, f64::max);
    let min_r = row.iter().copied().fold(f64::INFINITY, f64::min);
    if min_r <= 0.0 {
        return f64::MAX;
    }
    let a = (side_sq * max_r) / sum_sq;
    let b = sum_sq / (side_sq * min_r);
    a.max(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_item_fills_bounds() {
        let slots = squarify(&[42.0], Rect::new(0.0, 0.0, 1920.0, 1080.0));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0], Rect::new(0.0, 0.0, 1920.0, 1080.0));
    }

    #[test]
    fn areas_are_proportional_to_weights() {
        let weights = [6.0, 6.0, 4.0, 3.0, 2.0, 2.0, 1.0];
        let bounds = Rect::new(0.0, 0.0, 600.0, 400.0);
        let slots = squarify(&weights, bounds);
        let total: f64 = weights.iter().sum();
        for (slot, weight) in slots.iter().zip(weights) {
            let expected = weight / total * bounds.area() as f64;
            assert!((slot.area() as f64 - expected).abs() < 1e-2 * expected.max(1.0));
        }
    }

    #[test]
    fn classic_example_produces_square_first_rows() {
        // Bruls et al. reference input on a 6x4 rectangle.
        let slots = squarify(
            &[6.0, 6.0, 4.0, 3.0, 2.0, 2.0, 1.0],
            Rect::new(0.0, 0.0, 6.0, 4.0),
        );
        // First row is a column of the two 6s on the left edge.
        assert!((slots[0].width() - 3.0).abs() < 1e-5);
        assert!((slots[1].width() - 3.0).abs() < 1e-5);
        assert!((slots[0].height() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_bounds_yield_empty_slots() {
        let slots = squarify(&[1.0, 2.0], Rect::new(0.0, 0.0, 0.0, 50.0));
        assert!(slots.iter().all(|s| s.is_empty()));
        assert!(squarify(&[], Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn worst_aspect_ratio_of_square_is_one() {
        assert!((worst_aspect_ratio(&[4.0], 4.0, 2.0) - 1.0).abs() < 1e-12);
        assert_eq!(worst_aspect_ratio(&[], 0.0, 2.0), f64::MAX);
    }
}
