use std::sync::Arc;

use chrono::Timelike;
use vello::kurbo::{Affine, Rect, Stroke};
use vello::peniko::{Blob, Fill, Image, ImageFormat};
use vello::Scene;

use super::colors::{color_for, AppColor, BACKGROUND, GROUP_BORDER, GROUP_LABEL};
use super::text::{LabelRenderer, TextRenderResult};
use crate::layout::Rect as TileRect;
use crate::ui::frame::{Frame, Tile, TileKind};
use crate::ui::navigation::ViewMode;
use crate::ui::tooltip::{format_change, TooltipInfo};

/// Height of the header strip above the treemap.
pub const HEADER_HEIGHT: f32 = 28.0;

const WHITE: AppColor = AppColor::new(1.0, 1.0, 1.0);
const GROUP_LABEL_SIZE: f32 = 11.0;
const TOOLTIP_FONT_SIZE: f32 = 12.0;

/// Everything drawn on top of the treemap that isn't part of the frame.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub show_labels: bool,
    /// Search box contents as typed (may run ahead of the applied search)
    pub search_input: String,
    /// Feed status message, if any
    pub status: Option<String>,
    /// "Updated HH:MM" for the last successful load or refresh
    pub updated: Option<String>,
    /// Cursor position and info for the hovered instrument
    pub tooltip: Option<(f32, f32, TooltipInfo)>,
}

/// Build a Vello scene from a frame plus overlays.
pub fn build_scene(
    scene: &mut Scene,
    frame: &Frame,
    window_width: f32,
    overlay: &Overlay,
    labels: &mut LabelRenderer,
) {
    scene.reset();

    let canvas = TileRect::new(0.0, 0.0, window_width, frame.bounds.y1.max(HEADER_HEIGHT));
    fill(scene, &canvas, BACKGROUND);

    // Group frames only exist when members are nested inside them.
    let nested = frame.view_mode == ViewMode::Overview && frame.tiles.iter().any(|t| !t.is_group());

    for tile in &frame.tiles {
        if tile.is_group() && nested {
            draw_group_frame(scene, tile, overlay.show_labels, labels);
        } else {
            draw_cell(scene, tile, overlay.show_labels, labels);
        }
    }

    draw_header(scene, frame, window_width, overlay, labels);

    if let Some((x, y, info)) = &overlay.tooltip {
        draw_tooltip(scene, *x, *y, info, window_width, frame.bounds.y1, labels);
    }
}

fn draw_group_frame(scene: &mut Scene, tile: &Tile, show_labels: bool, labels: &mut LabelRenderer) {
    fill(scene, &tile.rect, GROUP_BORDER.with_alpha(0.35));
    scene.stroke(
        &Stroke::new(1.0),
        Affine::IDENTITY,
        GROUP_BORDER.to_peniko(),
        None,
        &to_kurbo(&tile.rect),
    );

    if !show_labels || tile.rect.width() <= 40.0 {
        return;
    }
    let label = truncate_label(&tile.label, tile.rect.width() - 8.0, GROUP_LABEL_SIZE);
    if label.is_empty() {
        return;
    }
    if let Some(text) = labels.render_text(&label, GROUP_LABEL_SIZE, GROUP_LABEL) {
        draw_text_to_scene(scene, text, tile.rect.x0 + 4.0, tile.rect.y0 + 3.0);
    }
}

fn draw_cell(scene: &mut Scene, tile: &Tile, show_labels: bool, labels: &mut LabelRenderer) {
    let mut color = color_for(tile.change_percent);
    if tile.dimmed {
        color = color.dimmed();
    }
    fill(scene, &tile.rect, color);
    scene.stroke(
        &Stroke::new(0.5),
        Affine::IDENTITY,
        BACKGROUND.to_peniko(),
        None,
        &to_kurbo(&tile.rect),
    );

    if !show_labels {
        return;
    }
    let (w, h) = (tile.rect.width(), tile.rect.height());
    let Some(font_size) = label_font_size(w, h) else {
        return;
    };
    let text_alpha = if tile.dimmed { 0.35 } else { 1.0 };

    let title = match &tile.kind {
        TileKind::Group { .. } => truncate_label(&tile.label, w - 6.0, font_size),
        TileKind::Instrument { .. } => tile.label.to_string(),
    };
    let cx = (tile.rect.x0 + tile.rect.x1) / 2.0;
    let cy = (tile.rect.y0 + tile.rect.y1) / 2.0;
    let two_lines = shows_change_line(w, h);

    if let Some(text) = labels.render_text(&title, font_size, WHITE.with_alpha(text_alpha)) {
        let tx = cx - text.width as f32 / 2.0;
        let ty = if two_lines {
            cy - text.height as f32 - 1.0
        } else {
            cy - text.height as f32 / 2.0
        };
        draw_text_to_scene(scene, text, tx, ty);
    }

    if two_lines {
        let size = change_font_size(font_size);
        let change = format_change(tile.change_percent);
        if let Some(text) = labels.render_text(&change, size, WHITE.with_alpha(0.85 * text_alpha)) {
            let tx = cx - text.width as f32 / 2.0;
            draw_text_to_scene(scene, text, tx, cy + 2.0);
        }
    }
}

fn draw_header(
    scene: &mut Scene,
    frame: &Frame,
    window_width: f32,
    overlay: &Overlay,
    labels: &mut LabelRenderer,
) {
    let band = TileRect::new(0.0, 0.0, window_width, HEADER_HEIGHT);
    fill(scene, &band, GROUP_BORDER);

    let text = header_text(frame, overlay);
    if let Some(rendered) = labels.render_text(&text, TOOLTIP_FONT_SIZE, WHITE) {
        let ty = (HEADER_HEIGHT - rendered.height as f32) / 2.0;
        draw_text_to_scene(scene, rendered, 8.0, ty);
    }

    if let Some(status) = &overlay.status {
        let color = AppColor::from_rgb8(0xff, 0xb3, 0x00);
        if let Some(rendered) = labels.render_text(status, TOOLTIP_FONT_SIZE, color) {
            let tx = (window_width - rendered.width as f32 - 8.0).max(8.0);
            let ty = (HEADER_HEIGHT - rendered.height as f32) / 2.0;
            draw_text_to_scene(scene, rendered, tx, ty);
        }
    }
}

fn draw_tooltip(
    scene: &mut Scene,
    x: f32,
    y: f32,
    info: &TooltipInfo,
    max_x: f32,
    max_y: f32,
    labels: &mut LabelRenderer,
) {
    let mut lines = vec![format!("{}  {}", info.ticker, info.name)];
    lines.extend(info.rows().into_iter().map(|(k, v)| format!("{k}: {v}")));

    let line_h = TOOLTIP_FONT_SIZE + 4.0;
    let width = lines
        .iter()
        .filter_map(|l| labels.measure(l, TOOLTIP_FONT_SIZE))
        .fold(0.0f32, f32::max)
        + 16.0;
    let height = line_h * lines.len() as f32 + 12.0;
    let (bx, by) = tooltip_origin(x, y, width, height, max_x, max_y);

    let panel = TileRect::new(bx, by, bx + width, by + height);
    fill(scene, &panel, BACKGROUND.with_alpha(0.92));
    let accent = if info.positive { color_for(2.0) } else { color_for(-2.0) };
    scene.stroke(&Stroke::new(1.0), Affine::IDENTITY, accent.to_peniko(), None, &to_kurbo(&panel));

    for (i, line) in lines.iter().enumerate() {
        let color = if i == 0 { WHITE } else { GROUP_LABEL.lighten(0.3) };
        if let Some(text) = labels.render_text(line, TOOLTIP_FONT_SIZE, color) {
            draw_text_to_scene(scene, text, bx + 8.0, by + 6.0 + line_h * i as f32);
        }
    }
}

/// Header line: dimension, summary counts, last update and search box.
pub fn header_text(frame: &Frame, overlay: &Overlay) -> String {
    let search_input = overlay.search_input.as_str();
    let location = match &frame.active_group {
        Some(group) => format!("{} › {}", frame.dimension, group),
        None => format!("by {}", frame.dimension),
    };
    let stats = &frame.stats;
    let search = if search_input.is_empty() {
        String::new()
    } else {
        format!("   search: {search_input}")
    };
    let updated = match &overlay.updated {
        Some(updated) => format!("   {updated}"),
        None => String::new(),
    };
    format!(
        "{location}   {} ETFs  avg {}  ▲{} ▼{}{updated}{search}",
        stats.total,
        format_change(stats.average_change),
        stats.gainers,
        stats.losers
    )
}

/// Wall-clock label for the last successful fetch, e.g. "Updated 09:05".
pub fn updated_text(time: &impl Timelike) -> String {
    format!("Updated {:02}:{:02}", time.hour(), time.minute())
}

/// Label size for a cell, or `None` when the cell is too small for text.
pub fn label_font_size(width: f32, height: f32) -> Option<f32> {
    if width < 28.0 || height < 16.0 {
        return None;
    }
    Some(if width < 40.0 {
        8.0
    } else if width < 60.0 {
        9.0
    } else if width < 90.0 {
        11.0
    } else {
        13.0
    })
}

pub fn change_font_size(label_size: f32) -> f32 {
    (label_size - 2.0).max(7.0)
}

/// Whether the change line fits below the ticker.
pub fn shows_change_line(width: f32, height: f32) -> bool {
    height > 30.0 && width > 35.0
}

/// Shorten `name` to fit `max_width` at `font_size`, ending in an ellipsis.
pub fn truncate_label(name: &str, max_width: f32, font_size: f32) -> String {
    let approx_char_w = (font_size * 0.6).max(1.0);
    let max_chars = (max_width.max(0.0) / approx_char_w) as usize;
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    if max_chars < 2 {
        return String::new();
    }
    let truncated: String = name.chars().take(max_chars - 1).collect();
    format!("{truncated}…")
}

/// Keep the tooltip inside the canvas, preferring below-right of the cursor.
fn tooltip_origin(x: f32, y: f32, w: f32, h: f32, max_x: f32, max_y: f32) -> (f32, f32) {
    let mut bx = x + 14.0;
    let mut by = y + 14.0;
    if bx + w > max_x {
        bx = (x - w - 14.0).max(0.0);
    }
    if by + h > max_y {
        by = (y - h - 14.0).max(HEADER_HEIGHT);
    }
    (bx, by)
}

fn to_kurbo(rect: &TileRect) -> Rect {
    Rect::new(rect.x0 as f64, rect.y0 as f64, rect.x1 as f64, rect.y1 as f64)
}

fn fill(scene: &mut Scene, rect: &TileRect, color: AppColor) {
    if rect.is_empty() {
        return;
    }
    scene.fill(Fill::NonZero, Affine::IDENTITY, color.to_peniko(), None, &to_kurbo(rect));
}

/// Draw rendered text to a Vello scene.
fn draw_text_to_scene(scene: &mut Scene, text_result: TextRenderResult, x: f32, y: f32) {
    for glyph in text_result.glyphs {
        if glyph.bitmap.is_empty() {
            continue;
        }

        let glyph_image = Image::new(
            Blob::new(Arc::new(glyph.bitmap)),
            ImageFormat::Rgba8,
            glyph.width as u32,
            glyph.height as u32,
        );

        let transform = Affine::translate((x as f64 + glyph.x as f64, y as f64 + glyph.y as f64));
        scene.draw_image(&glyph_image, transform);
    }
}
