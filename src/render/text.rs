use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings, Metrics};

use super::colors::AppColor;

/// Rasterizes tile labels with a single system font.
///
/// Coverage bitmaps are cached per glyph and pixel size; tinting happens when
/// the RGBA bitmap is produced so one cached raster serves every label color.
pub struct LabelRenderer {
    font: Option<Font>,
    layout: Layout,
    cache: HashMap<(u16, u32), Arc<(Metrics, Vec<u8>)>>,
}

impl Default for LabelRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelRenderer {
    pub fn new() -> Self {
        Self {
            font: None,
            layout: Layout::new(CoordinateSystem::PositiveYDown),
            cache: HashMap::new(),
        }
    }

    pub fn with_font(font: Font) -> Self {
        let mut renderer = Self::new();
        renderer.font = Some(font);
        renderer
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Try `preferred` first, then a list of common system font paths.
    pub fn load_system_font(&mut self, preferred: Option<&std::path::Path>) -> Result<()> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(path) = preferred {
            candidates.push(path.to_path_buf());
        }

        if let Ok(windir) = std::env::var("WINDIR") {
            candidates.push(PathBuf::from(format!("{windir}\\Fonts\\segoeui.ttf")));
            candidates.push(PathBuf::from(format!("{windir}\\Fonts\\arial.ttf")));
        }
        candidates.push(PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"));
        candidates.push(PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"));
        candidates.push(PathBuf::from("/usr/share/fonts/dejavu/DejaVuSans.ttf"));
        candidates.push(PathBuf::from("/System/Library/Fonts/Helvetica.ttc"));
        candidates.push(PathBuf::from("/Library/Fonts/Arial.ttf"));

        for path in candidates {
            let Ok(font_data) = std::fs::read(&path) else {
                continue;
            };
            if let Ok(font) = Font::from_bytes(font_data, FontSettings::default()) {
                tracing::info!("Loaded label font from {}", path.display());
                self.font = Some(font);
                self.cache.clear();
                return Ok(());
            }
        }

        Err(anyhow!("unable to load a system font from known locations"))
    }

    /// Advance width of `text` at `font_size`, or `None` without a font.
    pub fn measure(&self, text: &str, font_size: f32) -> Option<f32> {
        let font = self.font.as_ref()?;
        Some(
            text.chars()
                .map(|c| font.metrics(c, font_size).advance_width)
                .sum(),
        )
    }

    pub fn render_text(&mut self, text: &str, font_size: f32, color: AppColor) -> Option<TextRenderResult> {
        let font = self.font.as_ref()?;

        self.layout.reset(&LayoutSettings::default());
        self.layout.append(&[font], &TextStyle::new(text, font_size, 0));

        let [r, g, b] = [color.r, color.g, color.b].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let mut glyphs = Vec::new();
        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;

        for glyph in self.layout.glyphs() {
            let key = (glyph.key.glyph_index, font_size.to_bits());
            let raster = self
                .cache
                .entry(key)
                .or_insert_with(|| {
                    Arc::new(font.rasterize_config(GlyphRasterConfig {
                        glyph_index: glyph.key.glyph_index,
                        px: font_size,
                        font_hash: 0,
                    }))
                })
                .clone();
            let (metrics, coverage) = (&raster.0, &raster.1);

            let mut rgba_bitmap = Vec::with_capacity(coverage.len() * 4);
            for &alpha in coverage {
                let a = (alpha as f32 * color.a.clamp(0.0, 1.0)) as u8;
                rgba_bitmap.extend_from_slice(&[r, g, b, a]);
            }

            glyphs.push(TextGlyph {
                x: glyph.x,
                y: glyph.y,
                width: metrics.width,
                height: metrics.height,
                bitmap: rgba_bitmap,
            });

            width = width.max(glyph.x + metrics.width as f32);
            height = height.max(glyph.y + metrics.height as f32);
        }

        if glyphs.is_empty() {
            return None;
        }

        Some(TextRenderResult {
            glyphs,
            width: width.ceil() as u32,
            height: height.ceil() as u32,
        })
    }
}

pub struct TextRenderResult {
    pub glyphs: Vec<TextGlyph>,
    pub width: u32,
    pub height: u32,
}

pub struct TextGlyph {
    pub x: f32,
    pub y: f32,
    pub width: usize,
    pub height: usize,
    pub bitmap: Vec<u8>, // RGBA
}
