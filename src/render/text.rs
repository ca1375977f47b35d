//! Text layers.
//!
//! Fonts are loaded once from `<fonts>/<name>.ttf` and shared across render
//! workers. Each line is centred horizontally; the block is aligned to the
//! top, centre or bottom of the key and then moved by the layer offset.

use crate::error::AssetError;
use crate::models::{KeySize, TextLayer, VerticalAlign};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::{Pixel, RgbaImage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Loaded fonts by base filename. Failed loads are remembered too.
pub struct FontCache {
    dir: PathBuf,
    fonts: Mutex<HashMap<String, Option<Arc<Font>>>>,
}

impl FontCache {
    /// Creates a cache reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fonts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the font named `name`, loading it on first use.
    pub fn get(&self, name: &str) -> Result<Arc<Font>, AssetError> {
        let mut fonts = self.fonts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = fonts.get(name) {
            return cached.clone().ok_or_else(|| AssetError::Font(name.to_string()));
        }

        let path = self.dir.join(format!("{name}.ttf"));
        let loaded = std::fs::read(&path)
            .map_err(|err| err.to_string())
            .and_then(|data| {
                Font::from_bytes(data, FontSettings::default()).map_err(str::to_string)
            });
        let font = match loaded {
            Ok(font) => {
                tracing::debug!("loaded font {}", path.display());
                Some(Arc::new(font))
            }
            Err(err) => {
                tracing::warn!("cannot load font {}: {}", path.display(), err);
                None
            }
        };
        fonts.insert(name.to_string(), font.clone());
        font.ok_or_else(|| AssetError::Font(name.to_string()))
    }
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache").field("dir", &self.dir).finish_non_exhaustive()
    }
}

/// Rasterizes `layer` onto a transparent key-sized image.
#[must_use]
pub fn render_text(layer: &TextLayer, font: &Font, key: KeySize) -> RgbaImage {
    let mut canvas = RgbaImage::new(key.width, key.height);

    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings::default());
    layout.append(&[font], &TextStyle::new(&layer.text, layer.size as f32, 0));

    let glyphs = layout.glyphs();
    let Some(lines) = layout.lines() else {
        return canvas;
    };

    let block_height = layout.height();
    let top = match layer.align {
        VerticalAlign::Top => 0.0,
        VerticalAlign::Center => (key.height as f32 - block_height) / 2.0,
        VerticalAlign::Bottom => key.height as f32 - block_height,
    } + layer.offset.y as f32;

    let color = layer.color;
    for line in lines {
        let line_glyphs = glyphs
            .get(line.glyph_start..=line.glyph_end)
            .unwrap_or_default();
        let left = line_glyphs.iter().map(|g| g.x).fold(f32::INFINITY, f32::min);
        let right = line_glyphs
            .iter()
            .map(|g| g.x + g.width as f32)
            .fold(f32::NEG_INFINITY, f32::max);
        if !left.is_finite() || !right.is_finite() {
            continue;
        }
        let dx = (key.width as f32 - (right - left)) / 2.0 - left + layer.offset.x as f32;

        for glyph in line_glyphs {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = font.rasterize_config(glyph.key);
            let gx = (glyph.x + dx).round() as i64;
            let gy = (glyph.y + top).round() as i64;

            for (i, coverage) in bitmap.iter().enumerate() {
                if *coverage == 0 {
                    continue;
                }
                let px = gx + (i % metrics.width) as i64;
                let py = gy + (i / metrics.width) as i64;
                if px < 0 || py < 0 || px >= i64::from(key.width) || py >= i64::from(key.height) {
                    continue;
                }
                canvas
                    .get_pixel_mut(px as u32, py as u32)
                    .blend(&color.to_rgba(*coverage));
            }
        }
    }
    canvas
}
