//! Painting a button onto one key image.
//!
//! Layers are painted in ascending `z_index` onto a transparent canvas the
//! size of the key. A layer whose asset cannot be used still paints its
//! background and border; the problem is reported as a [`FieldIssue`].

use super::assets::AssetStore;
use super::decode::{decode_raster, rasterize_svg};
use super::editor;
use super::source::{FetchRequest, IconSource};
use super::text::render_text;
use crate::error::{AssetError, FieldIssue};
use crate::models::{Button, IconLayer, KeySize, LayerContent, TextLayer};
use crate::services::pipeline::Slot;
use image::imageops;
use image::RgbaImage;
use std::sync::Arc;

/// A painted key.
#[derive(Debug, Clone)]
pub struct RenderedKey {
    /// Key-sized image
    pub image: RgbaImage,
    /// Asset problems met while painting
    pub issues: Vec<FieldIssue>,
    /// Remote icons that were missing from the cache
    pub fetches: Vec<FetchRequest>,
}

impl RenderedKey {
    fn blank(key: KeySize) -> Self {
        Self {
            image: RgbaImage::new(key.width, key.height),
            issues: Vec::new(),
            fetches: Vec::new(),
        }
    }
}

/// Field that failed, the error, and what to paint instead (if anything).
type LayerFailure = (&'static str, AssetError, Option<RgbaImage>);

/// Paints buttons for one key size.
#[derive(Debug, Clone)]
pub struct Compositor {
    assets: Arc<AssetStore>,
    key: KeySize,
}

impl Compositor {
    /// Creates a compositor.
    #[must_use]
    pub const fn new(assets: Arc<AssetStore>, key: KeySize) -> Self {
        Self { assets, key }
    }

    /// Key size painted.
    #[must_use]
    pub const fn key_size(&self) -> KeySize {
        self.key
    }

    /// Paints one slot. Empty and hidden slots are transparent.
    #[must_use]
    pub fn render_slot(&self, slot: &Slot) -> RenderedKey {
        match slot.button() {
            Some(resolved) => self.render(&resolved.button),
            None => RenderedKey::blank(self.key),
        }
    }

    /// Paints `button`.
    #[must_use]
    pub fn render(&self, button: &Button) -> RenderedKey {
        let mut rendered = RenderedKey::blank(self.key);

        for layer in button.paint_order() {
            let painted = match &layer.content {
                LayerContent::Icon(icon) => self.paint_icon(icon, &mut rendered.fetches),
                LayerContent::Text(text) => self.paint_text(text),
            };
            let image = match painted {
                Ok(image) => image,
                Err((field, err, fallback)) => {
                    rendered
                        .issues
                        .push(FieldIssue::new(format!("{}{field}", layer.label), err));
                    match fallback {
                        Some(image) => image,
                        None => continue,
                    }
                }
            };
            imageops::overlay(&mut rendered.image, &image, 0, 0);
        }
        rendered
    }

    /// Paints an icon layer onto a key-sized image. On failure the
    /// fallback is the same layer with a blank icon.
    fn paint_icon(
        &self,
        icon: &IconLayer,
        fetches: &mut Vec<FetchRequest>,
    ) -> Result<RgbaImage, LayerFailure> {
        match self.icon_image(icon, fetches) {
            Ok(image) => Ok(self.finish_icon(image, icon)),
            Err(err) => {
                let (w, h) = editor::target_size(
                    icon.size,
                    (self.key.width, self.key.height),
                    self.key,
                );
                let fallback = self.finish_icon(RgbaImage::new(w, h), icon);
                Err(("icon", err, Some(fallback)))
            }
        }
    }

    /// Loads and sizes the icon itself.
    fn icon_image(
        &self,
        icon: &IconLayer,
        fetches: &mut Vec<FetchRequest>,
    ) -> Result<RgbaImage, AssetError> {
        let source = IconSource::parse(&icon.source, &icon.variant)?;
        let bytes = match self.assets.icon_bytes(&source) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                let (w, h) = editor::target_size(
                    icon.size,
                    (self.key.width, self.key.height),
                    self.key,
                );
                return Ok(RgbaImage::new(w, h));
            }
            Err(AssetError::Pending(url)) => {
                fetches.extend(source.fetch_request(self.assets.paths()));
                return Err(AssetError::Pending(url));
            }
            Err(err) => return Err(err),
        };

        let decode_error = |message: String| AssetError::Decode {
            source_name: icon.source.clone(),
            message,
        };
        if bytes.vector {
            let mut image = rasterize_svg(&bytes.data, icon.size, self.key).map_err(decode_error)?;
            if let Some(color) = icon.color {
                editor::tint(&mut image, color);
            }
            Ok(image)
        } else {
            let image = decode_raster(&bytes.data).map_err(decode_error)?;
            let (w, h) = editor::target_size(icon.size, image.dimensions(), self.key);
            Ok(editor::fit(&image, icon.size_mode, w, h))
        }
    }

    fn finish_icon(&self, image: RgbaImage, icon: &IconLayer) -> RgbaImage {
        let image = editor::pad(image, icon.padding);
        let image = editor::fill_background(image, icon.background);
        let image = editor::apply_border(
            image,
            icon.border_width,
            icon.border_radius,
            icon.border_color,
        );
        let mut image = editor::shift(image, icon.offset);
        editor::adjust_brightness(&mut image, icon.brightness);
        editor::center_on(&image, self.key)
    }

    fn paint_text(
        &self,
        text: &TextLayer,
    ) -> Result<RgbaImage, LayerFailure> {
        let font = self
            .assets
            .font(&text.font)
            .map_err(|err| ("text_font", err, None))?;
        Ok(render_text(text, &font, self.key))
    }
}
