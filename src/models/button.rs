//! Render-ready button description.
//!
//! A [`Button`] is what the compositor paints. It is built from a style
//! record that has already gone through preset resolution, state
//! overrides and template evaluation, so every value here is final.

use crate::constants::{resolve_font, DEFAULT_LAYER_TEXT_SIZE};
use crate::error::{AssetError, FieldIssue};
use crate::models::style::{ActionSpec, Pair, SizeMode, StyleRecord, VerticalAlign};
use crate::models::RgbColor;
use serde::Serialize;

/// Pixel size of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KeySize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl KeySize {
    /// Creates a key size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Whether and how a slot is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Visibility {
    /// Painted normally
    #[default]
    Visible,
    /// Slot kept, painted as an empty placeholder
    Hidden,
    /// Slot removed; later buttons move up
    Gone,
}

impl Visibility {
    /// Parses the config/template spelling. Unknown values are `None`.
    ///
    /// Templates render booleans as `True`/`False` and null as `None`, so
    /// those spellings are accepted too.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "visible" | "True" | "true" => Some(Self::Visible),
            "hidden" | "False" | "false" => Some(Self::Hidden),
            "gone" | "None" | "none" | "null" => Some(Self::Gone),
            _ => None,
        }
    }
}

/// An image layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconLayer {
    /// Icon source URI; `none` paints only background and border
    pub source: String,
    /// Phosphor weight
    pub variant: String,
    /// Requested box size; zero sides follow the source aspect ratio
    pub size: Pair,
    /// Fitting mode for raster sources
    pub size_mode: SizeMode,
    /// Transparent padding around the icon
    pub padding: u32,
    /// Tint for SVG sources
    pub color: Option<RgbColor>,
    /// Fill behind the icon
    pub background: Option<RgbColor>,
    /// Shift from the key centre
    pub offset: Pair,
    /// Corner radius
    pub border_radius: u32,
    /// Border stroke width
    pub border_width: u32,
    /// Border stroke color
    pub border_color: RgbColor,
    /// Brightness in percent
    pub brightness: Option<u8>,
}

/// A text layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayer {
    /// Text, possibly multi-line
    pub text: String,
    /// Fill color
    pub color: RgbColor,
    /// Vertical placement
    pub align: VerticalAlign,
    /// Font base filename
    pub font: String,
    /// Pixel size
    pub size: u32,
    /// Shift from the aligned position
    pub offset: Pair,
}

/// What a layer paints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LayerContent {
    /// An icon (or a blank box)
    Icon(IconLayer),
    /// A line or lines of text
    Text(TextLayer),
}

/// One paintable element of a button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    /// Paint order; higher is painted later
    pub z_index: i32,
    /// Field prefix used when reporting issues for this layer
    pub label: String,
    /// What to paint
    pub content: LayerContent,
}

/// A fully resolved, render-ready button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    /// Bound entity
    pub entity_id: Option<String>,
    /// Title passed to the device
    pub name: Option<String>,
    /// Visibility mode
    pub visibility: Visibility,
    /// Short press action
    pub tap_action: Option<ActionSpec>,
    /// Long press action
    pub hold_action: Option<ActionSpec>,
    /// Layers in declaration order: primary icon, primary text, additional icons
    pub layers: Vec<Layer>,
}

impl Button {
    /// Builds a button from a resolved style record.
    ///
    /// Malformed colors do not fail the button: the affected field uses its
    /// default and an issue is returned alongside.
    #[must_use]
    pub fn from_style(style: &StyleRecord, key: KeySize) -> (Self, Vec<FieldIssue>) {
        let mut issues = Vec::new();

        let visibility = match style.visibility.as_deref() {
            None => Visibility::Visible,
            Some(value) => Visibility::parse(value).unwrap_or_else(|| {
                tracing::debug!("unrecognised visibility '{}', showing button", value);
                Visibility::Visible
            }),
        };

        let z_index = style.z_index.unwrap_or(0);
        let mut layers = vec![Layer {
            z_index,
            label: String::new(),
            content: LayerContent::Icon(icon_layer(style, key, "", &mut issues)),
        }];

        if let Some(text) = text_layer(style, "", &mut issues) {
            layers.push(Layer {
                z_index,
                label: String::new(),
                content: LayerContent::Text(text),
            });
        }

        for (index, extra) in style.additional_icons.iter().flatten().enumerate() {
            let prefix = format!("additional_icons[{index}].");
            let content = if extra.icon.is_some() {
                LayerContent::Icon(icon_layer(extra, key, &prefix, &mut issues))
            } else if let Some(text) = text_layer(&layer_text_defaults(extra), &prefix, &mut issues)
            {
                LayerContent::Text(text)
            } else {
                LayerContent::Icon(icon_layer(extra, key, &prefix, &mut issues))
            };
            layers.push(Layer {
                z_index: extra.z_index.unwrap_or(0),
                label: prefix,
                content,
            });
        }

        let name = style
            .name
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let button = Self {
            entity_id: style.entity_id.clone(),
            name,
            visibility,
            tap_action: style.tap_action.clone(),
            hold_action: style.hold_action.clone(),
            layers,
        };
        (button, issues)
    }

    /// Layers in paint order: ascending `z_index`, ties kept in declaration
    /// order, so the highest `z_index` ends up on top.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Layer> {
        let mut ordered: Vec<&Layer> = self.layers.iter().collect();
        ordered.sort_by_key(|layer| layer.z_index);
        ordered
    }
}

/// Fills text defaults that apply to additional layers (the label style only
/// covers the primary text).
fn layer_text_defaults(layer: &StyleRecord) -> StyleRecord {
    let defaults = StyleRecord {
        text_align: Some(VerticalAlign::Center),
        text_size: Some(DEFAULT_LAYER_TEXT_SIZE),
        text_color: Some(RgbColor::WHITE.to_hex()),
        text_offset: Some(Pair::default()),
        ..Default::default()
    };
    defaults.merged_with(layer)
}

fn parse_color(
    value: Option<&String>,
    field: &str,
    prefix: &str,
    issues: &mut Vec<FieldIssue>,
) -> Option<RgbColor> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return None;
    }
    match RgbColor::from_hex(value) {
        Ok(color) => Some(color),
        Err(_) => {
            issues.push(FieldIssue::new(
                format!("{prefix}{field}"),
                AssetError::Color(value.to_string()),
            ));
            None
        }
    }
}

fn icon_layer(
    style: &StyleRecord,
    key: KeySize,
    prefix: &str,
    issues: &mut Vec<FieldIssue>,
) -> IconLayer {
    let color = parse_color(style.icon_color.as_ref(), "icon_color", prefix, issues);
    let background = parse_color(
        style.icon_background_color.as_ref(),
        "icon_background_color",
        prefix,
        issues,
    );
    let border_color = parse_color(
        style.icon_border_color.as_ref(),
        "icon_border_color",
        prefix,
        issues,
    )
    .or(color)
    .or(background)
    .unwrap_or(RgbColor::WHITE);

    let size = match style.icon_size {
        Some(pair) if pair.x > 0 || pair.y > 0 => Pair::new(pair.x.max(0), pair.y.max(0)),
        _ => Pair::new(key.width as i32, key.height as i32),
    };

    IconLayer {
        source: style
            .icon
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "none".to_string()),
        variant: style
            .icon_variant
            .clone()
            .unwrap_or_else(|| crate::constants::PHOSPHOR_DEFAULT_VARIANT.to_string()),
        size,
        size_mode: style.icon_size_mode.unwrap_or_default(),
        padding: style.icon_padding.unwrap_or(0),
        color: color.or(Some(RgbColor::WHITE)),
        background,
        offset: style.icon_offset.unwrap_or_default(),
        border_radius: style.icon_border_radius.unwrap_or(0),
        border_width: style.icon_border_width.unwrap_or(0),
        border_color,
        brightness: style.icon_brightness,
    }
}

fn text_layer(style: &StyleRecord, prefix: &str, issues: &mut Vec<FieldIssue>) -> Option<TextLayer> {
    let text = style.text.as_ref().filter(|t| !t.is_empty())?.clone();
    let color = parse_color(style.text_color.as_ref(), "text_color", prefix, issues)
        .unwrap_or(RgbColor::WHITE);
    let size = style.text_size.unwrap_or(DEFAULT_LAYER_TEXT_SIZE);
    if size == 0 {
        return None;
    }
    Some(TextLayer {
        text,
        color,
        align: style.text_align.unwrap_or_default(),
        font: resolve_font(style.text_font.as_deref().unwrap_or("")),
        size,
        offset: style.text_offset.unwrap_or_default(),
    })
}
