//! Style records: the plain, partial field bags that presets, buttons,
//! state overrides and additional icon layers are written as.
//!
//! Every field is optional. Resolution is an ordered merge of records
//! (`StyleRecord::merged_with`), never type inheritance: the later record
//! wins field by field and nothing is merged deeper than one field.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a raster icon is fitted into its declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Scale to fill the box, cropping the overflow
    #[default]
    Cover,
    /// Scale to fit inside the box, letterboxing the rest
    Contain,
    /// Scale both axes independently to the box
    Stretch,
}

/// Vertical placement of a text layer on the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    /// Flush with the top edge
    Top,
    /// Centred vertically
    #[default]
    Center,
    /// Flush with the bottom edge
    Bottom,
}

/// A pair of integers written as `"W H"`, `[W, H]` or a single number.
///
/// Used for `icon_size`, `icon_offset` and `text_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub struct Pair {
    /// First component (width or x offset)
    pub x: i32,
    /// Second component (height or y offset)
    pub y: i32,
}

impl Pair {
    /// Creates a new pair.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Parses the `"W H"` string form (comma or whitespace separated).
    pub fn parse(text: &str) -> Option<Self> {
        let parts: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .collect();
        match parts.as_slice() {
            [single] => {
                let v = single.parse().ok()?;
                Some(Self::new(v, v))
            }
            [x, y] => Some(Self::new(x.parse().ok()?, y.parse().ok()?)),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Pair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i32),
            List(Vec<i32>),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Self::new(v, v)),
            Raw::List(items) => match items.as_slice() {
                [v] => Ok(Self::new(*v, *v)),
                [x, y] => Ok(Self::new(*x, *y)),
                _ => Err(de::Error::custom("expected one or two numbers")),
            },
            Raw::Text(text) => Self::parse(&text)
                .ok_or_else(|| de::Error::custom(format!("invalid size/offset '{text}'"))),
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// `presets` accepts a single name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetList {
    /// `presets: dimmable`
    One(String),
    /// `presets: [dimmable, warm]`
    Many(Vec<String>),
}

impl PresetList {
    /// Preset names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

/// A tap or hold action as written in the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    /// `$page.*`, `$system.exec`, or a hub service such as `light.toggle`
    pub action: String,
    /// Opaque payload forwarded with the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionSpec {
    /// Creates an action without data.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            data: None,
        }
    }

    /// Sets the action payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Partial style of a button, preset, state override or layer.
///
/// Unknown keys are rejected when deserializing, so typos in the config
/// file fail at load time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleRecord {
    /// Bound hub entity, e.g. `light.kitchen`
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Title shown under the key
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Entity domain used to pick implicit presets
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// `visible`, `hidden` or `gone` (booleans and null accepted)
    #[serde(deserialize_with = "visibility_string", skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    /// Presets applied before the explicit fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presets: Option<PresetList>,
    /// Action on a short press
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tap_action: Option<ActionSpec>,
    /// Action on a long press
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_action: Option<ActionSpec>,
    /// Per-entity-state overrides
    #[serde(deserialize_with = "state_table", skip_serializing_if = "Option::is_none")]
    pub states: Option<BTreeMap<String, StyleRecord>>,

    /// Icon source URI (`none`, `local:`, `url:`, `mdi:`, `pi:`)
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Phosphor icon weight (`regular`, `bold`, `fill`, ...)
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub icon_variant: Option<String>,
    /// Icon box size; a zero side follows the source aspect ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<Pair>,
    /// Fitting mode for raster icons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size_mode: Option<SizeMode>,
    /// Transparent padding around the icon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_padding: Option<u32>,
    /// Tint for SVG icons
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    /// Fill behind the icon
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub icon_background_color: Option<String>,
    /// Shift of the icon from the key centre
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_offset: Option<Pair>,
    /// Corner radius of the icon box
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_border_radius: Option<u32>,
    /// Border stroke width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_border_width: Option<u32>,
    /// Border stroke color
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub icon_border_color: Option<String>,
    /// Brightness of the icon layer in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_brightness: Option<u8>,

    /// Text drawn on the key
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Text color
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Vertical text placement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<VerticalAlign>,
    /// Font base filename or bundled font id
    #[serde(deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub text_font: Option<String>,
    /// Font size in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_size: Option<u32>,
    /// Shift of the text from its aligned position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_offset: Option<Pair>,

    /// Paint order; higher values end up on top
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    /// Extra layers painted with the primary icon and text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_icons: Option<Vec<StyleRecord>>,
}

/// Generates the field-by-field merge so adding a field cannot forget it.
macro_rules! merge_fields {
    ($base:expr, $over:expr; $($field:ident),+ $(,)?) => {
        StyleRecord {
            $($field: $over.$field.clone().or_else(|| $base.$field.clone()),)+
        }
    };
}

impl StyleRecord {
    /// Names of the fields evaluated by the template engine.
    pub const TEMPLATE_FIELDS: [&'static str; 9] = [
        "name",
        "visibility",
        "icon",
        "icon_color",
        "icon_background_color",
        "icon_border_color",
        "text",
        "text_color",
        "text_font",
    ];

    /// Fields that only make sense on a whole button, not on an extra layer.
    pub const BUTTON_ONLY_FIELDS: [&'static str; 8] = [
        "entity_id",
        "name",
        "domain",
        "visibility",
        "presets",
        "tap_action",
        "hold_action",
        "states",
    ];

    /// Returns a new record where every field set on `over` replaces the
    /// field on `self`. Neither input is modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use homedeck::models::StyleRecord;
    ///
    /// let base = StyleRecord { icon: Some("mdi:lamp".into()), text: Some("A".into()), ..Default::default() };
    /// let over = StyleRecord { text: Some("B".into()), ..Default::default() };
    /// let merged = base.merged_with(&over);
    /// assert_eq!(merged.icon.as_deref(), Some("mdi:lamp"));
    /// assert_eq!(merged.text.as_deref(), Some("B"));
    /// ```
    #[must_use]
    pub fn merged_with(&self, over: &StyleRecord) -> StyleRecord {
        merge_fields!(self, over;
            entity_id, name, domain, visibility, presets, tap_action, hold_action, states,
            icon, icon_variant, icon_size, icon_size_mode, icon_padding, icon_color,
            icon_background_color, icon_offset, icon_border_radius, icon_border_width,
            icon_border_color, icon_brightness,
            text, text_color, text_align, text_font, text_size, text_offset,
            z_index, additional_icons,
        )
    }

    /// Names of the button-only fields that are set on this record.
    #[must_use]
    pub fn button_only_fields_set(&self) -> Vec<&'static str> {
        let set = [
            self.entity_id.is_some(),
            self.name.is_some(),
            self.domain.is_some(),
            self.visibility.is_some(),
            self.presets.is_some(),
            self.tap_action.is_some(),
            self.hold_action.is_some(),
            self.states.is_some(),
        ];
        Self::BUTTON_ONLY_FIELDS
            .iter()
            .zip(set)
            .filter_map(|(name, is_set)| is_set.then_some(*name))
            .collect()
    }

    /// Mutable access to the templated string fields, paired with their names.
    pub fn template_fields_mut(&mut self) -> [(&'static str, &mut Option<String>); 9] {
        [
            ("name", &mut self.name),
            ("visibility", &mut self.visibility),
            ("icon", &mut self.icon),
            ("icon_color", &mut self.icon_color),
            ("icon_background_color", &mut self.icon_background_color),
            ("icon_border_color", &mut self.icon_border_color),
            ("text", &mut self.text),
            ("text_color", &mut self.text_color),
            ("text_font", &mut self.text_font),
        ]
    }

    /// Read access to a templated field by name.
    #[must_use]
    pub fn template_field(&self, field: &str) -> Option<&String> {
        match field {
            "name" => self.name.as_ref(),
            "visibility" => self.visibility.as_ref(),
            "icon" => self.icon.as_ref(),
            "icon_color" => self.icon_color.as_ref(),
            "icon_background_color" => self.icon_background_color.as_ref(),
            "icon_border_color" => self.icon_border_color.as_ref(),
            "text" => self.text.as_ref(),
            "text_color" => self.text_color.as_ref(),
            "text_font" => self.text_font.as_ref(),
            _ => None,
        }
    }

    /// Whether any string field (including layers) contains a template marker.
    #[must_use]
    pub fn has_templates(&self) -> bool {
        let own = Self::TEMPLATE_FIELDS.iter().any(|field| {
            self.template_field(field)
                .is_some_and(|value| crate::template::is_template(value))
        });
        own || self
            .additional_icons
            .iter()
            .flatten()
            .any(StyleRecord::has_templates)
    }
}

/// Reads a YAML scalar (string, number or boolean) as a string.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Int(v) => v.to_string(),
        Scalar::Float(v) => v.to_string(),
        Scalar::Bool(true) => "True".to_string(),
        Scalar::Bool(false) => "False".to_string(),
    }))
}

/// Like `scalar_string` for fields that must hold a value.
pub(crate) fn required_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    scalar_string(deserializer)?.ok_or_else(|| de::Error::custom("expected a string or number"))
}

/// Reads `visibility`: `true` → visible, `false` → hidden, `null` → gone.
///
/// Only called when the key is present, so an explicit `null` becomes
/// `Some("gone")` rather than "unset".
fn visibility_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
    }

    Ok(Some(match Option::<Raw>::deserialize(deserializer)? {
        None => "gone".to_string(),
        Some(Raw::Flag(true)) => "visible".to_string(),
        Some(Raw::Flag(false)) => "hidden".to_string(),
        Some(Raw::Text(text)) => text,
    }))
}

/// Reads the `states` table; keys may be written as YAML booleans or numbers.
fn state_table<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, StyleRecord>>, D::Error> {
    let raw: Option<BTreeMap<StateKey, StyleRecord>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|table| table.into_iter().map(|(k, v)| (k.0, v)).collect()))
}

/// A `states` key normalised to the string the hub reports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct StateKey(String);

impl<'de> Deserialize<'de> for StateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
            Bool(bool),
        }

        Ok(Self(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Int(v) => v.to_string(),
            Raw::Float(v) => v.to_string(),
            // YAML 1.1 readers turn `on`/`off` keys into booleans
            Raw::Bool(true) => "on".to_string(),
            Raw::Bool(false) => "off".to_string(),
        }))
    }
}
