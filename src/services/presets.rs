//! Preset resolution: turns a declared button into a fully layered style.
//!
//! Layers, lowest first: hard defaults, the label style, each preset in list
//! order, then the button's own fields. Nothing is mutated; every step
//! produces a new record.

use crate::config::DeckConfig;
use crate::constants::{DEFAULT_PRESET, PHOSPHOR_DEFAULT_VARIANT};
use crate::models::{ActionSpec, EntitySnapshot, Pair, RgbColor, SizeMode, StyleRecord};

/// Domains whose implicit presets also key on `device_class`.
const DEVICE_CLASS_DOMAINS: [&str; 2] = ["sensor", "binary_sensor"];

/// Resolves buttons against the presets and label style of one config.
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver<'a> {
    config: &'a DeckConfig,
}

impl<'a> ConfigResolver<'a> {
    /// Creates a resolver for `config`.
    #[must_use]
    pub const fn new(config: &'a DeckConfig) -> Self {
        Self { config }
    }

    /// Hard defaults with the label style on top.
    ///
    /// This is also the record a failing template field falls back to.
    #[must_use]
    pub fn defaults(&self) -> StyleRecord {
        let hard = StyleRecord {
            visibility: Some("visible".to_string()),
            icon_variant: Some(PHOSPHOR_DEFAULT_VARIANT.to_string()),
            icon_size_mode: Some(SizeMode::Cover),
            icon_padding: Some(0),
            icon_color: Some(RgbColor::WHITE.to_hex()),
            icon_offset: Some(Pair::default()),
            icon_border_radius: Some(0),
            icon_border_width: Some(0),
            text_offset: Some(Pair::default()),
            z_index: Some(0),
            ..Default::default()
        };
        hard.merged_with(&self.config.label_style.as_style())
    }

    /// Preset names applied to a button that declares none.
    ///
    /// `$page.go_to` for navigation buttons, `$default` otherwise, then
    /// `$<domain>` and, for sensors, `$<domain>.<device_class>`. Names that
    /// are not declared are dropped.
    #[must_use]
    pub fn implicit_presets(&self, button: &StyleRecord, snapshot: &EntitySnapshot) -> Vec<String> {
        let navigates = button
            .tap_action
            .as_ref()
            .is_some_and(|action| action.action == "$page.go_to");
        let mut names = vec![if navigates {
            "$page.go_to".to_string()
        } else {
            DEFAULT_PRESET.to_string()
        }];

        if let Some(domain) = domain_of(button) {
            names.push(format!("${domain}"));
            let device_class = button
                .entity_id
                .as_deref()
                .filter(|_| DEVICE_CLASS_DOMAINS.contains(&domain.as_str()))
                .and_then(|id| snapshot.get(id))
                .and_then(|entity| entity.attribute_str("device_class"));
            if let Some(device_class) = device_class {
                names.push(format!("${domain}.{device_class}"));
            }
        }

        names.retain(|name| self.config.presets.contains_key(name));
        names
    }

    /// Merges the named presets in order onto `base`. Unknown names are
    /// skipped; config validation has already rejected explicit ones.
    #[must_use]
    pub fn apply_presets(&self, base: &StyleRecord, names: &[String]) -> StyleRecord {
        names
            .iter()
            .filter_map(|name| self.config.presets.get(name))
            .fold(base.clone(), |acc, preset| acc.merged_with(preset))
    }

    /// Resolves one declared button.
    #[must_use]
    pub fn resolve(&self, button: &StyleRecord, snapshot: &EntitySnapshot) -> StyleRecord {
        let names = match &button.presets {
            Some(presets) => presets.names(),
            None => self.implicit_presets(button, snapshot),
        };
        tracing::trace!("resolving {:?} with presets {:?}", button.entity_id, names);

        let mut resolved = self
            .apply_presets(&self.defaults(), &names)
            .merged_with(button);
        resolved.presets = None;
        if resolved.domain.is_none() {
            resolved.domain = domain_of(button);
        }

        if let Some(entity) = resolved.entity_id.as_deref().and_then(|id| snapshot.get(id)) {
            if resolved.icon.is_none() {
                resolved.icon = entity.attribute_str("icon").map(str::to_string);
            }
            if resolved.name.is_none() {
                resolved.name = entity.attribute_str("friendly_name").map(str::to_string);
            }
        }

        let entity_id = resolved.entity_id.clone();
        resolved.tap_action = resolved
            .tap_action
            .map(|action| bind_action(action, entity_id.as_deref()));
        resolved.hold_action = resolved
            .hold_action
            .map(|action| bind_action(action, entity_id.as_deref()));

        resolved
    }
}

/// Explicit `domain`, else the `entity_id` prefix.
fn domain_of(button: &StyleRecord) -> Option<String> {
    button.domain.clone().or_else(|| {
        button
            .entity_id
            .as_deref()
            .and_then(|id| id.split_once('.'))
            .map(|(domain, _)| domain.to_string())
    })
}

/// Inserts the button's `entity_id` into hub service data.
pub(crate) fn bind_action(mut action: ActionSpec, entity_id: Option<&str>) -> ActionSpec {
    let Some(entity_id) = entity_id else {
        return action;
    };
    if action.action.starts_with('$') {
        return action;
    }
    let data = action
        .data
        .get_or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    if let serde_json::Value::Object(map) = data {
        map.entry("entity_id")
            .or_insert_with(|| serde_json::Value::String(entity_id.to_string()));
    }
    action
}
