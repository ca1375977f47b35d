//! Panel configuration loading and validation.
//!
//! The user's `configuration.yml` is deep-merged over a built-in base file
//! (default system buttons and presets), deserialized into [`DeckConfig`] and
//! validated. Anything wrong in the file stops the load with a
//! [`ConfigError`] inside the returned `anyhow` chain.

use crate::constants::{
    font_name, APP_BINARY_NAME, DEFAULT_BRIGHTNESS, MAX_ICON_DIMENSION, ROOT_PAGE,
};
use crate::error::ConfigError;
use crate::models::style::required_scalar;
use crate::models::{ActionSpec, RgbColor, StyleRecord, VerticalAlign, Visibility};
use crate::template::is_template;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in configuration the user file is merged over.
pub const BASE_CONFIG: &str = include_str!("data/configuration.base.yml");

/// Inactivity dimming and sleeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SleepConfig {
    /// Brightness while dimmed; never above the active brightness
    pub dim_brightness: u8,
    /// Idle seconds before dimming (0 disables)
    pub dim_timeout: u64,
    /// Further idle seconds before sleeping (0 disables)
    pub sleep_timeout: u64,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            dim_brightness: 1,
            dim_timeout: 0,
            sleep_timeout: 0,
        }
    }
}

/// Style of the primary text and of the key titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelStyle {
    /// Vertical placement of the primary text
    pub align: VerticalAlign,
    /// Text color
    #[serde(deserialize_with = "required_scalar")]
    pub color: String,
    /// Bundled font id
    pub font: u8,
    /// Whether button names are sent to the device as titles
    pub show_title: bool,
    /// Text size in pixels
    pub size: u32,
    /// Font weight; accepted for compatibility, not used when rendering
    pub weight: u32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            align: VerticalAlign::Bottom,
            color: RgbColor::WHITE.to_hex(),
            font: 1,
            show_title: true,
            size: 11,
            weight: 80,
        }
    }
}

impl LabelStyle {
    /// Base filename of the configured font.
    #[must_use]
    pub fn font_name(&self) -> &'static str {
        font_name(self.font)
    }

    /// The label style as a style record, used as the layer under presets.
    #[must_use]
    pub fn as_style(&self) -> StyleRecord {
        StyleRecord {
            text_align: Some(self.align),
            text_color: Some(self.color.clone()),
            text_size: Some(self.size),
            text_font: Some(self.font_name().to_string()),
            ..Default::default()
        }
    }
}

/// The navigation buttons the panel injects while paginating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SystemAction {
    /// Return to the previous page
    #[serde(rename = "$page.back")]
    Back,
    /// Previous sub-page of the current page
    #[serde(rename = "$page.previous")]
    Previous,
    /// Next sub-page of the current page
    #[serde(rename = "$page.next")]
    Next,
}

impl SystemAction {
    /// The action name as written in configs.
    #[must_use]
    pub const fn action_name(self) -> &'static str {
        match self {
            Self::Back => "$page.back",
            Self::Previous => "$page.previous",
            Self::Next => "$page.next",
        }
    }
}

impl fmt::Display for SystemAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

/// Placement and style of one system button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SystemButtonConfig {
    /// 1-based slot on each sub-page; 0 disables the button
    pub position: u32,
    /// Button style; the tap action is always synthesized
    pub button: StyleRecord,
}

/// One page of buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Declared slots in order; `null` is an empty slot
    pub buttons: Vec<Option<StyleRecord>>,
}

/// The whole panel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckConfig {
    /// Active brightness in percent (1-100)
    pub brightness: u8,
    /// Dim and sleep timers
    pub sleep: SleepConfig,
    /// Primary text style
    pub label_style: LabelStyle,
    /// Injected navigation buttons
    pub system_buttons: BTreeMap<SystemAction, SystemButtonConfig>,
    /// Named partial styles
    pub presets: BTreeMap<String, StyleRecord>,
    /// Pages by name; `$root` is the start page
    pub pages: BTreeMap<String, PageConfig>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            sleep: SleepConfig::default(),
            label_style: LabelStyle::default(),
            system_buttons: BTreeMap::new(),
            presets: BTreeMap::new(),
            pages: BTreeMap::from([(ROOT_PAGE.to_string(), PageConfig::default())]),
        }
    }
}

impl DeckConfig {
    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/homedeck/`
    /// - macOS: `~/Library/Application Support/homedeck/`
    /// - Windows: `%APPDATA%\homedeck\`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_BINARY_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the default configuration file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("configuration.yml"))
    }

    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .context(format!("Failed to load config file: {}", path.display()))
    }

    /// Parses, merges over the base configuration and validates.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut merged: Value =
            serde_yml::from_str(BASE_CONFIG).context("Failed to parse built-in base configuration")?;
        let user: Value = serde_yml::from_str(content).context("Failed to parse YAML")?;
        deep_merge(&mut merged, user);

        let mut config: Self = serde_yml::from_value(merged).context("Invalid configuration")?;
        config.validate()?;

        // Dimming never brightens the panel
        config.sleep.dim_brightness = config.sleep.dim_brightness.min(config.brightness);

        Ok(config)
    }

    /// Checks value ranges and every cross-reference.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in a stable order: global values,
    /// presets, system buttons, then pages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.brightness) {
            return Err(invalid("brightness", format!("{} is not within 1-100", self.brightness)));
        }
        if self.sleep.dim_brightness > 100 {
            return Err(invalid(
                "sleep.dim_brightness",
                format!("{} is not within 0-100", self.sleep.dim_brightness),
            ));
        }
        check_color("label_style.color", Some(&self.label_style.color))?;

        if !self.pages.contains_key(ROOT_PAGE) {
            return Err(invalid("pages", format!("the '{ROOT_PAGE}' page is missing")));
        }

        for (name, preset) in &self.presets {
            let owner = format!("presets.{name}");
            if preset.presets.is_some() {
                return Err(ConfigError::InvalidPreset {
                    preset: name.clone(),
                    field: "presets".to_string(),
                });
            }
            self.check_button(&owner, preset)?;
        }

        for (action, system) in &self.system_buttons {
            let owner = format!("system_buttons.{action}.button");
            self.check_button(&owner, &system.button)?;
        }

        for (page, config) in &self.pages {
            for (index, button) in config.buttons.iter().enumerate() {
                if let Some(button) = button {
                    let owner = format!("pages.{page}.buttons[{index}]");
                    self.check_button(&owner, button)?;
                }
            }
        }

        Ok(())
    }

    fn check_button(&self, owner: &str, button: &StyleRecord) -> Result<(), ConfigError> {
        self.check_record(owner, button)?;

        for (state, over) in button.states.iter().flatten() {
            if over.states.is_some() {
                return Err(ConfigError::NestedStates {
                    owner: owner.to_string(),
                    state: state.clone(),
                });
            }
            self.check_record(&format!("{owner}.states.{state}"), over)?;
        }

        Ok(())
    }

    fn check_record(&self, owner: &str, record: &StyleRecord) -> Result<(), ConfigError> {
        for preset in record.presets.iter().flat_map(|p| p.names()) {
            if !self.presets.contains_key(&preset) {
                return Err(ConfigError::UnknownPreset {
                    owner: owner.to_string(),
                    preset,
                });
            }
        }

        let actions = [
            ("tap_action", &record.tap_action),
            ("hold_action", &record.hold_action),
        ];
        for (field, action) in actions {
            if let Some(action) = action {
                self.check_action(&format!("{owner}.{field}"), action)?;
            }
        }

        if let Some(visibility) = record.visibility.as_deref() {
            if !is_template(visibility) && Visibility::parse(visibility).is_none() {
                return Err(invalid(
                    &format!("{owner}.visibility"),
                    format!("'{visibility}' is not one of visible, hidden, gone"),
                ));
            }
        }

        check_colors(owner, record)?;
        check_dimensions(owner, record)?;

        for (index, layer) in record.additional_icons.iter().flatten().enumerate() {
            let layer_owner = format!("{owner}.additional_icons[{index}]");
            if let Some(field) = layer.button_only_fields_set().first() {
                return Err(invalid(
                    &format!("{layer_owner}.{field}"),
                    "only allowed on buttons".to_string(),
                ));
            }
            if layer.additional_icons.is_some() {
                return Err(invalid(
                    &format!("{layer_owner}.additional_icons"),
                    "layers cannot nest".to_string(),
                ));
            }
            check_colors(&layer_owner, layer)?;
            check_dimensions(&layer_owner, layer)?;
        }

        Ok(())
    }

    fn check_action(&self, owner: &str, action: &ActionSpec) -> Result<(), ConfigError> {
        if action.action != "$page.go_to" {
            return Ok(());
        }
        match action.data.as_ref().and_then(serde_json::Value::as_str) {
            Some(target) if self.has_page(target) => Ok(()),
            Some(target) => Err(ConfigError::UnknownPage {
                owner: owner.to_string(),
                target: target.to_string(),
            }),
            None => Err(invalid(
                &format!("{owner}.data"),
                "$page.go_to needs a page name".to_string(),
            )),
        }
    }

    /// Whether a page is declared.
    #[must_use]
    pub fn has_page(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    /// Looks up a page.
    #[must_use]
    pub fn page(&self, name: &str) -> Option<&PageConfig> {
        self.pages.get(name)
    }

    /// Looks up a system button; `None` when absent or disabled.
    #[must_use]
    pub fn system_button(&self, action: SystemAction) -> Option<&SystemButtonConfig> {
        self.system_buttons
            .get(&action)
            .filter(|system| system.position > 0)
    }
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

fn check_color(field: &str, value: Option<&String>) -> Result<(), ConfigError> {
    match value {
        Some(value) if !is_template(value) && !value.eq_ignore_ascii_case("none") => {
            RgbColor::from_hex(value)
                .map(|_| ())
                .map_err(|err| invalid(field, err.to_string()))
        }
        _ => Ok(()),
    }
}

fn check_dimensions(owner: &str, record: &StyleRecord) -> Result<(), ConfigError> {
    let too_large = |field: &str, value: String| {
        invalid(
            &format!("{owner}.{field}"),
            format!("{value} exceeds {MAX_ICON_DIMENSION} pixels"),
        )
    };

    for (field, pair) in [("icon_size", record.icon_size), ("icon_offset", record.icon_offset)] {
        let Some(pair) = pair else {
            continue;
        };
        if pair.x.unsigned_abs().max(pair.y.unsigned_abs()) > MAX_ICON_DIMENSION {
            return Err(too_large(field, pair.to_string()));
        }
    }
    for (field, length) in [
        ("icon_padding", record.icon_padding),
        ("icon_border_width", record.icon_border_width),
    ] {
        if let Some(length) = length.filter(|length| *length > MAX_ICON_DIMENSION) {
            return Err(too_large(field, length.to_string()));
        }
    }
    Ok(())
}

fn check_colors(owner: &str, record: &StyleRecord) -> Result<(), ConfigError> {
    for (name, value) in [
        ("icon_color", &record.icon_color),
        ("icon_background_color", &record.icon_background_color),
        ("icon_border_color", &record.icon_border_color),
        ("text_color", &record.text_color),
    ] {
        check_color(&format!("{owner}.{name}"), value.as_ref())?;
    }
    Ok(())
}

/// Merges `over` into `base`: mappings key by key, anything else replaced.
/// A `null` never wipes out a whole mapping.
fn deep_merge(base: &mut Value, over: Value) {
    match (base, over) {
        (Value::Mapping(base_map), Value::Mapping(over_map)) => {
            for (key, value) in over_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Mapping(_), Value::Null) => {}
        (base, over) => *base = over,
    }
}

/// Where icons, fonts and downloaded files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    /// Root for `local:` icons and bundled `icons/<set>/` files
    pub assets: PathBuf,
    /// Font directory (`<name>.ttf`)
    pub fonts: PathBuf,
    /// Download cache root
    pub cache: PathBuf,
}

impl AssetPaths {
    /// Uses `<assets>/fonts` for fonts.
    pub fn new(assets: impl Into<PathBuf>, cache: impl Into<PathBuf>) -> Self {
        let assets = assets.into();
        Self {
            fonts: assets.join("fonts"),
            assets,
            cache: cache.into(),
        }
    }

    /// Platform defaults: assets next to the config file, cache in the
    /// user cache directory.
    pub fn default_dirs() -> Result<Self> {
        let cache = dirs::cache_dir()
            .context("Failed to determine cache directory")?
            .join(APP_BINARY_NAME);
        Ok(Self::new(DeckConfig::config_dir()?.join("assets"), cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn load(yaml: &str) -> Result<DeckConfig> {
        DeckConfig::from_yaml_str(yaml)
    }

    fn config_error(yaml: &str) -> ConfigError {
        load(yaml)
            .unwrap_err()
            .downcast::<ConfigError>()
            .expect("expected a ConfigError")
    }

    #[test]
    fn test_base_config_alone() {
        let config = load("").unwrap();
        assert_eq!(config.brightness, 100);
        assert_eq!(config.sleep, SleepConfig::default());
        assert_eq!(config.label_style, LabelStyle::default());
        assert!(config.has_page(ROOT_PAGE));
        assert!(config.presets.contains_key("$default"));
        assert_eq!(config.system_button(SystemAction::Back).unwrap().position, 1);
        assert_eq!(config.system_button(SystemAction::Next).unwrap().position, 15);
    }

    #[test]
    fn test_user_file_merges_over_base() {
        let config = load(
            "brightness: 60\nlabel_style:\n  color: /00FF00\nsystem_buttons:\n  $page.next:\n    position: 6\npages:\n  $root:\n    buttons:\n      - text: A\n      - null\n",
        )
        .unwrap();
        assert_eq!(config.brightness, 60);
        assert_eq!(config.label_style.color, "/00FF00");
        assert_eq!(config.label_style.size, 11);
        let next = config.system_button(SystemAction::Next).unwrap();
        assert_eq!(next.position, 6);
        assert_eq!(next.button.icon.as_deref(), Some("mdi:chevron-right"));
        assert_eq!(config.page(ROOT_PAGE).unwrap().buttons.len(), 2);
        assert!(config.page(ROOT_PAGE).unwrap().buttons[1].is_none());
    }

    #[test]
    fn test_position_zero_disables() {
        let config = load("system_buttons:\n  $page.back:\n    position: 0\n").unwrap();
        assert!(config.system_button(SystemAction::Back).is_none());
    }

    #[test]
    fn test_dim_brightness_clamped() {
        let config = load("brightness: 40\nsleep:\n  dim_brightness: 80\n  dim_timeout: 30\n").unwrap();
        assert_eq!(config.sleep.dim_brightness, 40);
        assert_eq!(config.sleep.dim_timeout, 30);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(load("brightnes: 50").is_err());
        assert!(load("pages:\n  $root:\n    buttons:\n      - icon_colour: FF0000\n").is_err());
    }

    #[test]
    fn test_brightness_range() {
        assert!(matches!(
            config_error("brightness: 0"),
            ConfigError::InvalidValue { field, .. } if field == "brightness"
        ));
    }

    #[test]
    fn test_unknown_preset() {
        let err = config_error("pages:\n  $root:\n    buttons:\n      - presets: [nope]\n");
        assert_eq!(
            err,
            ConfigError::UnknownPreset {
                owner: "pages.$root.buttons[0]".into(),
                preset: "nope".into()
            }
        );
    }

    #[test]
    fn test_unknown_go_to_target() {
        let err = config_error(
            "pages:\n  $root:\n    buttons:\n      - tap_action:\n          action: $page.go_to\n          data: living-room\n",
        );
        assert_eq!(
            err,
            ConfigError::UnknownPage {
                owner: "pages.$root.buttons[0].tap_action".into(),
                target: "living-room".into()
            }
        );

        let ok = load(
            "pages:\n  living-room:\n    buttons: []\n  $root:\n    buttons:\n      - tap_action:\n          action: $page.go_to\n          data: living-room\n",
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_go_to_errors_name_the_action_field() {
        let err = config_error(
            "pages:\n  $root:\n    buttons:\n      - tap_action:\n          action: light.toggle\n        hold_action:\n          action: $page.go_to\n",
        );
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field, .. }
                if field == "pages.$root.buttons[0].hold_action.data"
        ));

        let err = config_error(
            "pages:\n  $root:\n    buttons:\n      - entity_id: light.x\n        states:\n          'on':\n            hold_action:\n              action: $page.go_to\n              data: attic\n",
        );
        assert_eq!(
            err,
            ConfigError::UnknownPage {
                owner: "pages.$root.buttons[0].states.on.hold_action".into(),
                target: "attic".into()
            }
        );
    }

    #[test]
    fn test_icon_dimensions_bounded() {
        assert!(load(
            "pages:\n  $root:\n    buttons:\n      - icon_size: 1024 0\n        icon_offset: -1024 8\n        icon_padding: 1024\n"
        )
        .is_ok());

        let cases = [
            ("icon_padding: 4294967295", "pages.$root.buttons[0].icon_padding"),
            ("icon_border_width: 2000", "pages.$root.buttons[0].icon_border_width"),
            ("icon_size: 96 5000", "pages.$root.buttons[0].icon_size"),
            ("icon_offset: -2147483648 0", "pages.$root.buttons[0].icon_offset"),
            (
                "additional_icons:\n          - icon_padding: 1025",
                "pages.$root.buttons[0].additional_icons[0].icon_padding",
            ),
        ];
        for (line, expected) in cases {
            let err = config_error(&format!("pages:\n  $root:\n    buttons:\n      - {line}\n"));
            assert!(
                matches!(&err, ConfigError::InvalidValue { field, .. } if field == expected),
                "{line}: {err:?}"
            );
        }
    }

    #[test]
    fn test_nested_states_rejected() {
        let err = config_error(
            "pages:\n  $root:\n    buttons:\n      - entity_id: light.x\n        states:\n          'on':\n            states:\n              'off': {}\n",
        );
        assert_eq!(
            err,
            ConfigError::NestedStates {
                owner: "pages.$root.buttons[0]".into(),
                state: "on".into()
            }
        );
    }

    #[test]
    fn test_preset_cannot_chain() {
        let err = config_error("presets:\n  a:\n    presets: $default\n");
        assert_eq!(
            err,
            ConfigError::InvalidPreset {
                preset: "a".into(),
                field: "presets".into()
            }
        );
    }

    #[test]
    fn test_layer_rejects_button_fields() {
        let err = config_error(
            "pages:\n  $root:\n    buttons:\n      - additional_icons:\n          - entity_id: light.x\n",
        );
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field, .. }
                if field == "pages.$root.buttons[0].additional_icons[0].entity_id"
        ));
    }

    #[test]
    fn test_colors_checked_unless_templated() {
        assert!(load("pages:\n  $root:\n    buttons:\n      - icon_color: /012ABC\n").is_ok());
        assert!(load("pages:\n  $root:\n    buttons:\n      - icon_color: 012ABC\n").is_ok());
        assert!(load(
            "pages:\n  $root:\n    buttons:\n      - icon_color: \"{{ 'FF' ~ '0000' }}\"\n"
        )
        .is_ok());
        assert!(matches!(
            config_error("pages:\n  $root:\n    buttons:\n      - text_color: FFF\n"),
            ConfigError::InvalidValue { field, .. } if field == "pages.$root.buttons[0].text_color"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("configuration.yml");
        fs::write(&path, "brightness: 70\n").unwrap();
        assert_eq!(DeckConfig::load(&path).unwrap().brightness, 70);

        let missing = temp_dir.path().join("missing.yml");
        let err = DeckConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_asset_paths() {
        let paths = AssetPaths::new("/srv/deck", "/tmp/deck-cache");
        assert_eq!(paths.fonts, PathBuf::from("/srv/deck/fonts"));
        assert_eq!(paths.cache, PathBuf::from("/tmp/deck-cache"));
    }
}
