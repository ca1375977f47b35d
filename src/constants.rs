//! Application-wide constants.
//!
//! Names, bundled font table, icon download locations and the defaults
//! that every resolved button falls back to.

/// The display name of the application.
pub const APP_NAME: &str = "HomeDeck";

/// The binary name of the application (used in command examples).
pub const APP_BINARY_NAME: &str = "homedeck";

/// Name of the implicit start page.
pub const ROOT_PAGE: &str = "$root";

/// Preset applied to buttons that declare no presets.
pub const DEFAULT_PRESET: &str = "$default";

/// Bundled fonts by `label_style.font` id.
pub const FONTS: [(u8, &str); 8] = [
    (1, "Roboto-SemiBold"),
    (2, "FZShuSong-Z01"),
    (3, "DejaVu Sans"),
    (4, "Bareona"),
    (5, "Crimson Text"),
    (6, "Magiera"),
    (7, "Syke"),
    (8, "Roboto"),
];

/// Font used when an id is unknown.
pub const DEFAULT_FONT: &str = "Roboto-SemiBold";

/// Maps a font id to its bundled base filename, falling back to font 1.
#[must_use]
pub fn font_name(id: u8) -> &'static str {
    FONTS
        .iter()
        .find(|(font_id, _)| *font_id == id)
        .map_or(DEFAULT_FONT, |(_, name)| name)
}

/// Resolves a `text_font` value: bundled ids (`"3"`) map to their name,
/// anything else is taken as a font base filename.
#[must_use]
pub fn resolve_font(value: &str) -> String {
    match value.trim().parse::<u8>() {
        Ok(id) => font_name(id).to_string(),
        Err(_) if value.trim().is_empty() => DEFAULT_FONT.to_string(),
        Err(_) => value.trim().to_string(),
    }
}

/// Material Design Icons raw SVG location (`{name}` is substituted).
pub const MDI_URL: &str =
    "https://raw.githubusercontent.com/Templarian/MaterialDesign/refs/heads/master/svg/{name}.svg";

/// Phosphor raw SVG location (`{variant}` and `{name}` are substituted).
pub const PHOSPHOR_URL: &str =
    "https://raw.githubusercontent.com/phosphor-icons/core/refs/heads/main/raw/{variant}/{name}.svg";

/// Phosphor's default weight; other weights are suffixed to the file name.
pub const PHOSPHOR_DEFAULT_VARIANT: &str = "regular";

/// Timeout for one remote icon download.
pub const ICON_FETCH_TIMEOUT_SECS: u64 = 5;

/// Delay before a failed icon download is attempted again.
pub const ICON_RETRY_SECS: u64 = 60;

/// Default panel brightness (percent).
pub const DEFAULT_BRIGHTNESS: u8 = 100;

/// Default font size of additional text layers.
pub const DEFAULT_LAYER_TEXT_SIZE: u32 = 20;

/// Largest icon size, padding, offset or border width, in pixels.
pub const MAX_ICON_DIMENSION: u32 = 1_024;

/// Template evaluation step budget per field.
pub const TEMPLATE_STEP_BUDGET: u32 = 10_000;

/// Template evaluation wall-clock budget per field, in milliseconds.
pub const TEMPLATE_TIME_BUDGET_MS: u64 = 5;

/// Deepest nesting of parentheses, calls and operators in one expression.
pub const TEMPLATE_MAX_DEPTH: usize = 64;

/// Interval of the power/keep-alive timer tick, in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 1_000;
