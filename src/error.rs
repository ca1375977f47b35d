//! Error taxonomy for the panel pipeline.
//!
//! Only [`ConfigError`] is fatal: it stops the config from loading and is
//! usually carried inside an `anyhow` chain. Everything else is recoverable
//! and is reported per field, per layer or per key while the rest of the
//! page keeps rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Problems found while loading or validating the configuration file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A button (or system button, or state override) names a preset that
    /// is not declared under `presets`.
    #[error("{owner} references unknown preset '{preset}'")]
    UnknownPreset {
        /// Where the reference was found (e.g. "page 'lights' button 3")
        owner: String,
        /// The undeclared preset name
        preset: String,
    },

    /// A `$page.go_to` action targets a page that is not declared.
    #[error("{owner} navigates to undeclared page '{target}'")]
    UnknownPage {
        /// Where the action was found
        owner: String,
        /// The undeclared page name
        target: String,
    },

    /// A `states` override contains its own `states` table.
    #[error("{owner}: state override '{state}' must not contain nested 'states'")]
    NestedStates {
        /// Where the override was found
        owner: String,
        /// The state key of the offending override
        state: String,
    },

    /// A preset declares `presets`; presets do not chain.
    #[error("preset '{preset}' must not declare '{field}'")]
    InvalidPreset {
        /// The preset name
        preset: String,
        /// The offending field
        field: String,
    },

    /// A field holds a value outside its allowed range or format.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Dotted path of the field
        field: String,
        /// Human-readable reason
        message: String,
    },
}

/// Failure evaluating one templated field.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemplateError {
    /// The expression could not be tokenized or parsed.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax {
        /// Byte offset inside the expression
        offset: usize,
        /// What went wrong
        message: String,
    },

    /// The expression calls a function outside the registry.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// The referenced entity is not in the snapshot.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// A `self_*` function was used on a button without `entity_id`.
    #[error("'{0}' requires the button to have an entity_id")]
    NoBoundEntity(String),

    /// A function received the wrong number of arguments.
    #[error("'{function}' expects {expected} argument(s), got {got}")]
    Arity {
        /// Function name
        function: String,
        /// Expected argument count
        expected: usize,
        /// Actual argument count
        got: usize,
    },

    /// A function received an argument of the wrong type.
    #[error("'{function}' expects a {expected} argument")]
    TypeMismatch {
        /// Function name
        function: String,
        /// Expected type name
        expected: &'static str,
    },

    /// Evaluation exceeded its step or time budget.
    #[error("evaluation budget exhausted")]
    BudgetExceeded,
}

/// Failure producing the pixels of one layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// A local file does not exist.
    #[error("asset not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A remote icon is being downloaded; the layer stays blank until then.
    #[error("icon '{0}' is still downloading")]
    Pending(String),

    /// An icon source string could not be understood.
    #[error("unsupported icon source '{0}'")]
    UnsupportedSource(String),

    /// The file exists but could not be decoded.
    #[error("failed to decode '{source_name}': {message}")]
    Decode {
        /// Icon source or path
        source_name: String,
        /// Decoder message
        message: String,
    },

    /// Downloading a remote icon failed.
    #[error("failed to fetch '{url}': {message}")]
    Fetch {
        /// Remote URL
        url: String,
        /// Transport or status message
        message: String,
    },

    /// A font could not be loaded.
    #[error("failed to load font '{0}'")]
    Font(String),

    /// A color string inside the layer is malformed.
    #[error("invalid color '{0}'")]
    Color(String),
}

/// A tap/hold action that cannot be dispatched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The action name is neither a `$` action nor `domain.service`.
    #[error("unknown action '{0}'")]
    Unknown(String),

    /// The action needs data that is missing or has the wrong shape.
    #[error("action '{action}' requires {expected}")]
    InvalidData {
        /// Action name
        action: String,
        /// Description of the expected data
        expected: &'static str,
    },

    /// A navigation action targets an undeclared page.
    #[error("page '{0}' does not exist")]
    UnknownPage(String),
}

/// Failure reported by the device collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Writing a key image failed.
    #[error("failed to write key {slot}: {message}")]
    Write {
        /// Slot index
        slot: usize,
        /// Transport message
        message: String,
    },

    /// Setting the brightness failed.
    #[error("failed to set brightness: {0}")]
    Brightness(String),

    /// The device went away.
    #[error("device disconnected")]
    Disconnected,
}

/// Any error that degrades a single field, layer or action instead of
/// stopping the page.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Recoverable {
    /// Template evaluation failed
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// An icon, font or color could not be used
    #[error(transparent)]
    Asset(#[from] AssetError),
    /// An action could not be dispatched
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// A recoverable error tagged with the field or layer it affected.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    /// Field name, prefixed with the layer for additional icons
    /// (e.g. `additional_icons[1].text`)
    pub field: String,
    /// What went wrong
    pub error: Recoverable,
}

impl FieldIssue {
    /// Creates an issue for `field`.
    pub fn new(field: impl Into<String>, error: impl Into<Recoverable>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}
