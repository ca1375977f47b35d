//! Template engine for button fields.
//!
//! A field is a template when it contains at least one `{{ ... }}` marker.
//! Text outside the markers is kept as written; each marker holds one
//! expression in a small Jinja-compatible language evaluated against the
//! current entity snapshot.
//!
//! ```
//! use homedeck::models::{EntitySnapshot, EntityState};
//! use homedeck::template::{render, TemplateContext};
//!
//! let snapshot = EntitySnapshot::from_states([EntityState::new("sensor.t", "21.5")]);
//! let ctx = TemplateContext::new(&snapshot, Some("sensor.t"));
//! assert_eq!(render("{{ self_states() }} °C", &ctx).unwrap(), "21.5 °C");
//! ```

pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;

use crate::constants::{TEMPLATE_STEP_BUDGET, TEMPLATE_TIME_BUDGET_MS};
use crate::error::{FieldIssue, TemplateError};
use crate::models::{EntitySnapshot, StyleRecord};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

pub use eval::Budget;

/// A value produced while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text
    Str(String),
    /// Number
    Num(f64),
    /// Boolean
    Bool(bool),
    /// Absent value
    None,
}

impl Value {
    /// Converts an entity attribute.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::None, Self::Num),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            other => Self::Str(other.to_string()),
        }
    }

    /// Jinja truthiness.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Num(n) => *n != 0.0,
            Self::Bool(b) => *b,
            Self::None => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Num(n) => write!(f, "{n}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::None => f.write_str("None"),
        }
    }
}

/// What a template can see: the snapshot and the button's bound entity.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Entity states for this render pass
    pub snapshot: &'a EntitySnapshot,
    /// `entity_id` of the button, used by the `self_` functions
    pub entity_id: Option<&'a str>,
}

impl<'a> TemplateContext<'a> {
    /// Creates a context.
    #[must_use]
    pub const fn new(snapshot: &'a EntitySnapshot, entity_id: Option<&'a str>) -> Self {
        Self {
            snapshot,
            entity_id,
        }
    }
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(?s)\{\{(.*?)\}\}").unwrap())
}

/// Whether `text` contains a `{{ ... }}` marker.
#[must_use]
pub fn is_template(text: &str) -> bool {
    marker_regex().is_match(text)
}

/// Renders every marker in `text` with the default budget.
///
/// # Errors
///
/// Returns the first [`TemplateError`] met; the whole field fails.
pub fn render(text: &str, ctx: &TemplateContext<'_>) -> Result<String, TemplateError> {
    let mut budget = Budget::new(
        TEMPLATE_STEP_BUDGET,
        Duration::from_millis(TEMPLATE_TIME_BUDGET_MS),
    );
    render_with_budget(text, ctx, &mut budget)
}

/// Renders every marker in `text`, charging `budget`.
///
/// # Errors
///
/// Returns the first [`TemplateError`] met.
pub fn render_with_budget(
    text: &str,
    ctx: &TemplateContext<'_>,
    budget: &mut Budget,
) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for captures in marker_regex().captures_iter(text) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        output.push_str(&text[last..whole.start()]);
        let expr = parser::parse(inner.as_str()).map_err(|err| match err {
            TemplateError::Syntax { offset, message } => TemplateError::Syntax {
                offset: inner.start() + offset,
                message,
            },
            other => other,
        })?;
        output.push_str(&eval::evaluate(&expr, ctx, budget)?.to_string());
        last = whole.end();
    }
    output.push_str(&text[last..]);
    Ok(output)
}

/// Evaluates every templated field of `record` and its additional layers.
///
/// A failing field takes the value `defaults` has for it (unset on layers)
/// and an issue naming the field is returned. Non-template fields are left
/// untouched.
#[must_use]
pub fn evaluate_record(
    record: &StyleRecord,
    defaults: &StyleRecord,
    ctx: &TemplateContext<'_>,
) -> (StyleRecord, Vec<FieldIssue>) {
    let mut issues = Vec::new();
    let mut output = record.clone();

    evaluate_fields(&mut output, Some(defaults), ctx, "", &mut issues);
    if let Some(layers) = output.additional_icons.as_mut() {
        for (index, layer) in layers.iter_mut().enumerate() {
            let prefix = format!("additional_icons[{index}].");
            evaluate_fields(layer, None, ctx, &prefix, &mut issues);
        }
    }

    (output, issues)
}

fn evaluate_fields(
    record: &mut StyleRecord,
    defaults: Option<&StyleRecord>,
    ctx: &TemplateContext<'_>,
    prefix: &str,
    issues: &mut Vec<FieldIssue>,
) {
    for (field, slot) in record.template_fields_mut() {
        let Some(value) = slot.as_deref().filter(|v| is_template(v)) else {
            continue;
        };
        match render(value, ctx) {
            Ok(rendered) => *slot = Some(rendered),
            Err(error) => {
                let name = format!("{prefix}{field}");
                tracing::warn!("template for '{}' failed: {}", name, error);
                *slot = defaults.and_then(|d| d.template_field(field)).cloned();
                issues.push(FieldIssue::new(name, error));
            }
        }
    }
}
