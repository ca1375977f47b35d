//! CLI command handlers for HomeDeck.
//!
//! Headless access to the configuration and rendering pipeline for
//! checking configs, previewing pages and scripting.

pub mod common;
pub mod pages;
pub mod render;
pub mod validate;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use pages::PagesArgs;
pub use render::RenderArgs;
pub use validate::ValidateArgs;
