//! Service layer for the button pipeline.
//!
//! Preset resolution, state overrides and the per-page pipeline that ties
//! them to template evaluation and pagination.

pub mod pipeline;
pub mod presets;
pub mod states;

// Re-export commonly used types
pub use pipeline::{PagePipeline, PageView, ResolvedButton, Slot};
pub use presets::ConfigResolver;
pub use states::StateOverrideResolver;
