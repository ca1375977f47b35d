//! Data models for panel configuration, resolved buttons and hub state.
//!
//! This module contains the plain data structures shared by the resolver,
//! the template engine and the renderer. Models carry no I/O.

pub mod button;
pub mod rgb;
pub mod snapshot;
pub mod style;

// Re-export all model types
pub use button::{Button, IconLayer, KeySize, Layer, LayerContent, TextLayer, Visibility};
pub use rgb::RgbColor;
pub use snapshot::{EntitySnapshot, EntityState};
pub use style::{ActionSpec, Pair, PresetList, SizeMode, StyleRecord, VerticalAlign};
