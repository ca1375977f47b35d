//! HomeDeck Library
//!
//! Turns a declarative YAML description of a button panel into key images
//! and reacts to entity-state changes from a home-automation hub and to
//! key presses. The device driver and the hub client are external: the
//! former implements [`device::PanelDevice`], the latter talks to the
//! runtime through the channels in [`hub`].

// Module declarations
pub mod actions;
pub mod cli;
pub mod config;
pub mod constants;
pub mod deck;
pub mod device;
pub mod error;
pub mod hub;
pub mod models;
pub mod navigation;
pub mod power;
pub mod render;
pub mod services;
pub mod template;

// Re-export commonly used types
pub use config::{AssetPaths, DeckConfig};
pub use deck::Deck;
pub use device::{PanelDevice, PanelEvent, PanelGeometry, PressKind};
pub use models::{Button, EntitySnapshot, EntityState};
