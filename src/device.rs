//! Seam to the physical panel.
//!
//! The USB driver is outside this crate; it implements [`PanelDevice`] and
//! pushes [`PanelEvent`]s into an `mpsc` channel. [`DirectoryPanel`] is a
//! file-backed implementation used by the CLI to preview pages.

use crate::error::DeviceError;
use crate::models::KeySize;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key layout of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    /// Number of image keys
    pub key_count: usize,
    /// Pixel size of one key image
    pub key_size: KeySize,
}

impl PanelGeometry {
    /// Creates a geometry.
    #[must_use]
    pub const fn new(key_count: usize, key_size: KeySize) -> Self {
        Self {
            key_count,
            key_size,
        }
    }
}

impl Default for PanelGeometry {
    /// 15 keys of 96x96 pixels.
    fn default() -> Self {
        Self::new(15, KeySize::new(96, 96))
    }
}

/// How a key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    /// Short press
    Tap,
    /// Long press
    Hold,
}

/// A key press reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelEvent {
    /// 0-based key index
    pub slot: usize,
    /// Tap or hold
    pub kind: PressKind,
}

impl PanelEvent {
    /// A tap on `slot`.
    #[must_use]
    pub const fn tap(slot: usize) -> Self {
        Self {
            slot,
            kind: PressKind::Tap,
        }
    }

    /// A hold on `slot`.
    #[must_use]
    pub const fn hold(slot: usize) -> Self {
        Self {
            slot,
            kind: PressKind::Hold,
        }
    }
}

/// Operations the deck needs from a panel driver.
pub trait PanelDevice: Send {
    /// Key count and key image size.
    fn geometry(&self) -> PanelGeometry;

    /// Replaces the image of one key.
    fn write_key_image(&mut self, slot: usize, image: &RgbaImage) -> Result<(), DeviceError>;

    /// Sets or clears the title shown under a key.
    fn set_key_title(&mut self, slot: usize, title: Option<&str>) -> Result<(), DeviceError>;

    /// Sets the backlight brightness in percent.
    fn set_brightness(&mut self, level: u8) -> Result<(), DeviceError>;
}

/// Writes key images as `key-NN.png` files and titles to `titles.json`.
#[derive(Debug)]
pub struct DirectoryPanel {
    dir: PathBuf,
    geometry: PanelGeometry,
    titles: BTreeMap<usize, String>,
    brightness: u8,
}

impl DirectoryPanel {
    /// Creates the output directory if needed.
    pub fn create(dir: &Path, geometry: PanelGeometry) -> Result<Self> {
        fs::create_dir_all(dir)
            .context(format!("Failed to create output directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            geometry,
            titles: BTreeMap::new(),
            brightness: 0,
        })
    }

    /// Path of the image written for `slot`.
    #[must_use]
    pub fn key_path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("key-{slot:02}.png"))
    }

    /// Last brightness set.
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Titles currently set, by slot.
    #[must_use]
    pub const fn titles(&self) -> &BTreeMap<usize, String> {
        &self.titles
    }
}

impl PanelDevice for DirectoryPanel {
    fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    fn write_key_image(&mut self, slot: usize, image: &RgbaImage) -> Result<(), DeviceError> {
        image
            .save(self.key_path(slot))
            .map_err(|err| DeviceError::Write {
                slot,
                message: err.to_string(),
            })
    }

    fn set_key_title(&mut self, slot: usize, title: Option<&str>) -> Result<(), DeviceError> {
        match title {
            Some(title) => self.titles.insert(slot, title.to_string()),
            None => self.titles.remove(&slot),
        };
        let json = serde_json::to_string_pretty(&self.titles).map_err(|err| DeviceError::Write {
            slot,
            message: err.to_string(),
        })?;
        fs::write(self.dir.join("titles.json"), json).map_err(|err| DeviceError::Write {
            slot,
            message: err.to_string(),
        })
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DeviceError> {
        self.brightness = level;
        Ok(())
    }
}
