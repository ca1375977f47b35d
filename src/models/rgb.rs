//! RGB color handling with hex parsing and serialization.

// Allow small types passed by reference for API consistency
#![allow(clippy::trivially_copy_pass_by_ref)]

use anyhow::{Context, Result};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGB color value with hex string representation.
///
/// Config files write colors as six hex digits. YAML reads `012345` as a
/// number, so the config surface also accepts a leading `/` (`/012345`);
/// a leading `#` is accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl RgbColor {
    /// White, the default foreground for icons and labels.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a new `RgbColor` from individual channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses an `RgbColor` from a hex string.
    ///
    /// Supports formats: "RRGGBB", "/RRGGBB", "#RRGGBB" in either case.
    ///
    /// # Examples
    ///
    /// ```
    /// use homedeck::models::RgbColor;
    ///
    /// let color = RgbColor::from_hex("/012ABC").unwrap();
    /// assert_eq!(color, RgbColor::new(0x01, 0x2A, 0xBC));
    ///
    /// let color = RgbColor::from_hex("FF0000").unwrap();
    /// assert_eq!(color, RgbColor::new(255, 0, 0));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not exactly six hex digits after
    /// the optional prefix.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let hex = hex
            .strip_prefix('/')
            .or_else(|| hex.strip_prefix('#'))
            .unwrap_or(hex);

        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid hex color format '{hex}'. Expected 6 hex digits (RRGGBB)");
        }

        let r = u8::from_str_radix(&hex[0..2], 16)
            .context(format!("Invalid red channel in hex color '{hex}'"))?;
        let g = u8::from_str_radix(&hex[2..4], 16)
            .context(format!("Invalid green channel in hex color '{hex}'"))?;
        let b = u8::from_str_radix(&hex[4..6], 16)
            .context(format!("Invalid blue channel in hex color '{hex}'"))?;

        Ok(Self::new(r, g, b))
    }

    /// Converts the color to the canonical config form "RRGGBB" (uppercase).
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Returns an opaque (or partially transparent) RGBA pixel.
    #[must_use]
    pub const fn to_rgba(&self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }

    /// Returns a dimmed version of the color at the given percentage.
    ///
    /// # Arguments
    ///
    /// * `percent` - Brightness percentage (0-100). 0 = black, 100 = original color.
    ///
    /// # Examples
    ///
    /// ```
    /// use homedeck::models::RgbColor;
    ///
    /// let color = RgbColor::new(200, 100, 50);
    /// let dimmed = color.dim(50); // 50% brightness
    /// assert_eq!(dimmed, RgbColor::new(100, 50, 25));
    /// ```
    #[must_use]
    pub const fn dim(&self, percent: u8) -> Self {
        let percent = if percent > 100 { 100 } else { percent };
        Self {
            r: (self.r as u16 * percent as u16 / 100) as u8,
            g: (self.g as u16 * percent as u16 / 100) as u8,
            b: (self.b as u16 * percent as u16 / 100) as u8,
        }
    }
}

impl FromStr for RgbColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for RgbColor {
    /// Default color is white (FFFFFF).
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_accepts_all_config_spellings() {
        let expected = RgbColor::new(0x01, 0x2A, 0xBC);
        assert_eq!(RgbColor::from_hex("012ABC").unwrap(), expected);
        assert_eq!(RgbColor::from_hex("/012ABC").unwrap(), expected);
        assert_eq!(RgbColor::from_hex("#012abc").unwrap(), expected);
        assert_eq!(RgbColor::from_hex("  012ABC  ").unwrap(), expected);
        assert_eq!(
            RgbColor::from_hex("FF0000").unwrap(),
            RgbColor::new(255, 0, 0)
        );
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(RgbColor::from_hex("FFF").is_err());
        assert!(RgbColor::from_hex("FFFFFFF").is_err());
        assert!(RgbColor::from_hex("GGGGGG").is_err());
        assert!(RgbColor::from_hex("").is_err());
        assert!(RgbColor::from_hex("/").is_err());
        assert!(RgbColor::from_hex("//012ABC").is_err());
        // Multi-byte characters must not panic on slicing
        assert!(RgbColor::from_hex("ÄÄÄ").is_err());
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(RgbColor::new(255, 0, 0).to_hex(), "FF0000");
        assert_eq!(RgbColor::new(0, 128, 255).to_hex(), "0080FF");
        assert_eq!(RgbColor::new(0, 0, 0).to_string(), "000000");
    }

    #[test]
    fn test_dim_clamps_percent() {
        let color = RgbColor::new(200, 100, 50);
        assert_eq!(color.dim(0), RgbColor::new(0, 0, 0));
        assert_eq!(color.dim(150), color);
    }

    #[test]
    fn test_default() {
        assert_eq!(RgbColor::default(), RgbColor::new(255, 255, 255));
    }
}
