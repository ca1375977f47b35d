//! Icon source URIs.
//!
//! `none`, `local:<path>`, `url:<url>`, `mdi:<name>` and `pi:<name>`. Named
//! icon sets are looked up as bundled files first, then in the download
//! cache; anything else remote is cached under the SHA-256 of its source.

use crate::config::AssetPaths;
use crate::constants::{MDI_URL, PHOSPHOR_DEFAULT_VARIANT, PHOSPHOR_URL};
use crate::error::AssetError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A parsed icon source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// Nothing to draw; background and border still apply
    Blank,
    /// File relative to the assets directory
    Local(PathBuf),
    /// Arbitrary remote image
    Url(String),
    /// Material Design icon
    Mdi(String),
    /// Phosphor icon in a weight
    Phosphor {
        /// Icon name without weight suffix
        name: String,
        /// Weight (`regular`, `bold`, `fill`, ...)
        variant: String,
    },
}

/// A download the render path needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    /// Remote location
    pub url: String,
    /// Cache file the bytes are written to
    pub path: PathBuf,
}

impl IconSource {
    /// Parses an icon source string.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::UnsupportedSource`] for unknown schemes or an
    /// empty name.
    pub fn parse(source: &str, variant: &str) -> Result<Self, AssetError> {
        let source = source.trim();
        if source.is_empty()
            || source.eq_ignore_ascii_case("none")
            || source.eq_ignore_ascii_case("blank")
        {
            return Ok(Self::Blank);
        }

        let unsupported = || AssetError::UnsupportedSource(source.to_string());
        let (scheme, rest) = source.split_once(':').ok_or_else(unsupported)?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(unsupported());
        }

        match scheme {
            "local" => Ok(Self::Local(PathBuf::from(rest))),
            "url" => Ok(Self::Url(rest.to_string())),
            "mdi" => Ok(Self::Mdi(rest.to_string())),
            "pi" => {
                let variant = variant.trim();
                Ok(Self::Phosphor {
                    name: rest.to_string(),
                    variant: if variant.is_empty() {
                        PHOSPHOR_DEFAULT_VARIANT.to_string()
                    } else {
                        variant.to_lowercase()
                    },
                })
            }
            _ => Err(unsupported()),
        }
    }

    /// Whether the source is known to be SVG without looking at its bytes.
    #[must_use]
    pub fn is_vector(&self) -> bool {
        match self {
            Self::Mdi(_) | Self::Phosphor { .. } => true,
            Self::Local(path) => path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("svg")),
            Self::Blank | Self::Url(_) => false,
        }
    }

    /// File name inside an icon set directory (`pi` weights other than
    /// `regular` are suffixed).
    fn set_file(&self) -> Option<(&'static str, String)> {
        match self {
            Self::Mdi(name) => Some(("mdi", format!("{name}.svg"))),
            Self::Phosphor { name, variant } if variant == PHOSPHOR_DEFAULT_VARIANT => {
                Some(("pi", format!("{name}.svg")))
            }
            Self::Phosphor { name, variant } => Some(("pi", format!("{name}-{variant}.svg"))),
            _ => None,
        }
    }

    /// Remote location, for sources that can be downloaded.
    #[must_use]
    pub fn remote_url(&self) -> Option<String> {
        match self {
            Self::Url(url) => Some(url.clone()),
            Self::Mdi(name) => Some(MDI_URL.replace("{name}", name)),
            Self::Phosphor { variant, .. } => {
                let (_, file) = self.set_file()?;
                let stem = file.trim_end_matches(".svg");
                Some(
                    PHOSPHOR_URL
                        .replace("{variant}", variant)
                        .replace("{name}", stem),
                )
            }
            Self::Blank | Self::Local(_) => None,
        }
    }

    /// Bundled file shipped with the assets, if the source names one.
    #[must_use]
    pub fn bundled_path(&self, paths: &AssetPaths) -> Option<PathBuf> {
        match self {
            Self::Local(path) => Some(paths.assets.join(path)),
            _ => {
                let (set, file) = self.set_file()?;
                Some(paths.assets.join("icons").join(set).join(file))
            }
        }
    }

    /// Where a downloaded copy lives.
    #[must_use]
    pub fn cache_path(&self, paths: &AssetPaths) -> Option<PathBuf> {
        let icons = paths.cache.join("icons");
        match self {
            Self::Url(url) => Some(icons.join("url").join(format!("{}.img", sha256_hex(url)))),
            _ => {
                let (set, file) = self.set_file()?;
                Some(icons.join(set).join(file))
            }
        }
    }

    /// The download that would fill the cache for this source.
    #[must_use]
    pub fn fetch_request(&self, paths: &AssetPaths) -> Option<FetchRequest> {
        Some(FetchRequest {
            url: self.remote_url()?,
            path: self.cache_path(paths)?,
        })
    }
}

/// Lowercase hex SHA-256 of `text`.
#[must_use]
pub fn sha256_hex(text: &str) -> String {
    hex_digest(Sha256::digest(text.as_bytes()).as_slice())
}

pub(crate) fn hex_digest(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Sniffs SVG content (XML prolog or an `<svg` root near the start).
#[must_use]
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Whether `path` is a usable file.
pub(crate) fn is_file(path: &Path) -> bool {
    path.metadata().is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}
