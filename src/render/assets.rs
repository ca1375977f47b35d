//! Locating icon bytes and fonts on disk.
//!
//! Lookups never touch the network. A remote icon that is not cached yet
//! yields [`AssetError::Pending`]; the deck schedules the download and
//! re-renders once it lands in the cache.

use super::source::{is_file, looks_like_svg, IconSource};
use super::text::FontCache;
use crate::config::AssetPaths;
use crate::error::AssetError;
use fontdue::Font;
use std::path::Path;
use std::sync::Arc;

/// Raw icon file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBytes {
    /// File contents
    pub data: Vec<u8>,
    /// SVG rather than a raster format
    pub vector: bool,
}

/// Read access to icons and fonts, shared by render workers.
#[derive(Debug)]
pub struct AssetStore {
    paths: AssetPaths,
    fonts: FontCache,
}

impl AssetStore {
    /// Creates a store over `paths`.
    #[must_use]
    pub fn new(paths: AssetPaths) -> Self {
        Self {
            fonts: FontCache::new(paths.fonts.clone()),
            paths,
        }
    }

    /// Asset directories.
    #[must_use]
    pub const fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// Font named `name`.
    pub fn font(&self, name: &str) -> Result<Arc<Font>, AssetError> {
        self.fonts.get(name)
    }

    /// Bytes of `source`: bundled file first, then the download cache.
    ///
    /// Returns `Ok(None)` for blank sources.
    pub fn icon_bytes(&self, source: &IconSource) -> Result<Option<IconBytes>, AssetError> {
        let path = match source {
            IconSource::Blank => return Ok(None),
            IconSource::Local(relative) => {
                let path = self.paths.assets.join(relative);
                if !is_file(&path) {
                    return Err(AssetError::NotFound(path));
                }
                path
            }
            IconSource::Url(_) | IconSource::Mdi(_) | IconSource::Phosphor { .. } => {
                let found = source
                    .bundled_path(&self.paths)
                    .into_iter()
                    .chain(source.cache_path(&self.paths))
                    .find(|path| is_file(path));
                match found {
                    Some(path) => path,
                    None => {
                        let url = source.remote_url().unwrap_or_default();
                        return Err(AssetError::Pending(url));
                    }
                }
            }
        };

        let data = read(&path)?;
        let vector = source.is_vector() || looks_like_svg(&data);
        Ok(Some(IconBytes { data, vector }))
    }
}

fn read(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|err| {
        tracing::debug!("cannot read {}: {}", path.display(), err);
        AssetError::NotFound(path.to_path_buf())
    })
}
