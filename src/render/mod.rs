//! Key image rendering.
//!
//! [`Compositor`] turns a resolved [`crate::models::Button`] into an RGBA
//! image. Icons come from bundled assets, the download cache or, via
//! [`IconFetcher`], from the network in the background.

pub mod assets;
pub mod compositor;
pub mod decode;
pub mod editor;
pub mod fetch;
pub mod source;
pub mod text;

pub use assets::AssetStore;
pub use compositor::{Compositor, RenderedKey};
#[cfg(feature = "remote-icons")]
pub use fetch::HttpDownloader;
pub use fetch::{Downloader, FetchOutcome, IconFetcher, OfflineDownloader};
pub use source::{FetchRequest, IconSource};
