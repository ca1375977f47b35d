//! `render` command: paints one page to PNG files.

use crate::actions::Navigation;
use crate::cli::common::{load_config, load_snapshot, parse_key_size, CliError, CliResult};
use crate::config::{AssetPaths, DeckConfig};
use crate::constants::ROOT_PAGE;
use crate::deck::Deck;
use crate::device::{DirectoryPanel, PanelGeometry};
use crate::models::{EntitySnapshot, KeySize};
use crate::render::{Downloader, OfflineDownloader};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Render a page to key-NN.png files
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Path to the configuration file (defaults to the user config)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory for key images and titles.json
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Page to render
    #[arg(short, long, value_name = "NAME", default_value = ROOT_PAGE)]
    pub page: String,

    /// 1-based sub-page to render
    #[arg(long, default_value_t = 1)]
    pub sub_page: usize,

    /// Entity states as a JSON list
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Assets directory (icons, fonts/)
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Download cache directory
    #[arg(long, value_name = "DIR")]
    pub cache: Option<PathBuf>,

    /// Number of keys on the panel
    #[arg(long, default_value_t = 15)]
    pub keys: usize,

    /// Key image size, e.g. 96x96
    #[arg(long, default_value = "96x96", value_parser = parse_key_size)]
    pub key_size: KeySize,

    /// Do not download remote icons
    #[arg(long)]
    pub offline: bool,
}

impl RenderArgs {
    /// Execute the render command
    pub fn execute(&self) -> CliResult<()> {
        if self.keys == 0 || self.sub_page == 0 {
            return Err(CliError::validation("--keys and --sub-page must be at least 1"));
        }
        let config = Arc::new(load_config(self.config.as_deref())?);
        if !config.has_page(&self.page) {
            return Err(CliError::validation(format!(
                "Page '{}' does not exist",
                self.page
            )));
        }
        let snapshot = load_snapshot(self.snapshot.as_deref())?;
        let paths = self.asset_paths()?;
        let panel = DirectoryPanel::create(&self.output, PanelGeometry::new(self.keys, self.key_size))
            .map_err(|e| CliError::io(format!("{e:#}")))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::io(format!("Failed to start runtime: {e}")))?;

        let (shown, count) = runtime.block_on(async {
            #[cfg(feature = "remote-icons")]
            if !self.offline {
                let downloader = crate::render::HttpDownloader::new()
                    .map_err(|e| CliError::io(format!("{e:#}")))?;
                return Ok(self.render(config, panel, paths, downloader, &snapshot).await);
            }
            Ok::<_, CliError>(self.render(config, panel, paths, OfflineDownloader, &snapshot).await)
        })?;

        println!(
            "✓ Rendered page '{}' {}/{} to {}",
            self.page,
            shown,
            count,
            self.output.display()
        );
        Ok(())
    }

    fn asset_paths(&self) -> CliResult<AssetPaths> {
        if let (Some(assets), Some(cache)) = (&self.assets, &self.cache) {
            return Ok(AssetPaths::new(assets, cache));
        }
        let defaults = AssetPaths::default_dirs().map_err(|e| CliError::io(format!("{e:#}")))?;
        Ok(AssetPaths::new(
            self.assets.clone().unwrap_or(defaults.assets),
            self.cache.clone().unwrap_or(defaults.cache),
        ))
    }

    /// Walks to the requested sub-page and renders it, waiting for icon
    /// downloads. Returns the sub-page shown and the sub-page count.
    async fn render<D: Downloader>(
        &self,
        config: Arc<DeckConfig>,
        panel: DirectoryPanel,
        paths: AssetPaths,
        downloader: D,
        snapshot: &EntitySnapshot,
    ) -> (usize, usize) {
        // service calls are never dispatched here
        let (hub, _calls) = mpsc::channel(1);
        let mut deck = Deck::new(config, panel, paths, downloader, hub);

        if self.page != ROOT_PAGE {
            deck.navigate(Navigation::GoTo(self.page.clone()));
        }
        deck.render(snapshot, true).await;
        for _ in 1..self.sub_page {
            if !deck.navigate(Navigation::Next) {
                break;
            }
            deck.render(snapshot, false).await;
        }
        deck.render_settled(snapshot).await;

        deck.view()
            .map_or((1, 1), |view| (view.location.sub_page, view.sub_page_count))
    }
}
