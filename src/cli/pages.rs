//! `pages` command: shows how pages split into sub-pages on a panel.

use crate::cli::common::{load_config, load_snapshot, CliError, CliResult};
use crate::device::PanelGeometry;
use crate::navigation::Location;
use crate::services::pipeline::{PagePipeline, Slot};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// List the keys of every page and sub-page
#[derive(Debug, Clone, Args)]
pub struct PagesArgs {
    /// Path to the configuration file (defaults to the user config)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only show this page
    #[arg(short, long, value_name = "NAME")]
    pub page: Option<String>,

    /// Entity states as a JSON list
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Number of keys on the panel
    #[arg(long, default_value_t = 15)]
    pub keys: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PageOutput {
    page: String,
    sub_pages: Vec<Vec<SlotOutput>>,
}

#[derive(Debug, Serialize)]
struct SlotOutput {
    slot: usize,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tap_action: Option<String>,
}

impl SlotOutput {
    fn new(slot: usize, content: &Slot) -> Self {
        let (kind, name, tap_action) = match content {
            Slot::Empty => ("empty", None, None),
            Slot::Hidden => ("hidden", None, None),
            Slot::Button(resolved) => (
                if resolved.system.is_some() { "system" } else { "button" },
                resolved.button.name.clone(),
                resolved.button.tap_action.as_ref().map(|a| a.action.clone()),
            ),
        };
        Self {
            slot,
            kind,
            name,
            tap_action,
        }
    }
}

impl PagesArgs {
    /// Execute the pages command
    pub fn execute(&self) -> CliResult<()> {
        if self.keys == 0 {
            return Err(CliError::validation("--keys must be at least 1"));
        }
        let config = load_config(self.config.as_deref())?;
        let snapshot = load_snapshot(self.snapshot.as_deref())?;

        let names: Vec<String> = match &self.page {
            Some(page) if !config.has_page(page) => {
                return Err(CliError::validation(format!("Page '{page}' does not exist")));
            }
            Some(page) => vec![page.clone()],
            None => config.pages.keys().cloned().collect(),
        };

        // key size only matters for painting
        let key_size = PanelGeometry::default().key_size;
        let pipeline = PagePipeline::new(&config, key_size, self.keys);

        let pages: Vec<PageOutput> = names
            .into_iter()
            .map(|page| {
                let first = pipeline.page_view(&Location::new(page.clone(), 1), &snapshot);
                let sub_pages = (1..=first.sub_page_count)
                    .map(|sub_page| {
                        let view = pipeline.page_view(&Location::new(page.clone(), sub_page), &snapshot);
                        view.slots
                            .iter()
                            .enumerate()
                            .map(|(index, slot)| SlotOutput::new(index, slot))
                            .collect()
                    })
                    .collect();
                PageOutput { page, sub_pages }
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&pages)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
            return Ok(());
        }

        for page in &pages {
            println!("{} ({} sub-page(s))", page.page, page.sub_pages.len());
            for (index, slots) in page.sub_pages.iter().enumerate() {
                println!("  [{}/{}]", index + 1, page.sub_pages.len());
                for slot in slots {
                    let label = match slot.kind {
                        "empty" => "-".to_string(),
                        "hidden" => "(hidden)".to_string(),
                        _ => slot.name.clone().unwrap_or_else(|| "(unnamed)".to_string()),
                    };
                    match &slot.tap_action {
                        Some(action) => println!("    {:>2}  {:<20} {}", slot.slot, label, action),
                        None => println!("    {:>2}  {}", slot.slot, label),
                    }
                }
            }
        }
        Ok(())
    }
}
