//! The panel runtime.
//!
//! [`Deck::run`] is a single loop that owns navigation, power state and the
//! key images last written. It reacts to entity snapshots, key presses, a
//! one-second tick and finished icon downloads. Key images are painted on
//! blocking workers and written back in slot order; a key is only written
//! when its content changed since the last successful write.

use crate::actions::{ActionDispatcher, Navigation};
use crate::config::{AssetPaths, DeckConfig};
use crate::constants::TICK_INTERVAL_MS;
use crate::device::{PanelDevice, PanelEvent, PressKind};
use crate::error::{AssetError, Recoverable};
use crate::hub::{ServiceSender, SnapshotReceiver};
use crate::models::EntitySnapshot;
use crate::navigation::NavigationContext;
use crate::power::{PowerState, PowerStateMachine, Wake};
use crate::render::{AssetStore, Compositor, Downloader, FetchOutcome, IconFetcher};
use crate::services::pipeline::{PagePipeline, PageView, Slot};
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::MissedTickBehavior;

type Fingerprint = [u8; 32];

/// Runtime state of one panel.
pub struct Deck<P, D> {
    config: Arc<DeckConfig>,
    panel: P,
    compositor: Compositor,
    fetcher: IconFetcher<D>,
    fetch_done: mpsc::UnboundedReceiver<FetchOutcome>,
    dispatcher: ActionDispatcher,
    navigation: NavigationContext,
    power: PowerStateMachine,
    view: Option<PageView>,
    written: Vec<Option<Fingerprint>>,
    titles: Vec<Option<String>>,
    workers: Arc<Semaphore>,
}

impl<P, D> std::fmt::Debug for Deck<P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deck")
            .field("location", self.navigation.current())
            .field("power", &self.power.state())
            .finish_non_exhaustive()
    }
}

impl<P: PanelDevice, D: Downloader> Deck<P, D> {
    /// Creates the runtime for `panel`, starting on the root page.
    pub fn new(
        config: Arc<DeckConfig>,
        panel: P,
        assets: AssetPaths,
        downloader: D,
        hub: ServiceSender,
    ) -> Self {
        let geometry = panel.geometry();
        let (fetcher, fetch_done) = IconFetcher::new(downloader);
        let workers = std::thread::available_parallelism().map_or(2, NonZeroUsize::get);

        Self {
            compositor: Compositor::new(Arc::new(AssetStore::new(assets)), geometry.key_size),
            fetcher,
            fetch_done,
            dispatcher: ActionDispatcher::new(hub),
            navigation: NavigationContext::new(),
            power: PowerStateMachine::new(&config, Instant::now()),
            view: None,
            written: vec![None; geometry.key_count],
            titles: vec![None; geometry.key_count],
            workers: Arc::new(Semaphore::new(workers)),
            config,
            panel,
        }
    }

    /// The panel driver.
    pub const fn panel(&self) -> &P {
        &self.panel
    }

    /// Navigation state.
    pub const fn navigation(&self) -> &NavigationContext {
        &self.navigation
    }

    /// Current power state.
    pub const fn power_state(&self) -> PowerState {
        self.power.state()
    }

    /// The page shown by the last render, if any.
    pub const fn view(&self) -> Option<&PageView> {
        self.view.as_ref()
    }

    /// Applies a navigation request. Returns whether the location changed.
    pub fn navigate(&mut self, navigation: Navigation) -> bool {
        match navigation {
            Navigation::GoTo(page) => match self.navigation.go_to(&self.config, &page) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!("{}", err);
                    false
                }
            },
            Navigation::Back => self.navigation.back(),
            Navigation::Previous => self.navigation.previous(),
            Navigation::Next => {
                let count = self.view.as_ref().map_or(1, |view| view.sub_page_count);
                self.navigation.next(count)
            }
        }
    }

    /// Rebuilds the current page and writes the keys whose content changed.
    /// `force` rewrites every key.
    pub async fn render(&mut self, snapshot: &EntitySnapshot, force: bool) {
        let geometry = self.panel.geometry();
        let pipeline = PagePipeline::new(&self.config, geometry.key_size, geometry.key_count);
        let view = pipeline.page_view(self.navigation.current(), snapshot);
        self.navigation.clamp_sub_page(view.sub_page_count);

        if force {
            self.written.fill(None);
            self.titles.fill(None);
        }

        let mut jobs = Vec::new();
        for (index, slot) in view.slots.iter().enumerate() {
            let fingerprint = fingerprint(slot);
            if self.written.get(index).copied().flatten() == Some(fingerprint) {
                continue;
            }
            let Ok(permit) = Arc::clone(&self.workers).acquire_owned().await else {
                break;
            };
            let compositor = self.compositor.clone();
            let slot = slot.clone();
            let job = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                compositor.render_slot(&slot)
            });
            jobs.push((index, fingerprint, job));
        }

        let now = Instant::now();
        for (index, fingerprint, job) in jobs {
            let rendered = match job.await {
                Ok(rendered) => rendered,
                Err(err) => {
                    tracing::error!("render worker for key {} failed: {}", index, err);
                    continue;
                }
            };
            for issue in &rendered.issues {
                if matches!(issue.error, Recoverable::Asset(AssetError::Pending(_))) {
                    tracing::debug!("key {}: {}", index, issue);
                } else {
                    tracing::warn!("key {}: {}", index, issue);
                }
            }
            for request in rendered.fetches {
                self.fetcher.request(request, now);
            }
            match self.panel.write_key_image(index, &rendered.image) {
                Ok(()) => self.written[index] = Some(fingerprint),
                Err(err) => {
                    tracing::warn!("{}", err);
                    self.written[index] = None;
                }
            }
        }

        self.update_titles(&view);
        tracing::debug!(
            "rendered page '{}' {}/{}",
            view.location.page,
            view.location.sub_page,
            view.sub_page_count
        );
        self.view = Some(view);
    }

    /// Renders, waits for every icon download it started, then renders
    /// again if any of them landed.
    pub async fn render_settled(&mut self, snapshot: &EntitySnapshot) {
        self.render(snapshot, true).await;
        let mut fetched = false;
        while self.fetcher.in_flight() > 0 {
            let Some(outcome) = self.fetch_done.recv().await else {
                break;
            };
            fetched |= self.fetcher.complete(&outcome, Instant::now());
        }
        if fetched {
            self.render(snapshot, true).await;
        }
    }

    /// Handles one key press.
    pub async fn press(&mut self, event: PanelEvent, snapshot: &EntitySnapshot) {
        match self.power.on_activity(Instant::now()) {
            Wake::AlreadyActive => {}
            Wake::FromDim => self.apply_brightness(),
            Wake::FromSleep => {
                self.apply_brightness();
                self.render(snapshot, true).await;
                return;
            }
        }

        let action = self
            .view
            .as_ref()
            .and_then(|view| view.slots.get(event.slot))
            .and_then(Slot::button)
            .and_then(|resolved| match event.kind {
                PressKind::Tap => resolved.button.tap_action.clone(),
                PressKind::Hold => resolved.button.hold_action.clone(),
            });
        let Some(action) = action else {
            tracing::debug!("key {} has no {:?} action", event.slot, event.kind);
            return;
        };

        match self.dispatcher.dispatch(&action) {
            Ok(Some(navigation)) => {
                if self.navigate(navigation) {
                    self.render(snapshot, false).await;
                }
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("key {}: {}", event.slot, err),
        }
    }

    /// Runs until the hub or the panel event stream closes, then hands the
    /// panel back.
    pub async fn run(
        mut self,
        mut snapshots: SnapshotReceiver,
        mut events: mpsc::Receiver<PanelEvent>,
    ) -> P {
        self.apply_brightness();
        let snapshot = Arc::clone(&snapshots.borrow_and_update());
        self.render(&snapshot, true).await;

        let mut tick = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        tracing::info!("hub connection closed");
                        break;
                    }
                    if self.power.is_asleep() {
                        continue;
                    }
                    let snapshot = Arc::clone(&snapshots.borrow_and_update());
                    self.render(&snapshot, false).await;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::info!("panel event stream closed");
                        break;
                    };
                    let snapshot = Arc::clone(&snapshots.borrow_and_update());
                    self.press(event, &snapshot).await;
                }
                _ = tick.tick() => {
                    if self.power.tick(Instant::now()).is_some() {
                        self.apply_brightness();
                    }
                }
                Some(outcome) = self.fetch_done.recv() => {
                    if self.fetcher.complete(&outcome, Instant::now()) && !self.power.is_asleep() {
                        let snapshot = Arc::clone(&snapshots.borrow_and_update());
                        self.render(&snapshot, true).await;
                    }
                }
            }
        }
        self.panel
    }

    fn apply_brightness(&mut self) {
        let level = self.power.brightness();
        if let Err(err) = self.panel.set_brightness(level) {
            tracing::warn!("{}", err);
        }
    }

    fn update_titles(&mut self, view: &PageView) {
        let show_title = self.config.label_style.show_title;
        for (index, slot) in view.slots.iter().enumerate() {
            let title = slot
                .button()
                .filter(|_| show_title)
                .and_then(|resolved| resolved.button.name.clone());
            if self.titles.get(index) == Some(&title) {
                continue;
            }
            match self.panel.set_key_title(index, title.as_deref()) {
                Ok(()) => self.titles[index] = title,
                Err(err) => tracing::warn!("{}", err),
            }
        }
    }
}

/// Content hash of what a slot paints.
fn fingerprint(slot: &Slot) -> Fingerprint {
    let mut hasher = Sha256::new();
    match slot {
        Slot::Empty => hasher.update(b"empty"),
        Slot::Hidden => hasher.update(b"hidden"),
        Slot::Button(resolved) => match serde_json::to_vec(&resolved.button) {
            Ok(json) => hasher.update(&json),
            Err(err) => {
                tracing::debug!("cannot fingerprint button: {}", err);
                hasher.update(format!("{:?}", resolved.button).as_bytes());
            }
        },
    }
    hasher.finalize().into()
}
