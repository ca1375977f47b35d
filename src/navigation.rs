//! Page navigation: the visited-page stack and sub-page splitting.
//!
//! A page with more visible buttons than the panel has keys is split into
//! sub-pages. While splitting, the system buttons are inserted at their
//! configured positions: back on the first sub-page of any page but the
//! root, previous on every later sub-page and next wherever buttons remain.

use crate::config::{DeckConfig, SystemAction};
use crate::constants::ROOT_PAGE;
use crate::error::ActionError;

/// Current location: page name and 1-based sub-page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Page name
    pub page: String,
    /// 1-based sub-page number
    pub sub_page: usize,
}

impl Location {
    /// Creates a location.
    pub fn new(page: impl Into<String>, sub_page: usize) -> Self {
        Self {
            page: page.into(),
            sub_page,
        }
    }

    /// `($root, 1)`.
    #[must_use]
    pub fn root() -> Self {
        Self::new(ROOT_PAGE, 1)
    }
}

/// Runtime navigation state, owned by the deck loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationContext {
    current: Location,
    stack: Vec<Location>,
}

impl Default for NavigationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationContext {
    /// Starts at the root page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Location::root(),
            stack: vec![Location::root()],
        }
    }

    /// Where the panel is now.
    #[must_use]
    pub const fn current(&self) -> &Location {
        &self.current
    }

    /// Number of entries on the visited stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Pushes `target` and moves to its first sub-page.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnknownPage`] if the page is not declared.
    pub fn go_to(&mut self, config: &DeckConfig, target: &str) -> Result<(), ActionError> {
        if !config.has_page(target) {
            return Err(ActionError::UnknownPage(target.to_string()));
        }
        let location = Location::new(target, 1);
        self.stack.push(location.clone());
        self.current = location;
        tracing::debug!("navigated to page '{}'", target);
        Ok(())
    }

    /// Pops the current page and returns to the one below it, or to the
    /// root when the stack runs out. Returns whether the location changed.
    pub fn back(&mut self) -> bool {
        self.stack.pop();
        let target = self.stack.last().cloned().unwrap_or_else(Location::root);
        let changed = target != self.current;
        self.current = target;
        changed
    }

    /// Moves to the previous sub-page; no-op on the first.
    pub fn previous(&mut self) -> bool {
        if self.current.sub_page <= 1 {
            return false;
        }
        self.set_sub_page(self.current.sub_page - 1);
        true
    }

    /// Moves to the next sub-page; no-op on the last of `sub_page_count`.
    pub fn next(&mut self, sub_page_count: usize) -> bool {
        if self.current.sub_page >= sub_page_count {
            return false;
        }
        self.set_sub_page(self.current.sub_page + 1);
        true
    }

    /// Keeps the sub-page inside `1..=sub_page_count`, e.g. after buttons
    /// disappeared. Returns whether it moved.
    pub fn clamp_sub_page(&mut self, sub_page_count: usize) -> bool {
        let clamped = self.current.sub_page.clamp(1, sub_page_count.max(1));
        if clamped == self.current.sub_page {
            return false;
        }
        self.set_sub_page(clamped);
        true
    }

    fn set_sub_page(&mut self, sub_page: usize) {
        self.current.sub_page = sub_page;
        match self.stack.last_mut() {
            Some(top) if top.page == self.current.page => top.sub_page = sub_page,
            _ => self.stack.push(self.current.clone()),
        }
    }
}

/// One key of a paginated page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<T> {
    /// A slot declared on the page
    Declared(T),
    /// An injected navigation button
    System(SystemAction),
}

/// Configured 1-based positions of the system buttons; 0 disables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemPositions {
    /// Back button
    pub back: usize,
    /// Previous sub-page button
    pub previous: usize,
    /// Next sub-page button
    pub next: usize,
}

impl SystemPositions {
    /// Reads the positions from a config.
    #[must_use]
    pub fn from_config(config: &DeckConfig) -> Self {
        let position = |action| {
            config
                .system_button(action)
                .map_or(0, |system| system.position as usize)
        };
        Self {
            back: position(SystemAction::Back),
            previous: position(SystemAction::Previous),
            next: position(SystemAction::Next),
        }
    }
}

/// Splits `items` into sub-pages of `key_count` keys, inserting system
/// buttons. Always returns at least one (possibly empty) sub-page.
///
/// A position past the last key is clamped to the last key. Previous and
/// Next are left out of a sub-page when they would fill every key, so a
/// panel with one or two keys still lists every declared entry.
#[must_use]
pub fn paginate<T>(
    items: Vec<T>,
    key_count: usize,
    is_root: bool,
    positions: SystemPositions,
) -> Vec<Vec<Entry<T>>> {
    let key_count = key_count.max(1);
    let mut list: Vec<Entry<T>> = items.into_iter().map(Entry::Declared).collect();

    let insert = |list: &mut Vec<Entry<T>>, start: usize, position: usize, action| {
        let index = (start + position.min(key_count) - 1).min(list.len());
        list.insert(index, Entry::System(action));
    };

    let mut start = 0;
    let mut number = 1;
    loop {
        let mut reserved = 0;
        if !is_root && number == 1 && positions.back > 0 {
            insert(&mut list, start, positions.back, SystemAction::Back);
            reserved += 1;
        }
        // paging buttons must leave a key for a declared entry
        if number > 1 && positions.previous > 0 && reserved + 1 < key_count {
            insert(&mut list, start, positions.previous, SystemAction::Previous);
            reserved += 1;
        }
        if start + key_count < list.len() && positions.next > 0 && reserved + 1 < key_count {
            insert(&mut list, start, positions.next, SystemAction::Next);
        }

        start += key_count;
        number += 1;
        if start >= list.len() {
            break;
        }
    }

    let mut pages = Vec::new();
    let mut rest = list.into_iter().peekable();
    while rest.peek().is_some() {
        pages.push(rest.by_ref().take(key_count).collect());
    }
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}
