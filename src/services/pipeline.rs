//! Page pipeline: from declared slots to render-ready keys.
//!
//! For every declared slot of a page the pipeline runs preset resolution,
//! the state override, template evaluation and visibility, then splits the
//! visible slots into sub-pages with the system buttons injected.

use super::presets::ConfigResolver;
use super::states::StateOverrideResolver;
use crate::config::{DeckConfig, SystemAction};
use crate::constants::ROOT_PAGE;
use crate::error::FieldIssue;
use crate::models::{ActionSpec, Button, EntitySnapshot, KeySize, StyleRecord, Visibility};
use crate::navigation::{paginate, Entry, Location, SystemPositions};
use crate::template::{self, TemplateContext};

/// A button ready to paint, with the problems met while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedButton {
    /// The final button
    pub button: Button,
    /// Recoverable template and color issues
    pub issues: Vec<FieldIssue>,
    /// Set for injected navigation buttons
    pub system: Option<SystemAction>,
}

/// What one key shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Nothing declared here
    Empty,
    /// A button with `visibility: hidden`
    Hidden,
    /// A visible button
    Button(Box<ResolvedButton>),
}

impl Slot {
    /// The button, if this slot shows one.
    #[must_use]
    pub fn button(&self) -> Option<&ResolvedButton> {
        match self {
            Self::Button(resolved) => Some(resolved),
            Self::Empty | Self::Hidden => None,
        }
    }
}

/// One sub-page, exactly `key_count` slots long.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    /// Page and sub-page shown (sub-page clamped to what exists)
    pub location: Location,
    /// Number of sub-pages the page currently splits into
    pub sub_page_count: usize,
    /// One entry per key
    pub slots: Vec<Slot>,
}

/// Builds page views for one config and panel size.
#[derive(Debug, Clone, Copy)]
pub struct PagePipeline<'a> {
    config: &'a DeckConfig,
    key_size: KeySize,
    key_count: usize,
}

impl<'a> PagePipeline<'a> {
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(config: &'a DeckConfig, key_size: KeySize, key_count: usize) -> Self {
        Self {
            config,
            key_size,
            key_count,
        }
    }

    /// Runs one declared button through resolve, override and templates.
    ///
    /// Returns `None` for `gone` buttons.
    #[must_use]
    pub fn build_button(&self, declared: &StyleRecord, snapshot: &EntitySnapshot) -> Option<Slot> {
        let resolver = ConfigResolver::new(self.config);
        let resolved = resolver.resolve(declared, snapshot);
        let overridden = StateOverrideResolver::new(resolver).apply(&resolved, snapshot);

        let ctx = TemplateContext::new(snapshot, overridden.entity_id.as_deref());
        let (templated, mut issues) =
            template::evaluate_record(&overridden, &resolver.defaults(), &ctx);

        let (button, asset_issues) = Button::from_style(&templated, self.key_size);
        issues.extend(asset_issues);

        match button.visibility {
            Visibility::Gone => None,
            Visibility::Hidden => Some(Slot::Hidden),
            Visibility::Visible => Some(Slot::Button(Box::new(ResolvedButton {
                button,
                issues,
                system: None,
            }))),
        }
    }

    /// Builds an injected navigation button.
    #[must_use]
    pub fn build_system_button(&self, action: SystemAction, snapshot: &EntitySnapshot) -> Slot {
        let style = self
            .config
            .system_button(action)
            .map(|system| system.button.clone())
            .unwrap_or_default();
        let declared = StyleRecord {
            tap_action: Some(ActionSpec::new(action.action_name())),
            hold_action: None,
            visibility: None,
            ..style
        };

        match self.build_button(&declared, snapshot) {
            Some(Slot::Button(mut resolved)) => {
                resolved.system = Some(action);
                Slot::Button(resolved)
            }
            // navigation must stay reachable even if a template hid it
            _ => {
                let (button, issues) = Button::from_style(
                    &ConfigResolver::new(self.config).resolve(&declared, snapshot),
                    self.key_size,
                );
                Slot::Button(Box::new(ResolvedButton {
                    button: Button {
                        visibility: Visibility::Visible,
                        ..button
                    },
                    issues,
                    system: Some(action),
                }))
            }
        }
    }

    /// Builds the view of `location`.
    ///
    /// An undeclared page yields an empty view; a sub-page past the end is
    /// clamped to the last one.
    #[must_use]
    pub fn page_view(&self, location: &Location, snapshot: &EntitySnapshot) -> PageView {
        let declared = self
            .config
            .page(&location.page)
            .map(|page| page.buttons.as_slice())
            .unwrap_or_default();

        let visible: Vec<Slot> = declared
            .iter()
            .filter_map(|slot| match slot {
                None => Some(Slot::Empty),
                Some(button) => self.build_button(button, snapshot),
            })
            .collect();

        let mut pages = paginate(
            visible,
            self.key_count,
            location.page == ROOT_PAGE,
            SystemPositions::from_config(self.config),
        );
        let sub_page_count = pages.len();
        let sub_page = location.sub_page.clamp(1, sub_page_count);

        let mut slots: Vec<Slot> = pages
            .swap_remove(sub_page - 1)
            .into_iter()
            .map(|entry| match entry {
                Entry::Declared(slot) => slot,
                Entry::System(action) => self.build_system_button(action, snapshot),
            })
            .collect();
        slots.resize(self.key_count, Slot::Empty);

        for (index, slot) in slots.iter().enumerate() {
            for issue in slot.button().map(|b| b.issues.as_slice()).unwrap_or_default() {
                tracing::warn!("page '{}' key {}: {}", location.page, index, issue);
            }
        }

        PageView {
            location: Location::new(location.page.clone(), sub_page),
            sub_page_count,
            slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Recoverable, TemplateError};
    use crate::models::{EntityState, LayerContent};

    const KEY: KeySize = KeySize::new(96, 96);

    fn config(yaml: &str) -> DeckConfig {
        DeckConfig::from_yaml_str(yaml).unwrap()
    }

    fn text_of(slot: &Slot) -> Option<String> {
        slot.button()?.button.layers.iter().find_map(|layer| match &layer.content {
            LayerContent::Text(text) => Some(text.text.clone()),
            LayerContent::Icon(_) => None,
        })
    }

    #[test]
    fn test_gone_shifts_left_and_hidden_keeps_slot() {
        let config = config(
            "pages:\n  $root:\n    buttons:\n      - text: A\n      - text: B\n        visibility: gone\n      - text: C\n        visibility: hidden\n      - null\n      - text: D\n",
        );
        let pipeline = PagePipeline::new(&config, KEY, 6);
        let view = pipeline.page_view(&Location::root(), &EntitySnapshot::new());

        assert_eq!(view.slots.len(), 6);
        assert_eq!(text_of(&view.slots[0]).as_deref(), Some("A"));
        assert_eq!(view.slots[1], Slot::Hidden);
        assert_eq!(view.slots[2], Slot::Empty);
        assert_eq!(text_of(&view.slots[3]).as_deref(), Some("D"));
        assert_eq!(view.slots[4], Slot::Empty);
    }

    #[test]
    fn test_templated_visibility_and_state() {
        let config = config(
            "pages:\n  $root:\n    buttons:\n      - entity_id: light.x\n        visibility: \"{{ 'visible' if self_is_state('on') else 'gone' }}\"\n        text: \"{{ self_states() }}\"\n      - text: after\n",
        );
        let pipeline = PagePipeline::new(&config, KEY, 3);

        let on = EntitySnapshot::from_states([EntityState::new("light.x", "on")]);
        let view = pipeline.page_view(&Location::root(), &on);
        assert_eq!(text_of(&view.slots[0]).as_deref(), Some("on"));

        let off = on.with_state(EntityState::new("light.x", "off"));
        let view = pipeline.page_view(&Location::root(), &off);
        assert_eq!(text_of(&view.slots[0]).as_deref(), Some("after"));
    }

    #[test]
    fn test_template_failure_reported_with_field() {
        let config = config(
            "pages:\n  $root:\n    buttons:\n      - text: \"{{ states('sensor.gone') }}\"\n        icon_color: \"{{ nope() }}\"\n",
        );
        let pipeline = PagePipeline::new(&config, KEY, 2);
        let view = pipeline.page_view(&Location::root(), &EntitySnapshot::new());
        let resolved = view.slots[0].button().unwrap();

        let fields: Vec<&str> = resolved.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["icon_color", "text"]);
        assert_eq!(
            resolved.issues[1].error,
            Recoverable::Template(TemplateError::UnknownEntity("sensor.gone".into()))
        );
        // text fell back to "no text", icon color to white
        assert_eq!(text_of(&view.slots[0]), None);
    }

    #[test]
    fn test_sub_page_with_system_buttons() {
        let config = config(
            "system_buttons:\n  $page.next:\n    position: 3\npages:\n  rooms:\n    buttons:\n      - text: a\n      - text: b\n      - text: c\n  $root:\n    buttons:\n      - tap_action:\n          action: $page.go_to\n          data: rooms\n",
        );
        let pipeline = PagePipeline::new(&config, KEY, 3);
        let snapshot = EntitySnapshot::new();

        let first = pipeline.page_view(&Location::new("rooms", 1), &snapshot);
        assert_eq!(first.sub_page_count, 2);
        assert_eq!(first.slots[0].button().unwrap().system, Some(SystemAction::Back));
        assert_eq!(text_of(&first.slots[1]).as_deref(), Some("a"));
        let next = first.slots[2].button().unwrap();
        assert_eq!(next.system, Some(SystemAction::Next));
        assert_eq!(
            next.button.tap_action.as_ref().unwrap().action,
            "$page.next"
        );

        let second = pipeline.page_view(&Location::new("rooms", 9), &snapshot);
        assert_eq!(second.location.sub_page, 2);
        assert_eq!(
            second.slots[0].button().unwrap().system,
            Some(SystemAction::Previous)
        );
        assert_eq!(text_of(&second.slots[1]).as_deref(), Some("b"));
        assert_eq!(text_of(&second.slots[2]).as_deref(), Some("c"));
    }
}
