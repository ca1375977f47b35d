//! Per-entity-state overrides.

use super::presets::{bind_action, ConfigResolver};
use crate::models::{EntitySnapshot, StyleRecord};

/// Applies the `states` entry matching the bound entity's current state.
#[derive(Debug, Clone, Copy)]
pub struct StateOverrideResolver<'a> {
    presets: ConfigResolver<'a>,
}

impl<'a> StateOverrideResolver<'a> {
    /// Creates a resolver; override `presets` are looked up through `presets`.
    #[must_use]
    pub const fn new(presets: ConfigResolver<'a>) -> Self {
        Self { presets }
    }

    /// Returns the override for the entity's current state, with its own
    /// presets merged underneath it.
    #[must_use]
    pub fn matching_override(
        &self,
        resolved: &StyleRecord,
        snapshot: &EntitySnapshot,
    ) -> Option<StyleRecord> {
        let state = snapshot.state_of(resolved.entity_id.as_deref()?)?;
        let over = resolved.states.as_ref()?.get(state)?;
        let names = over.presets.as_ref().map(|p| p.names()).unwrap_or_default();
        let mut layered = self
            .presets
            .apply_presets(&StyleRecord::default(), &names)
            .merged_with(over);
        layered.presets = None;
        Some(layered)
    }

    /// Merges the matching override onto `resolved`; returns it unchanged
    /// when there is no entity, no state or no matching key.
    ///
    /// Hub actions coming from the override get the bound `entity_id`
    /// like the button's own actions do.
    #[must_use]
    pub fn apply(&self, resolved: &StyleRecord, snapshot: &EntitySnapshot) -> StyleRecord {
        match self.matching_override(resolved, snapshot) {
            Some(over) => {
                tracing::trace!("state override for {:?}", resolved.entity_id);
                let mut merged = resolved.merged_with(&over);
                let entity_id = merged.entity_id.clone();
                merged.tap_action = merged
                    .tap_action
                    .take()
                    .map(|action| bind_action(action, entity_id.as_deref()));
                merged.hold_action = merged
                    .hold_action
                    .take()
                    .map(|action| bind_action(action, entity_id.as_deref()));
                merged
            }
            None => resolved.clone(),
        }
    }
}
