//! Point-in-time view of hub entity states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State of one hub entity, in the shape the hub's state API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Entity identifier, e.g. `light.kitchen`
    pub entity_id: String,
    /// Current state value, e.g. `on`, `21.5`, `unavailable`
    pub state: String,
    /// Entity attributes (`friendly_name`, `icon`, `device_class`, ...)
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// When the state value last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
}

impl EntityState {
    /// Creates a state without attributes.
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: serde_json::Map::new(),
            last_changed: None,
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Returns a string attribute, if present and a string.
    #[must_use]
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Immutable mapping from entity id to state.
///
/// The hub client builds a new snapshot for every change and hands it over
/// as an `Arc`; the render path never mutates one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySnapshot {
    entities: HashMap<String, EntityState>,
}

impl EntitySnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from a list of states; later duplicates win.
    #[must_use]
    pub fn from_states(states: impl IntoIterator<Item = EntityState>) -> Self {
        Self {
            entities: states
                .into_iter()
                .map(|state| (state.entity_id.clone(), state))
                .collect(),
        }
    }

    /// Parses the hub's JSON state list (`[{"entity_id": ..., "state": ...}]`).
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let states: Vec<EntityState> = serde_json::from_str(json)?;
        Ok(Self::from_states(states))
    }

    /// Returns a copy of this snapshot with one entity replaced.
    #[must_use]
    pub fn with_state(&self, state: EntityState) -> Self {
        let mut entities = self.entities.clone();
        entities.insert(state.entity_id.clone(), state);
        Self { entities }
    }

    /// Looks up an entity.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.entities.get(entity_id)
    }

    /// Current state value of an entity.
    #[must_use]
    pub fn state_of(&self, entity_id: &str) -> Option<&str> {
        self.get(entity_id).map(|e| e.state.as_str())
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when no entities are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
