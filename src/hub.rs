//! Seam to the home-automation hub.
//!
//! The hub client lives outside this crate. It publishes entity snapshots on
//! a `watch` channel and receives service calls on an `mpsc` channel.

use crate::error::ActionError;
use crate::models::EntitySnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// A hub service call, e.g. `light.toggle` with `{"entity_id": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    /// Service domain (`light`)
    pub domain: String,
    /// Service name (`toggle`)
    pub service: String,
    /// Payload forwarded unchanged
    pub data: Option<serde_json::Value>,
}

impl ServiceCall {
    /// Splits `domain.service`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Unknown`] when the name has no dot or an
    /// empty half.
    pub fn parse(action: &str, data: Option<serde_json::Value>) -> Result<Self, ActionError> {
        match action.split_once('.') {
            Some((domain, service)) if !domain.is_empty() && !service.is_empty() => Ok(Self {
                domain: domain.to_string(),
                service: service.to_string(),
                data,
            }),
            _ => Err(ActionError::Unknown(action.to_string())),
        }
    }
}

/// Snapshot stream from the hub.
pub type SnapshotReceiver = watch::Receiver<Arc<EntitySnapshot>>;

/// Snapshot publisher held by the hub client.
pub type SnapshotSender = watch::Sender<Arc<EntitySnapshot>>;

/// Service calls towards the hub.
pub type ServiceSender = mpsc::Sender<ServiceCall>;

/// Creates the snapshot channel with an initial snapshot.
#[must_use]
pub fn snapshot_channel(initial: EntitySnapshot) -> (SnapshotSender, SnapshotReceiver) {
    watch::channel(Arc::new(initial))
}
