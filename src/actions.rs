//! Tap and hold actions.
//!
//! `$page.*` actions become navigation for the deck loop to apply,
//! `$system.exec` spawns a shell command and anything of the form
//! `domain.service` is forwarded to the hub.

use crate::error::ActionError;
use crate::hub::{ServiceCall, ServiceSender};
use crate::models::ActionSpec;
use tokio::sync::mpsc::error::TrySendError;

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// `$page.go_to` with the target page
    GoTo(String),
    /// `$page.back`
    Back,
    /// `$page.previous`
    Previous,
    /// `$page.next`
    Next,
}

/// A parsed action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Page navigation
    Navigate(Navigation),
    /// Shell command
    Exec(String),
    /// Hub service call
    Service(ServiceCall),
}

impl Action {
    /// Interprets an action spec.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Unknown`] for unsupported names and
    /// [`ActionError::InvalidData`] when a `$` action lacks its string
    /// payload.
    pub fn parse(spec: &ActionSpec) -> Result<Self, ActionError> {
        let text_data = || {
            spec.data
                .as_ref()
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };

        match spec.action.as_str() {
            "$page.go_to" => text_data()
                .map(|page| Self::Navigate(Navigation::GoTo(page)))
                .ok_or_else(|| ActionError::InvalidData {
                    action: spec.action.clone(),
                    expected: "a page name",
                }),
            "$page.back" => Ok(Self::Navigate(Navigation::Back)),
            "$page.previous" => Ok(Self::Navigate(Navigation::Previous)),
            "$page.next" => Ok(Self::Navigate(Navigation::Next)),
            "$system.exec" => text_data()
                .map(Self::Exec)
                .ok_or_else(|| ActionError::InvalidData {
                    action: spec.action.clone(),
                    expected: "a command string",
                }),
            name if name.starts_with('$') => Err(ActionError::Unknown(name.to_string())),
            name => ServiceCall::parse(name, spec.data.clone()).map(Self::Service),
        }
    }
}

/// Routes actions: hub calls and commands are sent off, navigation is
/// handed back to the caller.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    hub: ServiceSender,
}

impl ActionDispatcher {
    /// Creates a dispatcher sending service calls to `hub`.
    #[must_use]
    pub const fn new(hub: ServiceSender) -> Self {
        Self { hub }
    }

    /// Performs `spec`. Returns the navigation to apply, if any.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionError`] from parsing; the caller logs it and
    /// carries on.
    pub fn dispatch(&self, spec: &ActionSpec) -> Result<Option<Navigation>, ActionError> {
        match Action::parse(spec)? {
            Action::Navigate(navigation) => Ok(Some(navigation)),
            Action::Exec(command) => {
                spawn_command(&command);
                Ok(None)
            }
            Action::Service(call) => {
                tracing::debug!("calling {}.{}", call.domain, call.service);
                match self.hub.try_send(call) {
                    Ok(()) => {}
                    Err(TrySendError::Full(call)) => {
                        tracing::warn!("hub queue full, dropping {}.{}", call.domain, call.service);
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::warn!("hub connection closed, service call dropped");
                    }
                }
                Ok(None)
            }
        }
    }
}

/// Starts `command` through the platform shell without waiting for it.
fn spawn_command(command: &str) {
    #[cfg(windows)]
    let mut process = {
        let mut process = tokio::process::Command::new("cmd");
        process.arg("/C").arg(command);
        process
    };
    #[cfg(not(windows))]
    let mut process = {
        let mut process = tokio::process::Command::new("sh");
        process.arg("-c").arg(command);
        process
    };

    match process.spawn() {
        Ok(mut child) => {
            tracing::info!("started command: {}", command);
            tokio::spawn(async move {
                if let Err(err) = child.wait().await {
                    tracing::warn!("command failed: {}", err);
                }
            });
        }
        Err(err) => tracing::warn!("failed to start command '{}': {}", command, err),
    }
}
