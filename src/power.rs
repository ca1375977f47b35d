//! Inactivity dimming and sleep.
//!
//! `active → dim → sleep`, driven by wall-clock idle time. Dim happens
//! `dim_timeout` seconds after the last press, sleep a further
//! `sleep_timeout` seconds later. A zero timeout disables its stage.

use crate::config::DeckConfig;
use std::time::{Duration, Instant};

/// Power level of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerState {
    /// Full brightness
    #[default]
    Active,
    /// Dimmed after inactivity
    Dim,
    /// Backlight off
    Sleep,
}

/// What a press did to the power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The panel was already active
    AlreadyActive,
    /// Woke from dim; the press is dispatched as usual
    FromDim,
    /// Woke from sleep; the press is consumed and the page redrawn
    FromSleep,
}

impl Wake {
    /// Whether the press should still trigger its button action.
    #[must_use]
    pub const fn dispatch_press(self) -> bool {
        !matches!(self, Self::FromSleep)
    }
}

/// Timer-driven brightness state, owned by the deck loop.
#[derive(Debug, Clone)]
pub struct PowerStateMachine {
    state: PowerState,
    last_activity: Instant,
    brightness: u8,
    dim_brightness: u8,
    dim_timeout: Duration,
    sleep_timeout: Duration,
}

impl PowerStateMachine {
    /// Starts active, with `now` as the last activity.
    #[must_use]
    pub fn new(config: &DeckConfig, now: Instant) -> Self {
        Self {
            state: PowerState::Active,
            last_activity: now,
            brightness: config.brightness,
            dim_brightness: config.sleep.dim_brightness.min(config.brightness),
            dim_timeout: Duration::from_secs(config.sleep.dim_timeout),
            sleep_timeout: Duration::from_secs(config.sleep.sleep_timeout),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PowerState {
        self.state
    }

    /// Brightness the panel should be at in the current state.
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        match self.state {
            PowerState::Active => self.brightness,
            PowerState::Dim => self.dim_brightness,
            PowerState::Sleep => 0,
        }
    }

    /// Whether the panel is asleep (state changes are not redrawn).
    #[must_use]
    pub fn is_asleep(&self) -> bool {
        self.state == PowerState::Sleep
    }

    /// Advances the timers. Returns the new brightness on a transition.
    pub fn tick(&mut self, now: Instant) -> Option<u8> {
        if self.state == PowerState::Sleep {
            return None;
        }
        let idle = now.saturating_duration_since(self.last_activity);

        let next = if !self.sleep_timeout.is_zero() && idle >= self.dim_timeout + self.sleep_timeout {
            PowerState::Sleep
        } else if !self.dim_timeout.is_zero()
            && self.state == PowerState::Active
            && idle >= self.dim_timeout
        {
            PowerState::Dim
        } else {
            return None;
        };

        tracing::debug!("power {:?} -> {:?} after {:?} idle", self.state, next, idle);
        self.state = next;
        Some(self.brightness())
    }

    /// Records a press: back to active and the idle timer restarts.
    pub fn on_activity(&mut self, now: Instant) -> Wake {
        self.last_activity = now;
        let wake = match self.state {
            PowerState::Active => Wake::AlreadyActive,
            PowerState::Dim => Wake::FromDim,
            PowerState::Sleep => Wake::FromSleep,
        };
        if wake != Wake::AlreadyActive {
            tracing::debug!("power {:?} -> Active", self.state);
        }
        self.state = PowerState::Active;
        wake
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(dim: u64, sleep: u64) -> (PowerStateMachine, Instant) {
        let config = DeckConfig::from_yaml_str(&format!(
            "brightness: 80\nsleep:\n  dim_brightness: 10\n  dim_timeout: {dim}\n  sleep_timeout: {sleep}\n"
        ))
        .unwrap();
        let start = Instant::now();
        (PowerStateMachine::new(&config, start), start)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_dim_then_sleep() {
        let (mut power, t0) = machine(30, 300);
        assert_eq!(power.tick(t0 + secs(29)), None);
        assert_eq!(power.tick(t0 + secs(30)), Some(10));
        assert_eq!(power.state(), PowerState::Dim);
        assert_eq!(power.tick(t0 + secs(100)), None);
        assert_eq!(power.tick(t0 + secs(330)), Some(0));
        assert!(power.is_asleep());
        assert_eq!(power.tick(t0 + secs(1000)), None);
    }

    #[test]
    fn test_press_wakes() {
        let (mut power, t0) = machine(30, 300);
        power.tick(t0 + secs(30));
        assert_eq!(power.on_activity(t0 + secs(40)), Wake::FromDim);
        assert_eq!(power.brightness(), 80);
        assert!(Wake::FromDim.dispatch_press());

        // idle timer restarted at 40s
        assert_eq!(power.tick(t0 + secs(60)), None);
        assert_eq!(power.tick(t0 + secs(370)), Some(0));
        let wake = power.on_activity(t0 + secs(400));
        assert_eq!(wake, Wake::FromSleep);
        assert!(!wake.dispatch_press());
        assert_eq!(power.state(), PowerState::Active);
    }

    #[test]
    fn test_zero_timeouts_disable_stages() {
        let (mut power, t0) = machine(0, 0);
        assert_eq!(power.tick(t0 + secs(100_000)), None);

        let (mut power, t0) = machine(0, 60);
        assert_eq!(power.tick(t0 + secs(59)), None);
        assert_eq!(power.tick(t0 + secs(60)), Some(0));

        let (mut power, t0) = machine(20, 0);
        assert_eq!(power.tick(t0 + secs(20)), Some(10));
        assert_eq!(power.tick(t0 + secs(100_000)), None);
    }

    #[test]
    fn test_sleep_straight_from_active() {
        let (mut power, t0) = machine(30, 300);
        // a long gap between ticks skips the dim stage
        assert_eq!(power.tick(t0 + secs(400)), Some(0));
    }
}
