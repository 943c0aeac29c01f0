//! Foreground/background signal and the display tick gate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Two-state app lifecycle delivered by the platform (or the CLI loop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycle {
    #[default]
    Foreground,
    Background,
}

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Gate for the periodic display refresh.
///
/// The tick only runs while a session is running and the app is in the
/// foreground. It is a refresh, never the source of truth for elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTicker {
    interval: Duration,
    active: bool,
}

impl DisplayTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            active: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Re-evaluate the gate from the timer's running flag and lifecycle.
    pub fn sync(&mut self, running: bool, lifecycle: AppLifecycle) {
        self.active = running && lifecycle == AppLifecycle::Foreground;
    }
}

impl Default for DisplayTicker {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}
