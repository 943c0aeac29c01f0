//! # Prajna Core Library
//!
//! This library provides the core logic for the Prajna meditation timer and
//! journal. The CLI binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer**: A wall-clock-based state machine (open-ended, countdown and
//!   overtime) that the caller drives with `tick()` while it is visible
//! - **Recovery**: A snapshot of a running session kept in a key-value store
//!   so a killed process can offer the session back on the next start
//! - **Storage**: SQLite-based sessions, tags and goals, plus TOML-based
//!   configuration
//! - **Goals and stats**: Pure computations over logged sessions: goal
//!   progress against a linear pace, totals and day streaks
//!
//! ## Key Components
//!
//! - [`MeditationTimer`]: Core timer state machine
//! - [`Database`]: Session, tag and goal persistence
//! - [`Config`]: Application configuration management
//! - [`TimerNotifier`]: Trait for alarm and live-status side effects

pub mod error;
pub mod events;
pub mod goals;
pub mod model;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod validation;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use goals::{ExpectedStatus, Goal, GoalInput, GoalProgress, GoalWithProgress, PeriodType};
pub use model::{NewSession, Session, SessionSource, SessionUpdate, SessionWithTags, Tag};
pub use notify::{NoopNotifier, TimerNotifier};
pub use stats::{calculate_streaks, SessionStats, Streaks, TagBreakdown, WeekStart};
pub use storage::{Config, Database};
pub use timer::{
    AppLifecycle, Clock, KvStore, ManualClock, MeditationTimer, SystemClock, TimerMode,
    TimerOptions, TimerPhase,
};
