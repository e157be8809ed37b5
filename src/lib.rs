//! Mochi Arcade - judgment and settling cores for small arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rhythm judgment, stack settling, round state)
//! - `persistence`: Key-value storage backends (memory, LocalStorage on web)
//! - `highscores`: Best-record bookkeeping and rank tables
//! - `settings`: Data-driven game tuning with presets

pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use highscores::{BestRecord, Rank, RecordBook};
pub use persistence::{KeyValueStore, MemoryStore, StorageError};
pub use settings::{RhythmSettings, Settings, SettingsError, StackSettings, StackVariant, Tempo};

/// Game configuration constants
pub mod consts {
    /// Default judgment windows (ms, absolute difference bounds)
    pub const PERFECT_WINDOW_MS: f64 = 70.0;
    pub const GREAT_WINDOW_MS: f64 = 120.0;
    pub const OK_WINDOW_MS: f64 = 170.0;
    pub const MISS_WINDOW_MS: f64 = 240.0;

    /// First note of a generated chart
    pub const CHART_LEAD_IN_MS: f64 = 3000.0;
    /// Charts stop this long before the track ends
    pub const CHART_TAIL_MS: f64 = 5000.0;
    /// Round ends this long after the last note
    pub const SONG_END_GRACE_MS: f64 = 2000.0;

    /// Rest thresholds (physics units per step)
    pub const LINEAR_EPS: f32 = 0.3;
    pub const ANGULAR_EPS: f32 = 0.02;
    /// Rest must hold continuously for this long
    pub const SETTLED_DURATION_MS: f64 = 100.0;
    /// Delay between landing and the first rest poll
    pub const SETTLE_INITIAL_DELAY_MS: f64 = 100.0;
    pub const SETTLE_POLL_INTERVAL_MS: f64 = 50.0;

    /// Horizontal offset tiers (px)
    pub const PERFECT_OFFSET: f32 = 10.0;
    pub const GREAT_OFFSET: f32 = 30.0;

    /// Lines below the base bottom (screen y grows downward)
    pub const SETTLE_FAIL_MARGIN: f32 = 20.0;
    pub const COLLAPSE_MARGIN: f32 = 50.0;
    pub const DROPPING_FALL_MARGIN: f32 = 100.0;

    /// Downward velocity seeded on release
    pub const RELEASE_SPEED: f32 = 5.0;

    /// Oscillation speed (px per tick)
    pub const BASE_MOVE_SPEED: f32 = 4.0;
    pub const MOVE_SPEED_PER_POINT: f32 = 0.2;
    pub const MAX_MOVE_SPEED: f32 = 12.0;

    /// Sweep area, centered on the target
    pub const PLAY_AREA_WIDTH: f32 = 400.0;
    /// Tree margin; the mochi preset widens it to half a body plus 20
    pub const PLAY_AREA_MARGIN: f32 = 40.0;

    /// Spawn height above the topmost member, in body heights
    pub const DROP_COUNT: f32 = 5.0;

    /// Screen shake decay per tick
    pub const SHAKE_DECAY: f32 = 0.9;
    pub const SHAKE_CUTOFF: f32 = 0.5;
}

/// Horizontal distance between two x positions
#[inline]
pub fn horizontal_offset(x: f32, center_x: f32) -> f32 {
    (x - center_x).abs()
}
