//! Game tuning and preferences
//!
//! Persisted as JSON through a `KeyValueStore`. Missing fields take their
//! defaults, so older saves keep loading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::persistence::{KeyValueStore, load_json, save_json};
use crate::sim::judgment::{JudgmentWindows, WindowError};
use crate::sim::rhythm::WrongLanePolicy;

pub use crate::sim::chart::Tempo;

/// Stacking game presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StackVariant {
    /// Rounded rice cakes of constant width
    #[default]
    Kagamimochi,
    /// Tree layers that narrow every placement, cycling every ten
    Tree,
}

impl StackVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackVariant::Kagamimochi => "kagamimochi",
            StackVariant::Tree => "tree",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kagamimochi" | "mochi" => Some(StackVariant::Kagamimochi),
            "tree" => Some(StackVariant::Tree),
            _ => None,
        }
    }

    /// Tuning for this variant
    pub fn settings(&self) -> StackSettings {
        let base = StackSettings::default();
        match self {
            StackVariant::Kagamimochi => StackSettings {
                body_width: 140.0,
                width_step: 0.0,
                min_width: 140.0,
                // Half the play area, less half a body, plus slack
                max_offset: PLAY_AREA_WIDTH / 2.0 - 140.0 / 2.0 + 20.0,
                // Sweep edge stays inside max_offset
                play_area_margin: 140.0 / 2.0 + 20.0,
                ..base
            },
            StackVariant::Tree => StackSettings {
                body_width: 260.0,
                width_step: 15.0,
                min_width: 100.0,
                max_offset: PLAY_AREA_WIDTH / 2.0 - 20.0,
                ..base
            },
        }
    }

    /// High-score key for this variant
    pub fn record_key(&self) -> &'static str {
        match self {
            StackVariant::Kagamimochi => "kagamimochi_record_v1",
            StackVariant::Tree => "treestack_record_v1",
        }
    }
}

/// Rhythm game tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmSettings {
    pub tempo: Tempo,
    pub windows: JudgmentWindows,
    pub wrong_lane: WrongLanePolicy,
}

impl Default for RhythmSettings {
    fn default() -> Self {
        Self {
            tempo: Tempo::Middle,
            windows: JudgmentWindows::default(),
            wrong_lane: WrongLanePolicy::Consume,
        }
    }
}

/// Stacking game tuning (px, ms, physics units per step)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSettings {
    // === Rest detection ===
    pub linear_eps: f32,
    pub angular_eps: f32,
    pub settled_duration_ms: f64,
    pub settle_initial_delay_ms: f64,
    pub settle_poll_interval_ms: f64,

    // === Placement tiers ===
    pub perfect_offset: f32,
    pub great_offset: f32,
    /// Placements further out than this end the round
    pub max_offset: f32,

    // === Failure lines (below the base bottom) ===
    pub settle_fail_margin: f32,
    pub collapse_margin: f32,
    pub dropping_fall_margin: f32,

    // === Bodies ===
    pub body_width: f32,
    pub body_height: f32,
    /// Width lost per placement within a ten-placement cycle
    pub width_step: f32,
    pub min_width: f32,
    pub drop_count: f32,
    pub release_speed: f32,

    // === Sweep ===
    pub play_area_width: f32,
    pub play_area_margin: f32,
    pub base_move_speed: f32,
    pub move_speed_per_point: f32,
    pub max_move_speed: f32,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            linear_eps: LINEAR_EPS,
            angular_eps: ANGULAR_EPS,
            settled_duration_ms: SETTLED_DURATION_MS,
            settle_initial_delay_ms: SETTLE_INITIAL_DELAY_MS,
            settle_poll_interval_ms: SETTLE_POLL_INTERVAL_MS,

            perfect_offset: PERFECT_OFFSET,
            great_offset: GREAT_OFFSET,
            max_offset: 150.0,

            settle_fail_margin: SETTLE_FAIL_MARGIN,
            collapse_margin: COLLAPSE_MARGIN,
            dropping_fall_margin: DROPPING_FALL_MARGIN,

            body_width: 140.0,
            body_height: 50.0,
            width_step: 0.0,
            min_width: 140.0,
            drop_count: DROP_COUNT,
            release_speed: RELEASE_SPEED,

            play_area_width: PLAY_AREA_WIDTH,
            play_area_margin: PLAY_AREA_MARGIN,
            base_move_speed: BASE_MOVE_SPEED,
            move_speed_per_point: MOVE_SPEED_PER_POINT,
            max_move_speed: MAX_MOVE_SPEED,
        }
    }
}

impl StackSettings {
    /// Width of the next body given the current score
    pub fn body_width_for(&self, score: u64) -> f32 {
        let cycle = (score % 10) as f32;
        (self.body_width - cycle * self.width_step).max(self.min_width)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.perfect_offset > 0.0
            && self.perfect_offset < self.great_offset
            && self.great_offset <= self.max_offset)
        {
            return Err(SettingsError::Stack("offset tiers must increase"));
        }
        if !(self.linear_eps >= 0.0 && self.angular_eps >= 0.0) {
            return Err(SettingsError::Stack("rest thresholds must be non-negative"));
        }
        if !(self.settle_poll_interval_ms > 0.0) {
            return Err(SettingsError::Stack("poll interval must be positive"));
        }
        if !(self.collapse_margin >= self.settle_fail_margin) {
            return Err(SettingsError::Stack("collapse line must sit below the settle line"));
        }
        Ok(())
    }
}

/// Rejected configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Windows(#[from] WindowError),
    #[error("invalid stack settings: {0}")]
    Stack(&'static str),
}

/// All game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub rhythm: RhythmSettings,
    pub stack_variant: StackVariant,
    /// Overrides for the variant preset; `None` uses the preset as-is
    pub stack: Option<StackSettings>,
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "mochi_arcade_settings";

    /// Effective stacking tuning
    pub fn stack_settings(&self) -> StackSettings {
        self.stack.unwrap_or_else(|| self.stack_variant.settings())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.rhythm.windows.validate()?;
        self.stack_settings().validate()
    }

    /// Load settings, falling back to defaults on any problem
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match load_json::<Settings, _>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => match settings.validate() {
                Ok(()) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(e) => {
                    log::warn!("Stored settings rejected ({e}), using defaults");
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        match save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {e}"),
        }
    }
}
