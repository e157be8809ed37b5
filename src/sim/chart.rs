//! Notes, lanes and seeded chart generation

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::RngState;
use crate::consts::{CHART_LEAD_IN_MS, CHART_TAIL_MS};

/// Input lane. Two classes per game: the mallet pound and the hand turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Right,
}

impl Lane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Right => "right",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "left" | "kine" | "f" => Some(Lane::Left),
            "right" | "hand" | "j" => Some(Lane::Right),
            _ => None,
        }
    }
}

/// Lifecycle of a single note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteStatus {
    Pending,
    Hit,
    Missed,
}

/// A scheduled target event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Target time (ms since song start)
    pub time_ms: f64,
    pub lane: Lane,
    pub status: NoteStatus,
}

impl Note {
    pub fn new(time_ms: f64, lane: Lane) -> Self {
        Self {
            time_ms,
            lane,
            status: NoteStatus::Pending,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == NoteStatus::Pending
    }
}

/// Song tempo presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tempo {
    #[default]
    Middle,
    High,
}

impl Tempo {
    pub fn bpm(&self) -> f64 {
        match self {
            Tempo::Middle => 120.0,
            Tempo::High => 170.0,
        }
    }

    /// Length of the backing track
    pub fn track_ms(&self) -> f64 {
        match self {
            Tempo::Middle => 207_000.0,
            Tempo::High => 193_000.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tempo::Middle => "middle",
            Tempo::High => "high",
        }
    }
}

/// Odds that a Right beat becomes a rest
const REST_CHANCE: f64 = 0.05;
/// Odds that a Left beat gets a half-beat follow-up
const DOUBLE_CHANCE: f64 = 0.15;

/// Generate a chart at a fixed tempo. Same seed, same chart.
pub fn generate_chart(bpm: f64, track_ms: f64, rng_state: &RngState) -> Vec<Note> {
    let mut rng = rng_state.to_rng();
    let beat_ms = 60_000.0 / bpm;
    let end_ms = track_ms - CHART_TAIL_MS;

    let mut notes = Vec::new();
    let mut left = true;
    let mut t = CHART_LEAD_IN_MS;
    while t < end_ms {
        if !left && rng.random_bool(REST_CHANCE) {
            left = true;
            t += beat_ms;
            continue;
        }
        notes.push(Note::new(t, if left { Lane::Left } else { Lane::Right }));
        if left && rng.random_bool(DOUBLE_CHANCE) {
            notes.push(Note::new(t + beat_ms / 2.0, Lane::Left));
        }
        left = !left;
        t += beat_ms;
    }

    // Schedule order
    notes.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
    notes
}

/// Generate the chart for a tempo preset
pub fn chart_for_tempo(tempo: Tempo, rng_state: &RngState) -> Vec<Note> {
    generate_chart(tempo.bpm(), tempo.track_ms(), rng_state)
}
