//! Best-record bookkeeping and rank tables
//!
//! One record per game under a fixed key. Read at startup, written at
//! round end only when something improved.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, load_json, save_json};
use crate::settings::StackVariant;
use crate::sim::RoundSummary;

/// Key for the rhythm game's record
pub const RHYTHM_RECORD_KEY: &str = "mochi_rhythm_record_v1";

/// Best score and combo ever reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestRecord {
    pub high_score: u64,
    pub max_combo: u32,
}

/// A record bound to its storage key
#[derive(Debug, Clone)]
pub struct RecordBook {
    key: &'static str,
    pub record: BestRecord,
}

impl RecordBook {
    /// Load the record, or start from zero if storage fails
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, key: &'static str) -> Self {
        let record = match load_json::<BestRecord, _>(store, key) {
            Ok(Some(record)) => {
                log::info!("Loaded record {}: best {}", key, record.high_score);
                record
            }
            Ok(None) => {
                log::info!("No record for {}, starting fresh", key);
                BestRecord::default()
            }
            Err(e) => {
                log::warn!("Failed to load record {} ({}), starting fresh", key, e);
                BestRecord::default()
            }
        };
        Self { key, record }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Fold a finished round into the record. Persists only if a field
    /// strictly improved; returns true on a new high score.
    pub fn submit<S: KeyValueStore + ?Sized>(&mut self, store: &mut S, summary: &RoundSummary) -> bool {
        let new_high = summary.score > self.record.high_score;
        let new_combo = summary.max_combo > self.record.max_combo;
        if !new_high && !new_combo {
            return false;
        }

        self.record.high_score = self.record.high_score.max(summary.score);
        self.record.max_combo = self.record.max_combo.max(summary.max_combo);

        match save_json(store, self.key, &self.record) {
            Ok(()) => log::info!(
                "Record {} saved (best {}, combo {})",
                self.key,
                self.record.high_score,
                self.record.max_combo
            ),
            // The in-memory record still counts for this session
            Err(e) => log::warn!("Failed to save record {}: {}", self.key, e),
        }
        new_high
    }
}

/// A named tier of achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub threshold: u64,
    pub name: &'static str,
}

const KAGAMIMOCHI_RANKS: &[Rank] = &[
    Rank { threshold: 0, name: "Zatou" },
    Rank { threshold: 10, name: "Tabako" },
    Rank { threshold: 20, name: "Ougi" },
    Rank { threshold: 30, name: "Nasu" },
    Rank { threshold: 50, name: "Taka" },
    Rank { threshold: 100, name: "Fuji" },
];

const TREE_RANKS: &[Rank] = &[
    Rank { threshold: 0, name: "Sapling" },
    Rank { threshold: 3, name: "Mini Tree" },
    Rank { threshold: 6, name: "Garden Tree" },
    Rank { threshold: 10, name: "Santa" },
    Rank { threshold: 15, name: "Giant Tree" },
    Rank { threshold: 20, name: "North Star" },
];

/// Ranks for a stacking variant, lowest threshold first
pub fn ranks(variant: StackVariant) -> &'static [Rank] {
    match variant {
        StackVariant::Kagamimochi => KAGAMIMOCHI_RANKS,
        StackVariant::Tree => TREE_RANKS,
    }
}

/// Highest rank whose threshold the score reaches
pub fn rank_for(variant: StackVariant, score: u64) -> Rank {
    let table = ranks(variant);
    table
        .iter()
        .rev()
        .find(|r| r.threshold <= score)
        .copied()
        .unwrap_or(table[0])
}
