//! Combo and score bookkeeping shared by both engines

use serde::{Deserialize, Serialize};

use super::judgment::Judgment;

/// Running combo plus its high-water mark
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboState {
    pub combo: u32,
    pub max_combo: u32,
}

impl ComboState {
    /// Extend the combo by one, raising the watermark if needed
    pub fn extend(&mut self) -> u32 {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.combo
    }

    pub fn reset(&mut self) {
        self.combo = 0;
    }
}

/// Per-tier judgment counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitStats {
    pub perfect: u32,
    pub great: u32,
    pub ok: u32,
    pub miss: u32,
}

impl HitStats {
    pub fn record(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Perfect => self.perfect += 1,
            Judgment::Great => self.great += 1,
            Judgment::Ok => self.ok += 1,
            Judgment::Miss => self.miss += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.great + self.ok + self.miss
    }
}

/// Score, combo and tier counts for one rhythm round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub combo: ComboState,
    pub stats: HitStats,
}

impl Scoreboard {
    /// Apply a judgment: hits score one point and extend the combo,
    /// misses reset it. Score never goes down.
    pub fn apply(&mut self, judgment: Judgment) {
        self.stats.record(judgment);
        if judgment.is_hit() {
            self.combo.extend();
            self.score += 1;
        } else {
            self.combo.reset();
        }
    }
}
