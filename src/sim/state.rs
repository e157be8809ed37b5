//! Round lifecycle, emitted events and RNG state
//!
//! Engines never throw: every outcome the presentation layer cares about
//! is pushed as a `RoundEvent` and drained once per frame.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::chart::Lane;
use super::judgment::Judgment;
use super::physics::BodyId;
use super::score::HitStats;
use super::stack::PlacementTier;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Created, waiting for `start`
    Ready,
    /// Active gameplay
    Playing,
    /// Round ended; every further call is a no-op
    GameOver,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EndReason {
    /// Every note resolved and the grace period elapsed
    SongFinished,
    /// Settled too far from the target center
    Misplaced { offset: f32 },
    /// Settling body dropped below the failure line
    FellBelowLine,
    /// A committed member or the dropping body left the play area
    Collapse,
}

/// Final numbers handed to the score screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub score: u64,
    pub max_combo: u32,
    /// Rhythm tier counts (zero for stacking rounds)
    pub stats: HitStats,
    /// Perfect placements (zero for rhythm rounds)
    pub perfect_count: u32,
    pub reason: EndReason,
}

/// Something the presentation layer should react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoundEvent {
    /// A judgment was applied. `note` is `None` for a dry fire.
    Judged {
        judgment: Judgment,
        lane: Option<Lane>,
        note: Option<usize>,
        combo: u32,
    },
    /// A new falling body is hovering at spawn height
    Spawned { body: BodyId },
    /// The body was let go
    Released { body: BodyId },
    /// The body touched the base or the stack and is settling
    Landed { body: BodyId },
    /// The body came to rest in tolerance and joined the stack
    Committed {
        body: BodyId,
        tier: PlacementTier,
        offset: f32,
        combo: u32,
    },
    /// Terminal transition for the round
    RoundEnded(RoundSummary),
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Same seed, independent sequence
    pub fn with_stream(&self, stream: u64) -> Self {
        Self {
            seed: self.seed,
            stream,
        }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ self.stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}
