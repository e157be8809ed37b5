//! Deterministic simulation module
//!
//! All judgment and settling logic lives here. This module must be pure and deterministic:
//! - Caller-supplied clock only
//! - Seeded RNG only
//! - Stable iteration order (schedule order for notes, placement order for the stack)
//! - Never touches the host page

pub mod chart;
pub mod judgment;
pub mod physics;
pub mod rhythm;
pub mod score;
pub mod stack;
pub mod state;

pub use chart::{Lane, Note, NoteStatus, Tempo, chart_for_tempo, generate_chart};
pub use judgment::{Judgment, JudgmentWindows, WindowError};
pub use physics::{BlockSpawn, BodyId, Kinematics, PhysicsWorld, ScriptedWorld};
pub use rhythm::{RhythmRound, WrongLanePolicy};
pub use score::{ComboState, HitStats, Scoreboard};
pub use stack::{BodyState, FallingBody, PlacementTier, StackGeometry, StackRound};
pub use state::{EndReason, RngState, RoundEvent, RoundPhase, RoundSummary};
