//! Stack settling engine
//!
//! Per falling body: `Moving -> Dropping -> Settling -> Committed`, or
//! `Failed` when the round ends on it. Rest detection runs as an explicit
//! poll from `tick`, so feeding synthetic ticks is enough to test it.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::physics::{BlockSpawn, BodyId, Kinematics, PhysicsWorld};
use super::score::ComboState;
use super::state::{EndReason, RngState, RoundEvent, RoundPhase, RoundSummary};
use crate::horizontal_offset;
use crate::settings::StackSettings;

/// Placement quality by horizontal offset from the target center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementTier {
    Perfect,
    Great,
    Good,
}

impl PlacementTier {
    pub fn classify(offset: f32, settings: &StackSettings) -> Self {
        if offset < settings.perfect_offset {
            PlacementTier::Perfect
        } else if offset < settings.great_offset {
            PlacementTier::Great
        } else {
            PlacementTier::Good
        }
    }

    /// Screen shake kicked off by a placement
    pub fn shake(&self, combo: u32) -> f32 {
        match self {
            PlacementTier::Perfect => 10.0 + combo.min(10) as f32,
            PlacementTier::Great => 5.0,
            PlacementTier::Good => 2.0,
        }
    }
}

/// State of the active falling body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyState {
    /// Swept sideways by the engine, waiting for release
    Moving,
    /// Let go; physics owns its motion
    Dropping,
    /// Touched the base or stack; rest polling in progress
    Settling {
        landed_at_ms: f64,
        next_poll_ms: f64,
        /// When the current unbroken rest began
        rest_since_ms: Option<f64>,
    },
    /// Static and part of the stack
    Committed,
    /// The round ended on this body
    Failed,
}

/// The body currently being placed
#[derive(Debug, Clone)]
pub struct FallingBody {
    pub id: BodyId,
    pub state: BodyState,
    pub width: f32,
    /// Sweep position and direction (+1 right, -1 left)
    pub move_x: f32,
    pub move_dir: f32,
    /// Sweep speed (px per tick)
    pub speed: f32,
}

/// Fixed screen-space landmarks of the play field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackGeometry {
    /// Target center of every placement
    pub center_x: f32,
    /// Top surface of the base (topmost y when the stack is empty)
    pub base_top_y: f32,
    /// Lowest point of the base; failure lines hang below it
    pub base_bottom_y: f32,
}

impl StackGeometry {
    /// Layout used by the browser games for a canvas of this size
    pub fn for_canvas(width: f32, height: f32) -> Self {
        Self {
            center_x: width / 2.0,
            base_top_y: height - 130.0,
            base_bottom_y: height - 40.0,
        }
    }
}

/// A single stacking round
#[derive(Debug, Clone)]
pub struct StackRound {
    pub phase: RoundPhase,
    pub settings: StackSettings,
    pub geometry: StackGeometry,
    /// Platforms that count as landing targets but never move
    pub bases: Vec<BodyId>,
    /// Committed members in placement order
    pub stack: Vec<BodyId>,
    /// Pre-placed members that score nothing
    pub foundation_len: usize,
    pub active: Option<FallingBody>,
    pub score: u64,
    pub combo: ComboState,
    pub perfect_count: u32,
    pub shake: f32,
    /// Accumulated round time (ms)
    pub clock_ms: f64,
    rng: Pcg32,
    events: Vec<RoundEvent>,
}

impl StackRound {
    pub fn new(settings: StackSettings, geometry: StackGeometry, seed: u64) -> Self {
        Self {
            phase: RoundPhase::Ready,
            settings,
            geometry,
            bases: Vec::new(),
            stack: Vec::new(),
            foundation_len: 0,
            active: None,
            score: 0,
            combo: ComboState::default(),
            perfect_count: 0,
            shake: 0.0,
            clock_ms: 0.0,
            rng: RngState::new(seed).to_rng(),
            events: Vec::new(),
        }
    }

    /// Register a base platform as a landing target
    pub fn add_base(&mut self, body: BodyId) {
        self.bases.push(body);
    }

    /// Seed the stack with a pre-placed member (e.g. the tree's first layer)
    pub fn add_foundation(&mut self, body: BodyId) {
        self.stack.push(body);
        self.foundation_len += 1;
    }

    /// Begin play and spawn the first body
    pub fn start<W: PhysicsWorld>(&mut self, world: &mut W) {
        if self.phase != RoundPhase::Ready {
            return;
        }
        self.phase = RoundPhase::Playing;
        log::info!(
            "Stack round started ({} bases, {} foundation members)",
            self.bases.len(),
            self.foundation_len
        );
        self.spawn_next(world);
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == RoundPhase::Playing
    }

    /// Number of bodies the player has placed
    pub fn placed(&self) -> usize {
        self.stack.len() - self.foundation_len
    }

    /// Let go of the moving body. Returns false if nothing was released.
    pub fn release<W: PhysicsWorld>(&mut self, world: &mut W) -> bool {
        if !self.is_playing() {
            return false;
        }
        let Some(body) = self.active.as_mut() else {
            return false;
        };
        if body.state != BodyState::Moving {
            return false;
        }
        body.state = BodyState::Dropping;
        world.set_velocity(body.id, Vec2::new(0.0, self.settings.release_speed));
        let id = body.id;
        self.events.push(RoundEvent::Released { body: id });
        true
    }

    /// Collision-start notification from the physics provider
    pub fn on_collision(&mut self, a: BodyId, b: BodyId) {
        if !self.is_playing() {
            return;
        }
        let clock = self.clock_ms;
        let delay = self.settings.settle_initial_delay_ms;
        let Some(body) = self.active.as_mut() else {
            return;
        };
        if body.state != BodyState::Dropping {
            return;
        }
        let other = if a == body.id {
            b
        } else if b == body.id {
            a
        } else {
            return;
        };
        if !self.bases.contains(&other) && !self.stack.contains(&other) {
            return;
        }

        body.state = BodyState::Settling {
            landed_at_ms: clock,
            next_poll_ms: clock + delay,
            rest_since_ms: None,
        };
        let id = body.id;
        log::debug!("Body {:?} landed on {:?}", id, other);
        self.events.push(RoundEvent::Landed { body: id });
    }

    /// Advance the round by one frame
    pub fn tick<W: PhysicsWorld>(&mut self, world: &mut W, dt_ms: f64) {
        if !self.is_playing() {
            return;
        }
        self.clock_ms += dt_ms;

        self.shake *= crate::consts::SHAKE_DECAY;
        if self.shake < crate::consts::SHAKE_CUTOFF {
            self.shake = 0.0;
        }

        if self.has_collapsed(world) {
            self.finish(EndReason::Collapse);
            return;
        }

        let Some(state) = self.active.as_ref().map(|b| b.state) else {
            return;
        };
        match state {
            BodyState::Moving => self.sweep(world),
            BodyState::Settling { next_poll_ms, .. } if self.clock_ms >= next_poll_ms => {
                self.poll_rest(world);
            }
            _ => {}
        }
    }

    /// Topmost point of the stack (minimum y), or the base top when empty
    pub fn top_y<W: PhysicsWorld>(&self, world: &W) -> f32 {
        self.stack
            .iter()
            .filter_map(|&id| world.kinematics(id))
            .map(|k| k.pos.y)
            .fold(None, |top: Option<f32>, y| Some(top.map_or(y, |t| t.min(y))))
            .unwrap_or(self.geometry.base_top_y)
    }

    /// Safety net for anything the rest poll misses
    pub fn has_collapsed<W: PhysicsWorld>(&self, world: &W) -> bool {
        let collapse_line = self.geometry.base_bottom_y + self.settings.collapse_margin;
        let member_fell = self
            .stack
            .iter()
            .filter_map(|&id| world.kinematics(id))
            .any(|k| k.pos.y > collapse_line);
        if member_fell {
            return true;
        }

        match &self.active {
            Some(body) if body.state == BodyState::Dropping => {
                let fall_line = self.geometry.base_bottom_y + self.settings.dropping_fall_margin;
                world.kinematics(body.id).is_some_and(|k| k.pos.y > fall_line)
            }
            _ => false,
        }
    }

    /// Sweep speed for the current score
    pub fn move_speed(&self) -> f32 {
        let s = &self.settings;
        (s.base_move_speed + self.score as f32 * s.move_speed_per_point).min(s.max_move_speed)
    }

    fn sweep_bounds(&self) -> (f32, f32) {
        let left = self.geometry.center_x - self.settings.play_area_width / 2.0;
        let right = left + self.settings.play_area_width;
        (
            left + self.settings.play_area_margin,
            right - self.settings.play_area_margin,
        )
    }

    fn hover_y<W: PhysicsWorld>(&self, world: &W) -> f32 {
        self.top_y(world) - self.settings.body_height * self.settings.drop_count
    }

    /// Open-loop sideways motion; cancels whatever gravity added
    fn sweep<W: PhysicsWorld>(&mut self, world: &mut W) {
        let (min_x, max_x) = self.sweep_bounds();
        let hover_y = self.hover_y(world);
        let Some(body) = self.active.as_mut() else {
            return;
        };

        world.set_velocity(body.id, Vec2::ZERO);
        body.move_x += body.speed * body.move_dir;
        if body.move_x > max_x {
            body.move_x = max_x;
            body.move_dir = -1.0;
        } else if body.move_x < min_x {
            body.move_x = min_x;
            body.move_dir = 1.0;
        }
        world.set_position(body.id, Vec2::new(body.move_x, hover_y));
    }

    fn is_at_rest(&self, kin: &Kinematics) -> bool {
        kin.speed() <= self.settings.linear_eps && kin.angular_vel.abs() <= self.settings.angular_eps
    }

    fn poll_rest<W: PhysicsWorld>(&mut self, world: &mut W) {
        let clock = self.clock_ms;
        let interval = self.settings.settle_poll_interval_ms;
        let Some(id) = self.active.as_ref().map(|b| b.id) else {
            return;
        };
        let Some(kin) = world.kinematics(id) else {
            log::warn!("Settling body {:?} vanished from the world", id);
            self.finish(EndReason::Collapse);
            return;
        };

        let fail_line = self.geometry.base_bottom_y + self.settings.settle_fail_margin;
        if kin.pos.y > fail_line {
            self.finish(EndReason::FellBelowLine);
            return;
        }

        let at_rest = self.is_at_rest(&kin);
        let settled_for = self.settings.settled_duration_ms;
        let Some(body) = self.active.as_mut() else {
            return;
        };
        let BodyState::Settling {
            landed_at_ms,
            next_poll_ms,
            rest_since_ms,
        } = body.state
        else {
            return;
        };

        let mut next = next_poll_ms + interval;
        if next <= clock {
            next = clock + interval;
        }

        if !at_rest {
            // Moving again: keep settling, restart the rest timer
            body.state = BodyState::Settling {
                landed_at_ms,
                next_poll_ms: next,
                rest_since_ms: None,
            };
            return;
        }

        let since = rest_since_ms.unwrap_or(clock);
        if clock - since < settled_for {
            body.state = BodyState::Settling {
                landed_at_ms,
                next_poll_ms: next,
                rest_since_ms: Some(since),
            };
            return;
        }

        self.confirm(world, kin);
    }

    /// The body held still long enough: judge the placement
    fn confirm<W: PhysicsWorld>(&mut self, world: &mut W, kin: Kinematics) {
        let Some(mut body) = self.active.take() else {
            return;
        };
        let offset = horizontal_offset(kin.pos.x, self.geometry.center_x);
        if offset > self.settings.max_offset {
            // Left dynamic so it can topple off
            self.active = Some(body);
            self.finish(EndReason::Misplaced { offset });
            return;
        }

        world.set_static(body.id, true);
        body.state = BodyState::Committed;
        self.stack.push(body.id);
        self.score += 1;

        let tier = PlacementTier::classify(offset, &self.settings);
        match tier {
            PlacementTier::Perfect => {
                self.combo.extend();
                self.perfect_count += 1;
            }
            PlacementTier::Great | PlacementTier::Good => self.combo.reset(),
        }
        self.shake = tier.shake(self.combo.combo);

        log::debug!(
            "Committed {:?} as {:?} (offset {:.1}px, stack {})",
            body.id,
            tier,
            offset,
            self.stack.len()
        );
        self.events.push(RoundEvent::Committed {
            body: body.id,
            tier,
            offset,
            combo: self.combo.combo,
        });

        self.spawn_next(world);
    }

    fn spawn_next<W: PhysicsWorld>(&mut self, world: &mut W) {
        if !self.is_playing() {
            return;
        }
        let width = self.settings.body_width_for(self.score);
        let pos = Vec2::new(self.geometry.center_x, self.hover_y(world));
        let id = world.spawn_block(&BlockSpawn {
            pos,
            width,
            height: self.settings.body_height,
        });
        let move_dir = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };

        self.active = Some(FallingBody {
            id,
            state: BodyState::Moving,
            width,
            move_x: pos.x,
            move_dir,
            speed: self.move_speed(),
        });
        self.events.push(RoundEvent::Spawned { body: id });
    }

    fn finish(&mut self, reason: EndReason) {
        if self.phase == RoundPhase::GameOver {
            return;
        }
        self.phase = RoundPhase::GameOver;
        if let Some(body) = self.active.as_mut() {
            body.state = BodyState::Failed;
        }
        let summary = self.summary(reason);
        log::info!(
            "Stack round over ({:?}): score {}, max combo {}, perfect {}",
            reason,
            summary.score,
            summary.max_combo,
            summary.perfect_count
        );
        self.events.push(RoundEvent::RoundEnded(summary));
    }

    pub fn summary(&self, reason: EndReason) -> RoundSummary {
        RoundSummary {
            score: self.score,
            max_combo: self.combo.max_combo,
            stats: Default::default(),
            perfect_count: self.perfect_count,
            reason,
        }
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }
}
