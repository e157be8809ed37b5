//! Physics provider seam
//!
//! The settling engine never integrates motion itself. It reads body
//! kinematics and toggles velocity/static state through `PhysicsWorld`,
//! which a real rigid-body engine implements on the host side.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque handle to a body owned by the physics provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Snapshot of a body's motion state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Center position (screen coordinates, y grows downward)
    pub pos: Vec2,
    pub vel: Vec2,
    pub angular_vel: f32,
    pub is_static: bool,
}

impl Kinematics {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            angular_vel: 0.0,
            is_static: false,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Shape and placement of a block to create
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSpawn {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
}

/// Operations the settling engine needs from a rigid-body simulation
pub trait PhysicsWorld {
    /// Current motion state, or `None` if the body no longer exists
    fn kinematics(&self, body: BodyId) -> Option<Kinematics>;
    fn set_position(&mut self, body: BodyId, pos: Vec2);
    fn set_velocity(&mut self, body: BodyId, vel: Vec2);
    fn set_static(&mut self, body: BodyId, is_static: bool);
    /// Create a dynamic block and return its handle
    fn spawn_block(&mut self, spawn: &BlockSpawn) -> BodyId;
}

#[derive(Debug, Clone)]
struct ScriptedBody {
    id: BodyId,
    kin: Kinematics,
    size: Vec2,
}

/// Deterministic stand-in provider: bodies move only by their velocity
/// and whatever the driver scripts. No gravity, no contact solving.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWorld {
    bodies: Vec<ScriptedBody>,
    next_id: u32,
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static body (a base platform, for instance)
    pub fn add_static(&mut self, pos: Vec2, width: f32, height: f32) -> BodyId {
        let id = self.spawn_block(&BlockSpawn { pos, width, height });
        self.set_static(id, true);
        id
    }

    /// Integrate dynamic bodies by one step
    pub fn step(&mut self) {
        for body in &mut self.bodies {
            if !body.kin.is_static {
                body.kin.pos += body.kin.vel;
            }
        }
    }

    /// Override angular velocity (scripted wobble)
    pub fn set_angular_velocity(&mut self, body: BodyId, angular_vel: f32) {
        if let Some(b) = self.get_mut(body) {
            b.kin.angular_vel = angular_vel;
        }
    }

    /// Body dimensions as spawned
    pub fn size(&self, body: BodyId) -> Option<Vec2> {
        self.bodies.iter().find(|b| b.id == body).map(|b| b.size)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn get_mut(&mut self, body: BodyId) -> Option<&mut ScriptedBody> {
        self.bodies.iter_mut().find(|b| b.id == body)
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn kinematics(&self, body: BodyId) -> Option<Kinematics> {
        self.bodies.iter().find(|b| b.id == body).map(|b| b.kin)
    }

    fn set_position(&mut self, body: BodyId, pos: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.kin.pos = pos;
        }
    }

    fn set_velocity(&mut self, body: BodyId, vel: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.kin.vel = vel;
        }
    }

    fn set_static(&mut self, body: BodyId, is_static: bool) {
        if let Some(b) = self.get_mut(body) {
            b.kin.is_static = is_static;
            if is_static {
                b.kin.vel = Vec2::ZERO;
                b.kin.angular_vel = 0.0;
            }
        }
    }

    fn spawn_block(&mut self, spawn: &BlockSpawn) -> BodyId {
        self.next_id += 1;
        let id = BodyId(self.next_id);
        self.bodies.push(ScriptedBody {
            id,
            kin: Kinematics::at(spawn.pos),
            size: Vec2::new(spawn.width, spawn.height),
        });
        id
    }
}
