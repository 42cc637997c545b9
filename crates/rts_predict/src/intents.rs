//! Outbound messages.
//!
//! Everything the core wants the authority to know is staged here and handed
//! back from each tick. Delivery is fire-and-forget: the core never waits
//! for or retries any of these.

use serde::{Deserialize, Serialize};

use crate::animation::AnimMode;
use crate::math::Vec2;
use crate::unit::{Unit, UnitSpawn};
use crate::world::{EntityId, GroundItemId, PlayerId, ResourceId, ResourceKind, UnitId};

/// A discrete request for the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Damage another player's unit.
    AttackUnit {
        /// Owner of the target.
        target_owner: PlayerId,
        /// Target unit.
        target_unit: UnitId,
        /// Proposed damage.
        damage: f32,
        /// Attacking local unit.
        attacker: UnitId,
    },
    /// Damage a map entity.
    AttackEntity {
        /// Target entity.
        entity: EntityId,
        /// Proposed damage.
        damage: f32,
        /// Attacking local unit.
        attacker: UnitId,
    },
    /// A harvest finished.
    CollectResource {
        /// Harvested node.
        resource: ResourceId,
        /// Resource color.
        kind: ResourceKind,
        /// Units collected.
        amount: u32,
        /// Harvesting local unit.
        unit: UnitId,
    },
    /// A unit was staged locally.
    SpawnUnit {
        /// The staged unit.
        unit: UnitSpawn,
    },
    /// Equip a ground item into a slot.
    PickupItem {
        /// Receiving local unit.
        unit: UnitId,
        /// Target slot.
        slot: usize,
        /// Item on the ground.
        ground_item: GroundItemId,
    },
}

/// Authority-bound snapshot of one local unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSync {
    /// Unit id.
    pub id: UnitId,
    /// Predicted position.
    pub position: Vec2,
    /// Last commanded move point.
    pub move_target: Option<Vec2>,
    /// Animation loop.
    pub anim: AnimMode,
    /// Facing key, `"000"`..`"337"`.
    pub dir: String,
    /// Current hit points.
    pub hp: f32,
    /// Derived maximum hit points.
    pub max_hp: f32,
}

impl From<&Unit> for UnitSync {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            position: unit.position,
            move_target: unit.move_target,
            anim: unit.anim.mode,
            dir: unit.facing.key(),
            hp: unit.hp,
            max_hp: unit.max_hp,
        }
    }
}

/// Everything produced by one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// Tick number (first tick is 1).
    pub tick: u64,
    /// Time scale applied this tick.
    pub dt_scale: f32,
    /// One record per live local unit, ordered by id.
    pub sync: Vec<UnitSync>,
    /// Discrete intents in the order they were raised.
    pub intents: Vec<Intent>,
    /// Local units removed this tick because their hp reached zero.
    pub removed: Vec<UnitId>,
}
