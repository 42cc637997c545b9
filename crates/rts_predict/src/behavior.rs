//! Per-unit behavior state machine.
//!
//! Each local unit is in exactly one [`Behavior`]. Orders replace the
//! current behavior wholesale; everything else (arrival, harvest completion,
//! target loss, automatic acquisition) is re-derived from the current state
//! every tick.
//!
//! ```text
//!              Move                 arrived / gave up
//!   Idle ─────────────────► ManualMove ─────────────────► Idle
//!    │  ▲
//!    │  │ collected / gone        Harvest
//!    │  └──────────────── Harvesting ◄──────── (any)
//!    │
//!    │ hostile in aggro radius     target gone / lost
//!    └──────────────────► Combat ─────────────────────► Idle
//! ```

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::animation::AnimMode;
use crate::combat::{self, EnemyTarget, TargetRef, TargetStatus};
use crate::config::SimConfig;
use crate::harvest::{harvest_step, HarvestStep, HiddenResources};
use crate::intents::Intent;
use crate::math::Vec2;
use crate::obstacles::ObstacleMap;
use crate::steering;
use crate::unit::Unit;
use crate::world::{PlayerId, ResourceId, WorldSnapshot};

/// A unit's slot in a group move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormationSlot {
    /// Position in the group.
    pub index: u32,
    /// Group size.
    pub total: u32,
}

impl FormationSlot {
    /// A unit moving on its own.
    pub const SOLO: Self = Self { index: 0, total: 1 };

    /// Offset from the shared target: members sit evenly on a ring whose
    /// radius grows with the group. A solo unit goes to the target itself.
    #[must_use]
    pub fn offset(self, spacing: f32) -> Vec2 {
        if self.total <= 1 {
            return Vec2::ZERO;
        }
        let angle = self.index as f32 / self.total as f32 * TAU;
        Vec2::new(angle.cos(), angle.sin()) * (self.total as f32 * spacing)
    }
}

impl Default for FormationSlot {
    fn default() -> Self {
        Self::SOLO
    }
}

/// What a unit is doing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Behavior {
    /// Standing around; may auto-acquire a target.
    #[default]
    Idle,
    /// Walking to an ordered point.
    ManualMove {
        /// Shared group target.
        target: Vec2,
        /// This unit's slot in the group.
        formation: FormationSlot,
    },
    /// Walking to or working a resource.
    Harvesting {
        /// The resource.
        resource: ResourceId,
        /// Milliseconds of harvesting done, `None` when not started.
        timer: Option<f32>,
    },
    /// Chasing or attacking a target.
    Combat(EnemyTarget),
}

/// A player command for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Order {
    /// Walk to `target` (plus the formation offset).
    Move {
        /// Shared group target.
        target: Vec2,
        /// Slot in the group.
        #[serde(default)]
        formation: FormationSlot,
    },
    /// Harvest a resource.
    Harvest(ResourceId),
    /// Attack a target until it dies or vanishes.
    Attack {
        /// What to attack.
        target: TargetRef,
        /// Where to stand while closing in.
        #[serde(default)]
        approach_point: Option<Vec2>,
    },
    /// Stop and idle.
    Stop,
}

/// Replace whatever the unit was doing with `order`.
pub fn apply_order(unit: &mut Unit, order: Order) {
    unit.steering.reset();
    unit.behavior = match order {
        Order::Move { target, formation } => {
            unit.move_target = Some(target);
            Behavior::ManualMove { target, formation }
        }
        Order::Harvest(resource) => Behavior::Harvesting {
            resource,
            timer: None,
        },
        Order::Attack {
            target,
            approach_point,
        } => Behavior::Combat(EnemyTarget {
            target,
            approach_point,
            user_issued: true,
        }),
        Order::Stop => {
            unit.anim.mode = AnimMode::Idle;
            Behavior::Idle
        }
    };
}

/// Shared read-only inputs for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Tuning.
    pub config: &'a SimConfig,
    /// Latest snapshot.
    pub world: &'a WorldSnapshot,
    /// Obstacles built from `world` for this tick.
    pub obstacles: &'a ObstacleMap,
    /// The player this client controls.
    pub local_player: PlayerId,
    /// Time scale of this tick.
    pub dt_scale: f32,
    /// Simulation clock after this tick's advance.
    pub now_ms: f64,
}

/// Movement wanted by the current behavior.
enum Motion {
    Hold,
    Move { desired: Vec2, goal: Vec2 },
}

/// Advance one unit by one tick.
///
/// Intents raised by the unit are appended to `intents`; harvested
/// resources are added to `hidden`.
pub fn update_unit(
    unit: &mut Unit,
    ctx: &TickContext<'_>,
    hidden: &mut HiddenResources,
    intents: &mut Vec<Intent>,
) {
    let config = ctx.config;
    let stats = unit.refresh_stats(config);
    unit.prev_position = unit.position;

    let motion = match unit.behavior {
        Behavior::ManualMove { target, formation } => manual_move(unit, target, formation, ctx),
        Behavior::Harvesting { resource, timer } => {
            harvesting(unit, resource, timer, ctx, hidden, intents)
        }
        Behavior::Idle | Behavior::Combat(_) => combat(unit, stats.dps, ctx, intents),
    };

    let (desired, goal) = match motion {
        Motion::Hold => (Vec2::ZERO, unit.position),
        Motion::Move { desired, goal } => (desired, goal),
    };
    let result = steering::steer(
        &mut unit.steering,
        unit.position,
        desired,
        goal,
        ctx.obstacles,
        ctx.now_ms,
        config,
    );
    unit.position += result.displacement;

    if result.nudged && unit.steering.recoveries >= config.give_up_after_recoveries {
        if let Behavior::ManualMove { .. } | Behavior::Harvesting { .. } = unit.behavior {
            tracing::debug!(
                unit = %unit.id,
                recoveries = unit.steering.recoveries,
                "Giving up on unreachable destination"
            );
            unit.behavior = Behavior::Idle;
            unit.anim.mode = AnimMode::Idle;
            unit.steering.reset();
        }
    }

    if unit.attack_cooldown < config.attack_cooldown_ms {
        unit.attack_cooldown =
            (unit.attack_cooldown + config.scaled_ms(ctx.dt_scale)).min(config.attack_cooldown_ms);
    }
    unit.anim.advance(ctx.dt_scale, config);
}

fn manual_move(
    unit: &mut Unit,
    target: Vec2,
    formation: FormationSlot,
    ctx: &TickContext<'_>,
) -> Motion {
    let config = ctx.config;
    let goal = target + formation.offset(config.formation_spacing);
    let delta = goal - unit.position;
    let dist = delta.length();

    if !dist.is_finite() {
        unit.behavior = Behavior::Idle;
        unit.anim.mode = AnimMode::Idle;
        return Motion::Hold;
    }

    if dist <= config.arrival_threshold {
        if !ctx.obstacles.is_blocked(goal, config.unit_radius) {
            unit.position = goal;
        }
        unit.behavior = Behavior::Idle;
        unit.anim.mode = AnimMode::Idle;
        unit.steering.clear_detour();
        return Motion::Hold;
    }

    unit.anim.mode = AnimMode::Walk;
    unit.facing = unit.facing.toward(delta);
    Motion::Move {
        desired: unit
            .position
            .step_toward(goal, config.manual_speed * ctx.dt_scale),
        goal,
    }
}

fn harvesting(
    unit: &mut Unit,
    resource: ResourceId,
    mut timer: Option<f32>,
    ctx: &TickContext<'_>,
    hidden: &mut HiddenResources,
    intents: &mut Vec<Intent>,
) -> Motion {
    let step = harvest_step(
        unit.id,
        unit.position,
        resource,
        &mut timer,
        ctx.world,
        hidden,
        ctx.dt_scale,
        ctx.now_ms,
        ctx.config,
    );

    match step {
        HarvestStep::Abandon => {
            unit.behavior = Behavior::Idle;
            unit.anim.mode = AnimMode::Idle;
            Motion::Hold
        }
        HarvestStep::Approach { desired, goal } => {
            unit.behavior = Behavior::Harvesting { resource, timer };
            unit.anim.mode = AnimMode::Walk;
            unit.facing = unit.facing.toward(goal - unit.position);
            Motion::Move { desired, goal }
        }
        HarvestStep::Working { goal } => {
            unit.behavior = Behavior::Harvesting { resource, timer };
            unit.anim.mode = AnimMode::Idle;
            unit.facing = unit.facing.toward(goal - unit.position);
            Motion::Hold
        }
        HarvestStep::Collected(intent) => {
            intents.push(intent);
            unit.behavior = Behavior::Idle;
            unit.anim.mode = AnimMode::Idle;
            Motion::Hold
        }
    }
}

fn combat(unit: &mut Unit, dps: f32, ctx: &TickContext<'_>, intents: &mut Vec<Intent>) -> Motion {
    let config = ctx.config;
    let position = unit.position;

    let mut engaged = None;
    if let Behavior::Combat(target) = unit.behavior {
        match combat::resolve_target(&target, position, ctx.world, config) {
            TargetStatus::Engaged(resolved) => engaged = Some((target, resolved)),
            TargetStatus::Gone => {
                tracing::debug!(unit = %unit.id, target = ?target.target, "Target gone");
            }
            TargetStatus::Lost => {
                tracing::debug!(unit = %unit.id, target = ?target.target, "Target out of range");
            }
        }
    }

    if engaged.is_none() {
        engaged = combat::acquire(position, ctx.world, ctx.local_player, config).and_then(
            |target| match combat::resolve_target(&target, position, ctx.world, config) {
                TargetStatus::Engaged(resolved) => Some((target, resolved)),
                TargetStatus::Gone | TargetStatus::Lost => None,
            },
        );
    }

    let Some((target, resolved)) = engaged else {
        unit.behavior = Behavior::Idle;
        unit.anim.mode = AnimMode::Idle;
        return Motion::Hold;
    };

    let ready = unit.attack_cooldown >= config.attack_cooldown_ms;
    let engagement = combat::engage(
        unit.id,
        position,
        &target,
        &resolved,
        ready,
        dps,
        ctx.dt_scale,
        config,
    );
    if let Some(attack) = engagement.attack {
        intents.push(attack);
        unit.attack_cooldown = 0.0;
    }

    unit.behavior = Behavior::Combat(target);
    unit.anim.mode = engagement.anim;
    unit.facing = unit.facing.toward(engagement.aim - position);

    if engagement.desired == Vec2::ZERO {
        Motion::Hold
    } else {
        Motion::Move {
            desired: engagement.desired,
            goal: engagement.aim,
        }
    }
}
