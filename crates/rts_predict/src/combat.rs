//! Combat targeting with aggro hysteresis.
//!
//! Targets are held as [`TargetRef`]s (kind + id) and resolved against the
//! latest [`WorldSnapshot`] on every use. Acquisition and release use two
//! radii so a target hovering near the boundary does not flicker:
//!
//! - acquire when the nearest hostile is within `aggro_radius`
//! - release when effective distance exceeds `aggro_lose_radius`, unless the
//!   player explicitly ordered the attack
//!
//! Dead or vanished targets are always released immediately.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::animation::AnimMode;
use crate::config::SimConfig;
use crate::intents::Intent;
use crate::math::Vec2;
use crate::world::{EntityId, PlayerId, UnitId, WorldSnapshot};

/// Weak reference to something that can be attacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    /// Another player's unit.
    Unit {
        /// Owning player.
        owner: PlayerId,
        /// Unit id.
        unit: UnitId,
    },
    /// A map entity (town center, building, mine).
    Entity(EntityId),
}

/// A unit's current combat target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyTarget {
    /// What to attack.
    pub target: TargetRef,
    /// Where to stand while closing in, if the order spread attackers out.
    pub approach_point: Option<Vec2>,
    /// Ordered by the player; immune to distance-based release.
    pub user_issued: bool,
}

/// A hostile found by [`find_nearest_hostile`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hostile {
    /// Reference to it.
    pub target: TargetRef,
    /// Its center.
    pub position: Vec2,
    /// Center-to-center distance from the searcher.
    pub distance: f32,
}

/// Target geometry for this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTarget {
    /// Target center.
    pub center: Vec2,
    /// Approximate collision radius (0 for units).
    pub radius: f32,
    /// Center distance minus radius, never negative.
    pub effective_distance: f32,
}

/// Result of revalidating a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetStatus {
    /// Still valid.
    Engaged(ResolvedTarget),
    /// Dead or no longer in the snapshot.
    Gone,
    /// Out of the lose radius (automatic targets only).
    Lost,
}

/// What a unit in combat wants to do this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Engagement {
    /// Desired displacement (zero while attacking).
    pub desired: Vec2,
    /// Point the unit is moving toward or facing.
    pub aim: Vec2,
    /// Animation to play.
    pub anim: AnimMode,
    /// Attack intent, when the cooldown allowed one.
    pub attack: Option<Intent>,
}

/// Nearest live hostile by straight-line distance.
///
/// Hostiles are other players' units with hp and attackable entities (town
/// centers, buildings, mines) that are unowned or owned by someone else and
/// still have hp.
#[must_use]
pub fn find_nearest_hostile(
    position: Vec2,
    world: &WorldSnapshot,
    local_player: PlayerId,
) -> Option<Hostile> {
    let units = world
        .remote_units
        .iter()
        .filter(|u| u.owner != local_player && u.is_live())
        .map(|u| Hostile {
            target: TargetRef::Unit {
                owner: u.owner,
                unit: u.id,
            },
            position: u.position,
            distance: position.distance(u.position),
        });

    let entities = world
        .entities
        .iter()
        .filter(|e| {
            e.kind.is_attackable()
                && e.owner != Some(local_player)
                && e.is_alive()
                && e.position.is_finite()
        })
        .map(|e| Hostile {
            target: TargetRef::Entity(e.id),
            position: e.position,
            distance: position.distance(e.position),
        });

    units
        .chain(entities)
        .filter(|h| h.distance.is_finite())
        .fold(None, |best: Option<Hostile>, h| match best {
            Some(b) if b.distance <= h.distance => Some(b),
            _ => Some(h),
        })
}

/// Automatic acquisition: the nearest hostile, if within `aggro_radius`.
#[must_use]
pub fn acquire(
    position: Vec2,
    world: &WorldSnapshot,
    local_player: PlayerId,
    config: &SimConfig,
) -> Option<EnemyTarget> {
    let nearest = find_nearest_hostile(position, world, local_player)?;
    if nearest.distance > config.aggro_radius {
        return None;
    }
    tracing::debug!(target = ?nearest.target, distance = nearest.distance, "Target acquired");
    Some(EnemyTarget {
        target: nearest.target,
        approach_point: None,
        user_issued: false,
    })
}

/// Revalidate `target` against the current snapshot.
#[must_use]
pub fn resolve_target(
    target: &EnemyTarget,
    position: Vec2,
    world: &WorldSnapshot,
    config: &SimConfig,
) -> TargetStatus {
    let resolved = match target.target {
        TargetRef::Unit { owner, unit } => match world.remote_unit(owner, unit) {
            Some(u) if u.is_live() => ResolvedTarget {
                center: u.position,
                radius: 0.0,
                effective_distance: position.distance(u.position),
            },
            _ => return TargetStatus::Gone,
        },
        TargetRef::Entity(entity) => match world.entity(entity) {
            Some(e) if e.is_alive() && e.position.is_finite() => {
                let radius = e.approx_radius(config.building_size);
                ResolvedTarget {
                    center: e.position,
                    radius,
                    effective_distance: (position.distance(e.position) - radius).max(0.0),
                }
            }
            _ => return TargetStatus::Gone,
        },
    };

    if !target.user_issued && resolved.effective_distance > config.aggro_lose_radius {
        return TargetStatus::Lost;
    }
    TargetStatus::Engaged(resolved)
}

/// Chase or attack a resolved target.
///
/// Out of range the unit closes in at `chase_speed`, heading for the
/// approach point until it is reached and then for the target center; the
/// range decision always uses effective distance to the real target. In
/// range it plays the attack loop and, if `cooldown_ready`, proposes
/// `dps * nominal_frame_seconds * dt_scale` damage.
#[must_use]
pub fn engage(
    attacker: UnitId,
    position: Vec2,
    target: &EnemyTarget,
    resolved: &ResolvedTarget,
    cooldown_ready: bool,
    dps: f32,
    dt_scale: f32,
    config: &SimConfig,
) -> Engagement {
    if resolved.effective_distance > config.attack_range {
        let aim = target
            .approach_point
            .filter(|p| p.is_finite() && position.distance(*p) > config.arrival_threshold)
            .unwrap_or(resolved.center);
        let step = (config.chase_speed * dt_scale)
            .min(resolved.effective_distance - config.attack_range)
            .max(0.0);
        return Engagement {
            desired: position.step_toward(aim, step),
            aim,
            anim: AnimMode::Walk,
            attack: None,
        };
    }

    let attack = cooldown_ready.then(|| {
        let damage = dps * (config.nominal_frame_ms / 1000.0) * dt_scale;
        match target.target {
            TargetRef::Unit { owner, unit } => Intent::AttackUnit {
                target_owner: owner,
                target_unit: unit,
                damage,
                attacker,
            },
            TargetRef::Entity(entity) => Intent::AttackEntity {
                entity,
                damage,
                attacker,
            },
        }
    });

    Engagement {
        desired: Vec2::ZERO,
        aim: resolved.center,
        anim: AnimMode::Attack,
        attack,
    }
}

/// Spread `count` attackers evenly around a target so they do not stack.
///
/// Points sit on a ring just inside attack range of the target's edge.
#[must_use]
pub fn spread_approach_points(center: Vec2, radius: f32, count: usize, range: f32) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    let ring = radius + range * 0.75;
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * TAU;
            center + Vec2::new(angle.cos(), angle.sin()) * ring
        })
        .collect()
}
