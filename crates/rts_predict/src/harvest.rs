//! Resource harvesting and optimistic resource hiding.

use std::collections::BTreeMap;

use crate::config::SimConfig;
use crate::intents::Intent;
use crate::math::Vec2;
use crate::world::{ResourceId, UnitId, WorldSnapshot};

/// Gap kept between a harvester and the node's collision circle when
/// walking up to it.
const APPROACH_GAP: f32 = 4.0;

/// Resources this client collected but the authority has not yet removed.
///
/// Hidden resources are neither obstacles nor harvest targets. An entry is
/// dropped as soon as the snapshot stops listing the resource (confirmed),
/// or after `optimistic_hide_ms` (the collection was rejected or lost).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HiddenResources {
    hidden_at: BTreeMap<ResourceId, f64>,
}

impl HiddenResources {
    /// Hide `id` as of `now_ms`.
    pub fn hide(&mut self, id: ResourceId, now_ms: f64) {
        self.hidden_at.insert(id, now_ms);
    }

    /// Whether `id` is currently hidden.
    #[must_use]
    pub fn contains(&self, id: ResourceId) -> bool {
        self.hidden_at.contains_key(&id)
    }

    /// Number of hidden resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hidden_at.len()
    }

    /// Nothing hidden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hidden_at.is_empty()
    }

    /// Forget confirmed and timed-out entries.
    pub fn expire(&mut self, world: &WorldSnapshot, now_ms: f64, config: &SimConfig) {
        let timeout = f64::from(config.optimistic_hide_ms);
        self.hidden_at.retain(|&id, &mut hidden_at| {
            if world.resource(id).is_none() {
                return false;
            }
            if now_ms - hidden_at >= timeout {
                tracing::debug!(resource = %id, "Collected resource still listed, showing it again");
                return false;
            }
            true
        });
    }
}

/// What a harvester does this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum HarvestStep {
    /// The resource is gone (or already collected locally).
    Abandon,
    /// Walk toward the resource.
    Approach {
        /// Desired displacement.
        desired: Vec2,
        /// Resource position.
        goal: Vec2,
    },
    /// In range, harvest timer running.
    Working {
        /// Resource position.
        goal: Vec2,
    },
    /// Timer finished; the resource is now hidden locally.
    Collected(Intent),
}

/// Advance one harvesting unit.
///
/// `timer` holds the milliseconds of harvesting done so far: it is reset
/// when the unit is beyond `resource_stop_radius`, paused between the stop
/// and harvest radii, and advanced inside `resource_harvest_radius`. The
/// tick that enters the harvest radius only starts the timer.
pub fn harvest_step(
    unit: UnitId,
    position: Vec2,
    resource: ResourceId,
    timer: &mut Option<f32>,
    world: &WorldSnapshot,
    hidden: &mut HiddenResources,
    dt_scale: f32,
    now_ms: f64,
    config: &SimConfig,
) -> HarvestStep {
    let node = match world.resource(resource) {
        Some(node) if !hidden.contains(resource) && node.position.is_finite() => node,
        _ => {
            *timer = None;
            return HarvestStep::Abandon;
        }
    };

    let dist = position.distance(node.position);
    if dist > config.resource_harvest_radius {
        if dist > config.resource_stop_radius {
            *timer = None;
        }
        let standoff = (config.unit_radius + config.resource_collide_radius + APPROACH_GAP)
            .min(config.resource_harvest_radius);
        let step = (config.harvest_speed * dt_scale).min((dist - standoff).max(0.0));
        return HarvestStep::Approach {
            desired: position.step_toward(node.position, step),
            goal: node.position,
        };
    }

    let elapsed = match *timer {
        None => 0.0,
        Some(t) => t + config.scaled_ms(dt_scale),
    };
    if elapsed < config.harvest_duration_ms {
        *timer = Some(elapsed);
        return HarvestStep::Working {
            goal: node.position,
        };
    }

    *timer = None;
    hidden.hide(resource, now_ms);
    tracing::debug!(unit = %unit, resource = %resource, kind = ?node.kind, "Resource collected");
    HarvestStep::Collected(Intent::CollectResource {
        resource,
        kind: node.kind,
        amount: 1,
        unit,
    })
}
