//! Tuning constants for the prediction core.
//!
//! All distances are world units, all durations milliseconds, and all speeds
//! world units per nominal frame (they are multiplied by `dt_scale`).

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::Vec2;

/// Simulation tuning.
///
/// Loaded from RON by the headless runner; the defaults match the live game.
///
/// # Example
///
/// ```
/// use rts_predict::config::SimConfig;
///
/// let config = SimConfig::from_ron_str("(manual_speed: 6.0)").unwrap();
/// assert_eq!(config.manual_speed, 6.0);
/// assert_eq!(config.aggro_radius, 200.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Duration of a nominal frame; `dt_scale == 1` at this frame time.
    pub nominal_frame_ms: f32,
    /// Upper clamp on `dt_scale` after a stall.
    pub max_dt_scale: f32,

    /// Collision radius of every unit.
    pub unit_radius: f32,
    /// Speed under an explicit move order.
    pub manual_speed: f32,
    /// Speed while walking to a resource.
    pub harvest_speed: f32,
    /// Speed while chasing a combat target.
    pub chase_speed: f32,
    /// Distance below which a move order counts as arrived.
    pub arrival_threshold: f32,
    /// Per-member radius of the formation ring for group moves.
    pub formation_spacing: f32,

    /// Automatic target acquisition radius.
    pub aggro_radius: f32,
    /// Automatic targets are dropped past this effective distance.
    pub aggro_lose_radius: f32,
    /// Effective distance at which a unit attacks instead of chasing.
    pub attack_range: f32,
    /// Cooldown between attack intents.
    pub attack_cooldown_ms: f32,

    /// Hit points of an unequipped unit.
    pub base_hp: f32,
    /// Damage per second of an unequipped unit.
    pub base_dps: f32,
    /// Extra max hp per defense point.
    pub hp_per_defense: f32,
    /// Extra dps per attack point.
    pub dps_per_attack: f32,

    /// Collision radius of resource nodes.
    pub resource_collide_radius: f32,
    /// Harvesters walk until they are inside this radius.
    pub resource_stop_radius: f32,
    /// Harvest progress only advances inside this radius.
    pub resource_harvest_radius: f32,
    /// Time spent harvesting before a collect intent is emitted.
    pub harvest_duration_ms: f32,
    /// Resources collected locally stay hidden this long without confirmation.
    pub optimistic_hide_ms: f32,

    /// Collision radius of tree trunks.
    pub tree_radius: f32,
    /// Footprint of player buildings, also the fallback entity size.
    pub building_size: Vec2,
    /// Extra collision padding around player buildings.
    pub building_padding: f32,

    /// Extra clearance beyond both radii when placing a detour point.
    pub detour_clearance: f32,
    /// Lifetime of a detour.
    pub detour_expiry_ms: f32,
    /// A detour is reached within this distance.
    pub detour_arrival_radius: f32,
    /// Probe distance toward the real goal used to release a detour early.
    pub detour_release_lookahead: f32,
    /// Net movement per tick, averaged over a progress window, below which
    /// the unit counts as stuck.
    pub stuck_epsilon: f32,
    /// Moving ticks in one progress window.
    pub stuck_ticks: u32,
    /// Length of the emergency nudge.
    pub stuck_nudge_distance: f32,
    /// Stuck recoveries after which a move order is abandoned.
    pub give_up_after_recoveries: u32,
    /// Tolerated overlap with a solid obstacle at the end of a tick.
    pub penetration_epsilon: f32,

    /// Animation phase advance per nominal frame.
    pub anim_speed: f32,
    /// Frames in the idle loop.
    pub idle_frames: f32,
    /// Frames in the walk loop.
    pub walk_frames: f32,
    /// Frames in the attack loop.
    pub attack_frames: f32,

    /// Max center distance between a unit and a ground item it picks up.
    pub pickup_radius: f32,
    /// Local position is snapped to the authoritative one past this drift.
    pub reconcile_snap_distance: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nominal_frame_ms: 16.666,
            max_dt_scale: 3.0,

            unit_radius: 14.0,
            manual_speed: 4.5,
            harvest_speed: 3.8,
            chase_speed: 2.0,
            arrival_threshold: 1.5,
            formation_spacing: 10.0,

            aggro_radius: 200.0,
            aggro_lose_radius: 260.0,
            attack_range: 40.0,
            attack_cooldown_ms: 500.0,

            base_hp: 100.0,
            base_dps: 30.0,
            hp_per_defense: 15.0,
            dps_per_attack: 5.0,

            resource_collide_radius: 18.0,
            resource_stop_radius: 60.0,
            resource_harvest_radius: 48.0,
            harvest_duration_ms: 2000.0,
            optimistic_hide_ms: 5000.0,

            tree_radius: 30.0,
            building_size: Vec2::new(96.0, 96.0),
            building_padding: 6.0,

            detour_clearance: 12.0,
            detour_expiry_ms: 600.0,
            detour_arrival_radius: 6.0,
            detour_release_lookahead: 48.0,
            stuck_epsilon: 0.1,
            stuck_ticks: 45,
            stuck_nudge_distance: 12.0,
            give_up_after_recoveries: 4,
            penetration_epsilon: 1.0,

            anim_speed: 0.2,
            idle_frames: 4.0,
            walk_frames: 8.0,
            attack_frames: 6.0,

            pickup_radius: 60.0,
            reconcile_snap_distance: 96.0,
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) configuration from RON and validate it.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigParse`] for malformed RON and
    /// [`SimError::InvalidConfig`] when [`SimConfig::validate`] fails.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("nominal_frame_ms", self.nominal_frame_ms),
            ("max_dt_scale", self.max_dt_scale),
            ("unit_radius", self.unit_radius),
            ("manual_speed", self.manual_speed),
            ("harvest_speed", self.harvest_speed),
            ("chase_speed", self.chase_speed),
            ("arrival_threshold", self.arrival_threshold),
            ("aggro_radius", self.aggro_radius),
            ("attack_range", self.attack_range),
            ("resource_harvest_radius", self.resource_harvest_radius),
            ("harvest_duration_ms", self.harvest_duration_ms),
            ("tree_radius", self.tree_radius),
            ("detour_expiry_ms", self.detour_expiry_ms),
            ("detour_arrival_radius", self.detour_arrival_radius),
            ("stuck_epsilon", self.stuck_epsilon),
            ("stuck_nudge_distance", self.stuck_nudge_distance),
            ("idle_frames", self.idle_frames),
            ("walk_frames", self.walk_frames),
            ("attack_frames", self.attack_frames),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let non_negative = [
            ("formation_spacing", self.formation_spacing),
            ("attack_cooldown_ms", self.attack_cooldown_ms),
            ("base_dps", self.base_dps),
            ("hp_per_defense", self.hp_per_defense),
            ("dps_per_attack", self.dps_per_attack),
            ("resource_collide_radius", self.resource_collide_radius),
            ("optimistic_hide_ms", self.optimistic_hide_ms),
            ("building_padding", self.building_padding),
            ("detour_clearance", self.detour_clearance),
            ("detour_release_lookahead", self.detour_release_lookahead),
            ("penetration_epsilon", self.penetration_epsilon),
            ("anim_speed", self.anim_speed),
            ("pickup_radius", self.pickup_radius),
            ("reconcile_snap_distance", self.reconcile_snap_distance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        if !(self.base_hp.is_finite() && self.base_hp > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "base_hp must be positive, got {}",
                self.base_hp
            )));
        }
        if !(self.building_size.is_finite()
            && self.building_size.x > 0.0
            && self.building_size.y > 0.0)
        {
            return Err(SimError::InvalidConfig(
                "building_size must be positive".to_string(),
            ));
        }
        if self.aggro_radius >= self.aggro_lose_radius {
            return Err(SimError::InvalidConfig(format!(
                "aggro_radius ({}) must be smaller than aggro_lose_radius ({})",
                self.aggro_radius, self.aggro_lose_radius
            )));
        }
        if self.resource_harvest_radius >= self.resource_stop_radius {
            return Err(SimError::InvalidConfig(format!(
                "resource_harvest_radius ({}) must be smaller than resource_stop_radius ({})",
                self.resource_harvest_radius, self.resource_stop_radius
            )));
        }
        if self.stuck_ticks == 0 {
            return Err(SimError::InvalidConfig(
                "stuck_ticks must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Milliseconds advanced by a tick with the given `dt_scale`.
    #[must_use]
    pub fn scaled_ms(&self, dt_scale: f32) -> f32 {
        self.nominal_frame_ms * dt_scale
    }
}
