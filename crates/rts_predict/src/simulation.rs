//! Tick driver.
//!
//! [`PredictionSim`] owns the local player's units and advances them once per
//! rendered frame. The caller (render loop, headless runner, test) owns the
//! schedule: it hands in the elapsed wall time and the latest
//! [`WorldSnapshot`], and gets back everything to send to the authority.
//!
//! # Determinism
//!
//! Given the same config, orders, snapshots and elapsed times, two
//! simulations produce identical outputs and identical [`state_hash`]es:
//! - Units are processed in ascending id order
//! - Obstacles are ordered by kind, then snapshot order
//! - No system randomness, no wall-clock reads
//!
//! [`state_hash`]: PredictionSim::state_hash
//!
//! # Example
//!
//! ```
//! use rts_predict::behavior::{FormationSlot, Order};
//! use rts_predict::config::SimConfig;
//! use rts_predict::math::Vec2;
//! use rts_predict::simulation::PredictionSim;
//! use rts_predict::unit::{ItemSlots, UnitSpawn};
//! use rts_predict::world::{PlayerId, UnitId, WorldSnapshot};
//!
//! let mut sim = PredictionSim::new(PlayerId(1), SimConfig::default()).unwrap();
//! sim.spawn_unit(UnitSpawn {
//!     id: UnitId(1),
//!     position: Vec2::ZERO,
//!     items: ItemSlots::empty(),
//! })
//! .unwrap();
//! sim.issue(
//!     UnitId(1),
//!     Order::Move {
//!         target: Vec2::new(100.0, 0.0),
//!         formation: FormationSlot::SOLO,
//!     },
//! )
//! .unwrap();
//!
//! let out = sim.tick(16.666, &WorldSnapshot::default());
//! assert_eq!(out.tick, 1);
//! assert_eq!(out.sync.len(), 1);
//! assert!(out.sync[0].position.x > 0.0);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::behavior::{self, Behavior, FormationSlot, Order, TickContext};
use crate::clock::SimClock;
use crate::combat::{self, TargetRef};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::harvest::HiddenResources;
use crate::intents::{Intent, TickOutput, UnitSync};
use crate::math::Vec2;
use crate::obstacles::ObstacleMap;
use crate::unit::{ItemSlots, Unit, UnitSpawn};
use crate::world::{
    AuthoritativeUnit, GroundItemId, PlayerId, ResourceId, UnitId, WorldSnapshot,
};

/// Client-side prediction for one player's units.
#[derive(Debug, Clone)]
pub struct PredictionSim {
    config: SimConfig,
    local_player: PlayerId,
    tick: u64,
    clock: SimClock,
    units: BTreeMap<UnitId, Unit>,
    pending_orders: Vec<(UnitId, Order)>,
    pending_intents: Vec<Intent>,
    hidden: HiddenResources,
}

impl PredictionSim {
    /// Create an empty simulation.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] if `config` fails validation.
    pub fn new(local_player: PlayerId, config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            local_player,
            tick: 0,
            clock: SimClock::new(),
            units: BTreeMap::new(),
            pending_orders: Vec::new(),
            pending_intents: Vec::new(),
            hidden: HiddenResources::default(),
        })
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The player this simulation predicts for.
    #[must_use]
    pub const fn local_player(&self) -> PlayerId {
        self.local_player
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Simulation clock in milliseconds.
    #[must_use]
    pub const fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Look up a local unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Local units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Resources currently hidden after a local collection.
    #[must_use]
    pub const fn hidden_resources(&self) -> &HiddenResources {
        &self.hidden
    }

    /// Stage a new local unit and queue its spawn intent for the next tick.
    ///
    /// # Errors
    ///
    /// [`SimError::DuplicateUnit`] if the id is already in use.
    pub fn spawn_unit(&mut self, spawn: UnitSpawn) -> Result<()> {
        if self.units.contains_key(&spawn.id) {
            tracing::warn!(unit = %spawn.id, "Rejected spawn with duplicate id");
            return Err(SimError::DuplicateUnit(spawn.id));
        }
        tracing::debug!(unit = %spawn.id, x = spawn.position.x, y = spawn.position.y, "Unit staged");
        self.units
            .insert(spawn.id, Unit::spawn(&spawn, &self.config));
        self.pending_intents.push(Intent::SpawnUnit { unit: spawn });
        Ok(())
    }

    /// Queue an order; it takes effect at the start of the next tick.
    ///
    /// # Errors
    ///
    /// [`SimError::UnitNotFound`] if the unit is not local.
    pub fn issue(&mut self, unit: UnitId, order: Order) -> Result<()> {
        if !self.units.contains_key(&unit) {
            tracing::warn!(unit = %unit, ?order, "Rejected order for unknown unit");
            return Err(SimError::UnitNotFound(unit));
        }
        self.pending_orders.push((unit, order));
        Ok(())
    }

    /// Move a group to `target`, giving each member its own formation slot.
    ///
    /// Slots follow the order of `units`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnitNotFound`] if any unit is not local; no order is
    /// queued in that case.
    pub fn command_move(&mut self, units: &[UnitId], target: Vec2) -> Result<()> {
        self.check_known(units)?;
        let total = u32::try_from(units.len()).unwrap_or(u32::MAX);
        for (index, &unit) in (0_u32..).zip(units) {
            self.pending_orders.push((
                unit,
                Order::Move {
                    target,
                    formation: FormationSlot { index, total },
                },
            ));
        }
        Ok(())
    }

    /// Send a group to attack `target`, spreading them around it.
    ///
    /// Without the target in `world` the units go straight for it and drop
    /// the order on their first tick.
    ///
    /// # Errors
    ///
    /// [`SimError::UnitNotFound`] if any unit is not local; no order is
    /// queued in that case.
    pub fn command_attack(
        &mut self,
        units: &[UnitId],
        target: TargetRef,
        world: &WorldSnapshot,
    ) -> Result<()> {
        self.check_known(units)?;
        let located = match target {
            TargetRef::Unit { owner, unit } => world
                .remote_unit(owner, unit)
                .map(|u| (u.position, 0.0)),
            TargetRef::Entity(entity) => world
                .entity(entity)
                .map(|e| (e.position, e.approx_radius(self.config.building_size))),
        };
        let approach_points = match located {
            Some((center, radius)) if units.len() > 1 => combat::spread_approach_points(
                center,
                radius,
                units.len(),
                self.config.attack_range,
            ),
            _ => Vec::new(),
        };
        for (i, &unit) in units.iter().enumerate() {
            self.pending_orders.push((
                unit,
                Order::Attack {
                    target,
                    approach_point: approach_points.get(i).copied(),
                },
            ));
        }
        Ok(())
    }

    /// Send a group to harvest `resource`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnitNotFound`] if any unit is not local; no order is
    /// queued in that case.
    pub fn command_harvest(&mut self, units: &[UnitId], resource: ResourceId) -> Result<()> {
        self.check_known(units)?;
        self.pending_orders
            .extend(units.iter().map(|&unit| (unit, Order::Harvest(resource))));
        Ok(())
    }

    /// Stop a group.
    ///
    /// # Errors
    ///
    /// [`SimError::UnitNotFound`] if any unit is not local; no order is
    /// queued in that case.
    pub fn command_stop(&mut self, units: &[UnitId]) -> Result<()> {
        self.check_known(units)?;
        self.pending_orders
            .extend(units.iter().map(|&unit| (unit, Order::Stop)));
        Ok(())
    }

    /// Validate a pickup and build the intent for it.
    ///
    /// # Errors
    ///
    /// [`SimError::UnitNotFound`], [`SimError::GroundItemNotFound`],
    /// [`SimError::OutOfPickupRange`], [`SimError::SlotOutOfBounds`] or
    /// [`SimError::SlotOccupied`].
    pub fn request_pickup(
        &self,
        unit: UnitId,
        ground_item: GroundItemId,
        slot: usize,
        world: &WorldSnapshot,
    ) -> Result<Intent> {
        let local = self.units.get(&unit).ok_or(SimError::UnitNotFound(unit))?;
        let item = world
            .ground_item(ground_item)
            .ok_or(SimError::GroundItemNotFound(ground_item))?;
        local.items.check_free(unit, slot)?;

        let distance = local.position.distance(item.position);
        if distance.is_nan() || distance > self.config.pickup_radius {
            return Err(SimError::OutOfPickupRange {
                unit,
                item: ground_item,
                distance,
                radius: self.config.pickup_radius,
            });
        }
        Ok(Intent::PickupItem {
            unit,
            slot,
            ground_item,
        })
    }

    /// Replace a unit's equipment; stats are rederived on the next tick.
    ///
    /// # Errors
    ///
    /// [`SimError::UnitNotFound`] if the unit is not local.
    pub fn set_items(&mut self, unit: UnitId, items: ItemSlots) -> Result<()> {
        let local = self
            .units
            .get_mut(&unit)
            .ok_or(SimError::UnitNotFound(unit))?;
        local.items = items;
        Ok(())
    }

    /// Fold authoritative state for the local units into the prediction.
    ///
    /// Records for unknown units are ignored.
    pub fn reconcile(&mut self, records: &[AuthoritativeUnit]) {
        for record in records {
            let Some(unit) = self.units.get_mut(&record.id) else {
                continue;
            };
            unit.confirmed = true;

            if let Some(items) = &record.items {
                unit.items = items.clone();
            }
            unit.refresh_stats(&self.config);

            if let Some(hp) = record.hp.filter(|hp| hp.is_finite()) {
                unit.hp = hp.min(unit.max_hp);
            }

            if let Some(position) = record.position.filter(|p| p.is_finite()) {
                let drift = unit.position.distance(position);
                if drift > self.config.reconcile_snap_distance {
                    tracing::debug!(unit = %unit.id, drift, "Snapping to authoritative position");
                    unit.position = position;
                    unit.prev_position = position;
                    unit.steering.reset();
                }
            }
        }
    }

    /// Advance every local unit by one frame.
    ///
    /// `elapsed_ms` is the wall time since the previous frame. `world` is the
    /// latest snapshot and is not modified.
    pub fn tick(&mut self, elapsed_ms: f32, world: &WorldSnapshot) -> TickOutput {
        let dt_scale = self.clock.advance(elapsed_ms, &self.config);
        let now_ms = self.clock.now_ms();
        let mut out = TickOutput {
            dt_scale,
            intents: std::mem::take(&mut self.pending_intents),
            ..TickOutput::default()
        };

        // 1. Orders issued since the last frame
        for (id, order) in std::mem::take(&mut self.pending_orders) {
            if let Some(unit) = self.units.get_mut(&id) {
                behavior::apply_order(unit, order);
            }
        }

        // 2. Optimistically hidden resources
        self.hidden.expire(world, now_ms, &self.config);

        // 3. Dead units leave the prediction
        self.units.retain(|&id, unit| {
            if unit.is_alive() {
                return true;
            }
            tracing::debug!(unit = %id, "Unit removed");
            out.removed.push(id);
            false
        });

        // 4. Behavior and steering, in id order
        let obstacles =
            ObstacleMap::from_snapshot(world, self.local_player, &self.config, &self.hidden);
        let ctx = TickContext {
            config: &self.config,
            world,
            obstacles: &obstacles,
            local_player: self.local_player,
            dt_scale,
            now_ms,
        };
        for unit in self.units.values_mut() {
            behavior::update_unit(unit, &ctx, &mut self.hidden, &mut out.intents);
        }

        #[cfg(feature = "debug-validation")]
        for unit in self.units.values() {
            let depth = obstacles.penetration(unit.position, self.config.unit_radius);
            if depth > self.config.penetration_epsilon {
                tracing::warn!(unit = %unit.id, depth, "Unit inside an obstacle");
            }
        }

        // 5. Sync records
        out.sync = self.units.values().map(UnitSync::from).collect();

        self.tick += 1;
        out.tick = self.tick;

        tracing::trace!(
            tick = self.tick,
            dt_scale,
            units = self.units.len(),
            intents = out.intents.len(),
            obstacles = obstacles.len(),
            "Tick complete"
        );

        out
    }

    /// Hash of the predicted state.
    ///
    /// Two simulations fed the same inputs hash identically.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.clock.now_ms().to_bits().hash(&mut hasher);
        self.units.len().hash(&mut hasher);

        for (id, unit) in &self.units {
            id.hash(&mut hasher);
            unit.position.x.to_bits().hash(&mut hasher);
            unit.position.y.to_bits().hash(&mut hasher);
            unit.hp.to_bits().hash(&mut hasher);
            unit.attack_cooldown.to_bits().hash(&mut hasher);
            unit.facing.degrees().hash(&mut hasher);
            unit.anim.mode.hash(&mut hasher);
            unit.items.hash(&mut hasher);

            // Behavior discriminant plus whatever identifies its goal
            match unit.behavior {
                Behavior::Idle => 0_u8.hash(&mut hasher),
                Behavior::ManualMove { target, formation } => {
                    1_u8.hash(&mut hasher);
                    target.x.to_bits().hash(&mut hasher);
                    target.y.to_bits().hash(&mut hasher);
                    formation.hash(&mut hasher);
                }
                Behavior::Harvesting { resource, timer } => {
                    2_u8.hash(&mut hasher);
                    resource.hash(&mut hasher);
                    timer.map(f32::to_bits).hash(&mut hasher);
                }
                Behavior::Combat(target) => {
                    3_u8.hash(&mut hasher);
                    target.target.hash(&mut hasher);
                    target.user_issued.hash(&mut hasher);
                }
            }
        }

        self.hidden.len().hash(&mut hasher);
        hasher.finish()
    }

    fn check_known(&self, units: &[UnitId]) -> Result<()> {
        match units.iter().find(|id| !self.units.contains_key(id)) {
            Some(&missing) => {
                tracing::warn!(unit = %missing, "Rejected group order for unknown unit");
                Err(SimError::UnitNotFound(missing))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimMode;
    use crate::unit::ItemRef;
    use crate::world::{GroundItem, ItemId, RemoteUnit, ResourceId, ResourceKind, ResourceNode};

    const FRAME: f32 = 16.666;

    fn sim() -> PredictionSim {
        PredictionSim::new(PlayerId(1), SimConfig::default()).unwrap()
    }

    fn spawn(sim: &mut PredictionSim, id: u64, x: f32, y: f32) {
        sim.spawn_unit(UnitSpawn {
            id: UnitId(id),
            position: Vec2::new(x, y),
            items: ItemSlots::empty(),
        })
        .unwrap();
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    #[test]
    fn test_new_rejects_bad_config() {
        let config = SimConfig {
            aggro_radius: 300.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            PredictionSim::new(PlayerId(1), config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_spawn_queues_intent_once() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        assert!(matches!(
            sim.spawn_unit(UnitSpawn {
                id: UnitId(1),
                position: Vec2::ZERO,
                items: ItemSlots::empty(),
            }),
            Err(SimError::DuplicateUnit(UnitId(1)))
        ));

        let first = sim.tick(FRAME, &WorldSnapshot::default());
        assert_eq!(first.intents.len(), 1);
        assert!(matches!(first.intents[0], Intent::SpawnUnit { .. }));
        assert!(!sim.unit(UnitId(1)).unwrap().confirmed);

        let second = sim.tick(FRAME, &WorldSnapshot::default());
        assert!(second.intents.is_empty());
    }

    #[test]
    fn test_tick_increments() {
        let mut sim = sim();
        assert_eq!(sim.get_tick(), 0);
        let out = sim.tick(FRAME, &WorldSnapshot::default());
        assert_eq!(out.tick, 1);
        assert_eq!(sim.get_tick(), 1);
        assert!((out.dt_scale - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_dead_units_removed() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        spawn(&mut sim, 2, 100.0, 0.0);
        sim.reconcile(&[AuthoritativeUnit {
            id: UnitId(2),
            position: None,
            hp: Some(0.0),
            items: None,
        }]);

        let out = sim.tick(FRAME, &WorldSnapshot::default());
        assert_eq!(out.removed, vec![UnitId(2)]);
        assert_eq!(out.sync.len(), 1);
        assert!(sim.unit(UnitId(2)).is_none());
    }

    // ========================================================================
    // Orders
    // ========================================================================

    #[test]
    fn test_order_for_unknown_unit_rejected() {
        let mut sim = sim();
        assert!(matches!(
            sim.issue(UnitId(5), Order::Stop),
            Err(SimError::UnitNotFound(UnitId(5)))
        ));
        spawn(&mut sim, 1, 0.0, 0.0);
        assert!(sim
            .command_move(&[UnitId(1), UnitId(5)], Vec2::ZERO)
            .is_err());
    }

    #[test]
    fn test_group_orders_are_all_or_nothing() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        let mixed = [UnitId(1), UnitId(5)];

        assert!(matches!(
            sim.command_stop(&mixed),
            Err(SimError::UnitNotFound(UnitId(5)))
        ));
        assert!(matches!(
            sim.command_harvest(&mixed, ResourceId(3)),
            Err(SimError::UnitNotFound(UnitId(5)))
        ));
        assert!(sim.pending_orders.is_empty());

        sim.command_harvest(&[UnitId(1)], ResourceId(3)).unwrap();
        sim.command_stop(&[UnitId(1)]).unwrap();
        assert_eq!(
            sim.pending_orders,
            vec![
                (UnitId(1), Order::Harvest(ResourceId(3))),
                (UnitId(1), Order::Stop),
            ]
        );
    }

    #[test]
    fn test_group_move_spreads_goals() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        spawn(&mut sim, 2, 0.0, 100.0);
        sim.command_move(&[UnitId(1), UnitId(2)], Vec2::new(300.0, 300.0))
            .unwrap();
        for _ in 0..400 {
            sim.tick(FRAME, &WorldSnapshot::default());
        }
        let a = sim.unit(UnitId(1)).unwrap();
        let b = sim.unit(UnitId(2)).unwrap();
        assert_eq!(a.behavior, Behavior::Idle);
        assert_eq!(b.behavior, Behavior::Idle);
        // Two-unit ring of radius 20 around the target
        assert!((a.position.distance(Vec2::new(320.0, 300.0))) < 1e-3);
        assert!((b.position.distance(Vec2::new(280.0, 300.0))) < 1e-3);
    }

    #[test]
    fn test_group_attack_assigns_approach_points() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        spawn(&mut sim, 2, 0.0, 30.0);
        let world = WorldSnapshot {
            remote_units: vec![RemoteUnit {
                owner: PlayerId(2),
                id: UnitId(7),
                position: Vec2::new(300.0, 0.0),
                hp: 40.0,
                anim: AnimMode::Idle,
            }],
            ..WorldSnapshot::default()
        };
        let target = TargetRef::Unit {
            owner: PlayerId(2),
            unit: UnitId(7),
        };
        sim.command_attack(&[UnitId(1), UnitId(2)], target, &world)
            .unwrap();
        sim.tick(FRAME, &world);

        for id in [UnitId(1), UnitId(2)] {
            match sim.unit(id).unwrap().behavior {
                Behavior::Combat(t) => {
                    assert!(t.user_issued);
                    assert!(t.approach_point.is_some());
                    assert_eq!(t.target, target);
                }
                other => panic!("expected combat, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_attack_intents_until_target_gone() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        let mut world = WorldSnapshot {
            remote_units: vec![RemoteUnit {
                owner: PlayerId(2),
                id: UnitId(7),
                position: Vec2::new(35.0, 0.0),
                hp: 40.0,
                anim: AnimMode::Idle,
            }],
            ..WorldSnapshot::default()
        };

        let mut attacks = 0;
        for _ in 0..100 {
            attacks += sim
                .tick(FRAME, &world)
                .intents
                .iter()
                .filter(|i| matches!(i, Intent::AttackUnit { .. }))
                .count();
        }
        assert!(attacks >= 2);

        // The core never applies damage itself; the authority reports death.
        world.remote_units[0].hp = 0.0;
        let out = sim.tick(FRAME, &world);
        assert!(out.intents.is_empty());
        assert_eq!(sim.unit(UnitId(1)).unwrap().behavior, Behavior::Idle);
    }

    #[test]
    fn test_harvest_emits_single_collect() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        spawn(&mut sim, 2, 0.0, 60.0);
        let world = WorldSnapshot {
            resources: vec![ResourceNode {
                id: ResourceId(3),
                kind: ResourceKind::Blue,
                position: Vec2::new(40.0, 30.0),
            }],
            ..WorldSnapshot::default()
        };
        sim.issue(UnitId(1), Order::Harvest(ResourceId(3))).unwrap();
        sim.issue(UnitId(2), Order::Harvest(ResourceId(3))).unwrap();

        let mut collects = 0;
        for _ in 0..300 {
            collects += sim
                .tick(FRAME, &world)
                .intents
                .iter()
                .filter(|i| matches!(i, Intent::CollectResource { .. }))
                .count();
        }
        assert_eq!(collects, 1);
        assert!(sim.hidden_resources().contains(ResourceId(3)));
    }

    // ========================================================================
    // Reconciliation and items
    // ========================================================================

    #[test]
    fn test_reconcile_snaps_only_large_drift() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);

        sim.reconcile(&[AuthoritativeUnit {
            id: UnitId(1),
            position: Some(Vec2::new(50.0, 0.0)),
            hp: Some(500.0),
            items: None,
        }]);
        let unit = sim.unit(UnitId(1)).unwrap();
        assert_eq!(unit.position, Vec2::ZERO);
        assert!(unit.confirmed);
        assert_eq!(unit.hp, unit.max_hp);

        sim.reconcile(&[AuthoritativeUnit {
            id: UnitId(1),
            position: Some(Vec2::new(200.0, 0.0)),
            hp: Some(f32::NAN),
            items: None,
        }]);
        let unit = sim.unit(UnitId(1)).unwrap();
        assert_eq!(unit.position, Vec2::new(200.0, 0.0));
        assert_eq!(unit.hp, unit.max_hp);
    }

    #[test]
    fn test_items_change_max_hp() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        sim.set_items(UnitId(1), ItemSlots::starter(ItemId(1), ItemId(2)))
            .unwrap();
        let out = sim.tick(FRAME, &WorldSnapshot::default());
        assert!((out.sync[0].max_hp - 115.0).abs() < 1e-4);
    }

    #[test]
    fn test_request_pickup_validation() {
        let mut sim = sim();
        spawn(&mut sim, 1, 0.0, 0.0);
        let world = WorldSnapshot {
            ground_items: vec![
                GroundItem {
                    id: GroundItemId(1),
                    item: ItemRef::new(ItemId(9), "sword"),
                    position: Vec2::new(30.0, 0.0),
                },
                GroundItem {
                    id: GroundItemId(2),
                    item: ItemRef::new(ItemId(10), "shield"),
                    position: Vec2::new(300.0, 0.0),
                },
            ],
            ..WorldSnapshot::default()
        };

        assert_eq!(
            sim.request_pickup(UnitId(1), GroundItemId(1), 0, &world)
                .unwrap(),
            Intent::PickupItem {
                unit: UnitId(1),
                slot: 0,
                ground_item: GroundItemId(1),
            }
        );
        assert!(matches!(
            sim.request_pickup(UnitId(1), GroundItemId(2), 0, &world),
            Err(SimError::OutOfPickupRange { .. })
        ));
        assert!(matches!(
            sim.request_pickup(UnitId(1), GroundItemId(3), 0, &world),
            Err(SimError::GroundItemNotFound(_))
        ));
        assert!(matches!(
            sim.request_pickup(UnitId(1), GroundItemId(1), 4, &world),
            Err(SimError::SlotOutOfBounds { .. })
        ));

        sim.set_items(UnitId(1), ItemSlots::starter(ItemId(1), ItemId(2)))
            .unwrap();
        assert!(matches!(
            sim.request_pickup(UnitId(1), GroundItemId(1), 0, &world),
            Err(SimError::SlotOccupied { .. })
        ));
    }

    // ========================================================================
    // Determinism
    // ========================================================================

    #[test]
    fn test_deterministic_hash() {
        let run = || {
            let mut sim = sim();
            spawn(&mut sim, 1, 0.0, 0.0);
            spawn(&mut sim, 2, 40.0, 0.0);
            sim.command_move(&[UnitId(1), UnitId(2)], Vec2::new(200.0, 50.0))
                .unwrap();
            for i in 0..50_u8 {
                sim.tick(FRAME + f32::from(i % 3), &WorldSnapshot::default());
            }
            sim.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_hash_tracks_state() {
        let mut a = sim();
        let mut b = sim();
        spawn(&mut a, 1, 0.0, 0.0);
        spawn(&mut b, 1, 0.0, 0.0);
        assert_eq!(a.state_hash(), b.state_hash());
        b.issue(
            UnitId(1),
            Order::Move {
                target: Vec2::new(10.0, 0.0),
                formation: FormationSlot::SOLO,
            },
        )
        .unwrap();
        a.tick(FRAME, &WorldSnapshot::default());
        b.tick(FRAME, &WorldSnapshot::default());
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
