//! Locally owned units, their equipment and derived stats.

use serde::{Deserialize, Serialize};

use crate::animation::{AnimState, Facing};
use crate::behavior::Behavior;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::math::Vec2;
use crate::steering::SteeringState;
use crate::world::{ItemId, UnitId};

/// Number of equipment slots on a unit.
pub const MAX_ITEM_SLOTS: usize = 4;

/// What an item does for its wearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// +1 attack.
    Sword,
    /// +1 defense.
    Shield,
    /// No stat effect.
    Other,
}

/// An item instance, identified by id and described by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    /// Item instance id.
    pub id: ItemId,
    /// Item name (case-insensitive; determines the kind).
    pub name: String,
}

impl ItemRef {
    /// Create an item reference.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Classify by name.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        if self.name.eq_ignore_ascii_case("sword") {
            ItemKind::Sword
        } else if self.name.eq_ignore_ascii_case("shield") {
            ItemKind::Shield
        } else {
            ItemKind::Other
        }
    }
}

/// Fixed equipment slots, each empty or holding one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemSlots([Option<ItemRef>; MAX_ITEM_SLOTS]);

impl ItemSlots {
    /// All slots empty.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A sword in slot 0 and a shield in slot 1, the loadout of a freshly
    /// trained unit.
    #[must_use]
    pub fn starter(sword: ItemId, shield: ItemId) -> Self {
        let mut slots = Self::empty();
        slots.0[0] = Some(ItemRef::new(sword, "sword"));
        slots.0[1] = Some(ItemRef::new(shield, "shield"));
        slots
    }

    /// Item in `slot`, `None` when empty or out of bounds.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&ItemRef> {
        self.0.get(slot).and_then(Option::as_ref)
    }

    /// Put an item into an empty slot.
    ///
    /// # Errors
    ///
    /// [`SimError::SlotOutOfBounds`] or [`SimError::SlotOccupied`].
    pub fn equip(&mut self, unit: UnitId, slot: usize, item: ItemRef) -> Result<()> {
        let entry = self.0.get_mut(slot).ok_or(SimError::SlotOutOfBounds {
            slot,
            capacity: MAX_ITEM_SLOTS,
        })?;
        if entry.is_some() {
            return Err(SimError::SlotOccupied { unit, slot });
        }
        *entry = Some(item);
        Ok(())
    }

    /// Check that `slot` exists and is empty.
    ///
    /// # Errors
    ///
    /// [`SimError::SlotOutOfBounds`] or [`SimError::SlotOccupied`].
    pub fn check_free(&self, unit: UnitId, slot: usize) -> Result<()> {
        match self.0.get(slot) {
            None => Err(SimError::SlotOutOfBounds {
                slot,
                capacity: MAX_ITEM_SLOTS,
            }),
            Some(Some(_)) => Err(SimError::SlotOccupied { unit, slot }),
            Some(None) => Ok(()),
        }
    }

    /// Take the item out of `slot`.
    pub fn take(&mut self, slot: usize) -> Option<ItemRef> {
        self.0.get_mut(slot).and_then(Option::take)
    }

    /// Equipped items.
    pub fn iter(&self) -> impl Iterator<Item = &ItemRef> {
        self.0.iter().flatten()
    }
}

/// Stats derived from equipment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    /// Attack points (swords).
    pub attack: u32,
    /// Defense points (shields).
    pub defense: u32,
    /// Maximum hit points.
    pub max_hp: f32,
    /// Damage per second.
    pub dps: f32,
}

impl UnitStats {
    /// Derive stats from equipped items. Pure: the same items always give
    /// the same stats.
    #[must_use]
    pub fn from_items(items: &ItemSlots, config: &SimConfig) -> Self {
        let (attack, defense) = items.iter().fold((0, 0), |(a, d), item| match item.kind() {
            ItemKind::Sword => (a + 1, d),
            ItemKind::Shield => (a, d + 1),
            ItemKind::Other => (a, d),
        });
        Self {
            attack,
            defense,
            max_hp: config.base_hp + defense as f32 * config.hp_per_defense,
            dps: config.base_dps + attack as f32 * config.dps_per_attack,
        }
    }
}

/// Request to stage a new local unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Id chosen by the client.
    pub id: UnitId,
    /// Spawn position.
    pub position: Vec2,
    /// Starting equipment.
    #[serde(default)]
    pub items: ItemSlots,
}

/// A locally owned, locally simulated unit.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Unit id.
    pub id: UnitId,
    /// Predicted position.
    pub position: Vec2,
    /// Position at the start of the current tick.
    pub prev_position: Vec2,
    /// Last commanded move point.
    pub move_target: Option<Vec2>,
    /// Active mode.
    pub behavior: Behavior,
    /// Animation counters.
    pub anim: AnimState,
    /// Facing.
    pub facing: Facing,
    /// Milliseconds accumulated toward the next attack.
    pub attack_cooldown: f32,
    /// Current hit points.
    pub hp: f32,
    /// Derived maximum hit points.
    pub max_hp: f32,
    /// Equipment.
    pub items: ItemSlots,
    /// Detour and stuck-detection state.
    pub steering: SteeringState,
    /// Whether the authority has echoed this unit back.
    pub confirmed: bool,
}

impl Unit {
    /// Stage a unit from a spawn request at full health.
    #[must_use]
    pub fn spawn(spawn: &UnitSpawn, config: &SimConfig) -> Self {
        let stats = UnitStats::from_items(&spawn.items, config);
        Self {
            id: spawn.id,
            position: spawn.position,
            prev_position: spawn.position,
            move_target: Some(spawn.position),
            behavior: Behavior::Idle,
            anim: AnimState::default(),
            facing: Facing::default(),
            attack_cooldown: 0.0,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            items: spawn.items.clone(),
            steering: SteeringState::default(),
            confirmed: false,
        }
    }

    /// Recompute derived stats and clamp hp to the new maximum.
    pub fn refresh_stats(&mut self, config: &SimConfig) -> UnitStats {
        let stats = UnitStats::from_items(&self.items, config);
        self.max_hp = stats.max_hp;
        if self.hp > self.max_hp {
            self.hp = self.max_hp;
        }
        stats
    }

    /// Has positive hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }
}
