//! Inbound world snapshot.
//!
//! Everything in here is supplied by the transport layer between ticks and is
//! read-only for the core. Other players' units, map entities, buildings,
//! resources, trees and ground items are referenced by id only; the core
//! resolves ids against the latest snapshot every time it needs them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::animation::AnimMode;
use crate::collision::Rect;
use crate::math::Vec2;
use crate::unit::{ItemRef, ItemSlots};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// A connected player (session) identifier.
    PlayerId(u64)
);
id_type!(
    /// A unit identifier, unique per owning player.
    UnitId(u64)
);
id_type!(
    /// A map entity (building, town center, mine, tile) identifier.
    EntityId(u64)
);
id_type!(
    /// A resource node identifier.
    ResourceId(u64)
);
id_type!(
    /// A tree identifier.
    TreeId(u32)
);
id_type!(
    /// An item lying on the ground.
    GroundItemId(u64)
);
id_type!(
    /// An equippable item instance.
    ItemId(u64)
);

/// A unit owned by another player, as last reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUnit {
    /// Owning player.
    pub owner: PlayerId,
    /// Unit id within the owner's roster.
    pub id: UnitId,
    /// World position.
    pub position: Vec2,
    /// Current hit points.
    pub hp: f32,
    /// Animation tag, for presentation only.
    #[serde(default)]
    pub anim: AnimMode,
}

impl RemoteUnit {
    /// Alive and positioned somewhere sensible.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.hp > 0.0 && self.position.is_finite()
    }
}

/// What a map entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A player's town center.
    TownCenter,
    /// A generic building.
    Building,
    /// A mine.
    Mine,
    /// A placed map tile.
    #[default]
    Tile,
    /// Anything else (props, markers).
    Decoration,
}

impl EntityKind {
    /// Entities of this kind can be attacked.
    #[must_use]
    pub const fn is_attackable(self) -> bool {
        matches!(self, Self::TownCenter | Self::Building | Self::Mine)
    }
}

/// Explicit collision footprint, distinct from the visual size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionBox {
    /// Collision width.
    pub w: f32,
    /// Collision height.
    pub h: f32,
    /// Offset of the collision center from the entity position.
    #[serde(default)]
    pub offset: Vec2,
}

/// A map entity (placed building, town center, mine or tile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntity {
    /// Entity id.
    pub id: EntityId,
    /// Entity kind.
    pub kind: EntityKind,
    /// Owning player, `None` for neutral/unowned entities.
    #[serde(default)]
    pub owner: Option<PlayerId>,
    /// World position (visual center).
    pub position: Vec2,
    /// Visual size (width, height), if known.
    #[serde(default)]
    pub size: Option<Vec2>,
    /// Collision footprint override.
    #[serde(default)]
    pub collision: Option<CollisionBox>,
    /// Whether this entity blocks movement.
    #[serde(default)]
    pub collides: bool,
    /// Hit points; entities without hp are not alive for combat purposes.
    #[serde(default)]
    pub hp: Option<f32>,
}

impl MapEntity {
    /// Has positive hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp.is_some_and(|hp| hp > 0.0)
    }

    /// Width and height used for collision and range checks: the collision
    /// box, then the visual size, then `default_size`.
    #[must_use]
    pub fn footprint(&self, default_size: Vec2) -> Vec2 {
        if let Some(cb) = self.collision {
            return Vec2::new(cb.w, cb.h);
        }
        self.size.unwrap_or(default_size)
    }

    /// Approximate radius: half of the longer footprint side.
    #[must_use]
    pub fn approx_radius(&self, default_size: Vec2) -> f32 {
        let size = self.footprint(default_size);
        size.x.abs().max(size.y.abs()) / 2.0
    }

    /// Collision rectangle, honoring the collision box offset.
    #[must_use]
    pub fn collision_rect(&self, default_size: Vec2) -> Rect {
        let offset = self.collision.map_or(Vec2::ZERO, |cb| cb.offset);
        let size = self.footprint(default_size);
        Rect::from_center_size(self.position + offset, size.x, size.y)
    }
}

/// A player-placed building with the fixed default footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Building id.
    pub id: EntityId,
    /// Owning player.
    pub owner: PlayerId,
    /// World position (center).
    pub position: Vec2,
}

/// Resource color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Red crystals.
    #[default]
    Red,
    /// Green crystals.
    Green,
    /// Blue crystals.
    Blue,
}

/// A harvestable resource node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Resource id.
    pub id: ResourceId,
    /// Resource color.
    #[serde(default)]
    pub kind: ResourceKind,
    /// World position.
    pub position: Vec2,
}

/// A tree (circular obstacle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Tree id.
    pub id: TreeId,
    /// Trunk position.
    pub position: Vec2,
}

/// An item lying on the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundItem {
    /// Ground item id.
    pub id: GroundItemId,
    /// The item.
    pub item: ItemRef,
    /// World position.
    pub position: Vec2,
}

/// Latest authoritative view of everything the local player does not own.
///
/// Refreshed externally between ticks; within a tick it is shared read-only
/// by every unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Units of every player (the local player's own entries are ignored).
    #[serde(default)]
    pub remote_units: Vec<RemoteUnit>,
    /// Map entities.
    #[serde(default)]
    pub entities: Vec<MapEntity>,
    /// Player-placed buildings.
    #[serde(default)]
    pub buildings: Vec<Building>,
    /// Resource nodes.
    #[serde(default)]
    pub resources: Vec<ResourceNode>,
    /// Trees.
    #[serde(default)]
    pub trees: Vec<Tree>,
    /// Items on the ground.
    #[serde(default)]
    pub ground_items: Vec<GroundItem>,
}

impl WorldSnapshot {
    /// Look up a remote unit by owner and id.
    #[must_use]
    pub fn remote_unit(&self, owner: PlayerId, id: UnitId) -> Option<&RemoteUnit> {
        self.remote_units
            .iter()
            .find(|u| u.owner == owner && u.id == id)
    }

    /// Look up a map entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&MapEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Look up a resource node by id.
    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceNode> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Look up a ground item by id.
    #[must_use]
    pub fn ground_item(&self, id: GroundItemId) -> Option<&GroundItem> {
        self.ground_items.iter().find(|g| g.id == id)
    }
}

/// Authoritative echo of one of the local player's units.
///
/// Absent fields leave the predicted value untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeUnit {
    /// Unit id.
    pub id: UnitId,
    /// Position the authority holds for the unit.
    #[serde(default)]
    pub position: Option<Vec2>,
    /// Authoritative hit points.
    #[serde(default)]
    pub hp: Option<f32>,
    /// Authoritative equipment.
    #[serde(default)]
    pub items: Option<ItemSlots>,
}
