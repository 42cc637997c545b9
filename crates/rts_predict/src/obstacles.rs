//! Frame-local obstacle map.
//!
//! Built once per tick from the world snapshot and shared read-only by every
//! local unit. Queries never move anything; only the steering controller
//! decides what to do with the answers.

use serde::{Deserialize, Serialize};

use crate::collision::{
    circle_overlaps_circle, circle_overlaps_rect, resolve_circle_circle, resolve_circle_rect,
    Contact, Rect,
};
use crate::config::SimConfig;
use crate::harvest::HiddenResources;
use crate::math::Vec2;
use crate::world::{EntityId, EntityKind, PlayerId, ResourceId, TreeId, UnitId, WorldSnapshot};

/// Obstacle category. Declaration order is the resolution priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Tree trunk.
    Tree,
    /// Resource node.
    Resource,
    /// Player building or attackable map entity.
    Building,
    /// Collidable map tile.
    Tile,
    /// Unit of another player.
    EnemyUnit,
}

/// Identity of the world object behind an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleId {
    /// A tree.
    Tree(TreeId),
    /// A resource node.
    Resource(ResourceId),
    /// A player building or map entity.
    Entity(EntityId),
    /// Another player's unit.
    Unit {
        /// Owning player.
        owner: PlayerId,
        /// Unit id.
        unit: UnitId,
    },
}

/// Obstacle geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle around a center.
    Circle {
        /// Center.
        center: Vec2,
        /// Radius.
        radius: f32,
    },
    /// Axis-aligned rectangle.
    Rect(Rect),
}

/// A single solid obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// What it is.
    pub id: ObstacleId,
    /// Category (resolution priority).
    pub kind: ObstacleKind,
    /// Geometry.
    pub shape: Shape,
}

impl Obstacle {
    /// Probe without resolving.
    #[must_use]
    pub fn overlaps(&self, point: Vec2, radius: f32) -> bool {
        match self.shape {
            Shape::Circle { center, radius: r } => circle_overlaps_circle(point, radius, center, r),
            Shape::Rect(rect) => circle_overlaps_rect(point, radius, &rect),
        }
    }

    /// Minimum translation out of this obstacle, if overlapping.
    #[must_use]
    pub fn resolve(&self, point: Vec2, radius: f32) -> Option<Contact> {
        match self.shape {
            Shape::Circle { center, radius: r } => resolve_circle_circle(point, radius, center, r),
            Shape::Rect(rect) => resolve_circle_rect(point, radius, &rect),
        }
    }

    /// Approximate center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        match self.shape {
            Shape::Circle { center, .. } => center,
            Shape::Rect(rect) => rect.center,
        }
    }

    fn is_finite(&self) -> bool {
        match self.shape {
            Shape::Circle { center, radius } => center.is_finite() && radius.is_finite(),
            Shape::Rect(rect) => rect.center.is_finite() && rect.half_extents.is_finite(),
        }
    }
}

/// All solid obstacles known this tick, in priority order.
#[derive(Debug, Clone, Default)]
pub struct ObstacleMap {
    obstacles: Vec<Obstacle>,
}

impl ObstacleMap {
    /// Build a map from explicit obstacles.
    ///
    /// Non-finite entries are dropped; the rest are ordered by kind, keeping
    /// the given order within a kind.
    #[must_use]
    pub fn new(obstacles: impl IntoIterator<Item = Obstacle>) -> Self {
        let mut obstacles: Vec<Obstacle> = obstacles.into_iter().filter(Obstacle::is_finite).collect();
        obstacles.sort_by_key(|o| o.kind);
        Self { obstacles }
    }

    /// Collect every solid thing in `world` that the local player's units
    /// must walk around.
    ///
    /// Locally collected resources in `hidden` are left out. Units of
    /// `local_player` never block each other.
    #[must_use]
    pub fn from_snapshot(
        world: &WorldSnapshot,
        local_player: PlayerId,
        config: &SimConfig,
        hidden: &HiddenResources,
    ) -> Self {
        let trees = world.trees.iter().map(|t| Obstacle {
            id: ObstacleId::Tree(t.id),
            kind: ObstacleKind::Tree,
            shape: Shape::Circle {
                center: t.position,
                radius: config.tree_radius,
            },
        });

        let resources = world
            .resources
            .iter()
            .filter(|r| !hidden.contains(r.id))
            .map(|r| Obstacle {
                id: ObstacleId::Resource(r.id),
                kind: ObstacleKind::Resource,
                shape: Shape::Circle {
                    center: r.position,
                    radius: config.resource_collide_radius,
                },
            });

        let building_size = config.building_size;
        let buildings = world.buildings.iter().map(|b| Obstacle {
            id: ObstacleId::Entity(b.id),
            kind: ObstacleKind::Building,
            shape: Shape::Rect(
                Rect::from_center_size(b.position, building_size.x, building_size.y)
                    .expanded(config.building_padding),
            ),
        });

        let entities = world.entities.iter().filter(|e| e.collides).map(|e| Obstacle {
            id: ObstacleId::Entity(e.id),
            kind: match e.kind {
                EntityKind::Tile | EntityKind::Decoration => ObstacleKind::Tile,
                EntityKind::TownCenter | EntityKind::Building | EntityKind::Mine => {
                    ObstacleKind::Building
                }
            },
            shape: Shape::Rect(e.collision_rect(building_size)),
        });

        let units = world
            .remote_units
            .iter()
            .filter(|u| u.owner != local_player && u.is_live())
            .map(|u| Obstacle {
                id: ObstacleId::Unit {
                    owner: u.owner,
                    unit: u.id,
                },
                kind: ObstacleKind::EnemyUnit,
                shape: Shape::Circle {
                    center: u.position,
                    radius: config.unit_radius,
                },
            });

        Self::new(
            trees
                .chain(resources)
                .chain(buildings)
                .chain(entities)
                .chain(units),
        )
    }

    /// Number of obstacles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// No obstacles at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Iterate in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    /// Would a circle at `point` overlap anything? Non-finite points are
    /// always blocked.
    #[must_use]
    pub fn is_blocked(&self, point: Vec2, radius: f32) -> bool {
        if !point.is_finite() {
            return true;
        }
        self.obstacles.iter().any(|o| o.overlaps(point, radius))
    }

    /// First overlapping obstacle in priority order, with its resolution.
    #[must_use]
    pub fn first_contact(&self, point: Vec2, radius: f32) -> Option<(&Obstacle, Contact)> {
        self.obstacles
            .iter()
            .find_map(|o| o.resolve(point, radius).map(|c| (o, c)))
    }

    /// Probe the straight segment `from -> to` at sub-radius spacing.
    #[must_use]
    pub fn is_path_clear(&self, from: Vec2, to: Vec2, radius: f32) -> bool {
        let length = from.distance(to);
        if !length.is_finite() {
            return false;
        }
        let spacing = (radius * 0.5).max(1.0);
        let samples = (length / spacing).ceil().max(1.0) as u32;
        (1..=samples).all(|i| {
            let t = i as f32 / samples as f32;
            !self.is_blocked(from + (to - from) * t, radius)
        })
    }

    /// Deepest overlap of a circle at `point` with any obstacle, 0 if clear.
    #[must_use]
    pub fn penetration(&self, point: Vec2, radius: f32) -> f32 {
        self.obstacles
            .iter()
            .filter_map(|o| o.resolve(point, radius))
            .map(|c| c.overlap)
            .fold(0.0, f32::max)
    }
}
