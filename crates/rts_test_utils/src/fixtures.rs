//! Test fixtures and helpers.
//!
//! Pre-built worlds and simulations for consistent testing.

use rts_predict::animation::AnimMode;
use rts_predict::config::SimConfig;
use rts_predict::math::Vec2;
use rts_predict::simulation::PredictionSim;
use rts_predict::unit::{ItemSlots, UnitSpawn};
use rts_predict::world::{
    Building, CollisionBox, EntityId, EntityKind, MapEntity, PlayerId, RemoteUnit, ResourceId,
    ResourceKind, ResourceNode, Tree, TreeId, UnitId, WorldSnapshot,
};

/// Player id used for the local side in fixtures.
pub const LOCAL_PLAYER: PlayerId = PlayerId(1);

/// Player id used for the opposing side in fixtures.
pub const ENEMY_PLAYER: PlayerId = PlayerId(2);

/// One nominal 60 Hz frame in milliseconds.
pub const FRAME_MS: f32 = 16.666;

/// Shorthand for [`Vec2::new`].
#[must_use]
pub const fn v(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

/// Spawn request with no equipment.
#[must_use]
pub fn bare_spawn(id: u64, position: Vec2) -> UnitSpawn {
    UnitSpawn {
        id: UnitId(id),
        position,
        items: ItemSlots::empty(),
    }
}

/// A simulation for [`LOCAL_PLAYER`] with default tuning and the given
/// unequipped units.
///
/// # Panics
///
/// Panics on duplicate ids.
#[must_use]
pub fn sim_with_units(units: &[(u64, Vec2)]) -> PredictionSim {
    sim_with_config(SimConfig::default(), units)
}

/// Like [`sim_with_units`] with explicit tuning.
///
/// # Panics
///
/// Panics if `config` is invalid or on duplicate ids.
#[must_use]
pub fn sim_with_config(config: SimConfig, units: &[(u64, Vec2)]) -> PredictionSim {
    let mut sim = PredictionSim::new(LOCAL_PLAYER, config).expect("fixture config is valid");
    for &(id, position) in units {
        sim.spawn_unit(bare_spawn(id, position))
            .expect("fixture unit ids are unique");
    }
    sim
}

/// Builder for [`WorldSnapshot`]s.
///
/// Ids are assigned in insertion order starting at 1 per kind.
#[derive(Debug, Clone, Default)]
pub struct WorldBuilder {
    world: WorldSnapshot,
}

impl WorldBuilder {
    /// Empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tree.
    #[must_use]
    pub fn tree(mut self, position: Vec2) -> Self {
        let id = TreeId(next_id(self.world.trees.len()) as u32);
        self.world.trees.push(Tree { id, position });
        self
    }

    /// Add a resource node.
    #[must_use]
    pub fn resource(mut self, kind: ResourceKind, position: Vec2) -> Self {
        let id = ResourceId(next_id(self.world.resources.len()));
        self.world.resources.push(ResourceNode { id, kind, position });
        self
    }

    /// Add a player building with the default footprint.
    ///
    /// Building ids start at 1001 so they never clash with entity ids.
    #[must_use]
    pub fn building(mut self, owner: PlayerId, position: Vec2) -> Self {
        let id = EntityId(1000 + next_id(self.world.buildings.len()));
        self.world.buildings.push(Building {
            id,
            owner,
            position,
        });
        self
    }

    /// Add a colliding tile entity with a `w` by `h` footprint centered at
    /// `position`.
    #[must_use]
    pub fn wall(mut self, position: Vec2, w: f32, h: f32) -> Self {
        let id = EntityId(next_id(self.world.entities.len()));
        self.world.entities.push(MapEntity {
            id,
            kind: EntityKind::Tile,
            owner: None,
            position,
            size: Some(v(w, h)),
            collision: Some(CollisionBox {
                w,
                h,
                offset: Vec2::ZERO,
            }),
            collides: true,
            hp: None,
        });
        self
    }

    /// Add an attackable entity such as an enemy town center.
    #[must_use]
    pub fn target_entity(
        mut self,
        kind: EntityKind,
        owner: Option<PlayerId>,
        position: Vec2,
        hp: f32,
    ) -> Self {
        let id = EntityId(next_id(self.world.entities.len()));
        self.world.entities.push(MapEntity {
            id,
            kind,
            owner,
            position,
            size: None,
            collision: None,
            collides: false,
            hp: Some(hp),
        });
        self
    }

    /// Add an enemy unit owned by [`ENEMY_PLAYER`].
    #[must_use]
    pub fn enemy(mut self, id: u64, position: Vec2, hp: f32) -> Self {
        self.world.remote_units.push(RemoteUnit {
            owner: ENEMY_PLAYER,
            id: UnitId(id),
            position,
            hp,
            anim: AnimMode::Idle,
        });
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> WorldSnapshot {
        self.world
    }
}

fn next_id(len: usize) -> u64 {
    len as u64 + 1
}

/// Parse a world snapshot written in RON.
///
/// # Panics
///
/// Panics if `source` is not a valid snapshot.
#[must_use]
pub fn world_from_ron(source: &str) -> WorldSnapshot {
    ron::from_str(source).expect("fixture world parses")
}

/// The rectangle detour scenario: a 40x40 wall centered at (50, 0) between
/// a unit at the origin and a goal at (100, 0).
#[must_use]
pub fn rect_detour_world() -> WorldSnapshot {
    WorldBuilder::new().wall(v(50.0, 0.0), 40.0, 40.0).build()
}

/// A scattered field of trees for crowded-tick benchmarks and property
/// tests. Trees sit on a jittered grid so paths between them exist.
#[must_use]
pub fn tree_field(columns: u32, rows: u32, spacing: f32) -> WorldSnapshot {
    let mut builder = WorldBuilder::new();
    for row in 0..rows {
        for col in 0..columns {
            let jitter = ((row * 7 + col * 13) % 5) as f32 * 4.0;
            builder = builder.tree(v(
                col as f32 * spacing + jitter,
                row as f32 * spacing - jitter,
            ));
        }
    }
    builder.build()
}
