//! Scenario loading.
//!
//! A scenario is a static world snapshot, the local player's starting units
//! and a schedule of group orders keyed by tick.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rts_predict::combat::TargetRef;
use rts_predict::config::SimConfig;
use rts_predict::error::SimError;
use rts_predict::math::Vec2;
use rts_predict::unit::{ItemSlots, UnitSpawn};
use rts_predict::world::{
    CollisionBox, EntityId, EntityKind, MapEntity, PlayerId, ResourceId, Tree, TreeId, UnitId,
    WorldSnapshot,
};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario or config was rejected by the simulation.
    #[error("Simulation rejected the scenario: {0}")]
    Sim(#[from] SimError),
}

/// A group order issued at a fixed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledOrder {
    /// Issued before this tick runs (0 = before the first tick).
    pub tick: u64,
    /// Units receiving the order.
    pub units: Vec<UnitId>,
    /// What to do.
    pub command: ScenarioCommand,
}

/// Orders a scenario can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScenarioCommand {
    /// Group move with formation slots.
    Move(Vec2),
    /// Group attack with spread approach points.
    Attack(TargetRef),
    /// Harvest a resource node.
    Harvest(ResourceId),
    /// Stop and idle.
    Stop,
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Player the simulation predicts for.
    #[serde(default = "default_local_player")]
    pub local_player: PlayerId,
    /// Suggested run length in ticks.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Local units to stage before the first tick.
    #[serde(default)]
    pub units: Vec<UnitSpawn>,
    /// Orders, in any order; applied when their tick comes up.
    #[serde(default)]
    pub orders: Vec<ScheduledOrder>,
    /// Static world for the whole run.
    #[serde(default)]
    pub world: WorldSnapshot,
}

const fn default_local_player() -> PlayerId {
    PlayerId(1)
}

const fn default_ticks() -> u64 {
    600
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A built-in scenario by name, if there is one.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "detour_demo" => Some(Self::detour_demo()),
            "tree_line" => Some(Self::tree_line()),
            _ => None,
        }
    }

    /// Resolve `name_or_path` as a built-in name first, then as a file.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// One unit walking around a 40x40 wall that sits on its straight path.
    #[must_use]
    pub fn detour_demo() -> Self {
        Self {
            name: "detour_demo".to_string(),
            description: "Unit at the origin, 40x40 wall at (50, 0), goal at (100, 0)".to_string(),
            local_player: default_local_player(),
            ticks: 240,
            units: vec![UnitSpawn {
                id: UnitId(1),
                position: Vec2::ZERO,
                items: ItemSlots::empty(),
            }],
            orders: vec![ScheduledOrder {
                tick: 0,
                units: vec![UnitId(1)],
                command: ScenarioCommand::Move(Vec2::new(100.0, 0.0)),
            }],
            world: WorldSnapshot {
                entities: vec![MapEntity {
                    id: EntityId(1),
                    kind: EntityKind::Tile,
                    owner: None,
                    position: Vec2::new(50.0, 0.0),
                    size: Some(Vec2::new(40.0, 40.0)),
                    collision: Some(CollisionBox {
                        w: 40.0,
                        h: 40.0,
                        offset: Vec2::ZERO,
                    }),
                    collides: true,
                    hp: None,
                }],
                ..WorldSnapshot::default()
            },
        }
    }

    /// A squad of four crossing a line of trees.
    #[must_use]
    pub fn tree_line() -> Self {
        let units = (0..4_u8)
            .map(|i| UnitSpawn {
                id: UnitId(u64::from(i) + 1),
                position: Vec2::new(0.0, f32::from(i) * 40.0 - 60.0),
                items: ItemSlots::empty(),
            })
            .collect::<Vec<_>>();
        let trees = (0..7_u8)
            .map(|i| Tree {
                id: TreeId(u32::from(i) + 1),
                position: Vec2::new(200.0, f32::from(i) * 70.0 - 210.0),
            })
            .collect();

        Self {
            name: "tree_line".to_string(),
            description: "Four units crossing a loose line of trees".to_string(),
            local_player: default_local_player(),
            ticks: 400,
            orders: vec![ScheduledOrder {
                tick: 0,
                units: units.iter().map(|u| u.id).collect(),
                command: ScenarioCommand::Move(Vec2::new(400.0, 0.0)),
            }],
            units,
            world: WorldSnapshot {
                trees,
                ..WorldSnapshot::default()
            },
        }
    }
}

/// Load a simulation config from a RON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimConfig, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(SimConfig::from_ron_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rts_predict::unit::UnitStats;

    #[test]
    fn test_builtin_scenarios() {
        let demo = Scenario::builtin("detour_demo").unwrap();
        assert_eq!(demo.units.len(), 1);
        assert_eq!(demo.world.entities.len(), 1);
        assert!(demo.world.entities[0].collides);

        assert_eq!(Scenario::builtin("tree_line").unwrap().units.len(), 4);
        assert!(Scenario::builtin("nope").is_none());
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Test",
                units: [
                    (id: 1, position: (x: 0.0, y: 0.0)),
                ],
                orders: [
                    (tick: 10, units: [1], command: Move((x: 50.0, y: 0.0))),
                    (tick: 20, units: [1], command: Attack(Entity(3))),
                    (tick: 30, units: [1], command: Stop),
                ],
                world: (
                    trees: [(id: 1, position: (x: 25.0, y: 0.0))],
                ),
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.local_player, PlayerId(1));
        assert_eq!(scenario.ticks, 600);
        assert_eq!(
            scenario.orders[1].command,
            ScenarioCommand::Attack(TargetRef::Entity(EntityId(3)))
        );
        assert_eq!(scenario.world.trees.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_files() {
        use std::io::Write;

        let mut scenario_file = tempfile::NamedTempFile::new().unwrap();
        scenario_file
            .write_all(ron::to_string(&Scenario::tree_line()).unwrap().as_bytes())
            .unwrap();
        assert_eq!(
            Scenario::load(scenario_file.path()).unwrap(),
            Scenario::tree_line()
        );

        let mut config_file = tempfile::NamedTempFile::new().unwrap();
        config_file
            .write_all(b"(chase_speed: 2.5, aggro_radius: 180.0)")
            .unwrap();
        let config = load_config(config_file.path()).unwrap();
        assert_eq!(config.chase_speed, 2.5);
        assert_eq!(config.unit_radius, SimConfig::default().unit_radius);

        let mut bad_file = tempfile::NamedTempFile::new().unwrap();
        bad_file.write_all(b"(aggro_radius: 400.0)").unwrap();
        assert!(matches!(
            load_config(bad_file.path()),
            Err(ScenarioError::Sim(SimError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_bundled_files_parse() {
        let skirmish = Scenario::from_ron_str(include_str!("../scenarios/skirmish.ron")).unwrap();
        assert_eq!(skirmish.units.len(), 4);
        assert_eq!(skirmish.world.remote_units.len(), 2);
        let stats = UnitStats::from_items(&skirmish.units[0].items, &SimConfig::default());
        assert_eq!((stats.attack, stats.defense), (1, 1));

        let tuning = SimConfig::from_ron_str(include_str!("../scenarios/tuning.ron")).unwrap();
        assert_eq!(tuning.stuck_ticks, 24);
    }

    #[test]
    fn test_resolve_prefers_builtin() {
        assert_eq!(
            Scenario::resolve("detour_demo").unwrap(),
            Scenario::detour_demo()
        );
    }
}
