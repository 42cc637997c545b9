//! # RTS Predict
//!
//! Client-side prediction core for a multiplayer top-down strategy game.
//!
//! Each rendered frame the client advances its own units locally (movement,
//! collision, obstacle avoidance, combat targeting, harvesting) and stages
//! messages for the authoritative state holder. The authority decides
//! damage, deaths and resource totals; this crate only predicts and
//! proposes.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO or transport
//! - No system randomness
//! - No wall-clock reads (the caller passes elapsed time in)
//!
//! ## Crate Structure
//!
//! - [`math`], [`collision`] - Vectors and circle/rect contact geometry
//! - [`obstacles`] - Frame-local obstacle map built from the world snapshot
//! - [`steering`] - Collision-aware stepping with detours and stuck recovery
//! - [`behavior`], [`harvest`], [`combat`] - Per-unit state machine
//! - [`simulation`] - The tick driver, [`PredictionSim`](simulation::PredictionSim)
//! - [`world`], [`intents`] - Inbound snapshot and outbound messages

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod animation;
pub mod behavior;
pub mod clock;
pub mod collision;
pub mod combat;
pub mod config;
pub mod error;
pub mod harvest;
pub mod intents;
pub mod math;
pub mod obstacles;
pub mod simulation;
pub mod steering;
pub mod unit;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::animation::{AnimMode, Facing};
    pub use crate::behavior::{Behavior, FormationSlot, Order};
    pub use crate::combat::{EnemyTarget, TargetRef};
    pub use crate::config::SimConfig;
    pub use crate::error::{Result, SimError};
    pub use crate::intents::{Intent, TickOutput, UnitSync};
    pub use crate::math::Vec2;
    pub use crate::simulation::PredictionSim;
    pub use crate::unit::{ItemRef, ItemSlots, Unit, UnitSpawn};
    pub use crate::world::{
        AuthoritativeUnit, Building, EntityId, EntityKind, GroundItem, GroundItemId, ItemId,
        MapEntity, PlayerId, RemoteUnit, ResourceId, ResourceKind, ResourceNode, Tree, TreeId,
        UnitId, WorldSnapshot,
    };
}
