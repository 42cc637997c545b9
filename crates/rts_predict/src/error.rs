//! Error types for the prediction core.
//!
//! Errors only surface at the API boundary (orders, spawning, config, pickup
//! requests). A running tick never fails: stale references are dropped,
//! deadlocks are nudged apart and malformed numbers mean "no movement".

use thiserror::Error;

use crate::world::{GroundItemId, UnitId};

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for the prediction core.
#[derive(Debug, Error)]
pub enum SimError {
    /// An order or query named a unit this client does not own.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// A spawn reused an id that is already staged or live.
    #[error("Unit already exists: {0}")]
    DuplicateUnit(UnitId),

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// The ground item is not in the current snapshot.
    #[error("Ground item not found: {0}")]
    GroundItemNotFound(GroundItemId),

    /// The unit is too far from the ground item to pick it up.
    #[error("Unit {unit} is {distance:.1} away from item {item}, pickup radius is {radius:.1}")]
    OutOfPickupRange {
        /// The picking unit.
        unit: UnitId,
        /// The ground item.
        item: GroundItemId,
        /// Current center distance.
        distance: f32,
        /// Allowed radius.
        radius: f32,
    },

    /// Item slot index past the end of the slot array.
    #[error("Item slot {slot} out of bounds (unit has {capacity} slots)")]
    SlotOutOfBounds {
        /// Requested slot.
        slot: usize,
        /// Number of slots.
        capacity: usize,
    },

    /// Item slot already holds an item.
    #[error("Item slot {slot} on unit {unit} is occupied")]
    SlotOccupied {
        /// The unit.
        unit: UnitId,
        /// Requested slot.
        slot: usize,
    },
}
