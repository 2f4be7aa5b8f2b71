//! Shared primitive types used across the entire simulation.

/// A character's age in whole years. One turn = one year.
pub type Age = u32;

/// A stable, unique identifier for a simulated character.
pub type CharacterId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Identifier of an authored event in the catalog.
pub type EventId = String;
