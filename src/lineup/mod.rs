//! Formation parsing and default pitch placement for the lineup builder.

pub mod formation;
pub mod placement;

pub use formation::{Formation, FormationError, PositionCounts};
pub use placement::{clamp_coordinate, default_coordinates, seed_from_appearances, PositionType, SeedCandidate, SeededSlot};
