use std::fmt;
use std::str::FromStr;
use serde::Serialize;
use thiserror::Error;

/// Team sizes the club plays.
pub const SUPPORTED_PLAYER_COUNTS: [i32; 4] = [5, 7, 9, 11];
/// Largest single layer: every outfield player of an 11-a-side team.
pub const MAX_LAYER_SIZE: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormationError {
    #[error("Invalid formation structure format. Use numbers and hyphens only (e.g. 4-4-2).")]
    Malformed,
    #[error("Formation should have {expected} outfield players for {player_count}-a-side format. Current structure has {actual} outfield players.")]
    WrongOutfieldCount { player_count: i32, expected: i32, actual: i32 },
    #[error("{0}-a-side is not supported; use 5, 7, 9 or 11")]
    UnsupportedPlayerCount(i32),
}

/// Outfield layers from defence forwards, e.g. `4-4-2`. The goalkeeper is implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formation {
    layers: Vec<u32>,
}

impl Formation {
    pub fn parse(structure: &str) -> Result<Self, FormationError> {
        let layers = structure
            .trim()
            .split('-')
            .map(|layer| layer.trim().parse::<u32>().map_err(|_| FormationError::Malformed))
            .collect::<Result<Vec<_>, _>>()?;
        if layers.is_empty() || layers.iter().any(|&n| n == 0 || n > MAX_LAYER_SIZE) {
            return Err(FormationError::Malformed);
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[u32] {
        &self.layers
    }

    pub fn outfield(&self) -> i32 {
        self.layers
            .iter()
            .fold(0i32, |total, &n| total.saturating_add(n as i32))
    }

    pub fn validate_for(&self, player_count: i32) -> Result<(), FormationError> {
        if !SUPPORTED_PLAYER_COUNTS.contains(&player_count) {
            return Err(FormationError::UnsupportedPlayerCount(player_count));
        }
        if self.outfield() + 1 != player_count {
            return Err(FormationError::WrongOutfieldCount {
                player_count,
                expected: player_count - 1,
                actual: self.outfield(),
            });
        }
        Ok(())
    }

    pub fn position_counts(&self) -> PositionCounts {
        PositionCounts::from_formation(Some(self))
    }
}

impl FromStr for Formation {
    type Err = FormationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formation::parse(s)
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.layers.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", parts.join("-"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionCounts {
    pub goalkeepers: u32,
    pub defenders: u32,
    pub midfielders: u32,
    pub forwards: u32,
}

impl PositionCounts {
    /// Counts from the first three layers; 4-4-2 when there is no usable formation.
    pub fn from_formation(formation: Option<&Formation>) -> Self {
        let mut counts = Self { goalkeepers: 1, defenders: 4, midfielders: 4, forwards: 2 };
        if let Some(formation) = formation {
            if let [def, mid, fwd, ..] = formation.layers() {
                counts.defenders = *def;
                counts.midfielders = *mid;
                counts.forwards = *fwd;
            }
        }
        counts
    }
}
