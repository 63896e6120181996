use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Starters when the lineup has no formation attached.
pub const DEFAULT_STARTING_COUNT: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionType {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl PositionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionType::Goalkeeper => "GK",
            PositionType::Defender => "DEF",
            PositionType::Midfielder => "MID",
            PositionType::Forward => "FWD",
        }
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GK" => Ok(PositionType::Goalkeeper),
            "DEF" => Ok(PositionType::Defender),
            "MID" => Ok(PositionType::Midfielder),
            "FWD" => Ok(PositionType::Forward),
            other => Err(format!("Unknown position type '{}'", other)),
        }
    }
}

const OUTFIELD_ROTATION: [PositionType; 3] = [
    PositionType::Defender,
    PositionType::Midfielder,
    PositionType::Forward,
];

pub fn clamp_coordinate(value: f64) -> f64 {
    if value.is_nan() {
        return 50.0;
    }
    value.clamp(0.0, 100.0)
}

/// Pitch coordinates (x along the pitch, y across it) for the `idx`-th player
/// of a squad of `total`.
pub fn default_coordinates(position_type: Option<PositionType>, idx: usize, total: usize) -> (f64, f64) {
    let position_type = match position_type {
        Some(position_type) => position_type,
        None => return (50.0, 50.0),
    };

    let (x, slots) = match position_type {
        PositionType::Goalkeeper => return (10.0, 50.0),
        PositionType::Defender => (30.0, (total / 4).clamp(3, 4)),
        PositionType::Midfielder => (60.0, (total / 3).clamp(3, 4)),
        PositionType::Forward => (80.0, (total / 5).clamp(2, 3)),
    };

    let spread = (total as f64 * 5.0).min(70.0);
    let offset = spread / (slots as f64 + 1.0);
    let slot = idx % slots;
    let y = 50.0 - spread / 2.0 + offset * (slot as f64 + 1.0);
    (x, y)
}

#[derive(Debug, Clone)]
pub struct SeedCandidate {
    pub player_id: Uuid,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeededSlot {
    pub player_id: Uuid,
    pub position_id: Option<Uuid>,
    pub position_type: Option<PositionType>,
    pub x_coordinate: f64,
    pub y_coordinate: f64,
    pub jersey_number: i32,
    pub is_starter: bool,
}

/// Lay out a match squad on the pitch: keeper first, then defenders, midfielders
/// and forwards in rotation. Players past `starting_count` go to the touchline.
/// Inactive players are skipped but still consume their index.
pub fn seed_from_appearances(
    candidates: &[SeedCandidate],
    starting_count: Option<usize>,
    positions: &HashMap<PositionType, Uuid>,
) -> Vec<SeededSlot> {
    let total = candidates.len();
    let starting_count = starting_count.unwrap_or(DEFAULT_STARTING_COUNT);
    let substitutes = total.saturating_sub(starting_count).max(1);
    let sub_spacing = 80.0 / substitutes as f64;

    candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.active)
        .map(|(idx, candidate)| {
            let wanted = if idx == 0 {
                PositionType::Goalkeeper
            } else {
                OUTFIELD_ROTATION[(idx - 1) % OUTFIELD_ROTATION.len()]
            };
            let position_id = positions.get(&wanted).copied();
            let position_type = position_id.map(|_| wanted);

            let is_starter = idx < starting_count;
            let (x, y) = if is_starter {
                default_coordinates(position_type, idx, total)
            } else {
                let sub_idx = idx - starting_count;
                (1.0, 10.0 + sub_idx as f64 * sub_spacing)
            };

            SeededSlot {
                player_id: candidate.player_id,
                position_id,
                position_type,
                x_coordinate: x,
                y_coordinate: y,
                jersey_number: idx as i32 + 1,
                is_starter,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_positions() -> HashMap<PositionType, Uuid> {
        [PositionType::Goalkeeper, PositionType::Defender, PositionType::Midfielder, PositionType::Forward]
            .into_iter()
            .map(|t| (t, Uuid::new_v4()))
            .collect()
    }

    fn squad(n: usize) -> Vec<SeedCandidate> {
        (0..n).map(|_| SeedCandidate { player_id: Uuid::new_v4(), active: true }).collect()
    }

    #[test]
    fn goalkeeper_sits_in_front_of_goal() {
        assert_eq!(default_coordinates(Some(PositionType::Goalkeeper), 0, 11), (10.0, 50.0));
        assert_eq!(default_coordinates(None, 3, 11), (50.0, 50.0));
    }

    #[test]
    fn outfield_players_spread_across_the_width() {
        // 11 players: spread 55, 3 defender slots, offset 13.75
        let (x, y) = default_coordinates(Some(PositionType::Defender), 1, 11);
        assert_eq!(x, 30.0);
        assert!((y - (50.0 - 27.5 + 13.75 * 2.0)).abs() < 1e-9);
        let (x, _) = default_coordinates(Some(PositionType::Forward), 3, 11);
        assert_eq!(x, 80.0);
    }

    #[test]
    fn seeding_rotates_positions_and_benches_extras() {
        let positions = all_positions();
        let slots = seed_from_appearances(&squad(9), Some(7), &positions);

        assert_eq!(slots.len(), 9);
        assert_eq!(slots[0].position_type, Some(PositionType::Goalkeeper));
        assert_eq!(slots[1].position_type, Some(PositionType::Defender));
        assert_eq!(slots[2].position_type, Some(PositionType::Midfielder));
        assert_eq!(slots[3].position_type, Some(PositionType::Forward));
        assert_eq!(slots.iter().filter(|s| s.is_starter).count(), 7);

        let subs: Vec<_> = slots.iter().filter(|s| !s.is_starter).collect();
        assert_eq!(subs[0].x_coordinate, 1.0);
        assert_eq!(subs[0].y_coordinate, 10.0);
        assert_eq!(subs[1].y_coordinate, 50.0);
        assert_eq!(slots.last().map(|s| s.jersey_number), Some(9));
    }

    #[test]
    fn inactive_players_are_skipped_without_renumbering() {
        let mut candidates = squad(3);
        candidates[1].active = false;
        let slots = seed_from_appearances(&candidates, None, &all_positions());
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].jersey_number, 3);
        assert!(slots.iter().all(|s| s.is_starter));
    }

    #[test]
    fn missing_position_catalogue_centres_players() {
        let slots = seed_from_appearances(&squad(2), None, &HashMap::new());
        assert_eq!(slots[1].position_id, None);
        assert_eq!((slots[1].x_coordinate, slots[1].y_coordinate), (50.0, 50.0));
    }

    #[test]
    fn clamping_keeps_coordinates_on_the_pitch() {
        assert_eq!(clamp_coordinate(-5.0), 0.0);
        assert_eq!(clamp_coordinate(140.0), 100.0);
        assert_eq!(clamp_coordinate(f64::NAN), 50.0);
    }
}
