use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

/// Starters picked when no lineup exists (7-a-side).
pub const DEFAULT_STARTERS: usize = 7;

#[derive(Debug, Clone)]
pub struct LineupEntry {
    pub player_id: Uuid,
    pub is_starter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SquadSplit {
    pub starters: Vec<Uuid>,
    pub bench: Vec<Uuid>,
}

impl SquadSplit {
    pub fn total(&self) -> usize {
        self.starters.len() + self.bench.len()
    }
}

/// Decide who starts. A saved lineup wins: its starters start, and everyone
/// else (lineup reserves plus appearance players missing from it) sits on
/// the bench. Without a lineup the appearance players are shuffled and the
/// first seven start.
pub fn split_squad<R: Rng + ?Sized>(
    lineup: &[LineupEntry],
    appearance_players: &[Uuid],
    rng: &mut R,
) -> SquadSplit {
    if !lineup.is_empty() {
        let mut split = SquadSplit::default();
        for entry in lineup {
            if entry.is_starter {
                split.starters.push(entry.player_id);
            } else {
                split.bench.push(entry.player_id);
            }
        }
        for player_id in appearance_players {
            if !lineup.iter().any(|e| e.player_id == *player_id) && !split.bench.contains(player_id) {
                split.bench.push(*player_id);
            }
        }
        return split;
    }

    let mut players: Vec<Uuid> = Vec::with_capacity(appearance_players.len());
    for player_id in appearance_players {
        if !players.contains(player_id) {
            players.push(*player_id);
        }
    }
    players.shuffle(rng);
    let bench = if players.len() > DEFAULT_STARTERS {
        players.split_off(DEFAULT_STARTERS)
    } else {
        Vec::new()
    };
    SquadSplit { starters: players, bench }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn lineup_decides_starters_and_extras_go_to_bench() {
        let players = ids(4);
        let lineup = vec![
            LineupEntry { player_id: players[0], is_starter: true },
            LineupEntry { player_id: players[1], is_starter: false },
        ];
        let split = split_squad(&lineup, &players, &mut StdRng::seed_from_u64(1));
        assert_eq!(split.starters, vec![players[0]]);
        assert_eq!(split.bench, vec![players[1], players[2], players[3]]);
    }

    #[test]
    fn without_lineup_seven_random_players_start() {
        let players = ids(10);
        let split = split_squad(&[], &players, &mut StdRng::seed_from_u64(7));
        assert_eq!(split.starters.len(), 7);
        assert_eq!(split.bench.len(), 3);
        let mut all: Vec<_> = split.starters.iter().chain(split.bench.iter()).copied().collect();
        all.sort();
        let mut expected = players.clone();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn small_squads_all_start() {
        let players = ids(5);
        let split = split_squad(&[], &players, &mut StdRng::seed_from_u64(3));
        assert_eq!(split.starters.len(), 5);
        assert!(split.bench.is_empty());
        assert_eq!(split.total(), 5);
    }
}
