use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::football_match::MatchView;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct PlayerStatsRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub matches_played: i64,
    pub total_goals: i64,
    pub total_assists: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct TeamRecord {
    pub team_id: Uuid,
    pub team: String,
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct MatrixPlayer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

/// How often each pair of players has been in the same match squad.
#[derive(Debug, Serialize)]
pub struct PlayerMatrix {
    pub players: Vec<MatrixPlayer>,
    pub matrix: Vec<Vec<i64>>,
    pub max_value: i64,
}

impl PlayerMatrix {
    /// `squads` holds, per match, the ids of the players who appeared in it.
    pub fn build(players: Vec<MatrixPlayer>, squads: &[Vec<Uuid>]) -> Self {
        let n = players.len();
        let mut matrix = vec![vec![0i64; n]; n];
        for squad in squads {
            let present: Vec<usize> = players
                .iter()
                .enumerate()
                .filter(|(_, p)| squad.contains(&p.id))
                .map(|(i, _)| i)
                .collect();
            for &i in &present {
                for &j in &present {
                    matrix[i][j] += 1;
                }
            }
        }
        let max_value = matrix.iter().flatten().copied().max().unwrap_or(0);
        Self { players, matrix, max_value }
    }
}

#[derive(Debug, Deserialize)]
pub struct MatrixQuery {
    pub team_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_teams: i64,
    pub total_players: i64,
    pub total_matches: i64,
    pub recent_matches: Vec<MatchView>,
}
