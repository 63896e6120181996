use std::collections::BTreeMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::stats::{MatrixPlayer, PlayerStatsRow, TeamRecord};

#[derive(Debug)]
pub struct StatsQueries {
    pool: PgPool,
}

impl StatsQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Teams, players and matches on record.
    pub async fn totals(&self) -> Result<(i64, i64, i64), sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM teams),
                   (SELECT COUNT(*) FROM players),
                   (SELECT COUNT(*) FROM matches)
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    pub async fn player_stats(&self) -> Result<Vec<PlayerStatsRow>, sqlx::Error> {
        sqlx::query_as::<_, PlayerStatsRow>(
            r#"
            SELECT p.id, p.first_name, p.last_name,
                   COUNT(a.id) AS matches_played,
                   COALESCE(SUM(a.goals), 0)::BIGINT AS total_goals,
                   COALESCE(SUM(a.assists), 0)::BIGINT AS total_assists
            FROM players p
            LEFT JOIN match_appearances a ON a.player_id = p.id
            GROUP BY p.id, p.first_name, p.last_name
            ORDER BY p.first_name, p.last_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Win/draw/loss per team over matches with both scores entered.
    pub async fn team_records(&self) -> Result<Vec<TeamRecord>, sqlx::Error> {
        sqlx::query_as::<_, TeamRecord>(
            r#"
            SELECT t.id AS team_id, t.name AS team,
                   COUNT(m.id) FILTER (WHERE m.smoras_score > m.opponent_score) AS wins,
                   COUNT(m.id) FILTER (WHERE m.smoras_score = m.opponent_score) AS draws,
                   COUNT(m.id) FILTER (WHERE m.smoras_score < m.opponent_score) AS losses
            FROM teams t
            LEFT JOIN matches m ON m.smoras_team_id = t.id
                 AND m.smoras_score IS NOT NULL AND m.opponent_score IS NOT NULL
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Players who have appeared for the team, by name.
    pub async fn team_players(&self, team_id: Uuid) -> Result<Vec<MatrixPlayer>, sqlx::Error> {
        sqlx::query_as::<_, MatrixPlayer>(
            r#"
            SELECT DISTINCT p.id, p.first_name, p.last_name
            FROM players p
            JOIN match_appearances a ON a.player_id = p.id
            JOIN matches m ON m.id = a.match_id
            WHERE m.smoras_team_id = $1
            ORDER BY p.first_name, p.last_name
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
    }

    /// The set of players that appeared in each of the team's matches.
    pub async fn team_squads(&self, team_id: Uuid) -> Result<Vec<Vec<Uuid>>, sqlx::Error> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT a.match_id, a.player_id
            FROM match_appearances a
            JOIN matches m ON m.id = a.match_id
            WHERE m.smoras_team_id = $1
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        let mut squads: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
        for (match_id, player_id) in rows {
            squads.entry(match_id).or_default().push(player_id);
        }
        Ok(squads.into_values().collect())
    }
}
