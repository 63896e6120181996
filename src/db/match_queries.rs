use sqlx::PgPool;
use uuid::Uuid;

use crate::models::appearance::{AppearanceStatsRequest, AppearanceWithPlayer};
use crate::models::common::normalize_text;
use crate::models::football_match::{Match, MatchRequest};

/// Match columns plus the club team's name.
pub const MATCH_SELECT: &str = r#"
    SELECT m.id, m.smoras_team_id, t.name AS team_name, m.opponent_name, m.location_type,
           m.smoras_score, m.opponent_score, m.match_date, m.location, m.match_type,
           m.notes, m.created_at
    FROM matches m
    JOIN teams t ON t.id = m.smoras_team_id
"#;

#[derive(Debug)]
pub struct MatchQueries {
    pool: PgPool,
}

impl MatchQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first. `limit` of `None` returns every match.
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<Match>, sqlx::Error> {
        let sql = format!("{} ORDER BY m.match_date DESC LIMIT $1", MATCH_SELECT);
        sqlx::query_as::<_, Match>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find(&self, match_id: Uuid) -> Result<Option<Match>, sqlx::Error> {
        let sql = format!("{} WHERE m.id = $1", MATCH_SELECT);
        sqlx::query_as::<_, Match>(&sql)
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Creates the match and, when a template match is named, copies its squad.
    pub async fn create(&self, request: &MatchRequest) -> Result<Uuid, sqlx::Error> {
        let match_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO matches (id, smoras_team_id, opponent_name, location_type, smoras_score,
                                 opponent_score, match_date, location, match_type, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(match_id)
        .bind(request.smoras_team_id)
        .bind(request.opponent_name.trim())
        .bind(request.location_type.to_string())
        .bind(request.smoras_score)
        .bind(request.opponent_score)
        .bind(request.match_date)
        .bind(normalize_text(&request.location))
        .bind(request.match_type.to_string())
        .bind(normalize_text(&request.notes))
        .execute(&mut *tx)
        .await?;

        if let Some(template_id) = request.template_match_id {
            let player_ids: Vec<Uuid> =
                sqlx::query_scalar("SELECT player_id FROM match_appearances WHERE match_id = $1")
                    .bind(template_id)
                    .fetch_all(&mut *tx)
                    .await?;
            tracing::info!("Copying {} players from template match {}", player_ids.len(), template_id);
            for player_id in player_ids {
                sqlx::query(
                    r#"
                    INSERT INTO match_appearances (id, player_id, match_id, team_id)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (player_id, match_id) DO NOTHING
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(player_id)
                .bind(match_id)
                .bind(request.smoras_team_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(match_id)
    }

    pub async fn update(&self, match_id: Uuid, request: &MatchRequest) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE matches
            SET smoras_team_id = $2, opponent_name = $3, location_type = $4, smoras_score = $5,
                opponent_score = $6, match_date = $7, location = $8, match_type = $9, notes = $10
            WHERE id = $1
            "#,
        )
        .bind(match_id)
        .bind(request.smoras_team_id)
        .bind(request.opponent_name.trim())
        .bind(request.location_type.to_string())
        .bind(request.smoras_score)
        .bind(request.opponent_score)
        .bind(request.match_date)
        .bind(normalize_text(&request.location))
        .bind(request.match_type.to_string())
        .bind(normalize_text(&request.notes))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_score(&self, match_id: Uuid, own: Option<i32>, opponent: Option<i32>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE matches SET smoras_score = $2, opponent_score = $3 WHERE id = $1")
            .bind(match_id)
            .bind(own)
            .bind(opponent)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, match_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(match_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn appearances(&self, match_id: Uuid) -> Result<Vec<AppearanceWithPlayer>, sqlx::Error> {
        sqlx::query_as::<_, AppearanceWithPlayer>(
            r#"
            SELECT a.id, a.player_id, p.first_name, p.last_name, a.team_id, a.minutes_played,
                   a.goals, a.assists, a.yellow_cards, a.red_card
            FROM match_appearances a
            JOIN players p ON p.id = a.player_id
            WHERE a.match_id = $1
            ORDER BY p.first_name, p.last_name
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Replace the team's squad for the match. Other teams' rows are untouched.
    pub async fn replace_team_appearances(
        &self,
        match_id: Uuid,
        team_id: Uuid,
        player_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM match_appearances WHERE match_id = $1 AND team_id = $2")
            .bind(match_id)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;

        for player_id in player_ids {
            sqlx::query(
                r#"
                INSERT INTO match_appearances (id, player_id, match_id, team_id)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (player_id, match_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(player_id)
            .bind(match_id)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    pub async fn update_appearance(
        &self,
        match_id: Uuid,
        appearance_id: Uuid,
        stats: &AppearanceStatsRequest,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE match_appearances
            SET minutes_played = $3, goals = $4, assists = $5, yellow_cards = $6, red_card = $7
            WHERE id = $2 AND match_id = $1
            "#,
        )
        .bind(match_id)
        .bind(appearance_id)
        .bind(stats.minutes_played)
        .bind(stats.goals)
        .bind(stats.assists)
        .bind(stats.yellow_cards)
        .bind(stats.red_card)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn appearance_player_ids(&self, match_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT a.player_id
            FROM match_appearances a
            JOIN players p ON p.id = a.player_id
            WHERE a.match_id = $1
            ORDER BY p.first_name, p.last_name
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await
    }
}
