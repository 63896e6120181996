use sqlx::PgPool;
use uuid::Uuid;

use crate::models::appearance::PlayerAppearance;
use crate::models::common::normalize_text;
use crate::models::player::{Player, PlayerRequest};

const PLAYER_COLUMNS: &str = "id, first_name, last_name, position, date_of_birth, email, phone, active, created_at";

#[derive(Debug)]
pub struct PlayerQueries {
    pool: PgPool,
}

impl PlayerQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, active: Option<bool>) -> Result<Vec<Player>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM players WHERE ($1::BOOLEAN IS NULL OR active = $1) ORDER BY first_name, last_name",
            PLAYER_COLUMNS
        );
        sqlx::query_as::<_, Player>(&sql)
            .bind(active)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find(&self, player_id: Uuid) -> Result<Option<Player>, sqlx::Error> {
        let sql = format!("SELECT {} FROM players WHERE id = $1", PLAYER_COLUMNS);
        sqlx::query_as::<_, Player>(&sql)
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create(&self, request: &PlayerRequest) -> Result<Player, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO players (id, first_name, last_name, position, date_of_birth, email, phone, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PLAYER_COLUMNS
        );
        sqlx::query_as::<_, Player>(&sql)
            .bind(Uuid::new_v4())
            .bind(request.first_name.trim())
            .bind(request.last_name.trim())
            .bind(normalize_text(&request.position))
            .bind(request.date_of_birth)
            .bind(normalize_text(&request.email))
            .bind(normalize_text(&request.phone))
            .bind(request.active)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update(&self, player_id: Uuid, request: &PlayerRequest) -> Result<Option<Player>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE players
            SET first_name = $2, last_name = $3, position = $4, date_of_birth = $5,
                email = $6, phone = $7, active = $8
            WHERE id = $1
            RETURNING {}
            "#,
            PLAYER_COLUMNS
        );
        sqlx::query_as::<_, Player>(&sql)
            .bind(player_id)
            .bind(request.first_name.trim())
            .bind(request.last_name.trim())
            .bind(normalize_text(&request.position))
            .bind(request.date_of_birth)
            .bind(normalize_text(&request.email))
            .bind(normalize_text(&request.phone))
            .bind(request.active)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete(&self, player_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Newest match first.
    pub async fn appearances(&self, player_id: Uuid) -> Result<Vec<PlayerAppearance>, sqlx::Error> {
        sqlx::query_as::<_, PlayerAppearance>(
            r#"
            SELECT a.id, a.match_id, t.name AS team_name, m.opponent_name, m.match_date,
                   a.minutes_played, a.goals, a.assists, a.yellow_cards, a.red_card
            FROM match_appearances a
            JOIN matches m ON m.id = a.match_id
            JOIN teams t ON t.id = a.team_id
            WHERE a.player_id = $1
            ORDER BY m.match_date DESC
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
    }
}
