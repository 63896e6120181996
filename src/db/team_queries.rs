use sqlx::PgPool;
use uuid::Uuid;

use crate::db::match_queries::MATCH_SELECT;
use crate::models::common::normalize_text;
use crate::models::football_match::Match;
use crate::models::team::{Team, TeamRequest};

#[derive(Debug)]
pub struct TeamQueries {
    pool: PgPool,
}

impl TeamQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>("SELECT id, name, description, created_at FROM teams ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find(&self, team_id: Uuid) -> Result<Option<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>("SELECT id, name, description, created_at FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create(&self, request: &TeamRequest) -> Result<Team, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(normalize_text(&request.description))
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update(&self, team_id: Uuid, request: &TeamRequest) -> Result<Option<Team>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams SET name = $2, description = $3
            WHERE id = $1
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(team_id)
        .bind(request.name.trim())
        .bind(normalize_text(&request.description))
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, team_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn matches(&self, team_id: Uuid) -> Result<Vec<Match>, sqlx::Error> {
        let sql = format!("{} WHERE m.smoras_team_id = $1 ORDER BY m.match_date DESC", MATCH_SELECT);
        sqlx::query_as::<_, Match>(&sql)
            .bind(team_id)
            .fetch_all(&self.pool)
            .await
    }
}
