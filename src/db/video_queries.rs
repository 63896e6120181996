use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::video::{ClipQuery, ClipRequest, HighlightReel, MediaKind, ReelClip, ReelRequest, VideoClip};

const CLIP_COLUMNS: &str = "id, match_session_id, title, description, video_key, thumbnail_key, duration, \
     recorded_at, game_minute, period, action_tag, is_highlight, created_by";
const REEL_COLUMNS: &str =
    "id, title, description, video_key, thumbnail_key, is_published, match_id, created_by, created_at, updated_at";

#[derive(Debug)]
pub struct VideoQueries {
    pool: PgPool,
}

impl VideoQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn clips(&self, filter: &ClipQuery) -> Result<Vec<VideoClip>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {} FROM video_clips c
            WHERE ($1::UUID IS NULL OR c.match_session_id = $1)
              AND ($2::UUID IS NULL OR EXISTS (
                    SELECT 1 FROM video_clip_players vcp WHERE vcp.video_clip_id = c.id AND vcp.player_id = $2))
              AND ($3::TEXT IS NULL OR c.action_tag = $3)
              AND ($4::BOOLEAN IS NULL OR c.is_highlight = $4)
            ORDER BY c.recorded_at DESC
            "#,
            CLIP_COLUMNS
        );
        sqlx::query_as::<_, VideoClip>(&sql)
            .bind(filter.match_session_id)
            .bind(filter.player_id)
            .bind(filter.action_tag.map(|t| t.as_str()))
            .bind(filter.highlight)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_clip(&self, clip_id: Uuid) -> Result<Option<VideoClip>, sqlx::Error> {
        let sql = format!("SELECT {} FROM video_clips WHERE id = $1", CLIP_COLUMNS);
        sqlx::query_as::<_, VideoClip>(&sql).bind(clip_id).fetch_optional(&self.pool).await
    }

    pub async fn clip_players(&self, clip_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT player_id FROM video_clip_players WHERE video_clip_id = $1")
            .bind(clip_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create_clip(&self, request: &ClipRequest, created_by: Option<Uuid>) -> Result<VideoClip, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            r#"
            INSERT INTO video_clips (id, match_session_id, title, description, duration, recorded_at,
                                     game_minute, period, action_tag, is_highlight, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            CLIP_COLUMNS
        );
        let clip = sqlx::query_as::<_, VideoClip>(&sql)
            .bind(Uuid::new_v4())
            .bind(request.match_session_id)
            .bind(request.title.trim())
            .bind(&request.description)
            .bind(request.duration)
            .bind(request.recorded_at.unwrap_or_else(Utc::now))
            .bind(request.game_minute)
            .bind(request.period)
            .bind(request.action_tag.as_str())
            .bind(request.is_highlight)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        replace_players(&mut tx, clip.id, &request.player_ids).await?;
        tx.commit().await?;
        Ok(clip)
    }

    pub async fn update_clip(&self, clip_id: Uuid, request: &ClipRequest) -> Result<Option<VideoClip>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            r#"
            UPDATE video_clips
            SET match_session_id = $2, title = $3, description = $4, duration = $5,
                recorded_at = COALESCE($6, recorded_at), game_minute = $7, period = $8,
                action_tag = $9, is_highlight = $10
            WHERE id = $1
            RETURNING {}
            "#,
            CLIP_COLUMNS
        );
        let clip = sqlx::query_as::<_, VideoClip>(&sql)
            .bind(clip_id)
            .bind(request.match_session_id)
            .bind(request.title.trim())
            .bind(&request.description)
            .bind(request.duration)
            .bind(request.recorded_at)
            .bind(request.game_minute)
            .bind(request.period)
            .bind(request.action_tag.as_str())
            .bind(request.is_highlight)
            .fetch_optional(&mut *tx)
            .await?;

        if clip.is_some() {
            replace_players(&mut tx, clip_id, &request.player_ids).await?;
        }
        tx.commit().await?;
        Ok(clip)
    }

    pub async fn delete_clip(&self, clip_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM video_clips WHERE id = $1")
            .bind(clip_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_clip_media(&self, clip_id: Uuid, kind: MediaKind, object_key: &str) -> Result<u64, sqlx::Error> {
        let sql = match kind {
            MediaKind::Video => "UPDATE video_clips SET video_key = $2 WHERE id = $1",
            MediaKind::Thumbnail => "UPDATE video_clips SET thumbnail_key = $2 WHERE id = $1",
        };
        let result = sqlx::query(sql).bind(clip_id).bind(object_key).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn reels(&self) -> Result<Vec<HighlightReel>, sqlx::Error> {
        let sql = format!("SELECT {} FROM highlight_reels ORDER BY created_at DESC", REEL_COLUMNS);
        sqlx::query_as::<_, HighlightReel>(&sql).fetch_all(&self.pool).await
    }

    pub async fn find_reel(&self, reel_id: Uuid) -> Result<Option<HighlightReel>, sqlx::Error> {
        let sql = format!("SELECT {} FROM highlight_reels WHERE id = $1", REEL_COLUMNS);
        sqlx::query_as::<_, HighlightReel>(&sql).bind(reel_id).fetch_optional(&self.pool).await
    }

    pub async fn reel_clips(&self, reel_id: Uuid) -> Result<Vec<ReelClip>, sqlx::Error> {
        sqlx::query_as::<_, ReelClip>(
            r#"
            SELECT a.position, c.id AS clip_id, c.title, c.duration, c.game_minute, c.period, c.action_tag
            FROM highlight_clip_associations a
            JOIN video_clips c ON c.id = a.video_clip_id
            WHERE a.highlight_reel_id = $1
            ORDER BY a.position
            "#,
        )
        .bind(reel_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_reel(&self, request: &ReelRequest, created_by: Option<Uuid>) -> Result<HighlightReel, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO highlight_reels (id, title, description, video_key, thumbnail_key, is_published, match_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            REEL_COLUMNS
        );
        sqlx::query_as::<_, HighlightReel>(&sql)
            .bind(Uuid::new_v4())
            .bind(request.title.trim())
            .bind(&request.description)
            .bind(&request.video_key)
            .bind(&request.thumbnail_key)
            .bind(request.is_published)
            .bind(request.match_id)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update_reel(&self, reel_id: Uuid, request: &ReelRequest) -> Result<Option<HighlightReel>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE highlight_reels
            SET title = $2, description = $3, video_key = $4, thumbnail_key = $5, is_published = $6,
                match_id = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            REEL_COLUMNS
        );
        sqlx::query_as::<_, HighlightReel>(&sql)
            .bind(reel_id)
            .bind(request.title.trim())
            .bind(&request.description)
            .bind(&request.video_key)
            .bind(&request.thumbnail_key)
            .bind(request.is_published)
            .bind(request.match_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_reel(&self, reel_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM highlight_reels WHERE id = $1")
            .bind(reel_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// How many of `clip_ids` exist.
    pub async fn count_clips(&self, clip_ids: &[Uuid]) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM video_clips WHERE id = ANY($1)")
            .bind(clip_ids)
            .fetch_one(&self.pool)
            .await
    }

    /// Make `clip_ids` the reel's clips, positioned 0..n in the given order.
    pub async fn replace_reel_clips(&self, reel_id: Uuid, clip_ids: &[Uuid]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        lock_reel(&mut tx, reel_id).await?;
        sqlx::query("DELETE FROM highlight_clip_associations WHERE highlight_reel_id = $1")
            .bind(reel_id)
            .execute(&mut *tx)
            .await?;
        for (position, clip_id) in clip_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO highlight_clip_associations (id, highlight_reel_id, video_clip_id, position)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(reel_id)
            .bind(clip_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        sqlx::query("UPDATE highlight_reels SET updated_at = NOW() WHERE id = $1")
            .bind(reel_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }

    /// Add a clip after the last one. Returns false when the reel already holds it.
    pub async fn append_reel_clip(&self, reel_id: Uuid, clip_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        // Concurrent appends to one reel would otherwise read the same MAX(position).
        lock_reel(&mut tx, reel_id).await?;
        let result = sqlx::query(
            r#"
            INSERT INTO highlight_clip_associations (id, highlight_reel_id, video_clip_id, position)
            SELECT $1, $2, $3, COALESCE(MAX(position) + 1, 0)
            FROM highlight_clip_associations WHERE highlight_reel_id = $2
            ON CONFLICT (highlight_reel_id, video_clip_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(reel_id)
        .bind(clip_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn lock_reel(conn: &mut sqlx::PgConnection, reel_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT id FROM highlight_reels WHERE id = $1 FOR UPDATE")
        .bind(reel_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn replace_players(conn: &mut sqlx::PgConnection, clip_id: Uuid, player_ids: &[Uuid]) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM video_clip_players WHERE video_clip_id = $1")
        .bind(clip_id)
        .execute(&mut *conn)
        .await?;
    for player_id in player_ids {
        sqlx::query("INSERT INTO video_clip_players (video_clip_id, player_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(clip_id)
            .bind(player_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
