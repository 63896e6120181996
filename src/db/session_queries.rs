use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::match_day::{LineupEntry, SessionClock};
use crate::models::match_session::{MatchSession, PlayerSubstitution, SessionSummary, SquadMember};

const SESSION_COLUMNS: &str = "id, match_id, name, periods, period_length, substitution_interval, is_active, \
     start_time, current_period, elapsed_time, last_substitution, created_by, created_at, updated_at";

#[derive(Debug, Clone, Copy)]
pub struct SquadEntry {
    pub player_id: Uuid,
    pub on_pitch: bool,
}

/// Minutes to store for a player after folding in the running stint.
#[derive(Debug, Clone, Copy)]
pub struct BankedMinutes {
    pub player_id: Uuid,
    pub minutes_played: i32,
}

pub struct SubstitutionWrite {
    pub player_out: BankedMinutes,
    pub player_in_id: Uuid,
    pub minute: i32,
    pub period: i32,
}

#[derive(Debug)]
pub struct SessionQueries {
    pool: PgPool,
}

impl SessionQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_summaries(&self) -> Result<Vec<SessionSummary>, sqlx::Error> {
        sqlx::query_as::<_, SessionSummary>(
            r#"
            SELECT s.id, s.match_id, s.name, s.is_active, s.current_period, s.periods,
                   t.name AS team_name, m.opponent_name, m.match_date, s.created_at
            FROM match_sessions s
            JOIN matches m ON m.id = s.match_id
            JOIN teams t ON t.id = m.smoras_team_id
            ORDER BY m.match_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find(&self, session_id: Uuid) -> Result<Option<MatchSession>, sqlx::Error> {
        let sql = format!("SELECT {} FROM match_sessions WHERE id = $1", SESSION_COLUMNS);
        sqlx::query_as::<_, MatchSession>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create(
        &self,
        match_id: Uuid,
        name: &str,
        periods: i32,
        period_length: i32,
        substitution_interval: i32,
        created_by: Option<Uuid>,
    ) -> Result<MatchSession, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO match_sessions (id, match_id, name, periods, period_length, substitution_interval, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        sqlx::query_as::<_, MatchSession>(&sql)
            .bind(Uuid::new_v4())
            .bind(match_id)
            .bind(name)
            .bind(periods)
            .bind(period_length)
            .bind(substitution_interval)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update_settings(
        &self,
        session_id: Uuid,
        name: &str,
        periods: i32,
        period_length: i32,
        substitution_interval: i32,
    ) -> Result<Option<MatchSession>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE match_sessions
            SET name = $2, periods = $3, period_length = $4, substitution_interval = $5,
                current_period = LEAST(current_period, $3), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        sqlx::query_as::<_, MatchSession>(&sql)
            .bind(session_id)
            .bind(name)
            .bind(periods)
            .bind(period_length)
            .bind(substitution_interval)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete(&self, session_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM match_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn squad(&self, session_id: Uuid) -> Result<Vec<SquadMember>, sqlx::Error> {
        sqlx::query_as::<_, SquadMember>(
            r#"
            SELECT pt.id, pt.player_id, p.first_name, p.last_name, pt.minutes_played,
                   pt.is_on_pitch, pt.last_substitution_time
            FROM playing_times pt
            JOIN players p ON p.id = pt.player_id
            WHERE pt.match_session_id = $1
            ORDER BY p.first_name, p.last_name
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn substitutions(&self, session_id: Uuid) -> Result<Vec<PlayerSubstitution>, sqlx::Error> {
        sqlx::query_as::<_, PlayerSubstitution>(
            r#"
            SELECT id, match_session_id, player_in_id, player_out_id, minute, period, substituted_at
            FROM player_substitutions
            WHERE match_session_id = $1
            ORDER BY period, minute, substituted_at
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Players of the newest non-template lineup attached to the match.
    pub async fn latest_lineup_entries(&self, match_id: Uuid) -> Result<Vec<LineupEntry>, sqlx::Error> {
        let rows: Vec<(Uuid, bool)> = sqlx::query_as(
            r#"
            SELECT lpp.player_id, lpp.is_starter
            FROM lineup_player_positions lpp
            WHERE lpp.lineup_id = (
                SELECT id FROM lineups
                WHERE match_id = $1 AND is_template = FALSE
                ORDER BY created_at DESC
                LIMIT 1
            )
            ORDER BY lpp.is_starter DESC, lpp.jersey_number NULLS LAST
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(player_id, is_starter)| LineupEntry { player_id, is_starter })
            .collect())
    }

    /// Make `entries` the session squad. Minutes start from zero and players
    /// missing from `entries` are removed. On-pitch stints begin at `stint_start`.
    pub async fn replace_squad(
        &self,
        session_id: Uuid,
        entries: &[SquadEntry],
        stint_start: Option<DateTime<Utc>>,
    ) -> Result<(), sqlx::Error> {
        let keep: Vec<Uuid> = entries.iter().map(|e| e.player_id).collect();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM playing_times WHERE match_session_id = $1 AND NOT (player_id = ANY($2))")
            .bind(session_id)
            .bind(&keep)
            .execute(&mut *tx)
            .await?;

        for entry in entries {
            let since = if entry.on_pitch { stint_start } else { None };
            sqlx::query(
                r#"
                INSERT INTO playing_times (id, match_session_id, player_id, minutes_played, is_on_pitch, last_substitution_time)
                VALUES ($1, $2, $3, 0, $4, $5)
                ON CONFLICT (match_session_id, player_id)
                DO UPDATE SET minutes_played = 0,
                              is_on_pitch = EXCLUDED.is_on_pitch,
                              last_substitution_time = EXCLUDED.last_substitution_time
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(entry.player_id)
            .bind(entry.on_pitch)
            .bind(since)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE match_sessions SET updated_at = NOW() WHERE id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }

    /// Persist a started clock. On-pitch stints begin now, bench rows carry no stint.
    pub async fn start(&self, session_id: Uuid, clock: &SessionClock, now: DateTime<Utc>) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        write_clock(&mut tx, session_id, clock).await?;
        sqlx::query(
            r#"
            UPDATE playing_times
            SET last_substitution_time = CASE WHEN is_on_pitch THEN $2 ELSE NULL END
            WHERE match_session_id = $1
            "#,
        )
        .bind(session_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    /// Persist a stopped clock, bank the minutes and copy every squad
    /// member's total into the match appearances.
    pub async fn stop(
        &self,
        session_id: Uuid,
        clock: &SessionClock,
        banked: &[BankedMinutes],
        match_id: Uuid,
        team_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        write_clock(&mut tx, session_id, clock).await?;

        for row in banked {
            sqlx::query(
                r#"
                UPDATE playing_times
                SET minutes_played = $3, last_substitution_time = NULL
                WHERE match_session_id = $1 AND player_id = $2
                "#,
            )
            .bind(session_id)
            .bind(row.player_id)
            .bind(row.minutes_played)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO match_appearances (id, player_id, match_id, team_id, minutes_played)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (player_id, match_id) DO UPDATE SET minutes_played = EXCLUDED.minutes_played
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(row.player_id)
            .bind(match_id)
            .bind(team_id)
            .bind(row.minutes_played)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    /// Persist a reset clock. The on-pitch players' minutes are banked and
    /// their stints restart at `now`.
    pub async fn restart_clock(
        &self,
        session_id: Uuid,
        clock: &SessionClock,
        banked: &[BankedMinutes],
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        write_clock(&mut tx, session_id, clock).await?;
        for row in banked {
            sqlx::query(
                r#"
                UPDATE playing_times
                SET minutes_played = $3, last_substitution_time = $4
                WHERE match_session_id = $1 AND player_id = $2 AND is_on_pitch
                "#,
            )
            .bind(session_id)
            .bind(row.player_id)
            .bind(row.minutes_played)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    pub async fn reset_substitution_timer(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE match_sessions SET last_substitution = $2, updated_at = NOW() WHERE id = $1")
            .bind(session_id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Record the substitution, swap the two players and restart the rotation timer.
    pub async fn substitute(
        &self,
        session_id: Uuid,
        sub: &SubstitutionWrite,
        now: DateTime<Utc>,
    ) -> Result<Uuid, sqlx::Error> {
        let substitution_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO player_substitutions (id, match_session_id, player_in_id, player_out_id, minute, period, substituted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(substitution_id)
        .bind(session_id)
        .bind(sub.player_in_id)
        .bind(sub.player_out.player_id)
        .bind(sub.minute)
        .bind(sub.period)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE playing_times
            SET minutes_played = $3, is_on_pitch = FALSE, last_substitution_time = NULL
            WHERE match_session_id = $1 AND player_id = $2
            "#,
        )
        .bind(session_id)
        .bind(sub.player_out.player_id)
        .bind(sub.player_out.minutes_played)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE playing_times
            SET is_on_pitch = TRUE, last_substitution_time = $3
            WHERE match_session_id = $1 AND player_id = $2
            "#,
        )
        .bind(session_id)
        .bind(sub.player_in_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE match_sessions SET last_substitution = $2, updated_at = NOW() WHERE id = $1")
            .bind(session_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(substitution_id)
    }
}

async fn write_clock(conn: &mut PgConnection, session_id: Uuid, clock: &SessionClock) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE match_sessions
        SET is_active = $2, start_time = $3, current_period = $4, elapsed_time = $5,
            last_substitution = $6, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(session_id)
    .bind(clock.is_active)
    .bind(clock.start_time)
    .bind(clock.current_period)
    .bind(clock.elapsed_time)
    .bind(clock.last_substitution)
    .execute(conn)
    .await?;
    Ok(())
}
