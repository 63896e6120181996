use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::backup::error::BackupError;
use crate::backup::fixture::{Fixture, FixtureRecord};

/// Every application table, parents before children.
pub const TABLES: [&str; 17] = [
    "users",
    "teams",
    "players",
    "user_profiles",
    "matches",
    "match_appearances",
    "match_sessions",
    "playing_times",
    "player_substitutions",
    "formation_templates",
    "lineup_positions",
    "lineups",
    "lineup_player_positions",
    "video_clips",
    "video_clip_players",
    "highlight_reels",
    "highlight_clip_associations",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DatabaseStatus {
    pub users: i64,
    pub profiles: i64,
    pub teams: i64,
    pub players: i64,
    pub matches: i64,
    pub appearances: i64,
    pub sessions: i64,
}

impl DatabaseStatus {
    pub async fn collect(pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, DatabaseStatus>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM user_profiles) AS profiles,
                (SELECT COUNT(*) FROM teams) AS teams,
                (SELECT COUNT(*) FROM players) AS players,
                (SELECT COUNT(*) FROM matches) AS matches,
                (SELECT COUNT(*) FROM match_appearances) AS appearances,
                (SELECT COUNT(*) FROM match_sessions) AS sessions
            "#,
        )
        .fetch_one(pool)
        .await
    }

    pub fn has_club_data(&self) -> bool {
        self.teams > 0 && self.players > 0
    }

    pub fn is_empty(&self) -> bool {
        self.users == 0 && self.teams == 0 && self.players == 0 && self.matches == 0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreSummary {
    pub tables: BTreeMap<String, u64>,
    pub total: u64,
}

/// Snapshot of every table taken inside one repeatable-read transaction.
#[tracing::instrument(name = "Dump database", skip(pool))]
pub async fn dump(pool: &PgPool) -> Result<Fixture, BackupError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .execute(&mut *tx)
        .await?;

    let mut records = Vec::new();
    for table in TABLES {
        let sql = format!("SELECT row_to_json(t) FROM {} t", table);
        let rows: Vec<(Value,)> = sqlx::query_as(&sql).fetch_all(&mut *tx).await?;
        tracing::debug!("Dumped {} rows from {}", rows.len(), table);
        records.extend(rows.into_iter().map(|(row,)| FixtureRecord::from_row(table, row)));
    }
    tx.commit().await?;

    tracing::info!("Dumped {} records", records.len());
    Ok(Fixture::new(records))
}

/// Replace the contents of every table with `fixture`. Nothing is committed
/// unless every record loads.
#[tracing::instrument(name = "Restore database", skip(pool, fixture), fields(records = fixture.len()))]
pub async fn restore(pool: &PgPool, fixture: &Fixture) -> Result<RestoreSummary, BackupError> {
    if let Some(unknown) = fixture.records().iter().find(|r| !TABLES.contains(&r.model.as_str())) {
        return Err(BackupError::UnknownModel(unknown.model.clone()));
    }

    let mut tx = pool.begin().await?;
    for table in TABLES.iter().rev() {
        let sql = format!("DELETE FROM {}", table);
        sqlx::query(&sql).execute(&mut *tx).await?;
    }

    let mut summary = RestoreSummary::default();
    for table in TABLES {
        let sql = format!(
            "INSERT INTO {table} SELECT * FROM jsonb_populate_record(NULL::{table}, $1)",
            table = table
        );
        let mut loaded = 0;
        for record in fixture.records_for(table) {
            sqlx::query(&sql)
                .bind(Json(record.to_row()))
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to load {} record {:?}: {}", table, record.pk, e);
                    e
                })?;
            loaded += 1;
        }
        if loaded > 0 {
            summary.tables.insert(table.to_string(), loaded);
            summary.total += loaded;
        }
    }
    tx.commit().await?;

    tracing::info!("Restored {} records", summary.total);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_come_after_parents() {
        let pos = |t: &str| TABLES.iter().position(|x| *x == t).unwrap();
        assert!(pos("users") < pos("user_profiles"));
        assert!(pos("players") < pos("user_profiles"));
        assert!(pos("matches") < pos("match_sessions"));
        assert!(pos("match_sessions") < pos("video_clips"));
        assert!(pos("video_clips") < pos("highlight_clip_associations"));
        assert!(pos("formation_templates") < pos("lineups"));
        assert!(pos("lineups") < pos("lineup_player_positions"));
    }

    #[test]
    fn empty_status_has_no_club_data() {
        let status = DatabaseStatus::default();
        assert!(status.is_empty());
        assert!(!status.has_club_data());
        assert!(DatabaseStatus { teams: 1, players: 3, ..status }.has_club_data());
    }
}
