use serde::Serialize;

use crate::backup::fixture::{Fixture, MODEL_MATCHES, MODEL_PLAYERS, MODEL_TEAMS, MODEL_USERS};
use crate::backup::database::DatabaseStatus;
use crate::config::backup::BackupSettings;

/// The one rule deciding whether a backup is worth restoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    pub min_file_bytes: u64,
    pub min_teams: usize,
    pub min_players: usize,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self { min_file_bytes: 100, min_teams: 1, min_players: 5 }
    }
}

impl From<&BackupSettings> for BackupPolicy {
    fn from(settings: &BackupSettings) -> Self {
        Self {
            min_file_bytes: settings.min_file_bytes,
            min_teams: settings.min_teams.max(0) as usize,
            min_players: settings.min_players.max(0) as usize,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub file_bytes: u64,
    pub records: usize,
    pub teams: usize,
    pub players: usize,
    pub matches: usize,
    pub users: usize,
    pub problems: Vec<String>,
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} records: {} teams, {} players, {} matches, {} users",
            self.records, self.teams, self.players, self.matches, self.users
        )
    }

    /// True when restoring this backup would leave fewer teams or players than `live` has.
    pub fn would_reduce(&self, live: &DatabaseStatus) -> bool {
        (self.teams as i64) < live.teams || (self.players as i64) < live.players
    }
}

impl BackupPolicy {
    pub fn check(&self, file_bytes: u64, fixture: &Fixture) -> Verdict {
        let teams = fixture.count(MODEL_TEAMS);
        let players = fixture.count(MODEL_PLAYERS);
        let mut problems = Vec::new();

        if file_bytes < self.min_file_bytes {
            problems.push(format!(
                "file is {} bytes, below the {} byte minimum",
                file_bytes, self.min_file_bytes
            ));
        }
        if fixture.is_empty() {
            problems.push("backup contains no records".to_string());
        }
        if teams < self.min_teams {
            problems.push(format!("{} teams, at least {} required", teams, self.min_teams));
        }
        if players < self.min_players {
            problems.push(format!("{} players, at least {} required", players, self.min_players));
        }

        Verdict {
            file_bytes,
            records: fixture.len(),
            teams,
            players,
            matches: fixture.count(MODEL_MATCHES),
            users: fixture.count(MODEL_USERS),
            problems,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::fixture::FixtureRecord;
    use serde_json::Map;
    use uuid::Uuid;

    fn fixture(teams: usize, players: usize) -> Fixture {
        let record = |model: &str| FixtureRecord { model: model.into(), pk: Some(Uuid::new_v4()), fields: Map::new() };
        let mut records: Vec<_> = (0..teams).map(|_| record(MODEL_TEAMS)).collect();
        records.extend((0..players).map(|_| record(MODEL_PLAYERS)));
        Fixture::new(records)
    }

    #[test]
    fn healthy_backup_passes() {
        let verdict = BackupPolicy::default().check(4096, &fixture(1, 5));
        assert!(verdict.is_valid(), "{:?}", verdict.problems);
        assert_eq!(verdict.summary(), "6 records: 1 teams, 5 players, 0 matches, 0 users");
    }

    #[test]
    fn thin_backup_lists_every_problem() {
        let verdict = BackupPolicy::default().check(40, &fixture(0, 4));
        assert!(!verdict.is_valid());
        assert_eq!(verdict.problems.len(), 3);
    }

    #[test]
    fn empty_backup_is_invalid() {
        let verdict = BackupPolicy { min_file_bytes: 0, min_teams: 0, min_players: 0 }.check(2, &Fixture::default());
        assert_eq!(verdict.problems, vec!["backup contains no records".to_string()]);
    }

    #[test]
    fn reduction_compares_teams_and_players() {
        let verdict = BackupPolicy::default().check(4096, &fixture(2, 10));
        let live = DatabaseStatus { teams: 2, players: 11, ..DatabaseStatus::default() };
        assert!(verdict.would_reduce(&live));
        let live = DatabaseStatus { teams: 2, players: 10, ..DatabaseStatus::default() };
        assert!(!verdict.would_reduce(&live));
    }
}
