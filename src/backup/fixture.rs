use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const MODEL_TEAMS: &str = "teams";
pub const MODEL_PLAYERS: &str = "players";
pub const MODEL_USERS: &str = "users";
pub const MODEL_MATCHES: &str = "matches";

/// One table row: `{"model": <table>, "pk": <uuid>, "fields": {...}}`.
/// Join tables without an `id` column carry `pk: null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub model: String,
    pub pk: Option<Uuid>,
    pub fields: Map<String, Value>,
}

impl FixtureRecord {
    /// Split a `row_to_json` object into pk and fields.
    pub fn from_row(model: &str, row: Value) -> Self {
        let mut fields = match row {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other);
                map
            }
        };
        let pk = fields
            .remove("id")
            .and_then(|id| id.as_str().and_then(|s| Uuid::parse_str(s).ok()));
        Self { model: model.to_string(), pk, fields }
    }

    /// The full row again, ready for `jsonb_populate_record`.
    pub fn to_row(&self) -> Value {
        let mut row = self.fields.clone();
        if let Some(pk) = self.pk {
            row.insert("id".into(), Value::String(pk.to_string()));
        }
        Value::Object(row)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixture {
    records: Vec<FixtureRecord>,
}

impl Fixture {
    pub fn new(records: Vec<FixtureRecord>) -> Self {
        Self { records }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn to_vec_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn records(&self) -> &[FixtureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.model.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn count(&self, model: &str) -> usize {
        self.records.iter().filter(|r| r.model == model).count()
    }

    pub fn records_for<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a FixtureRecord> + 'a {
        self.records.iter().filter(move |r| r.model == model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_round_trips_through_record() {
        let id = Uuid::new_v4();
        let row = json!({"id": id.to_string(), "name": "G12", "description": null});
        let record = FixtureRecord::from_row(MODEL_TEAMS, row.clone());
        assert_eq!(record.pk, Some(id));
        assert!(!record.fields.contains_key("id"));
        assert_eq!(record.to_row(), row);
    }

    #[test]
    fn join_rows_have_no_pk() {
        let record = FixtureRecord::from_row("video_clip_players", json!({"video_clip_id": "a", "player_id": "b"}));
        assert_eq!(record.pk, None);
        assert_eq!(record.fields.len(), 2);
    }

    #[test]
    fn counts_group_by_model() {
        let fixture: Fixture = serde_json::from_value(json!([
            {"model": "teams", "pk": Uuid::new_v4(), "fields": {"name": "A"}},
            {"model": "players", "pk": Uuid::new_v4(), "fields": {"first_name": "Ola"}},
            {"model": "players", "pk": Uuid::new_v4(), "fields": {"first_name": "Kari"}}
        ])).unwrap();
        assert_eq!(fixture.count(MODEL_PLAYERS), 2);
        assert_eq!(fixture.counts().get(MODEL_TEAMS), Some(&1));
        assert_eq!(fixture.count(MODEL_USERS), 0);
    }
}
