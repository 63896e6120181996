use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::lineup::{clamp_coordinate, PositionType, SeedCandidate, SeededSlot};
use crate::models::lineup::{
    CreateLineupRequest, FormationRequest, FormationTemplate, Lineup, LineupPosition, LineupPositionRequest,
    LineupSlot, PitchDirection, PositionPayload, UpdateLineupRequest,
};

const LINEUP_COLUMNS: &str =
    "id, name, match_id, team_id, formation_id, is_template, direction, notes, created_by, created_at, updated_at";

/// The standard catalogue offered to a club with no positions yet.
pub const DEFAULT_POSITIONS: [(&str, &str, PositionType); 12] = [
    ("Goalkeeper", "GK", PositionType::Goalkeeper),
    ("Left Back", "LB", PositionType::Defender),
    ("Center Back", "CB", PositionType::Defender),
    ("Right Back", "RB", PositionType::Defender),
    ("Defensive Midfielder", "DM", PositionType::Midfielder),
    ("Central Midfielder", "CM", PositionType::Midfielder),
    ("Left Midfielder", "LM", PositionType::Midfielder),
    ("Right Midfielder", "RM", PositionType::Midfielder),
    ("Attacking Midfielder", "AM", PositionType::Midfielder),
    ("Left Winger", "LW", PositionType::Forward),
    ("Right Winger", "RW", PositionType::Forward),
    ("Striker", "ST", PositionType::Forward),
];

/// A player placement about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSlot {
    pub player_id: Uuid,
    pub position_id: Option<Uuid>,
    pub x_coordinate: f64,
    pub y_coordinate: f64,
    pub jersey_number: Option<i32>,
    pub is_starter: bool,
    pub notes: Option<String>,
}

impl NewSlot {
    pub fn from_payload(payload: &PositionPayload) -> Self {
        Self {
            player_id: payload.player_id,
            position_id: payload.position_id,
            x_coordinate: clamp_coordinate(payload.x),
            y_coordinate: clamp_coordinate(payload.y),
            jersey_number: payload.jersey_number,
            is_starter: payload.is_starter,
            notes: payload.notes.clone(),
        }
    }

    pub fn from_seeded(slot: &SeededSlot) -> Self {
        Self {
            player_id: slot.player_id,
            position_id: slot.position_id,
            x_coordinate: slot.x_coordinate,
            y_coordinate: slot.y_coordinate,
            jersey_number: Some(slot.jersey_number),
            is_starter: slot.is_starter,
            notes: None,
        }
    }

    /// Copies of a template's placements, leaving out inactive players.
    pub fn from_template(slots: &[LineupSlot]) -> Vec<Self> {
        slots
            .iter()
            .filter(|s| s.active)
            .map(|s| Self {
                player_id: s.player_id,
                position_id: s.position_id,
                x_coordinate: s.x_coordinate,
                y_coordinate: s.y_coordinate,
                jersey_number: s.jersey_number,
                is_starter: s.is_starter,
                notes: s.notes.clone(),
            })
            .collect()
    }
}

pub fn duplicate_name(name: &str) -> String {
    format!("{} (Copy)", name)
}

#[derive(Debug)]
pub struct LineupQueries {
    pool: PgPool,
}

impl LineupQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Formations

    pub async fn formations(&self) -> Result<Vec<FormationTemplate>, sqlx::Error> {
        sqlx::query_as::<_, FormationTemplate>(
            "SELECT id, name, description, player_count, formation_structure, created_at
             FROM formation_templates ORDER BY player_count, name",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_formation(&self, formation_id: Uuid) -> Result<Option<FormationTemplate>, sqlx::Error> {
        sqlx::query_as::<_, FormationTemplate>(
            "SELECT id, name, description, player_count, formation_structure, created_at
             FROM formation_templates WHERE id = $1",
        )
        .bind(formation_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create_formation(&self, request: &FormationRequest) -> Result<FormationTemplate, sqlx::Error> {
        sqlx::query_as::<_, FormationTemplate>(
            r#"
            INSERT INTO formation_templates (id, name, description, player_count, formation_structure)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, player_count, formation_structure, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.player_count)
        .bind(&request.formation_structure)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_formation(
        &self,
        formation_id: Uuid,
        request: &FormationRequest,
    ) -> Result<Option<FormationTemplate>, sqlx::Error> {
        sqlx::query_as::<_, FormationTemplate>(
            r#"
            UPDATE formation_templates
            SET name = $2, description = $3, player_count = $4, formation_structure = $5
            WHERE id = $1
            RETURNING id, name, description, player_count, formation_structure, created_at
            "#,
        )
        .bind(formation_id)
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.player_count)
        .bind(&request.formation_structure)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_formation(&self, formation_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM formation_templates WHERE id = $1")
            .bind(formation_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // Positions

    pub async fn positions(&self) -> Result<Vec<LineupPosition>, sqlx::Error> {
        sqlx::query_as::<_, LineupPosition>(
            r#"
            SELECT id, name, short_name, position_type FROM lineup_positions
            ORDER BY CASE position_type WHEN 'GK' THEN 0 WHEN 'DEF' THEN 1 WHEN 'MID' THEN 2 ELSE 3 END, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_position(&self, request: &LineupPositionRequest) -> Result<LineupPosition, sqlx::Error> {
        sqlx::query_as::<_, LineupPosition>(
            r#"
            INSERT INTO lineup_positions (id, name, short_name, position_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, short_name, position_type
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.short_name.trim())
        .bind(request.position_type.as_str())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_position(
        &self,
        position_id: Uuid,
        request: &LineupPositionRequest,
    ) -> Result<Option<LineupPosition>, sqlx::Error> {
        sqlx::query_as::<_, LineupPosition>(
            r#"
            UPDATE lineup_positions SET name = $2, short_name = $3, position_type = $4
            WHERE id = $1
            RETURNING id, name, short_name, position_type
            "#,
        )
        .bind(position_id)
        .bind(request.name.trim())
        .bind(request.short_name.trim())
        .bind(request.position_type.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_position(&self, position_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lineup_positions WHERE id = $1")
            .bind(position_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert the standard positions whose short name is not taken yet.
    /// Returns how many were added.
    pub async fn insert_default_positions(&self) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut added = 0;
        for (name, short_name, position_type) in DEFAULT_POSITIONS {
            let result = sqlx::query(
                r#"
                INSERT INTO lineup_positions (id, name, short_name, position_type)
                SELECT $1, $2, $3, $4
                WHERE NOT EXISTS (SELECT 1 FROM lineup_positions WHERE short_name = $3)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(short_name)
            .bind(position_type.as_str())
            .execute(&mut *tx)
            .await?;
            added += result.rows_affected();
        }
        tx.commit().await?;
        Ok(added)
    }

    /// First catalogue entry of each position type, by name.
    pub async fn first_position_per_type(&self) -> Result<Vec<(PositionType, Uuid)>, sqlx::Error> {
        let rows: Vec<(String, Uuid)> = sqlx::query_as(
            "SELECT DISTINCT ON (position_type) position_type, id FROM lineup_positions ORDER BY position_type, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(kind, id)| kind.parse::<PositionType>().ok().map(|kind| (kind, id)))
            .collect())
    }

    /// The match squad in seeding order, with each player's active flag.
    pub async fn match_candidates(&self, match_id: Uuid) -> Result<Vec<SeedCandidate>, sqlx::Error> {
        let rows: Vec<(Uuid, bool)> = sqlx::query_as(
            r#"
            SELECT a.player_id, p.active
            FROM match_appearances a
            JOIN players p ON p.id = a.player_id
            WHERE a.match_id = $1
            ORDER BY p.first_name, p.last_name
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(player_id, active)| SeedCandidate { player_id, active })
            .collect())
    }

    // Lineups

    pub async fn list(&self, team_id: Option<Uuid>) -> Result<Vec<Lineup>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM lineups WHERE ($1::UUID IS NULL OR team_id = $1) ORDER BY updated_at DESC",
            LINEUP_COLUMNS
        );
        sqlx::query_as::<_, Lineup>(&sql).bind(team_id).fetch_all(&self.pool).await
    }

    pub async fn find(&self, lineup_id: Uuid) -> Result<Option<Lineup>, sqlx::Error> {
        let sql = format!("SELECT {} FROM lineups WHERE id = $1", LINEUP_COLUMNS);
        sqlx::query_as::<_, Lineup>(&sql).bind(lineup_id).fetch_optional(&self.pool).await
    }

    pub async fn slots(&self, lineup_id: Uuid) -> Result<Vec<LineupSlot>, sqlx::Error> {
        sqlx::query_as::<_, LineupSlot>(
            r#"
            SELECT lpp.id, lpp.player_id, p.first_name, p.last_name, p.active,
                   lpp.position_id, lp.short_name AS position_short_name, lp.position_type,
                   lpp.x_coordinate, lpp.y_coordinate, lpp.jersey_number, lpp.is_starter, lpp.notes
            FROM lineup_player_positions lpp
            JOIN players p ON p.id = lpp.player_id
            LEFT JOIN lineup_positions lp ON lp.id = lpp.position_id
            WHERE lpp.lineup_id = $1
            ORDER BY lpp.is_starter DESC, lpp.jersey_number NULLS LAST, p.first_name
            "#,
        )
        .bind(lineup_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Create the lineup together with its initial placements.
    pub async fn create(
        &self,
        request: &CreateLineupRequest,
        created_by: Option<Uuid>,
        slots: &[NewSlot],
    ) -> Result<Lineup, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            r#"
            INSERT INTO lineups (id, name, match_id, team_id, formation_id, is_template, direction, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            LINEUP_COLUMNS
        );
        let lineup = sqlx::query_as::<_, Lineup>(&sql)
            .bind(Uuid::new_v4())
            .bind(request.name.trim())
            .bind(request.match_id)
            .bind(request.team_id)
            .bind(request.formation_id)
            .bind(request.is_template)
            .bind(request.direction.as_str())
            .bind(&request.notes)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        for slot in slots {
            upsert_slot(&mut tx, lineup.id, slot).await?;
        }
        tx.commit().await?;
        Ok(lineup)
    }

    pub async fn update(&self, lineup_id: Uuid, request: &UpdateLineupRequest) -> Result<Option<Lineup>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE lineups
            SET name = $2, match_id = $3, formation_id = $4, is_template = $5, direction = $6, notes = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LINEUP_COLUMNS
        );
        sqlx::query_as::<_, Lineup>(&sql)
            .bind(lineup_id)
            .bind(request.name.trim())
            .bind(request.match_id)
            .bind(request.formation_id)
            .bind(request.is_template)
            .bind(request.direction.as_str())
            .bind(&request.notes)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete(&self, lineup_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lineups WHERE id = $1")
            .bind(lineup_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Upsert every placement. A non-empty save also drops players it leaves out.
    pub async fn save_positions(
        &self,
        lineup_id: Uuid,
        slots: &[NewSlot],
        direction: Option<PitchDirection>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for slot in slots {
            upsert_slot(&mut tx, lineup_id, slot).await?;
        }

        if !slots.is_empty() {
            let keep: Vec<Uuid> = slots.iter().map(|s| s.player_id).collect();
            sqlx::query("DELETE FROM lineup_player_positions WHERE lineup_id = $1 AND NOT (player_id = ANY($2))")
                .bind(lineup_id)
                .bind(&keep)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE lineups SET direction = COALESCE($2, direction), updated_at = NOW() WHERE id = $1")
            .bind(lineup_id)
            .bind(direction.map(|d| d.as_str()))
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }

    pub async fn remove_player(&self, lineup_id: Uuid, player_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lineup_player_positions WHERE lineup_id = $1 AND player_id = $2")
            .bind(lineup_id)
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Copy a lineup and all its placements under a "(Copy)" name.
    pub async fn duplicate(&self, lineup_id: Uuid, created_by: Option<Uuid>) -> Result<Option<Lineup>, sqlx::Error> {
        let original = match self.find(lineup_id).await? {
            Some(original) => original,
            None => return Ok(None),
        };

        let mut tx = self.pool.begin().await?;
        let sql = format!(
            r#"
            INSERT INTO lineups (id, name, match_id, team_id, formation_id, is_template, direction, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            LINEUP_COLUMNS
        );
        let copy = sqlx::query_as::<_, Lineup>(&sql)
            .bind(Uuid::new_v4())
            .bind(duplicate_name(&original.name))
            .bind(original.match_id)
            .bind(original.team_id)
            .bind(original.formation_id)
            .bind(original.is_template)
            .bind(&original.direction)
            .bind(&original.notes)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO lineup_player_positions
                (id, lineup_id, player_id, position_id, x_coordinate, y_coordinate, jersey_number, is_starter, notes)
            SELECT gen_random_uuid(), $2, player_id, position_id, x_coordinate, y_coordinate, jersey_number, is_starter, notes
            FROM lineup_player_positions WHERE lineup_id = $1
            "#,
        )
        .bind(original.id)
        .bind(copy.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(copy))
    }
}

async fn upsert_slot(conn: &mut PgConnection, lineup_id: Uuid, slot: &NewSlot) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO lineup_player_positions
            (id, lineup_id, player_id, position_id, x_coordinate, y_coordinate, jersey_number, is_starter, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (lineup_id, player_id) DO UPDATE
        SET position_id = EXCLUDED.position_id,
            x_coordinate = EXCLUDED.x_coordinate,
            y_coordinate = EXCLUDED.y_coordinate,
            jersey_number = EXCLUDED.jersey_number,
            is_starter = EXCLUDED.is_starter,
            notes = EXCLUDED.notes
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(lineup_id)
    .bind(slot.player_id)
    .bind(slot.position_id)
    .bind(slot.x_coordinate)
    .bind(slot.y_coordinate)
    .bind(slot.jersey_number)
    .bind(slot.is_starter)
    .bind(&slot.notes)
    .execute(conn)
    .await?;
    Ok(())
}
