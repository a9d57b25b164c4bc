use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use uuid::Uuid;

use crate::db::Database;
use crate::team::Team;

fn row_to_team(row: &Row) -> rusqlite::Result<Team> {
    let id: String = row.get("id")?;
    let metadata_raw: String = row.get("metadata")?;
    let deactivation_date: Option<String> = row.get("deactivation_date")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Team {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        name: row.get("name")?,
        email: row.get("email")?,
        contact_person: row.get("contact_person")?,
        wallet_address: row.get("wallet_address")?,
        api_key: row.get("api_key")?,
        is_admin: row.get::<_, i64>("is_admin")? != 0,
        active: row.get::<_, i64>("active")? != 0,
        deactivation_reason: row.get("deactivation_reason")?,
        deactivation_date: deactivation_date
            .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
            .map(|d| d.with_timezone(&Utc)),
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(Value::Null),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

const SELECT_COLUMNS: &str = "id, name, email, contact_person, wallet_address, api_key, \
     is_admin, active, deactivation_reason, deactivation_date, metadata, created_at, updated_at";

pub struct TeamRepository {
    db: Database,
}

impl TeamRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, team: Team) -> rusqlite::Result<Team> {
        self.db
            .call(move |conn: &Connection| {
                conn.execute(
                    &format!(
                        "INSERT INTO teams ({SELECT_COLUMNS}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)"
                    ),
                    params![
                        team.id.to_string(),
                        team.name,
                        team.email,
                        team.contact_person,
                        team.wallet_address,
                        team.api_key,
                        team.is_admin as i64,
                        team.active as i64,
                        team.deactivation_reason,
                        team.deactivation_date.map(|d| d.to_rfc3339()),
                        serde_json::to_string(&team.metadata).unwrap_or_else(|_| "{}".to_string()),
                        team.created_at.to_rfc3339(),
                        team.updated_at.to_rfc3339(),
                    ],
                )?;
                Ok(team)
            })
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> rusqlite::Result<Option<Team>> {
        self.db
            .call(move |conn: &Connection| {
                conn.query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM teams WHERE id = ?1"),
                    params![id.to_string()],
                    row_to_team,
                )
                .optional()
            })
            .await
    }

    pub async fn get_by_email(&self, email: String) -> rusqlite::Result<Option<Team>> {
        self.db
            .call(move |conn: &Connection| {
                conn.query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM teams WHERE email = ?1"),
                    params![email],
                    row_to_team,
                )
                .optional()
            })
            .await
    }

    pub async fn get_by_api_key(&self, hash: String) -> rusqlite::Result<Option<Team>> {
        self.db
            .call(move |conn: &Connection| {
                conn.query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM teams WHERE api_key = ?1"),
                    params![hash],
                    row_to_team,
                )
                .optional()
            })
            .await
    }

    pub async fn list_all(&self) -> rusqlite::Result<Vec<Team>> {
        self.db
            .call(move |conn: &Connection| {
                let mut stmt = conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM teams ORDER BY created_at"))?;
                let rows = stmt.query_map([], row_to_team)?;
                rows.collect()
            })
            .await
    }

    pub async fn any_admin_exists(&self) -> rusqlite::Result<bool> {
        self.db
            .call(move |conn: &Connection| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM teams WHERE is_admin = 1",
                    [],
                    |r| r.get(0),
                )?;
                Ok(count > 0)
            })
            .await
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        contact_person: Option<String>,
        metadata: Option<Value>,
    ) -> rusqlite::Result<()> {
        self.db
            .call(move |conn: &Connection| {
                let now = Utc::now().to_rfc3339();
                if let Some(cp) = contact_person {
                    conn.execute(
                        "UPDATE teams SET contact_person = ?1, updated_at = ?2 WHERE id = ?3",
                        params![cp, now, id.to_string()],
                    )?;
                }
                if let Some(m) = metadata {
                    conn.execute(
                        "UPDATE teams SET metadata = ?1, updated_at = ?2 WHERE id = ?3",
                        params![serde_json::to_string(&m).unwrap_or_else(|_| "{}".to_string()), now, id.to_string()],
                    )?;
                }
                Ok(())
            })
            .await
    }

    pub async fn set_active(
        &self,
        id: Uuid,
        active: bool,
        reason: Option<String>,
    ) -> rusqlite::Result<()> {
        self.db
            .call(move |conn: &Connection| {
                let now = Utc::now().to_rfc3339();
                if active {
                    conn.execute(
                        "UPDATE teams SET active = 1, deactivation_reason = NULL, \
                         deactivation_date = NULL, updated_at = ?1 WHERE id = ?2",
                        params![now, id.to_string()],
                    )?;
                } else {
                    conn.execute(
                        "UPDATE teams SET active = 0, deactivation_reason = ?1, \
                         deactivation_date = ?2, updated_at = ?2 WHERE id = ?3",
                        params![reason, now, id.to_string()],
                    )?;
                }
                Ok(())
            })
            .await
    }

    /// Force-delete a team and every row that references it. Normal
    /// deactivation never deletes rows; this is the admin "force-delete"
    /// path, so it cascades by hand since the schema's foreign keys carry no
    /// `ON DELETE CASCADE` (a plain delete would otherwise trip
    /// `PRAGMA foreign_keys = ON` with a constraint violation).
    pub async fn delete(&self, id: Uuid) -> rusqlite::Result<usize> {
        self.db
            .transaction(move |tx: &rusqlite::Transaction<'_>| {
                let id_str = id.to_string();
                tx.execute(
                    "DELETE FROM portfolio_token_values WHERE snapshot_id IN \
                     (SELECT id FROM portfolio_snapshots WHERE team_id = ?1)",
                    params![id_str],
                )?;
                tx.execute("DELETE FROM portfolio_snapshots WHERE team_id = ?1", params![id_str])?;
                tx.execute("DELETE FROM trades WHERE team_id = ?1", params![id_str])?;
                tx.execute("DELETE FROM balances WHERE team_id = ?1", params![id_str])?;
                tx.execute("DELETE FROM competition_teams WHERE team_id = ?1", params![id_str])?;
                tx.execute("DELETE FROM teams WHERE id = ?1", params![id_str])
            })
            .await
    }
}
