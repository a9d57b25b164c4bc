use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::competition::{Competition, CompetitionStatus};
use crate::db::Database;

fn row_to_competition(row: &Row) -> rusqlite::Result<Competition> {
    let id: String = row.get("id")?;
    let status: String = row.get("status")?;
    let start_date: Option<String> = row.get("start_date")?;
    let end_date: Option<String> = row.get("end_date")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Competition {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        name: row.get("name")?,
        description: row.get("description")?,
        status: CompetitionStatus::from_str_opt(&status).unwrap_or(CompetitionStatus::Pending),
        start_date: start_date
            .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
            .map(|d| d.with_timezone(&Utc)),
        end_date: end_date
            .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
            .map(|d| d.with_timezone(&Utc)),
        cross_chain_trading_enabled: row.get::<_, i64>("cross_chain_trading_enabled")? != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

const COLUMNS: &str = "id, name, description, status, start_date, end_date, \
    cross_chain_trading_enabled, created_at, updated_at";

pub struct CompetitionRepository {
    db: Database,
}

impl CompetitionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, c: Competition) -> rusqlite::Result<Competition> {
        self.db
            .call(move |conn: &Connection| {
                conn.execute(
                    &format!("INSERT INTO competitions ({COLUMNS}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)"),
                    params![
                        c.id.to_string(),
                        c.name,
                        c.description,
                        c.status.as_str(),
                        c.start_date.map(|d| d.to_rfc3339()),
                        c.end_date.map(|d| d.to_rfc3339()),
                        c.cross_chain_trading_enabled as i64,
                        c.created_at.to_rfc3339(),
                        c.updated_at.to_rfc3339(),
                    ],
                )?;
                Ok(c)
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> rusqlite::Result<Option<Competition>> {
        self.db
            .call(move |conn: &Connection| {
                conn.query_row(
                    &format!("SELECT {COLUMNS} FROM competitions WHERE id = ?1"),
                    params![id.to_string()],
                    row_to_competition,
                )
                .optional()
            })
            .await
    }

    pub async fn get_active(&self) -> rusqlite::Result<Option<Competition>> {
        self.db
            .call(move |conn: &Connection| {
                conn.query_row(
                    &format!("SELECT {COLUMNS} FROM competitions WHERE status = 'ACTIVE' LIMIT 1"),
                    [],
                    row_to_competition,
                )
                .optional()
            })
            .await
    }

    pub async fn list_active(&self) -> rusqlite::Result<Vec<Competition>> {
        self.db
            .call(move |conn: &Connection| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {COLUMNS} FROM competitions WHERE status = 'ACTIVE'"))?;
                let rows = stmt.query_map([], row_to_competition)?;
                rows.collect()
            })
            .await
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        status: CompetitionStatus,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> rusqlite::Result<()> {
        self.db
            .call(move |conn: &Connection| {
                let now = Utc::now().to_rfc3339();
                conn.execute(
                    "UPDATE competitions SET status = ?1, start_date = COALESCE(?2, start_date), \
                     end_date = COALESCE(?3, end_date), updated_at = ?4 WHERE id = ?5",
                    params![
                        status.as_str(),
                        start_date.map(|d| d.to_rfc3339()),
                        end_date.map(|d| d.to_rfc3339()),
                        now,
                        id.to_string(),
                    ],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn add_member(&self, competition_id: Uuid, team_id: Uuid) -> rusqlite::Result<()> {
        self.db
            .call(move |conn: &Connection| {
                conn.execute(
                    "INSERT OR IGNORE INTO competition_teams (competition_id, team_id, joined_at) \
                     VALUES (?1, ?2, ?3)",
                    params![competition_id.to_string(), team_id.to_string(), Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn members(&self, competition_id: Uuid) -> rusqlite::Result<Vec<Uuid>> {
        self.db
            .call(move |conn: &Connection| {
                let mut stmt = conn.prepare(
                    "SELECT team_id FROM competition_teams WHERE competition_id = ?1",
                )?;
                let rows = stmt.query_map(params![competition_id.to_string()], |row| {
                    let id: String = row.get(0)?;
                    Ok(id)
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>().map(|ids| {
                    ids.into_iter()
                        .filter_map(|id| Uuid::parse_str(&id).ok())
                        .collect()
                })
            })
            .await
    }

    pub async fn is_member(&self, competition_id: Uuid, team_id: Uuid) -> rusqlite::Result<bool> {
        self.db
            .call(move |conn: &Connection| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM competition_teams WHERE competition_id = ?1 AND team_id = ?2",
                    params![competition_id.to_string(), team_id.to_string()],
                    |r| r.get(0),
                )?;
                Ok(count > 0)
            })
            .await
    }
}
