use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_timesheet_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS project (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    start_date TEXT NOT NULL,
    status TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS person (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hour_fact (
    work_date TEXT NOT NULL,
    person_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    hours REAL NOT NULL CHECK (hours > 0),
    updated_at TEXT NOT NULL,
    PRIMARY KEY (work_date, person_id, project_id)
);
"#,
    },
    Migration {
        version: 2,
        name: "hour_fact_pair_index_v1",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_hour_fact_pair_date
    ON hour_fact(person_id, project_id, work_date);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourFactRecord {
    pub work_date: String,
    pub person_id: String,
    pub project_id: String,
    pub hours: f64,
}

pub fn upsert_project(conn: &Connection, record: &ProjectRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO project (id, name, start_date, status, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    start_date = excluded.start_date,
    status = excluded.status,
    updated_at = excluded.updated_at
"#,
        params![
            record.id,
            record.name,
            record.start_date,
            record.status,
            now_utc_rfc3339()
        ],
    )?;
    Ok(())
}

pub fn list_projects(conn: &Connection) -> Result<Vec<ProjectRecord>> {
    let mut stmt =
        conn.prepare("SELECT id, name, start_date, status FROM project ORDER BY rowid ASC")?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(ProjectRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            start_date: row.get(2)?,
            status: row.get(3)?,
        });
    }
    Ok(result)
}

pub fn delete_project(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM project WHERE id = ?1", params![id])
}

pub fn upsert_person(conn: &Connection, record: &PersonRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO person (id, name, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    updated_at = excluded.updated_at
"#,
        params![record.id, record.name, now_utc_rfc3339()],
    )?;
    Ok(())
}

pub fn list_people(conn: &Connection) -> Result<Vec<PersonRecord>> {
    let mut stmt = conn.prepare("SELECT id, name FROM person ORDER BY rowid ASC")?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(PersonRecord {
            id: row.get(0)?,
            name: row.get(1)?,
        });
    }
    Ok(result)
}

pub fn delete_person(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM person WHERE id = ?1", params![id])
}

pub fn upsert_hour_fact(conn: &Connection, record: &HourFactRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO hour_fact (work_date, person_id, project_id, hours, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(work_date, person_id, project_id) DO UPDATE SET
    hours = excluded.hours,
    updated_at = excluded.updated_at
"#,
        params![
            record.work_date,
            record.person_id,
            record.project_id,
            record.hours,
            now_utc_rfc3339()
        ],
    )?;
    Ok(())
}

pub fn delete_hour_fact(
    conn: &Connection,
    work_date: &str,
    person_id: &str,
    project_id: &str,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM hour_fact WHERE work_date = ?1 AND person_id = ?2 AND project_id = ?3",
        params![work_date, person_id, project_id],
    )
}

pub fn delete_hour_facts_in_range(
    conn: &Connection,
    person_id: &str,
    project_id: &str,
    start_date: &str,
    end_date: &str,
) -> Result<usize> {
    conn.execute(
        concat!(
            "DELETE FROM hour_fact ",
            "WHERE person_id = ?1 AND project_id = ?2 ",
            "AND work_date BETWEEN ?3 AND ?4"
        ),
        params![person_id, project_id, start_date, end_date],
    )
}

pub fn list_hour_facts(conn: &Connection) -> Result<Vec<HourFactRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT work_date, person_id, project_id, hours
FROM hour_fact
ORDER BY work_date ASC, person_id ASC, project_id ASC
"#,
    )?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(HourFactRecord {
            work_date: row.get(0)?,
            person_id: row.get(1)?,
            project_id: row.get(2)?,
            hours: row.get(3)?,
        });
    }
    Ok(result)
}
