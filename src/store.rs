use crate::date;
use crate::error::{Result, TrackerError};
use crate::model::{DailyActivityRecord, SCHEMA_VERSION};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const DB_FILE: &str = "activity.db";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let db_path = resolve_db_path(path)?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&db_path)?;
        tracing::debug!("opened store at {}", db_path.display());
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS daily_activity (
                date TEXT PRIMARY KEY,
                commits INTEGER NOT NULL,
                prs INTEGER NOT NULL,
                issues INTEGER NOT NULL,
                lines_added INTEGER NOT NULL,
                lines_deleted INTEGER NOT NULL,
                files_changed INTEGER NOT NULL,
                repositories TEXT NOT NULL,
                commit_details TEXT NOT NULL,
                pr_details TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(TrackerError::Store(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    /// Every stored record, in no particular order.
    pub fn find_all(&self) -> Result<Vec<DailyActivityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, commits, prs, issues, lines_added, lines_deleted, files_changed,
                    repositories, commit_details, pr_details, updated_at
             FROM daily_activity",
        )?;
        let rows = stmt.query_map([], read_record)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Projection of just the `date` column.
    pub fn find_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare("SELECT date FROM daily_activity")?;
        let raw: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<_>>()?;
        raw.iter().map(|d| date::parse_canonical(d)).collect()
    }

    pub fn get(&self, day: NaiveDate) -> Result<Option<DailyActivityRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT date, commits, prs, issues, lines_added, lines_deleted, files_changed,
                        repositories, commit_details, pr_details, updated_at
                 FROM daily_activity WHERE date = ?",
                params![date::format_canonical(day)],
                read_record,
            )
            .optional()?)
    }

    /// Replaces each record's row wholesale, all in one transaction.
    pub fn upsert_many(&mut self, records: &[DailyActivityRecord], now: DateTime<Utc>) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut upsert_stmt = tx.prepare(
            "INSERT INTO daily_activity (date, commits, prs, issues, lines_added, lines_deleted,
                                         files_changed, repositories, commit_details, pr_details, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(date) DO UPDATE SET
                commits = excluded.commits,
                prs = excluded.prs,
                issues = excluded.issues,
                lines_added = excluded.lines_added,
                lines_deleted = excluded.lines_deleted,
                files_changed = excluded.files_changed,
                repositories = excluded.repositories,
                commit_details = excluded.commit_details,
                pr_details = excluded.pr_details,
                updated_at = excluded.updated_at",
        )?;

        for record in records {
            upsert_stmt.execute(params![
                record.canonical_date(),
                record.commits as i64,
                record.prs as i64,
                record.issues as i64,
                record.lines_added as i64,
                record.lines_deleted as i64,
                record.files_changed as i64,
                serde_json::to_string(&record.repositories)?,
                serde_json::to_string(&record.commit_details)?,
                serde_json::to_string(&record.pr_details)?,
                now.timestamp(),
            ])?;
        }

        drop(upsert_stmt);
        tx.commit()?;
        Ok(records.len())
    }
}

/// Explicit path, then `GHTRACK_DB`, then the platform data dir, then `~/.ghtrack`.
pub fn resolve_db_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os("GHTRACK_DB").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("ghtrack").join(DB_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".ghtrack").join(DB_FILE));
    }
    Err(TrackerError::Store(
        "Could not determine database path: no home or data directory".to_string(),
    ))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn read_record(row: &Row) -> rusqlite::Result<DailyActivityRecord> {
    let raw_date: String = row.get(0)?;
    let day = date::parse_canonical(&raw_date).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let ts: i64 = row.get(10)?;
    let updated_at = Utc.timestamp_opt(ts, 0).single().ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(10, "updated_at".to_string(), rusqlite::types::Type::Integer)
    })?;

    Ok(DailyActivityRecord {
        date: day,
        commits: row.get::<_, i64>(1)? as u64,
        prs: row.get::<_, i64>(2)? as u64,
        issues: row.get::<_, i64>(3)? as u64,
        lines_added: row.get::<_, i64>(4)? as u64,
        lines_deleted: row.get::<_, i64>(5)? as u64,
        files_changed: row.get::<_, i64>(6)? as u64,
        repositories: json_column(row, 7)?,
        commit_details: json_column(row, 8)?,
        pr_details: json_column(row, 9)?,
        updated_at: Some(updated_at),
    })
}
