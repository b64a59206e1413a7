//! SQLite-based focus history and progression storage.
//!
//! Provides persistent storage for:
//! - Focus records (one per finished session with focused minutes)
//! - Per-day statistics
//! - Pet and streak state
//! - Tasks marked done by a completed session

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::data_dir;
use crate::error::DatabaseError;
use crate::progression::{PetState, StreakState};
use crate::timer::SessionMode;

const PET_KEY: &str = "pet_state";
const STREAK_KEY: &str = "streak_state";

/// What the history keeps for one finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRecord {
    /// Calendar day the session finished on, as computed by the caller.
    pub date: NaiveDate,
    pub duration_minutes: u64,
    pub mode: SessionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFocusRecord {
    pub id: i64,
    #[serde(flatten)]
    pub record: FocusRecord,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub sessions: u64,
    pub focus_minutes: u64,
}

/// SQLite database for focus history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/pomopet.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("pomopet.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS focus_records (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                date         TEXT NOT NULL,
                duration_min INTEGER NOT NULL,
                mode         TEXT NOT NULL,
                recorded_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS completed_tasks (
                task_id      TEXT PRIMARY KEY,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_focus_records_date ON focus_records(date);",
        )?;
        Ok(())
    }

    /// Append a focus record. Returns the new row id.
    pub fn record_focus(&self, record: &FocusRecord) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO focus_records (date, duration_min, mode, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.date.to_string(),
                record.duration_minutes as i64,
                mode_str(record.mode),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent records first.
    pub fn recent_records(&self, limit: usize) -> Result<Vec<StoredFocusRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, duration_min, mode, recorded_at
             FROM focus_records
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, date, duration_minutes, mode, recorded_at) = row?;
            let corrupt = |message: String| DatabaseError::Corrupt {
                key: format!("focus_records.{id}"),
                message,
            };
            records.push(StoredFocusRecord {
                id,
                record: FocusRecord {
                    date: date.parse().map_err(|e: chrono::ParseError| corrupt(e.to_string()))?,
                    duration_minutes: duration_minutes.max(0) as u64,
                    mode: parse_mode(&mode).ok_or_else(|| corrupt(format!("mode '{mode}'")))?,
                },
                recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                    .map_err(|e| corrupt(e.to_string()))?
                    .with_timezone(&Utc),
            });
        }
        Ok(records)
    }

    pub fn stats_for_day(&self, date: NaiveDate) -> Result<DayStats, DatabaseError> {
        let (sessions, focus_minutes) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM focus_records
             WHERE date = ?1",
            params![date.to_string()],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        Ok(DayStats {
            sessions: sessions.max(0) as u64,
            focus_minutes: focus_minutes.max(0) as u64,
        })
    }

    pub fn mark_task_done(&self, task_id: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO completed_tasks (task_id, completed_at) VALUES (?1, ?2)",
            params![task_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn is_task_done(&self, task_id: &str) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM completed_tasks WHERE task_id = ?1",
            params![task_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Stored pet, or a fresh one.
    pub fn load_pet(&self) -> Result<PetState, DatabaseError> {
        Ok(self.kv_get_json(PET_KEY)?.unwrap_or_default())
    }

    pub fn save_pet(&self, pet: &PetState) -> Result<(), DatabaseError> {
        self.kv_set_json(PET_KEY, pet)
    }

    pub fn load_streak(&self) -> Result<StreakState, DatabaseError> {
        Ok(self.kv_get_json(STREAK_KEY)?.unwrap_or_default())
    }

    pub fn save_streak(&self, streak: &StreakState) -> Result<(), DatabaseError> {
        self.kv_set_json(STREAK_KEY, streak)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.kv_get(key)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| DatabaseError::Corrupt {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn kv_set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(value).map_err(|e| DatabaseError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.kv_set(key, &json)
    }
}

fn mode_str(mode: SessionMode) -> &'static str {
    match mode {
        SessionMode::Pomodoro => "pomodoro",
        SessionMode::Stopwatch => "stopwatch",
        SessionMode::Custom => "custom",
    }
}

fn parse_mode(s: &str) -> Option<SessionMode> {
    match s {
        "pomodoro" => Some(SessionMode::Pomodoro),
        "stopwatch" => Some(SessionMode::Stopwatch),
        "custom" => Some(SessionMode::Custom),
        _ => None,
    }
}
