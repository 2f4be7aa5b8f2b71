//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods; nothing else executes SQL.

use crate::{
    error::SimResult,
    event::EventLogEntry,
    history::AgeHistory,
    types::Age,
};
use rusqlite::{params, Connection, OptionalExtension};

/// Per-age narrative persistence for one character.
pub trait LifeLogStore {
    fn load(&self, character_id: &str) -> SimResult<AgeHistory>;
    fn save(&self, character_id: &str, history: &AgeHistory) -> SimResult<()>;
}

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the simulation database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_life.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    /// Register a run. Reopening an existing run is a no-op.
    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str, character_id: &str) -> SimResult<()> {
        let started_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO run (run_id, seed, version, character_id, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, seed as i64, version, character_id, started_at],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, age, source, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![entry.run_id, entry.age, entry.source, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn events_for_age(&self, run_id: &str, age: Age) -> SimResult<Vec<EventLogEntry>> {
        self.query_events(
            "SELECT id, run_id, age, source, event_type, payload
             FROM event_log WHERE run_id = ?1 AND age = ?2
             ORDER BY id ASC",
            params![run_id, age],
        )
    }

    pub fn events_for_run(&self, run_id: &str) -> SimResult<Vec<EventLogEntry>> {
        self.query_events(
            "SELECT id, run_id, age, source, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
            params![run_id],
        )
    }

    fn query_events(&self, sql: &str, params: impl rusqlite::Params) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    age:        row.get(2)?,
                    source:     row.get(3)?,
                    event_type: row.get(4)?,
                    payload:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, run_id: &str, age: Age, state_json: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshot (run_id, age, state_json) VALUES (?1, ?2, ?3)",
            params![run_id, age, state_json],
        )?;
        Ok(())
    }

    pub fn latest_snapshot_before(&self, run_id: &str, age: Age) -> SimResult<Option<(Age, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT age, state_json FROM snapshot
                 WHERE run_id = ?1 AND age <= ?2
                 ORDER BY age DESC LIMIT 1",
                params![run_id, age],
                |row| Ok((row.get::<_, Age>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(result)
    }
}

impl LifeLogStore for SimStore {
    fn load(&self, character_id: &str) -> SimResult<AgeHistory> {
        let mut stmt = self
            .conn
            .prepare("SELECT age, lines_json FROM age_history WHERE character_id = ?1 ORDER BY age ASC")?;
        let rows = stmt
            .query_map(params![character_id], |row| Ok((row.get::<_, Age>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut history = AgeHistory::new();
        for (age, json) in rows {
            let lines: Vec<String> = serde_json::from_str(&json)?;
            history.record(age, lines);
        }
        Ok(history)
    }

    fn save(&self, character_id: &str, history: &AgeHistory) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (age, lines) in history.iter() {
            tx.execute(
                "INSERT OR REPLACE INTO age_history (character_id, age, lines_json) VALUES (?1, ?2, ?3)",
                params![character_id, age, serde_json::to_string(lines)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
