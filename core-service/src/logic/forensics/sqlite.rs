//! SQLite forensic sink
//!
//! One row per record. The full record is stored as JSON alongside its
//! SHA-256 digest; indexed columns exist only for filtering.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use super::record::{digest_of, ForensicQuery, ForensicRecord};
use super::sink::ForensicSink;
use crate::logic::error::SinkError;

const SCHEMA: &str = "
    PRAGMA journal_mode=WAL;
    PRAGMA synchronous=FULL;
    CREATE TABLE IF NOT EXISTS forensic_records (
        record_id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        ts_micros INTEGER NOT NULL,
        verdict TEXT NOT NULL,
        canary INTEGER NOT NULL,
        score_after REAL NOT NULL,
        digest TEXT NOT NULL,
        payload TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_forensic_session_ts ON forensic_records(session_id, ts_micros);
    CREATE INDEX IF NOT EXISTS idx_forensic_ts ON forensic_records(ts_micros);
";

pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        log::info!("Opened forensic database: {:?}", path);
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, SinkError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SinkError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn count(&self) -> Result<usize, SinkError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM forensic_records", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

fn micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

impl ForensicSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn append(&self, record: &ForensicRecord) -> Result<(), SinkError> {
        let payload = record.to_json()?;
        let digest = digest_of(&payload);

        self.conn.lock().execute(
            "INSERT OR IGNORE INTO forensic_records(record_id,session_id,ts_micros,verdict,canary,score_after,digest,payload) VALUES(?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                record.record_id.to_string(),
                record.session_id,
                micros(record.timestamp),
                record.verdict.as_str(),
                record.canary,
                record.score_after,
                digest,
                payload
            ],
        )?;
        Ok(())
    }

    fn query(&self, query: &ForensicQuery) -> Result<Vec<ForensicRecord>, SinkError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT record_id, digest, payload FROM forensic_records
             WHERE (?1 IS NULL OR session_id = ?1)
               AND (?2 IS NULL OR ts_micros >= ?2)
               AND (?3 IS NULL OR ts_micros <= ?3)
             ORDER BY ts_micros ASC, rowid ASC
             LIMIT ?4",
        )?;

        let limit = query.limit.map(|l| l.min(i64::MAX as usize) as i64).unwrap_or(-1);
        let rows = stmt.query_map(
            params![
                query.session_id,
                query.from.map(micros),
                query.to.map(micros),
                limit
            ],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (record_id, digest, payload) = row?;
            if digest_of(&payload) != digest {
                return Err(SinkError::Corrupt(record_id));
            }
            out.push(serde_json::from_str(&payload)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::forensics::tests::sample_record;
    use tempfile::TempDir;

    #[test]
    fn test_append_is_idempotent() {
        let sink = SqliteSink::in_memory().unwrap();
        let record = sample_record("s1", 0);
        sink.append(&record).unwrap();
        sink.append(&record).unwrap();
        assert_eq!(sink.count().unwrap(), 1);
    }

    #[test]
    fn test_query_filters_and_orders() {
        let sink = SqliteSink::in_memory().unwrap();
        for i in [3, 1, 2] {
            sink.append(&sample_record("s1", i)).unwrap();
        }
        sink.append(&sample_record("s2", 0)).unwrap();

        let records = sink.query(&ForensicQuery::session("s1")).unwrap();
        let offsets: Vec<i64> = records
            .iter()
            .map(|r| (r.timestamp - sample_record("s1", 0).timestamp).num_seconds())
            .collect();
        assert_eq!(offsets, vec![1, 2, 3]);

        let limited = sink.query(&ForensicQuery::session("s1").limit(2)).unwrap();
        assert_eq!(limited.len(), 2);

        let base = sample_record("s1", 0).timestamp;
        let ranged = sink
            .query(&ForensicQuery::all().between(base + chrono::Duration::seconds(2), base + chrono::Duration::seconds(3)))
            .unwrap();
        assert_eq!(ranged.len(), 2);
    }

    #[test]
    fn test_tampered_payload_is_detected() {
        let sink = SqliteSink::in_memory().unwrap();
        let record = sample_record("s1", 0);
        sink.append(&record).unwrap();
        sink.conn
            .lock()
            .execute("UPDATE forensic_records SET payload = replace(payload, 'DECOY', 'REAL')", [])
            .unwrap();

        assert!(matches!(sink.query(&ForensicQuery::all()), Err(SinkError::Corrupt(_))));
    }

    #[test]
    fn test_commits_are_fully_synced() {
        let dir = TempDir::new().unwrap();
        let sink = SqliteSink::open(&dir.path().join("forensics.db")).unwrap();
        let conn = sink.conn.lock();

        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)).unwrap();
        let level: i64 = conn.query_row("PRAGMA synchronous", [], |row| row.get(0)).unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        // 2 = FULL
        assert_eq!(level, 2);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("forensics.db");
        {
            let sink = SqliteSink::open(&path).unwrap();
            sink.append(&sample_record("s1", 0)).unwrap();
        }
        let sink = SqliteSink::open(&path).unwrap();
        assert_eq!(sink.count().unwrap(), 1);
    }
}
