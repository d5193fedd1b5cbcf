//! Store methods for per-player reputation history.

use crate::{error::SimResult, types::Day};
use rusqlite::{params, OptionalExtension};

use super::SimStore;

impl SimStore {
    /// Persist one player's end-of-day reputation.
    pub fn insert_reputation_snapshot(
        &self,
        run_id:              &str,
        day:                 Day,
        player:              &str,
        score:               f64,
        delta:               f64,
        average_fulfillment: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO reputation_snapshot
                (run_id, day, player, score, delta, average_fulfillment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![run_id, day as i64, player, score, delta, average_fulfillment],
        )?;
        Ok(())
    }

    /// Most recent reputation recorded for `player`, if any.
    pub fn latest_reputation_score(&self, run_id: &str, player: &str) -> SimResult<Option<f64>> {
        let score = self
            .conn
            .query_row(
                "SELECT score FROM reputation_snapshot
                 WHERE run_id = ?1 AND player = ?2
                 ORDER BY day DESC LIMIT 1",
                params![run_id, player],
                |row| row.get(0),
            )
            .optional()?;
        Ok(score)
    }

    // ── Test / summary helpers ────────────────────────────────────────

    /// Number of reputation rows persisted (for tests).
    pub fn reputation_snapshot_count(&self, run_id: &str) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reputation_snapshot WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
