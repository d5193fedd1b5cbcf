//! Store methods for submitted player commands.

use crate::{command::QueuedCommand, error::SimResult};
use rusqlite::params;

use super::SimStore;

impl SimStore {
    /// Record a command and whether it was applied.
    pub fn insert_command(
        &self,
        queued:    &QueuedCommand,
        rejection: Option<&str>,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO player_command
                (command_id, run_id, day, player, command_type, payload, accepted, rejection, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                queued.command_id,
                queued.run_id,
                queued.queued_at as i64,
                queued.player,
                queued.command.type_name(),
                serde_json::to_string(&queued.command)?,
                rejection.is_none() as i64,
                rejection,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn command_count(&self, run_id: &str, accepted: bool) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM player_command WHERE run_id = ?1 AND accepted = ?2",
            params![run_id, accepted as i64],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
