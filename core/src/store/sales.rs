//! Store methods for daily sales totals.

use crate::{error::SimResult, types::{DailySales, Day}};
use rusqlite::params;

use super::SimStore;

impl SimStore {
    pub fn insert_daily_sales(
        &self,
        run_id:  &str,
        day:     Day,
        player:  &str,
        revenue: f64,
        cash:    f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_sales (run_id, day, player, revenue, cash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, day as i64, player, revenue, cash],
        )?;
        Ok(())
    }

    pub fn sales_for_day(&self, run_id: &str, day: Day) -> SimResult<DailySales> {
        let mut stmt = self.conn.prepare(
            "SELECT player, revenue FROM daily_sales
             WHERE run_id = ?1 AND day = ?2 ORDER BY player",
        )?;
        let rows = stmt
            .query_map(params![run_id, day as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<DailySales, _>>()?;
        Ok(rows)
    }

    /// Lifetime revenue per player across every stored day.
    pub fn total_revenue(&self, run_id: &str) -> SimResult<DailySales> {
        let mut stmt = self.conn.prepare(
            "SELECT player, SUM(revenue) FROM daily_sales
             WHERE run_id = ?1 GROUP BY player ORDER BY player",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<DailySales, _>>()?;
        Ok(rows)
    }
}
