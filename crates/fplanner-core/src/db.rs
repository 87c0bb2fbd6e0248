// SQLite persistence for the connected session and the manager's plans.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::model::Chip;
use crate::plan::{ChipPlan, TransferPlan};

/// SQLite-backed store: a key/JSON table for session values plus one table
/// each for transfer and chip plans.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS session_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS transfer_plans (
                gameweek   INTEGER PRIMARY KEY,
                player_out INTEGER NOT NULL,
                player_in  INTEGER NOT NULL,
                cost       INTEGER NOT NULL,
                seq        INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chip_plans (
                gameweek INTEGER PRIMARY KEY,
                chip     TEXT NOT NULL UNIQUE
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection. A poisoned lock still holds a usable
    /// connection, so it is recovered rather than propagated.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -----------------------------------------------------------------------
    // Key/value session state
    // -----------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`, overwriting any previous
    /// value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO session_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM session_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query session state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value: serde_json::Value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn delete_state(&self, key: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM session_state WHERE key = ?1", params![key])
            .context("failed to delete state")?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Plans
    // -----------------------------------------------------------------------

    /// Replace every stored transfer plan with `plans`, keeping their order.
    pub fn replace_transfer_plans(&self, plans: &[TransferPlan]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin transfer plan transaction")?;
        tx.execute("DELETE FROM transfer_plans", [])
            .context("failed to clear transfer plans")?;
        for (seq, plan) in plans.iter().enumerate() {
            tx.execute(
                "INSERT OR REPLACE INTO transfer_plans
                    (gameweek, player_out, player_in, cost, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![plan.gameweek, plan.player_out, plan.player_in, plan.cost, seq as i64],
            )
            .context("failed to insert transfer plan")?;
        }
        tx.commit().context("failed to commit transfer plans")?;
        Ok(())
    }

    /// Load transfer plans in the order they were saved.
    pub fn load_transfer_plans(&self) -> Result<Vec<TransferPlan>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT gameweek, player_out, player_in, cost
                 FROM transfer_plans ORDER BY seq",
            )
            .context("failed to prepare load_transfer_plans query")?;

        let plans = stmt
            .query_map([], |row| {
                Ok(TransferPlan {
                    gameweek: row.get(0)?,
                    player_out: row.get(1)?,
                    player_in: row.get(2)?,
                    cost: row.get(3)?,
                })
            })
            .context("failed to query transfer plans")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map transfer plan rows")?;

        Ok(plans)
    }

    /// Replace every stored chip plan with `plans`.
    pub fn replace_chip_plans(&self, plans: &[ChipPlan]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin chip plan transaction")?;
        tx.execute("DELETE FROM chip_plans", [])
            .context("failed to clear chip plans")?;
        for plan in plans {
            let chip = plan
                .chip
                .api_name()
                .with_context(|| format!("cannot store a plan for chip {:?}", plan.chip))?;
            tx.execute(
                "INSERT OR REPLACE INTO chip_plans (gameweek, chip) VALUES (?1, ?2)",
                params![plan.gameweek, chip],
            )
            .context("failed to insert chip plan")?;
        }
        tx.commit().context("failed to commit chip plans")?;
        Ok(())
    }

    /// Load chip plans ordered by gameweek. Rows naming a chip this build
    /// does not know are dropped.
    pub fn load_chip_plans(&self) -> Result<Vec<ChipPlan>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT gameweek, chip FROM chip_plans ORDER BY gameweek")
            .context("failed to prepare load_chip_plans query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
            })
            .context("failed to query chip plans")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map chip plan rows")?;

        let plans = rows
            .into_iter()
            .filter_map(|(gameweek, name)| {
                match serde_json::from_value::<Chip>(serde_json::Value::String(name.clone())) {
                    Ok(Chip::Other) | Err(_) => {
                        tracing::warn!("dropping stored chip plan with unknown chip {name:?}");
                        None
                    }
                    Ok(chip) => Some(ChipPlan { gameweek, chip }),
                }
            })
            .collect();
        Ok(plans)
    }

    /// Remove every stored value and plan.
    pub fn clear_all(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            "DELETE FROM session_state;
             DELETE FROM transfer_plans;
             DELETE FROM chip_plans;",
        )
        .context("failed to clear database")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
