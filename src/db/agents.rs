use rusqlite::{OptionalExtension, Row};

use super::models::{Agent, NewAgent};
use super::Database;
use crate::error::Result;

const AGENT_COLUMNS: &str =
    "agent_id, first_name, last_name, date_of_birth, rank, call_sign, user_id";

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        agent_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        rank: row.get(4)?,
        call_sign: row.get(5)?,
        user_id: row.get(6)?,
    })
}

impl Database {
    /// Insert an agent. Returns the new agent id.
    pub fn add_agent(&self, agent: &NewAgent) -> Result<i64> {
        let conn = self.handle()?;
        conn.execute(
            "INSERT INTO agents (first_name, last_name, date_of_birth, rank, call_sign, user_id)
             VALUES (:first_name, :last_name, :date_of_birth, :rank, :call_sign, :user_id)",
            rusqlite::named_params! {
                ":first_name": agent.first_name,
                ":last_name": agent.last_name,
                ":date_of_birth": agent.date_of_birth,
                ":rank": agent.rank,
                ":call_sign": agent.call_sign,
                ":user_id": agent.user_id,
            },
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get an agent by call sign.
    pub fn get_agent(&self, call_sign: &str) -> Result<Option<Agent>> {
        let conn = self.handle()?;
        let agent = conn
            .query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE call_sign = :call_sign"),
                rusqlite::named_params! { ":call_sign": call_sign },
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    pub fn get_agent_by_user_id(&self, user_id: i64) -> Result<Option<Agent>> {
        let conn = self.handle()?;
        let agent = conn
            .query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE user_id = :user_id"),
                rusqlite::named_params! { ":user_id": user_id },
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    /// List all agents ordered by call sign.
    pub fn list_agents(&self) -> Result<Vec<Agent>> {
        let conn = self.handle()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY call_sign"))?;
        let rows = stmt.query_map([], agent_from_row)?;
        let mut agents = Vec::new();
        for row in rows {
            agents.push(row?);
        }
        Ok(agents)
    }

    /// Update the agent owned by `agent.user_id`. Returns the number of rows changed.
    pub fn update_agent(&self, agent: &NewAgent) -> Result<usize> {
        let conn = self.handle()?;
        let updated = conn.execute(
            "UPDATE agents SET first_name = :first_name, last_name = :last_name,
                date_of_birth = :date_of_birth, rank = :rank, call_sign = :call_sign
             WHERE user_id = :user_id",
            rusqlite::named_params! {
                ":user_id": agent.user_id,
                ":first_name": agent.first_name,
                ":last_name": agent.last_name,
                ":date_of_birth": agent.date_of_birth,
                ":rank": agent.rank,
                ":call_sign": agent.call_sign,
            },
        )?;
        Ok(updated)
    }

    /// Delete the agent owned by a user. Deleting a missing agent is a no-op.
    pub fn delete_agent_by_user_id(&self, user_id: i64) -> Result<usize> {
        let conn = self.handle()?;
        let deleted = conn.execute(
            "DELETE FROM agents WHERE user_id = :user_id",
            rusqlite::named_params! { ":user_id": user_id },
        )?;
        Ok(deleted)
    }
}
