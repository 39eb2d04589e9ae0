use rusqlite::{OptionalExtension, Row};

use super::models::{NewUser, User};
use super::Database;
use crate::error::Result;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
    })
}

impl Database {
    pub fn add_user(&self, user: &NewUser) -> Result<i64> {
        let conn = self.handle()?;
        conn.execute(
            "INSERT INTO users (username, full_name) VALUES (:username, :full_name)",
            rusqlite::named_params! {
                ":username": user.username,
                ":full_name": user.full_name,
            },
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.handle()?;
        let user = conn
            .query_row(
                "SELECT user_id, username, full_name FROM users WHERE user_id = :user_id",
                rusqlite::named_params! { ":user_id": user_id },
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn update_user(&self, user_id: i64, user: &NewUser) -> Result<usize> {
        let conn = self.handle()?;
        let updated = conn.execute(
            "UPDATE users SET username = :username, full_name = :full_name
             WHERE user_id = :user_id",
            rusqlite::named_params! {
                ":user_id": user_id,
                ":username": user.username,
                ":full_name": user.full_name,
            },
        )?;
        Ok(updated)
    }

    /// Delete a user along with their agent and its reports.
    pub fn delete_user(&self, user_id: i64) -> Result<usize> {
        let conn = self.handle()?;
        let deleted = conn.execute(
            "DELETE FROM users WHERE user_id = :user_id",
            rusqlite::named_params! { ":user_id": user_id },
        )?;
        Ok(deleted)
    }
}
