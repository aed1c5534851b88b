//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Register note owners and resolve bearer-token digests to them.
//! - Delete an owner together with every note, label and item it owns.
//!
//! # Invariants
//! - Only token digests are stored; raw tokens never reach storage.
//! - Usernames are unique case-insensitively.

use crate::model::datetime::now_ms;
use crate::model::user::{User, UserId};
use crate::model::validation::ValidationError;
use crate::repo::{ensure_connection_ready, is_unique_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

pub trait UserRepository {
    /// Stores a new user; a taken username is a `username` validation error.
    fn create_user(&self, username: &str, token_hash: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_token_hash(&self, token_hash: &str) -> RepoResult<Option<User>>;
    /// Removes the user; storage cascades to owned records.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, username: &str, token_hash: &str) -> RepoResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: now_ms(),
        };

        let inserted = self.conn.execute(
            "INSERT INTO users (id, username, token_hash, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                token_hash,
                user.created_at
            ],
        );
        match inserted {
            Ok(_) => Ok(user),
            Err(err) if is_unique_violation(&err) => Err(RepoError::Validation(
                ValidationError::new("username", "a user with that username already exists"),
            )),
            Err(err) => Err(err.into()),
        }
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE id = ?1;",
                [id.to_string()],
                read_user_columns,
            )
            .optional()?
            .map(into_user)
            .transpose()
    }

    fn find_by_token_hash(&self, token_hash: &str) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE token_hash = ?1;",
                [token_hash],
                read_user_columns,
            )
            .optional()?
            .map(into_user)
            .transpose()
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        Ok(())
    }
}

type UserColumns = (String, String, i64);

fn read_user_columns(row: &Row<'_>) -> rusqlite::Result<UserColumns> {
    Ok((row.get("id")?, row.get("username")?, row.get("created_at")?))
}

fn into_user((id, username, created_at): UserColumns) -> RepoResult<User> {
    Ok(User {
        id: parse_uuid(&id, "users.id")?,
        username,
        created_at,
    })
}
