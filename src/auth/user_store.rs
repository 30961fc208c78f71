//! User Storage
//! Mission: Persist user accounts behind a swappable store interface

use crate::auth::models::User;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use uuid::Uuid;

/// Persistence contract for user records. Absence of a record is signaled by
/// `Option`/`bool`, never by an error.
pub trait UserStore: Send + Sync {
    fn create(&self, user: &User) -> Result<()>;
    fn find_by_id(&self, id: &Uuid) -> Result<Option<User>>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    fn update(&self, user: &User) -> Result<()>;
    /// Returns false when no record with that id existed.
    fn delete(&self, id: &Uuid) -> Result<bool>;
    fn list(&self) -> Result<Vec<User>>;
}

/// User storage with SQLite backend
pub struct SqliteUserStore {
    db_path: String,
}

type RawUserRow = (String, String, String, String, String, String, String);

const USER_COLUMNS: &str = "id, email, password_hash, name, roles, created_at, updated_at";

impl SqliteUserStore {
    /// Create a new user store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                roles TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn fetch_one(&self, sql: &str, param: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(sql)?;

        match stmt.query_row(params![param], row_to_raw) {
            Ok(raw) => Ok(Some(decode_row(raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl UserStore for SqliteUserStore {
    fn create(&self, user: &User) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO users (id, email, password_hash, name, roles, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.name,
                serde_json::to_string(&user.roles)?,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )
        .context("Failed to insert user")?;

        Ok(())
    }

    fn find_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        self.fetch_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            &id.to_string(),
        )
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            email,
        )
    }

    fn update(&self, user: &User) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE users
             SET email = ?2, password_hash = ?3, name = ?4, roles = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.name,
                serde_json::to_string(&user.roles)?,
                user.updated_at.to_rfc3339(),
            ],
        )
        .context("Failed to update user")?;

        Ok(())
    }

    fn delete(&self, id: &Uuid) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let rows_affected = conn.execute(
            "DELETE FROM users WHERE id = ?1",
            params![id.to_string()],
        )?;

        Ok(rows_affected > 0)
    }

    fn list(&self) -> Result<Vec<User>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users"))?;

        let raw_rows = stmt
            .query_map([], row_to_raw)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw_rows.into_iter().map(decode_row).collect()
    }
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUserRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_row(raw: RawUserRow) -> Result<User> {
    let (id, email, password_hash, name, roles, created_at, updated_at) = raw;
    Ok(User {
        id: Uuid::parse_str(&id).context("Corrupt user id column")?,
        email,
        password_hash,
        name,
        roles: serde_json::from_str(&roles).context("Corrupt roles column")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .context("Corrupt timestamp column")?
        .with_timezone(&Utc))
}

/// In-memory store. The trivial substitute used by unit and integration
/// tests; shares no code with the SQLite path on purpose.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    fn create(&self, user: &User) -> Result<()> {
        self.users.write().insert(user.id, user.clone());
        Ok(())
    }

    fn find_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self.users.read().get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn update(&self, user: &User) -> Result<()> {
        self.users.write().insert(user.id, user.clone());
        Ok(())
    }

    fn delete(&self, id: &Uuid) -> Result<bool> {
        Ok(self.users.write().remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<User>> {
        Ok(self.users.read().values().cloned().collect())
    }
}
