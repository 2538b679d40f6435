//! Credential Storage
//! Mission: Securely store and manage login credentials with SQLite

use crate::auth::models::Usuario;
use crate::db::Db;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS usuarios (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
) WITHOUT ROWID;
"#;

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "1234";

/// Credential store over the `usuarios` table
pub struct CredentialStore {
    db: Db,
}

impl CredentialStore {
    /// Initialize the schema and seed the default admin account if absent.
    pub fn new(db: Db) -> Result<Self> {
        {
            let conn = db.lock();
            conn.execute_batch(SCHEMA_SQL)
                .context("Failed to initialize usuarios schema")?;
            seed_default_admin(&conn)?;
        }
        Ok(Self { db })
    }

    /// Create a new credential. Returns `None` when the username is taken;
    /// the check and insert run under one lock, so the outcome is exact.
    pub fn create(&self, username: &str, password: &str) -> Result<Option<Usuario>> {
        let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

        let usuario = Usuario {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        };

        let conn = self.db.lock();

        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM usuarios WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )?;
        if taken {
            return Ok(None);
        }

        conn.execute(
            "INSERT INTO usuarios (id, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                usuario.id.to_string(),
                usuario.username,
                usuario.password_hash,
                usuario.created_at.to_rfc3339(),
            ],
        )
        .context("Failed to insert usuario")?;

        info!("✅ Registered usuario: {}", usuario.username);

        Ok(Some(usuario))
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<Usuario>> {
        let conn = self.db.lock();

        let usuario = conn
            .query_row(
                "SELECT id, username, password_hash, created_at
                 FROM usuarios WHERE username = ?1",
                params![username],
                usuario_from_row,
            )
            .optional()?;

        Ok(usuario)
    }

    /// Verify username and password. Unknown user and wrong password are
    /// indistinguishable to the caller.
    pub fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        match self.find_by_username(username)? {
            Some(usuario) => {
                let valid = verify(password, &usuario.password_hash)
                    .context("Failed to verify password")?;
                Ok(valid)
            }
            None => Ok(false),
        }
    }
}

/// Seed the fixed admin account on first run. Idempotent.
fn seed_default_admin(conn: &Connection) -> Result<()> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM usuarios WHERE username = ?1",
            params![DEFAULT_ADMIN_USERNAME],
            |row| row.get(0),
        )
        .context("Failed to check for admin credential")?;

    if count == 0 {
        let password_hash =
            hash(DEFAULT_ADMIN_PASSWORD, DEFAULT_COST).context("Failed to hash password")?;

        conn.execute(
            "INSERT INTO usuarios (id, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                DEFAULT_ADMIN_USERNAME,
                password_hash,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to insert admin credential")?;

        info!("🔐 Default admin credential created (username: admin)");
        warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
    }

    Ok(())
}

fn usuario_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Usuario> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;

    Ok(Usuario {
        id: Uuid::parse_str(&id).map_err(|e| text_conversion_error(0, e))?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| text_conversion_error(3, e))?
            .with_timezone(&Utc),
    })
}

fn text_conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (CredentialStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = crate::db::open(temp_file.path().to_str().unwrap()).unwrap();
        let store = CredentialStore::new(db).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_default_admin_created() {
        let (store, _temp) = create_test_store();

        let admin = store.find_by_username("admin").unwrap();
        assert!(admin.is_some());
        assert!(store.verify_password("admin", "1234").unwrap());
    }

    #[test]
    fn test_admin_seed_is_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let db = crate::db::open(temp_file.path().to_str().unwrap()).unwrap();

        let _first = CredentialStore::new(db.clone()).unwrap();
        let store = CredentialStore::new(db).unwrap();

        let count: i64 = store
            .db
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM usuarios WHERE username = 'admin'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_password_verification() {
        let (store, _temp) = create_test_store();

        store.create("joana", "correct horse").unwrap().unwrap();

        assert!(store.verify_password("joana", "correct horse").unwrap());
        assert!(!store.verify_password("joana", "wrong").unwrap());
        assert!(!store.verify_password("nonexistent", "anything").unwrap());
    }

    #[test]
    fn test_create_and_retrieve() {
        let (store, _temp) = create_test_store();

        let created = store.create("pedro", "pw").unwrap().unwrap();
        assert_eq!(created.username, "pedro");
        assert_ne!(created.password_hash, "pw"); // stored hashed, never plaintext

        let found = store.find_by_username("pedro").unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (store, _temp) = create_test_store();

        let original = store.create("dup", "first").unwrap().unwrap();
        assert!(store.create("dup", "second").unwrap().is_none());

        // Original credential untouched
        let found = store.find_by_username("dup").unwrap().unwrap();
        assert_eq!(found.id, original.id);
        assert!(store.verify_password("dup", "first").unwrap());
        assert!(!store.verify_password("dup", "second").unwrap());
    }

    #[test]
    fn test_empty_password_hashes() {
        let (store, _temp) = create_test_store();

        store.create("empty", "").unwrap().unwrap();
        assert!(store.verify_password("empty", "").unwrap());
        assert!(!store.verify_password("empty", "x").unwrap());
    }
}
