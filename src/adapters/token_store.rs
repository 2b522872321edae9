use std::path::Path;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::domain::session::PersistedTokens;

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS session_tokens (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#,
)];

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to prepare token database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
    #[error("token database lock poisoned")]
    LockPoisoned,
}

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<PersistedTokens, TokenStoreError>;
    fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), TokenStoreError>;
    fn clear(&self) -> Result<(), TokenStoreError>;
}

#[derive(Debug)]
pub struct SqliteTokenStore {
    connection: Mutex<Connection>,
}

impl SqliteTokenStore {
    pub fn open(path: &str) -> Result<Self, TokenStoreError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut connection = Connection::open(path)?;
        run_migrations(&mut connection)?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, TokenStoreError>,
    ) -> Result<T, TokenStoreError> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| TokenStoreError::LockPoisoned)?;
        op(&mut *connection)
    }
}

impl TokenStore for SqliteTokenStore {
    fn load(&self) -> Result<PersistedTokens, TokenStoreError> {
        self.with_connection(|connection| {
            Ok(PersistedTokens {
                access_token: read_token(connection, ACCESS_TOKEN_KEY)?,
                refresh_token: read_token(connection, REFRESH_TOKEN_KEY)?,
            })
        })
    }

    fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), TokenStoreError> {
        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        self.with_connection(|connection| {
            let transaction = connection.transaction()?;
            for (name, value) in [
                (ACCESS_TOKEN_KEY, access_token),
                (REFRESH_TOKEN_KEY, refresh_token),
            ] {
                transaction.execute(
                    "INSERT INTO session_tokens (name, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![name, value, updated_at],
                )?;
            }
            transaction.commit()?;
            Ok(())
        })
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.with_connection(|connection| {
            connection.execute(
                "DELETE FROM session_tokens WHERE name IN (?1, ?2)",
                params![ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY],
            )?;
            Ok(())
        })
    }
}

fn read_token(connection: &Connection, name: &str) -> Result<Option<String>, TokenStoreError> {
    connection
        .query_row(
            "SELECT value FROM session_tokens WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .map_err(TokenStoreError::from)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), TokenStoreError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(TokenStoreError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, TokenStoreError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}
