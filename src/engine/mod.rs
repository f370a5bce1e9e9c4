//! Engine loader
//!
//! The engine is the bundled SQLite library. Loading it means verifying the
//! linked library is recent enough and that it can actually open and query a
//! database; after that, [`Engine::new_database`] hands out isolated
//! in-memory instances.
//!
//! [`Engine::load`] does the work every time it is called. [`shared`] keeps
//! the first successful load for the rest of the process, so repeated session
//! initializations reuse one engine.

mod database;

pub use database::Database;

use crate::config::EngineConfig;
use crate::error::{engine_message, Result, SessionError};
use once_cell::sync::OnceCell;
use rusqlite::hooks::{AuthAction, AuthContext, Authorization};
use rusqlite::limits::Limit;
use rusqlite::Connection;
use std::sync::Arc;
use tracing::{debug, info, instrument};

static SHARED_ENGINE: OnceCell<Arc<Engine>> = OnceCell::new();

/// A loaded, verified SQL engine
#[derive(Debug, Clone)]
pub struct Engine {
    version: String,
    version_number: i32,
    config: EngineConfig,
}

impl Engine {
    /// Loads the engine without consulting the process-wide cache.
    ///
    /// Fails with [`SessionError::EngineLoad`] when the linked library is
    /// older than `config.min_sqlite_version`, and with
    /// [`SessionError::EngineInit`] when the library cannot open or query a
    /// scratch database.
    #[instrument(skip_all, fields(min_version = config.min_sqlite_version))]
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let version_number = rusqlite::version_number();
        check_version(version_number, rusqlite::version(), config.min_sqlite_version)?;

        let scratch = Connection::open_in_memory()
            .map_err(|e| SessionError::EngineInit(engine_message(&e)))?;
        let version: String = scratch
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))
            .map_err(|e| SessionError::EngineInit(engine_message(&e)))?;
        scratch
            .close()
            .map_err(|(_, e)| SessionError::EngineInit(engine_message(&e)))?;

        info!("Loaded SQLite engine {}", version);
        Ok(Self {
            version,
            version_number,
            config: config.clone(),
        })
    }

    /// Engine version string, e.g. `3.45.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn version_number(&self) -> i32 {
        self.version_number
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Opens a fresh, empty in-memory database.
    ///
    /// Every call returns an independent instance; nothing is shared between
    /// databases created by the same engine. The instance cannot reach the
    /// filesystem: `ATTACH` and `VACUUM INTO` are refused.
    pub fn new_database(&self) -> Result<Database> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", self.config.foreign_keys)?;
        confine_to_memory(&conn);
        let db = Database::new(conn);
        debug!(db = db.id(), "Opened in-memory database");
        Ok(db)
    }

    fn reconfigured(&self, config: &EngineConfig) -> Result<Self> {
        check_version(self.version_number, &self.version, config.min_sqlite_version)?;
        Ok(Self {
            config: config.clone(),
            ..self.clone()
        })
    }
}

/// Returns the process-wide engine, loading it on first use.
///
/// Only successful loads are cached; after a failure the next call tries
/// again. A later call with a different config reuses the loaded library and
/// only re-checks the version requirement.
pub fn shared(config: &EngineConfig) -> Result<Arc<Engine>> {
    let loaded = SHARED_ENGINE.get_or_try_init(|| Engine::load(config).map(Arc::new))?;
    if loaded.config == *config {
        return Ok(Arc::clone(loaded));
    }
    Ok(Arc::new(loaded.reconfigured(config)?))
}

/// Denies every attach, including the one `VACUUM INTO` issues internally.
fn confine_to_memory(conn: &Connection) {
    conn.authorizer(Some(deny_attach));
    let _previous = conn.set_limit(Limit::SQLITE_LIMIT_ATTACHED, 0);
}

fn deny_attach(ctx: AuthContext<'_>) -> Authorization {
    match ctx.action {
        AuthAction::Attach { .. } => Authorization::Deny,
        _ => Authorization::Allow,
    }
}

fn check_version(found: i32, found_str: &str, required: i32) -> Result<()> {
    if found < required {
        return Err(SessionError::EngineLoad(format!(
            "SQLite {} is linked, but version number {} or newer is required",
            found_str, required
        )));
    }
    Ok(())
}
