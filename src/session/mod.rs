//! Session manager
//!
//! Turns an exercise's schema script into a live in-memory database and owns
//! it until the exercise changes, [`SessionManager::cleanup`] is called, or
//! the manager is dropped. At most one database is alive per manager.
//!
//! Lifecycle errors (`initialize`, `reset`) are returned as `Err`. Query and
//! introspection calls never fail: problems are folded into their results.

mod state;

pub use state::SessionState;

use crate::catalog::SchemaIntrospector;
use crate::config::SandboxConfig;
use crate::engine::{self, Database, Engine};
use crate::error::{engine_message, Result, SessionError};
use crate::sql::{QueryExecutor, QueryOutcome, QueryResult, NOT_INITIALIZED};
use crate::types::{Catalog, Exercise, TableInfo};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Error text when the exercise carries no reference query.
pub const NO_SOLUTION: &str = "No solution query available";

struct ActiveSession {
    engine: Arc<Engine>,
    db: Database,
}

/// Owner of the current exercise session
pub struct SessionManager {
    config: SandboxConfig,
    state: SessionState,
    active: Option<ActiveSession>,
    /// Last exercise passed to `initialize`, kept for `reset`
    exercise: Option<Exercise>,
}

impl SessionManager {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
            active: None,
            exercise: None,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.active.is_some()
    }

    pub fn exercise(&self) -> Option<&Exercise> {
        self.exercise.as_ref()
    }

    /// Version of the engine backing the live session
    pub fn engine_version(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.engine.version())
    }

    // ============================================================================
    // 1. 生命周期
    // ============================================================================

    /// Builds a fresh session from `exercise.schema`.
    ///
    /// Any live session is torn down first, even when the new exercise turns
    /// out to be unusable. On failure the state is `Destroyed` and no
    /// partially built database is kept.
    #[instrument(skip_all, fields(exercise = ?exercise.id))]
    pub fn initialize(&mut self, exercise: &Exercise) -> Result<()> {
        self.cleanup();
        self.exercise = Some(exercise.clone());

        let schema = match exercise.schema_script() {
            Some(schema) => schema,
            None => {
                self.state = SessionState::Destroyed;
                warn!("Exercise has no schema");
                return Err(SessionError::NoSchema);
            }
        };

        self.state = SessionState::Initializing;
        match self.build(schema) {
            Ok(active) => {
                info!(db = active.db.id(), engine = active.engine.version(), "Session ready");
                self.active = Some(active);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Session initialization failed");
                self.state = SessionState::Destroyed;
                Err(e)
            }
        }
    }

    fn build(&self, schema: &str) -> Result<ActiveSession> {
        let engine = engine::shared(&self.config.engine)?;
        let db = engine.new_database()?;

        if let Err(e) = db.connection().execute_batch(schema) {
            let message = engine_message(&e);
            db.close().ok();
            return Err(SessionError::SchemaExecution(message));
        }

        Ok(ActiveSession { engine, db })
    }

    /// Rebuilds the current exercise's session from its schema, discarding
    /// everything the user changed.
    pub fn reset(&mut self) -> Result<()> {
        let exercise = self.exercise.clone().ok_or(SessionError::NoSchema)?;
        self.initialize(&exercise)
    }

    /// Releases the live database. A no-op when nothing is live.
    pub fn cleanup(&mut self) {
        if let Some(active) = self.active.take() {
            let id = active.db.id();
            active.db.close().ok();
            self.state = SessionState::Destroyed;
            debug!(db = id, "Session destroyed");
        }
    }

    // ============================================================================
    // 2. 查询
    // ============================================================================

    /// Runs user SQL against the live session.
    ///
    /// Without a live session the outcome is `Failed("Database not initialized")`.
    pub fn execute(&self, sql: &str) -> QueryOutcome {
        match &self.active {
            Some(active) => QueryExecutor::new(&active.db)
                .with_timeout(self.query_timeout())
                .execute(sql),
            None => QueryOutcome::Failed(NOT_INITIALIZED.to_string()),
        }
    }

    /// [`execute`](Self::execute) in wire form
    pub fn execute_result(&self, sql: &str) -> QueryResult {
        self.execute(sql).into()
    }

    /// Runs the exercise's reference query. Only done on explicit request.
    pub fn run_solution(&self) -> QueryOutcome {
        if self.active.is_none() {
            return QueryOutcome::Failed(NOT_INITIALIZED.to_string());
        }
        match self.exercise.as_ref().and_then(Exercise::solution_script) {
            Some(solution) => self.execute(solution),
            None => QueryOutcome::Failed(NO_SOLUTION.to_string()),
        }
    }

    fn query_timeout(&self) -> Option<Duration> {
        self.config.session.query_timeout_ms.map(Duration::from_millis)
    }

    // ============================================================================
    // 3. 表结构
    // ============================================================================

    /// Tables of the live session; empty without one.
    pub fn tables(&self) -> Vec<TableInfo> {
        self.catalog().tables
    }

    /// Full catalog scan including per-table failures
    pub fn catalog(&self) -> Catalog {
        match &self.active {
            Some(active) => {
                SchemaIntrospector::new(&active.db, self.config.session.sample_rows).scan()
            }
            None => Catalog::default(),
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    const SCHEMA: &str = "CREATE TABLE t(x INTEGER); INSERT INTO t VALUES (1),(2),(3);";

    #[test]
    fn test_lifecycle_states() {
        let mut manager = SessionManager::default();
        assert_eq!(manager.state(), SessionState::Uninitialized);

        manager.initialize(&Exercise::with_schema(SCHEMA)).unwrap();
        assert_eq!(manager.state(), SessionState::Ready);
        assert!(manager.is_ready());
        assert!(manager.engine_version().is_some());

        manager.cleanup();
        assert_eq!(manager.state(), SessionState::Destroyed);
        assert!(!manager.is_ready());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut manager = SessionManager::default();
        manager.cleanup();
        assert_eq!(manager.state(), SessionState::Uninitialized);

        manager.initialize(&Exercise::with_schema(SCHEMA)).unwrap();
        manager.cleanup();
        manager.cleanup();
        assert_eq!(manager.state(), SessionState::Destroyed);
    }

    #[test]
    fn test_missing_schema() {
        let mut manager = SessionManager::default();
        let err = manager.initialize(&Exercise::default()).unwrap_err();
        assert!(matches!(err, SessionError::NoSchema));
        assert_eq!(manager.state(), SessionState::Destroyed);
    }

    #[test]
    fn test_bad_schema_leaves_no_session() {
        let mut manager = SessionManager::default();
        manager.initialize(&Exercise::with_schema(SCHEMA)).unwrap();

        let err = manager
            .initialize(&Exercise::with_schema("CREATE TABLE ok(a); CREATE TABLE ok(a);"))
            .unwrap_err();
        match err {
            SessionError::SchemaExecution(msg) => assert!(msg.contains("already exists")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(manager.state(), SessionState::Destroyed);
        assert_eq!(manager.execute("SELECT 1").error(), Some(NOT_INITIALIZED));
        assert!(manager.tables().is_empty());
    }

    #[test]
    fn test_reset_discards_changes() {
        let mut manager = SessionManager::default();
        manager.initialize(&Exercise::with_schema(SCHEMA)).unwrap();
        manager.execute("DELETE FROM t");
        assert!(manager.execute("SELECT * FROM t").is_empty());

        manager.reset().unwrap();
        assert_eq!(manager.execute("SELECT * FROM t").row_count(), 3);
    }

    #[test]
    fn test_reset_without_exercise() {
        let mut manager = SessionManager::default();
        assert!(matches!(manager.reset(), Err(SessionError::NoSchema)));
    }

    #[test]
    fn test_run_solution() {
        let mut manager = SessionManager::default();
        manager
            .initialize(&Exercise::with_schema(SCHEMA).solution("SELECT max(x) AS m FROM t"))
            .unwrap();
        let outcome = manager.run_solution();
        assert_eq!(outcome.rows()[0]["m"], Value::Integer(3));

        manager.initialize(&Exercise::with_schema(SCHEMA)).unwrap();
        assert_eq!(manager.run_solution().error(), Some(NO_SOLUTION));
    }

    #[test]
    fn test_sample_rows_from_config() {
        let mut config = SandboxConfig::default();
        config.session.sample_rows = 2;
        let mut manager = SessionManager::new(config);
        manager.initialize(&Exercise::with_schema(SCHEMA)).unwrap();
        assert_eq!(manager.tables()[0].sample_data.len(), 2);
    }
}
