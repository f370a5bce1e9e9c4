//! sandql - exercise sessions on an embedded SQL engine
//!
//! 每个练习一个临时内存数据库
//!
//! ## 核心功能
//! - Engine loader: verifies and caches the bundled SQLite engine
//! - Session manager: materializes an exercise schema into an in-memory database
//! - Query executor: runs arbitrary user SQL and normalizes the outcome
//! - Schema introspector: tables, columns, foreign keys and sample rows
//!
//! ## Quick start
//!
//! ```no_run
//! use sandql::{Exercise, SessionManager};
//!
//! let mut session = SessionManager::default();
//! session.initialize(&Exercise::with_schema(
//!     "CREATE TABLE t(x INTEGER); INSERT INTO t VALUES (1),(2),(3);",
//! ))?;
//!
//! let result = session.execute_result("SELECT x FROM t ORDER BY x");
//! assert_eq!(result.columns, vec!["x"]);
//!
//! for table in session.tables() {
//!     println!("{}: {:?}", table.name, table.columns);
//! }
//! # Ok::<(), sandql::SessionError>(())
//! ```

pub mod config;
pub mod engine;
pub mod sql;
pub mod catalog;
pub mod session;
pub mod types;

mod error;

pub use config::{EngineConfig, SandboxConfig, SessionConfig};
pub use error::{Result, SessionError};

pub use engine::{Database, Engine};
pub use session::{SessionManager, SessionState};
pub use sql::{QueryOutcome, QueryResult, NOT_INITIALIZED, NO_RESULTS};
pub use types::{Catalog, ColumnInfo, Exercise, ForeignKey, SqlRow, TableFailure, TableInfo, Value};
