//! Sandbox configuration
//!
//! Engine settings and per-session limits, loadable from a JSON file.

use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rows sampled per table by introspection unless configured otherwise.
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// 引擎配置
///
/// Controls how the embedded SQLite engine is loaded and how each new
/// session database is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Oldest SQLite library accepted, in `sqlite3_libversion_number` form
    /// (e.g. `3035000` = 3.35.0, the first release with `RETURNING`).
    pub min_sqlite_version: i32,

    /// Enforce `FOREIGN KEY` constraints in session databases.
    ///
    /// SQLite ships with enforcement off; exercises about referential
    /// integrity expect it on.
    pub foreign_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_sqlite_version: 3_035_000,
            foreign_keys: true,
        }
    }
}

/// 会话配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on rows sampled per table by introspection.
    pub sample_rows: usize,

    /// Wall-clock limit for a single `execute` call (milliseconds).
    ///
    /// - None = no timeout (default; a runaway query blocks the caller)
    /// - Some(2000) = statements still running after 2s are interrupted
    pub query_timeout_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
            query_timeout_ms: None,
        }
    }
}

/// sandql 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub engine: EngineConfig,
    pub session: SessionConfig,
}

impl SandboxConfig {
    /// Configuration for unattended classroom use: user queries are capped at
    /// five seconds so a runaway recursive CTE cannot hang the shell.
    pub fn for_classroom() -> Self {
        Self {
            session: SessionConfig {
                query_timeout_ms: Some(5_000),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// 创建测试用配置
    pub fn for_testing() -> Self {
        Self {
            session: SessionConfig {
                query_timeout_ms: Some(1_000),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields take their defaults, so `{}` is a valid file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: SandboxConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.sample_rows == 0 {
            return Err(SessionError::Config(
                "session.sample_rows must be at least 1".to_string(),
            ));
        }
        if self.session.query_timeout_ms == Some(0) {
            return Err(SessionError::Config(
                "session.query_timeout_ms must be positive when set".to_string(),
            ));
        }
        if self.engine.min_sqlite_version < 3_000_000 {
            return Err(SessionError::Config(format!(
                "engine.min_sqlite_version {} is not a SQLite 3 version number",
                self.engine.min_sqlite_version
            )));
        }
        Ok(())
    }
}
