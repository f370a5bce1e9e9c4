/// Query execution against a session database
///
/// Runs one user-supplied SQL string (possibly several statements) and folds
/// every outcome, including engine errors, into a [`QueryOutcome`].

use super::row_converter::{column_names, row_to_sql_row};
use crate::engine::Database;
use crate::error::engine_message;
use crate::types::SqlRow;
use rusqlite::{Batch, ErrorCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Wire-level error text for a query that ran but returned no rows.
pub const NO_RESULTS: &str = "No results";

/// Error text reported when no session is ready.
pub const NOT_INITIALIZED: &str = "Database not initialized";

/// Engine VM instructions between deadline checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

/// Outcome of one execution
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// At least one row came back
    Rows {
        columns: Vec<String>,
        rows: Vec<SqlRow>,
    },

    /// Every statement succeeded but none produced a row
    Empty,

    /// Execution stopped with an error; the engine message is kept verbatim
    Failed(String),
}

impl QueryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, QueryOutcome::Empty)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryOutcome::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            QueryOutcome::Rows { columns, .. } => columns,
            _ => &[],
        }
    }

    pub fn rows(&self) -> &[SqlRow] {
        match self {
            QueryOutcome::Rows { rows, .. } => rows,
            _ => &[],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Wire form with the `"No results"` sentinel
    pub fn into_result(self) -> QueryResult {
        self.into()
    }
}

/// Flat result shape consumed by the presentation layer.
///
/// `error` is set exactly when `rows` is empty: either the engine message or
/// [`NO_RESULTS`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<SqlRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    /// True for the empty-success sentinel, false for real failures.
    pub fn is_no_results(&self) -> bool {
        self.error.as_deref() == Some(NO_RESULTS)
    }
}

impl From<QueryOutcome> for QueryResult {
    fn from(outcome: QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Rows { columns, rows } => QueryResult {
                columns,
                rows,
                error: None,
            },
            QueryOutcome::Empty => QueryResult {
                error: Some(NO_RESULTS.to_string()),
                ..Default::default()
            },
            QueryOutcome::Failed(msg) => QueryResult {
                error: Some(msg),
                ..Default::default()
            },
        }
    }
}

/// Executes SQL text against one database
pub struct QueryExecutor<'a> {
    db: &'a Database,
    timeout: Option<Duration>,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs every statement in `sql` in order.
    ///
    /// Rows from all row-producing statements are appended into one list and
    /// the column list is taken from the first row. Execution stops at the
    /// first failing statement; earlier statements stay applied.
    pub fn execute(&self, sql: &str) -> QueryOutcome {
        let started = Instant::now();
        if let Some(timeout) = self.timeout {
            let deadline = started + timeout;
            self.db
                .connection()
                .progress_handler(PROGRESS_CHECK_OPS, Some(move || Instant::now() >= deadline));
        }

        let mut statements = 0;
        let result = self.run_batch(sql, &mut statements);

        if self.timeout.is_some() {
            self.db
                .connection()
                .progress_handler(0, None::<fn() -> bool>);
        }

        let outcome = match result {
            Ok(rows) if rows.is_empty() => QueryOutcome::Empty,
            Ok(rows) => {
                let columns = rows[0].keys().cloned().collect();
                QueryOutcome::Rows { columns, rows }
            }
            Err(e) => match self.timeout {
                Some(timeout) if is_interrupt(&e) && started.elapsed() >= timeout => {
                    QueryOutcome::Failed(format!(
                        "Query exceeded the time limit of {} ms",
                        timeout.as_millis()
                    ))
                }
                _ => QueryOutcome::Failed(engine_message(&e)),
            },
        };

        debug!(
            db = self.db.id(),
            statements,
            rows = outcome.row_count(),
            failed = outcome.is_failed(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Executed query"
        );
        outcome
    }

    /// `statements` counts every statement that was prepared, including one
    /// that then fails while running.
    fn run_batch(&self, sql: &str, statements: &mut usize) -> rusqlite::Result<Vec<SqlRow>> {
        let mut batch = Batch::new(self.db.connection(), sql);
        let mut rows = Vec::new();

        while let Some(mut stmt) = batch.next()? {
            *statements += 1;
            if stmt.column_count() == 0 {
                stmt.execute([])?;
                continue;
            }
            let columns = column_names(&stmt);
            let mut result = stmt.query([])?;
            while let Some(row) = result.next()? {
                rows.push(row_to_sql_row(row, &columns)?);
            }
        }

        Ok(rows)
    }
}

fn is_interrupt(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::OperationInterrupted)
}
