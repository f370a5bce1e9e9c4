/// Owned handle to one in-memory engine database
use crate::error::Result;
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static NEXT_DATABASE_ID: AtomicU64 = AtomicU64::new(1);

/// One ephemeral database instance.
///
/// The instance lives entirely in memory; dropping or closing it releases the
/// engine-side memory and discards every table.
#[derive(Debug)]
pub struct Database {
    id: u64,
    conn: Connection,
}

impl Database {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            id: NEXT_DATABASE_ID.fetch_add(1, Ordering::Relaxed),
            conn,
        }
    }

    /// Process-unique id, used in log fields.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runs a multi-statement script, discarding any rows it produces.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the database, reporting whether the engine released it cleanly.
    ///
    /// Dropping a `Database` also releases it but swallows close errors.
    pub fn close(self) -> Result<()> {
        let id = self.id;
        match self.conn.close() {
            Ok(()) => {
                debug!(db = id, "Closed database");
                Ok(())
            }
            Err((_conn, e)) => {
                warn!(db = id, error = %e, "Database close failed; released on drop");
                Err(e.into())
            }
        }
    }
}
