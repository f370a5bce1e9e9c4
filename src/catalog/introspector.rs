/// Schema introspection over a live session database
use crate::engine::Database;
use crate::error::engine_message;
use crate::sql::{collect_rows, quote_identifier};
use crate::types::{Catalog, ColumnInfo, ForeignKey, TableFailure, TableInfo};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// User tables in catalog (creation) order; engine-internal tables such as
/// `sqlite_sequence` are hidden.
const LIST_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY rowid";

/// Describes the tables of one database
pub struct SchemaIntrospector<'a> {
    db: &'a Database,
    sample_rows: usize,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(db: &'a Database, sample_rows: usize) -> Self {
        Self { db, sample_rows }
    }

    /// Scans the whole catalog.
    ///
    /// Each table is described independently: a table that fails is recorded
    /// in [`Catalog::failures`] and the scan moves on.
    pub fn scan(&self) -> Catalog {
        let names = match self.list_tables() {
            Ok(names) => names,
            Err(e) => {
                warn!(db = self.db.id(), error = %e, "Catalog listing failed");
                return Catalog {
                    tables: Vec::new(),
                    failures: vec![TableFailure {
                        table: "sqlite_master".to_string(),
                        message: engine_message(&e),
                    }],
                };
            }
        };

        let catalog = collect_partial(names, |name| self.describe(name));
        debug!(
            db = self.db.id(),
            tables = catalog.tables.len(),
            failures = catalog.failures.len(),
            "Scanned catalog"
        );
        catalog
    }

    /// Table names in catalog order
    pub fn list_tables(&self) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self.db.connection().prepare(LIST_TABLES_SQL)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Metadata, foreign keys and a bounded sample for one table
    pub fn describe(&self, table: &str) -> rusqlite::Result<TableInfo> {
        let details = self.columns(table)?;
        let foreign_keys = self.foreign_keys(table)?;
        let sample_data = self.sample(table)?;

        let columns = details.iter().map(|c| c.name.clone()).collect();
        let column_types: IndexMap<String, String> = details
            .iter()
            .filter(|c| !c.declared_type.is_empty())
            .map(|c| (c.name.clone(), c.declared_type.clone()))
            .collect();

        Ok(TableInfo {
            name: table.to_string(),
            columns,
            column_types: if column_types.is_empty() {
                None
            } else {
                Some(column_types)
            },
            sample_data,
            column_details: details,
            foreign_keys,
        })
    }

    /// Columns in declared order, via `PRAGMA table_info`
    pub fn columns(&self, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(table));
        let mut stmt = self.db.connection().prepare(&sql)?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    not_null: row.get::<_, i64>(3)? != 0,
                    default_value: row.get(4)?,
                    primary_key: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    pub fn foreign_keys(&self, table: &str) -> rusqlite::Result<Vec<ForeignKey>> {
        let sql = format!("PRAGMA foreign_key_list({})", quote_identifier(table));
        let mut stmt = self.db.connection().prepare(&sql)?;
        let keys = stmt
            .query_map([], |row| {
                Ok(ForeignKey {
                    to_table: row.get(2)?,
                    from_column: row.get(3)?,
                    to_column: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }

    /// First `sample_rows` rows in scan order
    pub fn sample(&self, table: &str) -> rusqlite::Result<Vec<crate::types::SqlRow>> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            quote_identifier(table),
            self.sample_rows
        );
        let mut stmt = self.db.connection().prepare(&sql)?;
        collect_rows(&mut stmt)
    }
}

/// Describes every table with `describe`, keeping successes and failures
/// apart so one bad table cannot hide the rest.
fn collect_partial<F>(names: Vec<String>, mut describe: F) -> Catalog
where
    F: FnMut(&str) -> rusqlite::Result<TableInfo>,
{
    let mut catalog = Catalog::default();
    for name in names {
        match describe(&name) {
            Ok(info) => catalog.tables.push(info),
            Err(e) => {
                warn!(table = %name, error = %e, "Skipping table in catalog scan");
                catalog.failures.push(TableFailure {
                    message: engine_message(&e),
                    table: name,
                });
            }
        }
    }
    catalog
}
