/// sandql SQL layer
///
/// - Executor: runs user SQL and normalizes outcomes
/// - Row converter: engine rows -> SqlRow maps

pub mod executor;
pub mod row_converter;

pub use executor::{QueryExecutor, QueryOutcome, QueryResult, NOT_INITIALIZED, NO_RESULTS};
pub use row_converter::{collect_rows, row_to_sql_row, value_from_ref};

/// Quote an identifier for interpolation into SQL text
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
