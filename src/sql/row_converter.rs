/// Row conversion utilities - converts engine rows into SqlRow maps

use crate::types::{SqlRow, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Row, Statement};

/// Convert an engine cell into an owned Value
pub fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Convert an engine row into a SqlRow keyed by `columns`.
///
/// A repeated column name keeps its first position and its last value.
pub fn row_to_sql_row(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<SqlRow> {
    let mut sql_row = SqlRow::with_capacity(columns.len());
    for (i, name) in columns.iter().enumerate() {
        sql_row.insert(name.clone(), value_from_ref(row.get_ref(i)?));
    }
    Ok(sql_row)
}

/// Owned result column names of a prepared statement
pub fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

/// Run a parameterless row-producing statement and collect every row
pub fn collect_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<Vec<SqlRow>> {
    let columns = column_names(stmt);
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row_to_sql_row(row, &columns)?);
    }
    Ok(out)
}
