/// Catalog descriptions produced by schema introspection
use super::SqlRow;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column metadata as reported by `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared type, empty when the column has none
    pub declared_type: String,
    pub not_null: bool,
    /// Default expression as written in the DDL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// 1-based position within the primary key, 0 when not part of it
    pub primary_key: u32,
}

/// One `FOREIGN KEY` edge, used for diagram views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub from_column: String,
    pub to_table: String,
    /// None when the key references the target's primary key implicitly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_column: Option<String>,
}

/// Summary of one table at introspection time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    /// Table name
    pub name: String,
    /// Column names in declared order
    pub columns: Vec<String>,
    /// Column name -> declared type; None when no column declares a type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_types: Option<IndexMap<String, String>>,
    /// First rows of the table in scan order
    pub sample_data: Vec<SqlRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_details: Vec<ColumnInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.column_details.iter().find(|c| c.name == name)
    }
}

/// A table whose metadata or sample could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFailure {
    pub table: String,
    pub message: String,
}

/// Result of one catalog scan: every table that could be described, plus the
/// ones that could not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub tables: Vec<TableInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TableFailure>,
}

impl Catalog {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_table_info_wire_shape() {
        let mut sample = SqlRow::new();
        sample.insert("x".to_string(), Value::Integer(1));

        let mut types = IndexMap::new();
        types.insert("x".to_string(), "INTEGER".to_string());

        let info = TableInfo {
            name: "t".to_string(),
            columns: vec!["x".to_string()],
            column_types: Some(types),
            sample_data: vec![sample],
            column_details: Vec::new(),
            foreign_keys: Vec::new(),
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "t",
                "columns": ["x"],
                "columnTypes": {"x": "INTEGER"},
                "sampleData": [{"x": 1}]
            })
        );
    }
}
