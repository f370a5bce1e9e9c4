/// Exercise descriptor as delivered by the course API
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A coding challenge. Only `schema` and `solution_query` matter to sessions;
/// the remaining fields are carried for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Exercise {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// DDL + seed DML that builds the exercise tables
    pub schema: Option<String>,

    /// Reference answer, only run on explicit request
    pub solution_query: Option<String>,
}

impl Exercise {
    /// Exercise with only a schema script.
    pub fn with_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            ..Default::default()
        }
    }

    pub fn solution(mut self, query: impl Into<String>) -> Self {
        self.solution_query = Some(query.into());
        self
    }

    /// Returns the schema script when it holds anything besides whitespace.
    pub fn schema_script(&self) -> Option<&str> {
        self.schema.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn solution_script(&self) -> Option<&str> {
        self.solution_query
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_record() {
        let json = r#"{
            "id": 17,
            "title": "Top customers",
            "schema": "CREATE TABLE c(id INTEGER);",
            "solutionQuery": "SELECT * FROM c;",
            "unitId": 3,
            "difficulty": "easy"
        }"#;

        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.id, Some(serde_json::json!(17)));
        assert_eq!(exercise.schema_script(), Some("CREATE TABLE c(id INTEGER);"));
        assert_eq!(exercise.solution_script(), Some("SELECT * FROM c;"));
    }

    #[test]
    fn test_blank_schema_is_absent() {
        assert_eq!(Exercise::default().schema_script(), None);
        assert_eq!(Exercise::with_schema("  \n\t").schema_script(), None);
        assert_eq!(
            Exercise::with_schema("CREATE TABLE t(x);").schema_script(),
            Some("CREATE TABLE t(x);")
        );
    }
}
