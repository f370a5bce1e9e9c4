//! End-to-end session scenarios through the public API

use sandql::{
    Exercise, QueryOutcome, SandboxConfig, SessionError, SessionManager, SessionState, Value,
    NOT_INITIALIZED, NO_RESULTS,
};

const SCHEMA: &str = "CREATE TABLE t(x INTEGER); INSERT INTO t VALUES (1),(2),(3);";

fn ready(schema: &str) -> SessionManager {
    let mut session = SessionManager::new(SandboxConfig::for_testing());
    session.initialize(&Exercise::with_schema(schema)).unwrap();
    session
}

#[test]
fn empty_filter_reports_no_results() {
    let session = ready(SCHEMA);
    let result = session.execute_result("SELECT x FROM t WHERE x > 10");

    assert!(result.columns.is_empty());
    assert!(result.rows.is_empty());
    assert_eq!(result.error.as_deref(), Some(NO_RESULTS));
}

#[test]
fn ordered_select_returns_rows() {
    let session = ready(SCHEMA);
    let result = session.execute_result("SELECT x FROM t ORDER BY x");

    assert_eq!(result.columns, vec!["x"]);
    assert_eq!(result.error, None);
    let xs: Vec<_> = result.rows.iter().map(|r| r["x"].clone()).collect();
    assert_eq!(
        xs,
        vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
    );
}

#[test]
fn syntax_error_is_a_result_not_a_panic() {
    let session = ready(SCHEMA);
    let result = session.execute_result("SELEC * FROM t");

    assert!(result.columns.is_empty());
    assert!(result.rows.is_empty());
    let error = result.error.unwrap();
    assert!(!error.is_empty());
    assert_ne!(error, NO_RESULTS);
}

#[test]
fn invalid_queries_never_carry_rows() {
    let session = ready(SCHEMA);
    for sql in [
        "SELECT * FROM nowhere",
        "SELECT nope FROM t",
        "INSERT INTO t VALUES (1, 2)",
        "CREATE TABLE t(x)",
        "SELECT ?",
        ")))",
    ] {
        let outcome = session.execute(sql);
        assert!(outcome.is_failed(), "{} should fail, got {:?}", sql, outcome);
        let result = outcome.into_result();
        assert!(result.rows.is_empty() && result.columns.is_empty());
        assert!(!result.error.unwrap().is_empty());
    }
}

#[test]
fn introspection_matches_schema() {
    let session = ready(SCHEMA);
    let tables = session.tables();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "t");
    assert_eq!(tables[0].columns, vec!["x"]);
    assert_eq!(tables[0].sample_data.len(), 3);
    assert_eq!(tables[0].sample_data[2]["x"], Value::Integer(3));

    let json = serde_json::to_value(&tables[0]).unwrap();
    assert_eq!(json["sampleData"], serde_json::json!([{"x": 1}, {"x": 2}, {"x": 3}]));
    assert_eq!(json["columnTypes"], serde_json::json!({"x": "INTEGER"}));
}

#[test]
fn sample_data_capped_at_five_rows() {
    let session = ready(
        "CREATE TABLE big(n INTEGER);
         INSERT INTO big VALUES (1),(2),(3),(4),(5),(6),(7),(8);",
    );
    let tables = session.tables();
    assert_eq!(tables[0].sample_data.len(), 5);
}

#[test]
fn sessions_are_isolated() {
    let mut session = ready("CREATE TABLE from_a(id INTEGER);");
    session
        .initialize(&Exercise::with_schema("CREATE TABLE from_b(id INTEGER);"))
        .unwrap();

    let names: Vec<_> = session.tables().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["from_b"]);
    assert!(session.execute("SELECT * FROM from_a").is_failed());
}

#[test]
fn introspection_is_not_cached() {
    let session = ready(SCHEMA);
    assert_eq!(session.tables().len(), 1);

    session.execute("CREATE TABLE extra(y TEXT)");
    assert_eq!(session.tables().len(), 2);
}

#[test]
fn cleanup_twice_then_queries_degrade() {
    let mut session = ready(SCHEMA);
    session.cleanup();
    session.cleanup();

    assert_eq!(session.state(), SessionState::Destroyed);
    assert_eq!(
        session.execute("SELECT 1"),
        QueryOutcome::Failed(NOT_INITIALIZED.to_string())
    );
    assert!(session.tables().is_empty());
}

#[test]
fn uninitialized_session_degrades() {
    let session = SessionManager::default();
    let result = session.execute_result("SELECT 1");
    assert_eq!(result.error.as_deref(), Some(NOT_INITIALIZED));
    assert!(session.catalog().tables.is_empty());
}

#[test]
fn schema_failure_is_fatal() {
    let mut session = SessionManager::default();
    let err = session
        .initialize(&Exercise::with_schema("CREATE TABLE t(x INTEGER); INSERT INTO nope VALUES (1);"))
        .unwrap_err();

    assert!(matches!(err, SessionError::SchemaExecution(ref m) if m.contains("no such table")));
    assert!(!session.is_ready());
}

#[test]
fn exercise_from_api_json() {
    let exercise: Exercise = serde_json::from_str(
        r#"{"id": 4, "schema": "CREATE TABLE p(name TEXT); INSERT INTO p VALUES ('ada');",
            "solutionQuery": "SELECT name FROM p"}"#,
    )
    .unwrap();

    let mut session = SessionManager::default();
    session.initialize(&exercise).unwrap();
    let solution = session.run_solution();
    assert_eq!(solution.rows()[0]["name"], Value::from("ada"));
}

#[test]
fn runaway_query_is_interrupted_when_timeout_configured() {
    let mut config = SandboxConfig::default();
    config.session.query_timeout_ms = Some(100);
    let mut session = SessionManager::new(config);
    session.initialize(&Exercise::with_schema(SCHEMA)).unwrap();

    let outcome = session.execute(
        "WITH RECURSIVE c(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM c) SELECT max(n) FROM c",
    );
    assert!(outcome.error().unwrap().contains("time limit"));
    assert_eq!(session.execute("SELECT x FROM t").row_count(), 3);
}

#[test]
fn user_sql_cannot_write_files() {
    let dir = tempfile::tempdir().unwrap();
    let attached = dir.path().join("attached.db");
    let copy = dir.path().join("copy.db");
    let mut session = ready(SCHEMA);

    let attach = session.execute(&format!("ATTACH '{}' AS e", attached.display()));
    assert!(attach.is_failed());
    let vacuum = session.execute(&format!("VACUUM INTO '{}'", copy.display()));
    assert!(vacuum.is_failed());

    session.cleanup();
    assert!(!attached.exists());
    assert!(!copy.exists());
}

#[test]
fn tables_follow_creation_order_after_recreate() {
    let session = ready(
        "CREATE TABLE a(x INTEGER); CREATE TABLE b(x INTEGER); CREATE TABLE c(x INTEGER);",
    );
    session.execute("DROP TABLE a; CREATE TABLE a(y TEXT);");

    let names: Vec<_> = session.tables().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["b", "c", "a"]);
}
