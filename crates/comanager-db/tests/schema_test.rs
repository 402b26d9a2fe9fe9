//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let applied = comanager_db::run_migrations(&db).await.unwrap();
    assert_eq!(applied, 1);

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("owner"), "missing owner table");
    assert!(info_str.contains("delegate"), "missing delegate table");
    assert!(info_str.contains("audit_log"), "missing audit_log table");
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    assert_eq!(comanager_db::run_migrations(&db).await.unwrap(), 1);
    assert_eq!(comanager_db::run_migrations(&db).await.unwrap(), 0);

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_delegate_emails() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanager_db::run_migrations(&db).await.unwrap();

    let insert = "CREATE delegate SET \
                  owner_id = 'o1', email = 'dup@example.com', name = 'A', \
                  status = 'Active', created_by = 'o1'";

    db.query(insert).await.unwrap().check().unwrap();

    let result = db.query(insert).await.unwrap().check();
    assert!(result.is_err(), "duplicate email should be rejected");
}

#[tokio::test]
async fn delegate_status_is_constrained() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    comanager_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE delegate SET \
             owner_id = 'o1', email = 'x@example.com', name = 'X', \
             status = 'Deleted', created_by = 'o1'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "unknown status should be rejected");
}
