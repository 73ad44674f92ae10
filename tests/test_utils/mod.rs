//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations for testing purposes, plus fixture builders for remote
//! records and zipped export payloads.

use anyhow::Result;
use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // SQLite does not enforce our Postgres foreign key semantics; disable FK
    // checks so fixtures can insert rows that may not satisfy cross-table
    // relations in tests.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Inserts a subscription row directly for testing.
#[allow(dead_code)]
pub async fn insert_subscription(
    db: &DatabaseConnection,
    url: &str,
    token: Option<&str>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();

    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        "INSERT INTO subscriptions (id, url, token, created_at, updated_at) \
         VALUES ($1, $2, $3, '2025-06-01T00:00:00+00:00', '2025-06-01T00:00:00+00:00')",
        [
            id.into(),
            url.into(),
            token.map(|t| t.to_string()).into(),
        ],
    );

    db.execute(stmt).await?;

    Ok(id)
}

/// Parse an RFC 3339 timestamp for fixtures.
#[allow(dead_code)]
pub fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("valid fixture timestamp")
        .with_timezone(&Utc)
}

/// A minimal well-formed concept record.
#[allow(dead_code)]
pub fn concept_record(uuid: &str, code: &str) -> JsonValue {
    json!({
        "type": "Concept",
        "uuid": uuid,
        "id": code,
        "concept_class": "Diagnosis",
        "datatype": "N/A",
        "names": [
            {"name": format!("Concept {code}"), "locale": "en", "locale_preferred": true}
        ],
        "retired": false
    })
}

/// A minimal well-formed mapping record targeting another concept.
#[allow(dead_code)]
pub fn mapping_record(uuid: &str, from_concept: &str, to_concept: &str) -> JsonValue {
    json!({
        "type": "Mapping",
        "uuid": uuid,
        "map_type": "SAME-AS",
        "from_concept": from_concept,
        "to_concept": to_concept,
        "retired": false
    })
}

/// Build a ZIP export archive with the given payload under `export.json`.
#[allow(dead_code)]
pub fn export_zip(payload: &JsonValue) -> Vec<u8> {
    use std::io::Write;
    use zip::write::FileOptions;

    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        writer
            .start_file("export.json", FileOptions::default())
            .expect("start export entry");
        writer
            .write_all(payload.to_string().as_bytes())
            .expect("write export entry");
        writer.finish().expect("finish export archive");
    }
    buffer.into_inner()
}
