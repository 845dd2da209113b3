//! DDL and the persistent schema registry.
//!
//! The registry is a small metadata table mapping logical column names to
//! their semantic type and description. Every registry row is mirrored by a
//! typed data column in the `documents` table (and the `initial` table when
//! baseline support is enabled).

use docket_core::{Column, SemanticType};
use docket_filter::quote_ident;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Result, StorageError};

/// Name of the schema-registry table.
pub(crate) const COLUMNS_TABLE: &str = "columns";
/// Name of the current-values table.
pub(crate) const DOCUMENTS_TABLE: &str = "documents";
/// Name of the baseline-values table.
pub(crate) const INITIAL_TABLE: &str = "initial";

/// DDL for the registry and the current-values table. The `initial` table is
/// created separately, only when baseline support is requested.
pub(crate) const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS columns (
        name        TEXT PRIMARY KEY,
        type        TEXT NOT NULL,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        "index" TEXT PRIMARY KEY
    )
    "#,
];

pub(crate) const INITIAL_TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS initial (
        "index" TEXT PRIMARY KEY
    )
"#;

/// The SQLite column type backing a semantic type.
pub(crate) fn backend_type(ty: SemanticType) -> &'static str {
    match ty {
        SemanticType::Boolean | SemanticType::Integer => "INTEGER",
        SemanticType::Float => "REAL",
        // Temporals are ISO text; lists are canonical JSON text.
        _ => "TEXT",
    }
}

// ---------------------------------------------------------------------------
// Registry rows
// ---------------------------------------------------------------------------

pub(crate) fn column_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM columns WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn insert_column_row(conn: &Connection, column: &Column) -> Result<()> {
    conn.execute(
        "INSERT INTO columns (name, type, description) VALUES (?1, ?2, ?3)",
        params![
            column.name,
            column.column_type.as_str(),
            column.description
        ],
    )?;
    Ok(())
}

pub(crate) fn delete_column_row(conn: &Connection, name: &str) -> Result<()> {
    conn.execute("DELETE FROM columns WHERE name = ?1", params![name])?;
    Ok(())
}

pub(crate) fn get_column_on_conn(conn: &Connection, name: &str) -> Result<Option<Column>> {
    let row: Option<(String, String, Option<String>)> = conn
        .query_row(
            "SELECT name, type, description FROM columns WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    row.map(parse_column_row).transpose()
}

pub(crate) fn list_columns_on_conn(conn: &Connection) -> Result<Vec<Column>> {
    let mut stmt =
        conn.prepare("SELECT name, type, description FROM columns ORDER BY rowid")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
    let mut columns = Vec::new();
    for row in rows {
        columns.push(parse_column_row(row?)?);
    }
    Ok(columns)
}

fn parse_column_row(
    (name, type_str, description): (String, String, Option<String>),
) -> Result<Column> {
    let column_type = SemanticType::parse(&type_str).ok_or_else(|| {
        StorageError::invalid_argument(format!(
            "registry row for {name:?} carries unknown type {type_str:?}"
        ))
    })?;
    Ok(Column {
        name,
        column_type,
        description,
    })
}

// ---------------------------------------------------------------------------
// Data columns
// ---------------------------------------------------------------------------

pub(crate) fn add_data_column(
    conn: &Connection,
    table: &str,
    name: &str,
    ty: SemanticType,
) -> Result<()> {
    conn.execute(
        &format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote_ident(table),
            quote_ident(name),
            backend_type(ty)
        ),
        [],
    )?;
    Ok(())
}

pub(crate) fn drop_data_column(conn: &Connection, table: &str, name: &str) -> Result<()> {
    conn.execute(
        &format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(table),
            quote_ident(name)
        ),
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        conn
    }

    #[test]
    fn registry_round_trip() {
        let conn = test_conn();
        let column = Column::new(
            "PatientName",
            SemanticType::String,
            Some("Name of the patient"),
        );
        insert_column_row(&conn, &column).unwrap();

        assert!(column_exists(&conn, "PatientName").unwrap());
        assert_eq!(get_column_on_conn(&conn, "PatientName").unwrap(), Some(column));
        assert_eq!(get_column_on_conn(&conn, "Test").unwrap(), None);
    }

    #[test]
    fn listing_preserves_declaration_order() {
        let conn = test_conn();
        for name in ["zeta", "alpha", "mid"] {
            insert_column_row(&conn, &Column::new(name, SemanticType::Integer, None)).unwrap();
        }
        let names: Vec<String> = list_columns_on_conn(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn data_columns_follow_the_registry() {
        let conn = test_conn();
        add_data_column(&conn, DOCUMENTS_TABLE, "Bits per voxel", SemanticType::Integer).unwrap();
        conn.execute(
            r#"INSERT INTO documents ("index", "Bits per voxel") VALUES ('d1', 10)"#,
            [],
        )
        .unwrap();

        drop_data_column(&conn, DOCUMENTS_TABLE, "Bits per voxel").unwrap();
        // The column is gone; inserting into it now fails.
        assert!(
            conn.execute(
                r#"INSERT INTO documents ("index", "Bits per voxel") VALUES ('d2', 10)"#,
                [],
            )
            .is_err()
        );
    }
}
