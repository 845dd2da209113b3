//! Row-level operations shared by the current and initial tables.
//!
//! Both tables have the same shape, so every helper takes the table name.
//! Cells travel as [`StoredValue`] primitives; decoding into typed values
//! happens at the edge, in [`fetch_document`] / [`fetch_documents`].

use docket_core::{Column, Document, StoredValue, decode};
use docket_filter::{SqlFilter, quote_ident};
use rusqlite::{Connection, OptionalExtension, params};

use crate::backend::{from_sql_value, to_sql_value};
use crate::error::Result;

pub(crate) fn document_exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE \"index\" = ?1",
            quote_ident(table)
        ),
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Inserts an all-null row for a new document.
pub(crate) fn insert_document_row(conn: &Connection, table: &str, id: &str) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (\"index\") VALUES (?1)",
            quote_ident(table)
        ),
        params![id],
    )?;
    Ok(())
}

pub(crate) fn delete_document_row(conn: &Connection, table: &str, id: &str) -> Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE \"index\" = ?1", quote_ident(table)),
        params![id],
    )?;
    Ok(())
}

/// Reads one cell. `None` means the document row does not exist; a null cell
/// comes back as `Some(StoredValue::Null)`.
pub(crate) fn read_cell(
    conn: &Connection,
    table: &str,
    id: &str,
    column: &str,
) -> Result<Option<StoredValue>> {
    let value: Option<rusqlite::types::Value> = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE \"index\" = ?1",
                quote_ident(column),
                quote_ident(table)
            ),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.map(from_sql_value))
}

pub(crate) fn write_cell(
    conn: &Connection,
    table: &str,
    id: &str,
    column: &str,
    stored: &StoredValue,
) -> Result<()> {
    conn.execute(
        &format!(
            "UPDATE {} SET {} = ?1 WHERE \"index\" = ?2",
            quote_ident(table),
            quote_ident(column)
        ),
        params![to_sql_value(stored), id],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row fetching and decoding
// ---------------------------------------------------------------------------

fn select_list(columns: &[Column]) -> String {
    let mut parts = vec!["\"index\"".to_owned()];
    parts.extend(columns.iter().map(|c| quote_ident(&c.name)));
    parts.join(", ")
}

fn build_document(
    id: String,
    columns: &[Column],
    stored: Vec<StoredValue>,
) -> Result<Document> {
    let mut doc = Document::new(id);
    for (column, value) in columns.iter().zip(stored) {
        doc.insert(column.name.clone(), decode(&value, column.column_type)?);
    }
    Ok(doc)
}

pub(crate) fn fetch_document(
    conn: &Connection,
    table: &str,
    columns: &[Column],
    id: &str,
) -> Result<Option<Document>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE \"index\" = ?1",
        select_list(columns),
        quote_ident(table)
    );
    let row: Option<(String, Vec<StoredValue>)> = conn
        .query_row(&sql, params![id], |row| scan_row(row, columns.len()))
        .optional()?;
    row.map(|(id, stored)| build_document(id, columns, stored))
        .transpose()
}

/// Fetches all rows of a table, optionally restricted by a lowered filter.
pub(crate) fn fetch_documents(
    conn: &Connection,
    table: &str,
    columns: &[Column],
    filter: Option<&SqlFilter>,
) -> Result<Vec<Document>> {
    let mut sql = format!("SELECT {} FROM {}", select_list(columns), quote_ident(table));
    let params: Vec<rusqlite::types::Value> = match filter {
        Some(f) => {
            sql.push_str(" WHERE ");
            sql.push_str(&f.where_clause);
            f.params.iter().map(to_sql_value).collect()
        }
        None => Vec::new(),
    };
    sql.push_str(" ORDER BY rowid");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
        scan_row(row, columns.len())
    })?;

    let mut documents = Vec::new();
    for row in rows {
        let (id, stored) = row?;
        documents.push(build_document(id, columns, stored)?);
    }
    Ok(documents)
}

pub(crate) fn fetch_document_ids(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT \"index\" FROM {} ORDER BY rowid",
        quote_ident(table)
    ))?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn scan_row(
    row: &rusqlite::Row<'_>,
    column_count: usize,
) -> rusqlite::Result<(String, Vec<StoredValue>)> {
    let id: String = row.get(0)?;
    let mut stored = Vec::with_capacity(column_count);
    for i in 0..column_count {
        stored.push(from_sql_value(row.get::<_, rusqlite::types::Value>(i + 1)?));
    }
    Ok((id, stored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{self, DOCUMENTS_TABLE};
    use docket_core::{SemanticType, Value, encode};
    use pretty_assertions::assert_eq;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        schema::add_data_column(&conn, DOCUMENTS_TABLE, "PatientName", SemanticType::String)
            .unwrap();
        conn
    }

    #[test]
    fn rows_are_born_all_null() {
        let conn = test_conn();
        insert_document_row(&conn, DOCUMENTS_TABLE, "document1").unwrap();

        assert!(document_exists(&conn, DOCUMENTS_TABLE, "document1").unwrap());
        assert_eq!(
            read_cell(&conn, DOCUMENTS_TABLE, "document1", "PatientName").unwrap(),
            Some(StoredValue::Null)
        );
        assert_eq!(
            read_cell(&conn, DOCUMENTS_TABLE, "missing", "PatientName").unwrap(),
            None
        );
    }

    #[test]
    fn write_then_fetch_decodes() {
        let conn = test_conn();
        insert_document_row(&conn, DOCUMENTS_TABLE, "document1").unwrap();
        write_cell(
            &conn,
            DOCUMENTS_TABLE,
            "document1",
            "PatientName",
            &encode(&Value::from("test")),
        )
        .unwrap();

        let columns = vec![Column::new("PatientName", SemanticType::String, None)];
        let doc = fetch_document(&conn, DOCUMENTS_TABLE, &columns, "document1")
            .unwrap()
            .unwrap();
        assert_eq!(doc.get("PatientName"), Some(&Value::from("test")));
        assert_eq!(doc.id(), "document1");
    }

    #[test]
    fn delete_removes_the_row() {
        let conn = test_conn();
        insert_document_row(&conn, DOCUMENTS_TABLE, "document1").unwrap();
        delete_document_row(&conn, DOCUMENTS_TABLE, "document1").unwrap();
        assert!(!document_exists(&conn, DOCUMENTS_TABLE, "document1").unwrap());
    }
}
