//! The public database handle.
//!
//! One [`Database`] owns one staged working copy of the durable file. All
//! reads and writes go against the working copy; [`Database::save_modifications`]
//! promotes it. Operations are synchronous and a handle makes no thread
//! safety guarantee; callers wishing to share one must serialize externally.

use std::collections::HashMap;
use std::path::Path;

use docket_core::{
    Column, Document, PRIMARY_KEY, SemanticType, StoredValue, Value, coerce, decode, encode,
};
use docket_filter::Expr;
use tracing::{debug, info};

use crate::backend::SqliteBackend;
use crate::documents;
use crate::error::{Result, StorageError};
use crate::schema::{self, DOCUMENTS_TABLE, INITIAL_TABLE};
use crate::staging::StagedFile;

#[derive(Debug)]
pub struct Database {
    backend: SqliteBackend,
    staging: StagedFile,
    initial_enabled: bool,
}

impl Database {
    /// Opens the database at `path`, creating it when absent.
    ///
    /// With `initial_table` set, every cell keeps a baseline copy next to
    /// its working copy, enabling [`Database::reset_current_value`] and
    /// [`Database::is_value_modified`]. The flag must agree with the shape
    /// of an existing file in both directions; a mismatch is
    /// [`StorageError::InitialTableConflict`].
    pub fn open(path: impl AsRef<Path>, initial_table: bool) -> Result<Self> {
        let durable = path.as_ref();
        let existed = durable.exists();
        let staging = StagedFile::stage(durable)?;
        let backend = SqliteBackend::open(&staging.working_path())?;

        if existed && backend.table_exists(INITIAL_TABLE)? != initial_table {
            return Err(StorageError::InitialTableConflict {
                path: durable.to_path_buf(),
            });
        }
        for stmt in schema::SCHEMA_STATEMENTS {
            backend.conn.execute_batch(stmt)?;
        }
        if initial_table {
            backend.conn.execute_batch(schema::INITIAL_TABLE_DDL)?;
        }
        if !existed {
            // A fresh database commits its empty schema immediately, so the
            // durable file exists from construction onwards.
            backend.checkpoint()?;
            staging.commit()?;
        }

        info!(path = %durable.display(), initial_table, existed, "opened database");
        Ok(Self {
            backend,
            staging,
            initial_enabled: initial_table,
        })
    }

    /// The durable file path this handle will commit to.
    pub fn path(&self) -> &Path {
        self.staging.durable_path()
    }

    /// Whether baseline (initial) cells are kept.
    pub fn initial_table_enabled(&self) -> bool {
        self.initial_enabled
    }

    /// Promotes all staged changes to the durable file.
    ///
    /// Until this is called the durable file is unchanged; a second handle
    /// opened on the same path observes the last committed state. The handle
    /// stays usable afterwards.
    pub fn save_modifications(&self) -> Result<()> {
        self.backend.checkpoint()?;
        self.staging.commit()?;
        info!(path = %self.staging.durable_path().display(), "saved modifications");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Columns
    // -----------------------------------------------------------------------

    /// Declares a new column.
    ///
    /// Inserts the registry row and adds the typed data column to the
    /// current (and initial) table, atomically.
    pub fn add_column(
        &self,
        name: &str,
        column_type: SemanticType,
        description: Option<&str>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(StorageError::invalid_argument("column name may not be empty"));
        }
        if name == PRIMARY_KEY {
            return Err(StorageError::ReservedName { name: name.into() });
        }
        if schema::column_exists(&self.backend.conn, name)? {
            return Err(StorageError::DuplicateColumn { name: name.into() });
        }

        let column = Column::new(name, column_type, description);
        let tx = self.backend.begin()?;
        schema::insert_column_row(&tx, &column)?;
        schema::add_data_column(&tx, DOCUMENTS_TABLE, name, column_type)?;
        if self.initial_enabled {
            schema::add_data_column(&tx, INITIAL_TABLE, name, column_type)?;
        }
        tx.commit()?;

        debug!(column = name, column_type = %column_type, "added column");
        Ok(())
    }

    /// Drops a column and every cell stored under it, in both tables.
    pub fn remove_column(&self, name: &str) -> Result<()> {
        if !schema::column_exists(&self.backend.conn, name)? {
            return Err(StorageError::unknown_column(name));
        }

        let tx = self.backend.begin()?;
        schema::delete_column_row(&tx, name)?;
        schema::drop_data_column(&tx, DOCUMENTS_TABLE, name)?;
        if self.initial_enabled {
            schema::drop_data_column(&tx, INITIAL_TABLE, name)?;
        }
        tx.commit()?;

        debug!(column = name, "removed column");
        Ok(())
    }

    /// Looks up a column descriptor.
    pub fn get_column(&self, name: &str) -> Result<Option<Column>> {
        schema::get_column_on_conn(&self.backend.conn, name)
    }

    /// Lists all columns in declaration order.
    pub fn get_columns(&self) -> Result<Vec<Column>> {
        schema::list_columns_on_conn(&self.backend.conn)
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Adds a document with all cells null.
    pub fn add_document(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(StorageError::invalid_argument("document id may not be empty"));
        }
        if documents::document_exists(&self.backend.conn, DOCUMENTS_TABLE, id)? {
            return Err(StorageError::DuplicateDocument { id: id.into() });
        }

        let tx = self.backend.begin()?;
        documents::insert_document_row(&tx, DOCUMENTS_TABLE, id)?;
        if self.initial_enabled {
            documents::insert_document_row(&tx, INITIAL_TABLE, id)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Removes a document and all its cells from both tables.
    pub fn remove_document(&self, id: &str) -> Result<()> {
        if !documents::document_exists(&self.backend.conn, DOCUMENTS_TABLE, id)? {
            return Err(StorageError::unknown_document(id));
        }

        let tx = self.backend.begin()?;
        documents::delete_document_row(&tx, DOCUMENTS_TABLE, id)?;
        if self.initial_enabled {
            documents::delete_document_row(&tx, INITIAL_TABLE, id)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Returns the current row of a document, or `None` when unknown.
    pub fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let columns = self.get_columns()?;
        documents::fetch_document(&self.backend.conn, DOCUMENTS_TABLE, &columns, id)
    }

    /// Returns the baseline row of a document.
    pub fn get_initial_document(&self, id: &str) -> Result<Option<Document>> {
        if !self.initial_enabled {
            return Err(StorageError::InitialDisabled);
        }
        let columns = self.get_columns()?;
        documents::fetch_document(&self.backend.conn, INITIAL_TABLE, &columns, id)
    }

    /// Returns all current rows in insertion order.
    pub fn get_documents(&self) -> Result<Vec<Document>> {
        let columns = self.get_columns()?;
        documents::fetch_documents(&self.backend.conn, DOCUMENTS_TABLE, &columns, None)
    }

    /// Returns all baseline rows in insertion order.
    pub fn get_initial_documents(&self) -> Result<Vec<Document>> {
        if !self.initial_enabled {
            return Err(StorageError::InitialDisabled);
        }
        let columns = self.get_columns()?;
        documents::fetch_documents(&self.backend.conn, INITIAL_TABLE, &columns, None)
    }

    /// Returns all document ids in insertion order.
    pub fn get_documents_ids(&self) -> Result<Vec<String>> {
        documents::fetch_document_ids(&self.backend.conn, DOCUMENTS_TABLE)
    }

    // -----------------------------------------------------------------------
    // Cells
    // -----------------------------------------------------------------------

    /// Sets the first value of a cell.
    ///
    /// Fails with [`StorageError::ValueAlreadySet`] when the current cell is
    /// non-null. When the initial table is enabled and `initial` is `None`,
    /// the baseline cell is left null.
    pub fn new_value(
        &self,
        document: &str,
        column: &str,
        current: Value,
        initial: Option<Value>,
    ) -> Result<()> {
        let meta = self.require_column(column)?;
        self.require_document(document)?;
        if current.is_null() {
            return Err(StorageError::invalid_argument(
                "the current value of a new cell may not be null",
            ));
        }
        if initial.is_some() && !self.initial_enabled {
            return Err(StorageError::InitialDisabled);
        }

        let current = coerce(current, meta.column_type).map_err(|e| type_mismatch(column, e))?;
        let initial = initial
            .map(|v| coerce(v, meta.column_type).map_err(|e| type_mismatch(column, e)))
            .transpose()?;

        match documents::read_cell(&self.backend.conn, DOCUMENTS_TABLE, document, column)? {
            Some(StoredValue::Null) => {}
            Some(_) => {
                return Err(StorageError::ValueAlreadySet {
                    document: document.into(),
                    column: column.into(),
                });
            }
            None => return Err(StorageError::unknown_document(document)),
        }

        let tx = self.backend.begin()?;
        documents::write_cell(&tx, DOCUMENTS_TABLE, document, column, &encode(&current))?;
        if let Some(init) = &initial {
            documents::write_cell(&tx, INITIAL_TABLE, document, column, &encode(init))?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Overwrites the current cell; the baseline cell is untouched.
    pub fn set_current_value(&self, document: &str, column: &str, value: Value) -> Result<()> {
        let meta = self.require_column(column)?;
        self.require_document(document)?;
        let value = coerce(value, meta.column_type).map_err(|e| type_mismatch(column, e))?;
        documents::write_cell(
            &self.backend.conn,
            DOCUMENTS_TABLE,
            document,
            column,
            &encode(&value),
        )
    }

    /// Copies the baseline cell back over the current cell.
    pub fn reset_current_value(&self, document: &str, column: &str) -> Result<()> {
        if !self.initial_enabled {
            return Err(StorageError::InitialDisabled);
        }
        self.require_column(column)?;
        self.require_document(document)?;
        let initial = documents::read_cell(&self.backend.conn, INITIAL_TABLE, document, column)?
            .ok_or_else(|| StorageError::unknown_document(document))?;
        documents::write_cell(&self.backend.conn, DOCUMENTS_TABLE, document, column, &initial)
    }

    /// Nulls the current (and baseline) cell.
    pub fn remove_value(&self, document: &str, column: &str) -> Result<()> {
        self.require_column(column)?;
        self.require_document(document)?;

        let tx = self.backend.begin()?;
        documents::write_cell(&tx, DOCUMENTS_TABLE, document, column, &StoredValue::Null)?;
        if self.initial_enabled {
            documents::write_cell(&tx, INITIAL_TABLE, document, column, &StoredValue::Null)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Reads the current cell. Unknown referents and null cells both come
    /// back as `None`; only backend failures error.
    pub fn get_current_value(&self, document: &str, column: &str) -> Result<Option<Value>> {
        self.read_value(DOCUMENTS_TABLE, document, column)
    }

    /// Reads the baseline cell. `None` when the initial table is disabled,
    /// the referents are unknown, or the cell is null.
    pub fn get_initial_value(&self, document: &str, column: &str) -> Result<Option<Value>> {
        if !self.initial_enabled {
            return Ok(None);
        }
        self.read_value(INITIAL_TABLE, document, column)
    }

    /// Returns `true` iff both cells are set and their values differ.
    pub fn is_value_modified(&self, document: &str, column: &str) -> Result<bool> {
        if !self.initial_enabled {
            return Ok(false);
        }
        let current = self.get_current_value(document, column)?;
        let initial = self.get_initial_value(document, column)?;
        Ok(matches!((current, initial), (Some(c), Some(i)) if c != i))
    }

    fn read_value(&self, table: &str, document: &str, column: &str) -> Result<Option<Value>> {
        let Some(meta) = schema::get_column_on_conn(&self.backend.conn, column)? else {
            return Ok(None);
        };
        let Some(stored) = documents::read_cell(&self.backend.conn, table, document, column)?
        else {
            return Ok(None);
        };
        let value = decode(&stored, meta.column_type)?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    // -----------------------------------------------------------------------
    // Filtering
    // -----------------------------------------------------------------------

    /// Returns the documents matching a filter expression.
    ///
    /// A syntactically invalid expression errors; comparisons against
    /// unknown columns or disagreeing types match nothing.
    pub fn filter_documents(&self, filter: &str) -> Result<Vec<Document>> {
        let expr = docket_filter::parse(filter)?;
        self.execute_filter(&expr)
    }

    /// Runs a filter AST, pushing it down to SQL when fully expressible and
    /// falling back to an in-memory scan otherwise.
    pub(crate) fn execute_filter(&self, expr: &Expr) -> Result<Vec<Document>> {
        let columns = self.get_columns()?;
        let types = filter_schema(&columns);
        match docket_filter::lower(expr, &types) {
            Some(sql) => {
                debug!(where_clause = %sql.where_clause, "filter lowered to SQL");
                documents::fetch_documents(
                    &self.backend.conn,
                    DOCUMENTS_TABLE,
                    &columns,
                    Some(&sql),
                )
            }
            None => {
                debug!("filter evaluated in memory");
                let docs = documents::fetch_documents(
                    &self.backend.conn,
                    DOCUMENTS_TABLE,
                    &columns,
                    None,
                )?;
                Ok(docs
                    .into_iter()
                    .filter(|doc| docket_filter::matches(expr, doc))
                    .collect())
            }
        }
    }

    pub(crate) fn require_column(&self, name: &str) -> Result<Column> {
        schema::get_column_on_conn(&self.backend.conn, name)?
            .ok_or_else(|| StorageError::unknown_column(name))
    }

    fn require_document(&self, id: &str) -> Result<()> {
        if documents::document_exists(&self.backend.conn, DOCUMENTS_TABLE, id)? {
            Ok(())
        } else {
            Err(StorageError::unknown_document(id))
        }
    }
}

/// The column-type map filters are compiled against. The reserved primary
/// key participates as a string column.
pub(crate) fn filter_schema(columns: &[Column]) -> HashMap<String, SemanticType> {
    let mut map: HashMap<String, SemanticType> = columns
        .iter()
        .map(|c| (c.name.clone(), c.column_type))
        .collect();
    map.insert(PRIMARY_KEY.to_owned(), SemanticType::String);
    map
}

fn type_mismatch(column: &str, err: docket_core::InvalidValue) -> StorageError {
    StorageError::TypeMismatch {
        column: column.to_owned(),
        expected: err.expected,
        kind: err.kind,
    }
}
