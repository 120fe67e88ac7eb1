//! SQLite-backed table catalog
//!
//! The warehouse directory holds one database file per namespace,
//! `<warehouse>/<namespace>.db`, and each table is a SQLite table in it.

use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};

use super::{ColumnType, TableCatalog, TableIdentifier, TableSchema};
use crate::models::TripletRecord;
use crate::utils::error::StorageError;

/// Table catalog stored in a warehouse directory
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    warehouse: PathBuf,
}

impl SqliteCatalog {
    /// Open a warehouse, creating the directory if needed
    pub fn open(warehouse: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let warehouse = warehouse.into();
        std::fs::create_dir_all(&warehouse)?;
        Ok(Self { warehouse })
    }

    pub fn warehouse(&self) -> &Path {
        &self.warehouse
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.warehouse.join(format!("{namespace}.db"))
    }

    /// Connect to an existing namespace database
    fn connect(&self, namespace: &str) -> Result<Connection, StorageError> {
        let conn = Connection::open_with_flags(
            self.namespace_path(namespace),
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Number of rows in a table
    pub fn row_count(&self, table: &TableIdentifier) -> Result<u64, StorageError> {
        let conn = self.connect(&table.namespace)?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// All records of a triplet table, in insertion order
    pub fn scan(&self, table: &TableIdentifier) -> Result<Vec<TripletRecord>, StorageError> {
        let conn = self.connect(&table.namespace)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT anchor_text, anchor_rdf, positive_text, negative_text, negative_rdf, \
             subject_uri, subject_uri_id FROM \"{}\" ORDER BY rowid",
            table.name
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(TripletRecord {
                anchor_text: row.get(0)?,
                anchor_rdf: row.get(1)?,
                positive_text: row.get(2)?,
                negative_text: row.get(3)?,
                negative_rdf: row.get(4)?,
                subject_uri: row.get(5)?,
                subject_uri_id: row.get(6)?,
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Check that an existing table carries the triplet columns
    fn check_schema(&self, conn: &Connection, table: &TableIdentifier) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table.name))?;
        let columns = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let expected: Vec<(String, String)> = TableSchema::triplet()
            .columns
            .iter()
            .map(|c| (c.name.to_string(), sql_type(c.kind).to_string()))
            .collect();

        if columns != expected {
            return Err(StorageError::SchemaMismatch {
                table: table.to_string(),
                reason: format!("expected columns {expected:?}, found {columns:?}"),
            });
        }
        Ok(())
    }
}

fn sql_type(kind: ColumnType) -> &'static str {
    match kind {
        ColumnType::Utf8 => "TEXT",
        ColumnType::Int64 => "INTEGER",
    }
}

impl TableCatalog for SqliteCatalog {
    fn list_namespaces(&self) -> Result<Vec<String>, StorageError> {
        let mut namespaces = Vec::new();
        for entry in std::fs::read_dir(&self.warehouse)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "db") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    namespaces.push(stem.to_string());
                }
            }
        }
        namespaces.sort();
        Ok(namespaces)
    }

    fn create_namespace(&self, namespace: &str) -> Result<(), StorageError> {
        TableIdentifier::parse(&format!("{namespace}.probe"))?;
        Connection::open(self.namespace_path(namespace))?;
        Ok(())
    }

    fn table_exists(&self, table: &TableIdentifier) -> Result<bool, StorageError> {
        if !self.namespace_path(&table.namespace).exists() {
            return Ok(false);
        }
        let conn = self.connect(&table.namespace)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table.name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn drop_table(&self, table: &TableIdentifier) -> Result<(), StorageError> {
        let conn = self.connect(&table.namespace)?;
        conn.execute(&format!("DROP TABLE IF EXISTS \"{}\"", table.name), [])?;
        Ok(())
    }

    fn create_table(&self, table: &TableIdentifier, schema: &TableSchema) -> Result<(), StorageError> {
        let columns: Vec<String> = schema
            .columns
            .iter()
            .map(|c| format!("\"{}\" {} NOT NULL", c.name, sql_type(c.kind)))
            .collect();

        let conn = self.connect(&table.namespace)?;
        conn.execute(
            &format!("CREATE TABLE \"{}\" ({})", table.name, columns.join(", ")),
            [],
        )?;
        Ok(())
    }

    fn append(&self, table: &TableIdentifier, records: &[TripletRecord]) -> Result<usize, StorageError> {
        let mut conn = self.connect(&table.namespace)?;
        self.check_schema(&conn, table)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{}\" (anchor_text, anchor_rdf, positive_text, negative_text, \
                 negative_rdf, subject_uri, subject_uri_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                table.name
            ))?;

            for record in records {
                stmt.execute(params![
                    record.anchor_text,
                    record.anchor_rdf,
                    record.positive_text,
                    record.negative_text,
                    record.negative_rdf,
                    record.subject_uri,
                    record.subject_uri_id,
                ])?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }
}
