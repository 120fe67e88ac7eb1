//! Dataset materialization
//!
//! Generated records are written once per run to a namespace-qualified table
//! through a [`TableCatalog`]. Writes replace the table wholesale.

pub mod sqlite;

use std::fmt;
use std::str::FromStr;

use crate::models::TripletRecord;
use crate::utils::error::StorageError;

pub use sqlite::SqliteCatalog;

/// Namespace used when a table name carries none
pub const DEFAULT_NAMESPACE: &str = "default";

/// `namespace.table` identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentifier {
    pub namespace: String,
    pub name: String,
}

impl TableIdentifier {
    /// Parse `namespace.table`, or a bare `table` in the default namespace
    ///
    /// # Errors
    ///
    /// Both parts must be non-empty and made of ASCII letters, digits and `_`.
    pub fn parse(qualified: &str) -> Result<Self, StorageError> {
        let (namespace, name) = qualified
            .rsplit_once('.')
            .unwrap_or((DEFAULT_NAMESPACE, qualified));

        for part in [namespace, name] {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(StorageError::InvalidIdentifier(qualified.to_string()));
            }
        }

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

impl FromStr for TableIdentifier {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Column value type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Utf8,
    Int64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
}

/// Ordered column list of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// The seven triplet columns, in record field order
    pub fn triplet() -> Self {
        let text = |name| Column {
            name,
            kind: ColumnType::Utf8,
        };
        Self {
            columns: vec![
                text("anchor_text"),
                text("anchor_rdf"),
                text("positive_text"),
                text("negative_text"),
                text("negative_rdf"),
                text("subject_uri"),
                Column {
                    name: "subject_uri_id",
                    kind: ColumnType::Int64,
                },
            ],
        }
    }
}

/// Catalog and table store the dataset is written to
pub trait TableCatalog {
    fn list_namespaces(&self) -> Result<Vec<String>, StorageError>;

    fn create_namespace(&self, namespace: &str) -> Result<(), StorageError>;

    fn table_exists(&self, table: &TableIdentifier) -> Result<bool, StorageError>;

    fn drop_table(&self, table: &TableIdentifier) -> Result<(), StorageError>;

    fn create_table(&self, table: &TableIdentifier, schema: &TableSchema) -> Result<(), StorageError>;

    /// Append all records as one write, returning the number of rows written
    fn append(&self, table: &TableIdentifier, records: &[TripletRecord]) -> Result<usize, StorageError>;
}

/// Result of a materialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing to write; the destination was left untouched
    Empty,
    /// Table replaced with this many rows
    Written { rows: usize },
}

/// Writes generated records to their destination table
pub struct DatasetMaterializer<C: TableCatalog> {
    catalog: C,
}

impl<C: TableCatalog> DatasetMaterializer<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Replace `destination` with `records`
    ///
    /// An empty record list only logs a warning. Otherwise the namespace is
    /// created if absent, an existing table is dropped and recreated, and all
    /// records are appended in one write.
    ///
    /// # Errors
    ///
    /// Any catalog failure is returned; callers treat it as fatal.
    pub fn write(
        &self,
        records: &[TripletRecord],
        destination: &TableIdentifier,
    ) -> Result<WriteOutcome, StorageError> {
        if records.is_empty() {
            tracing::warn!(table = %destination, "No records to write, skipping");
            return Ok(WriteOutcome::Empty);
        }

        tracing::info!(table = %destination, rows = records.len(), "Writing dataset");

        let namespaces = self.catalog.list_namespaces()?;
        if !namespaces.iter().any(|ns| *ns == destination.namespace) {
            tracing::info!(namespace = %destination.namespace, "Creating namespace");
            self.catalog.create_namespace(&destination.namespace)?;
        }

        if self.catalog.table_exists(destination)? {
            tracing::warn!(table = %destination, "Table already exists, dropping and recreating");
            self.catalog.drop_table(destination)?;
        }

        self.catalog.create_table(destination, &TableSchema::triplet())?;
        let rows = self.catalog.append(destination, records)?;

        tracing::info!(table = %destination, rows, "Dataset written");
        Ok(WriteOutcome::Written { rows })
    }
}
