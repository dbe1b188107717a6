//! Schema metadata: column types, tables and the cached database catalog.
//!
//! Schema storage is an external collaborator reached through
//! [`SchemaStore`]. A [`Database`] loads each table at most once and keeps
//! it until the table is dropped.

pub mod types;

pub use types::{Column, ColumnType, Size, Table};

use crate::error::{EntityKind, SqlError, SqlResult};
use crate::transpiler::Dialect;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// What a store knows about a database before any table is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseInfo {
    pub name: String,
    pub table_names: Vec<String>,
}

/// Backing-store lookups for schema metadata.
pub trait SchemaStore {
    fn load_database(&self, name: &str) -> SqlResult<Option<DatabaseInfo>>;
    fn load_table(&self, database: &str, name: &str) -> SqlResult<Option<Table>>;
}

/// In-memory schema store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    databases: HashMap<String, Vec<Table>>,
    table_loads: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.databases.entry(name.into()).or_default();
        self
    }

    pub fn with_table(mut self, database: impl Into<String>, table: Table) -> Self {
        self.databases.entry(database.into()).or_default().push(table);
        self
    }

    /// Number of `load_table` calls that found a table.
    pub fn table_loads(&self) -> usize {
        self.table_loads.get()
    }
}

impl SchemaStore for MemoryStore {
    fn load_database(&self, name: &str) -> SqlResult<Option<DatabaseInfo>> {
        Ok(self.databases.get(name).map(|tables| DatabaseInfo {
            name: name.to_string(),
            table_names: tables.iter().map(|t| t.name.clone()).collect(),
        }))
    }

    fn load_table(&self, database: &str, name: &str) -> SqlResult<Option<Table>> {
        let found = self
            .databases
            .get(database)
            .and_then(|tables| tables.iter().find(|t| t.name == name))
            .cloned();
        if found.is_some() {
            self.table_loads.set(self.table_loads.get() + 1);
        }
        Ok(found)
    }
}

/// A database schema with a lazily filled table cache.
pub struct Database {
    name: String,
    dialect: Dialect,
    store: Rc<dyn SchemaStore>,
    table_names: Vec<String>,
    tables: HashMap<String, Table>,
}

impl Database {
    pub fn new(info: DatabaseInfo, dialect: Dialect, store: Rc<dyn SchemaStore>) -> Self {
        Self {
            name: info.name,
            dialect,
            store,
            table_names: info.table_names,
            tables: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn list_tables(&self) -> &[String] {
        &self.table_names
    }

    /// Whether `name` exists, loading it on first use.
    pub fn has_table_by_name(&mut self, name: &str) -> SqlResult<bool> {
        match self.table_by_name(name) {
            Ok(_) => Ok(true),
            Err(SqlError::NoSuchEntity {
                kind: EntityKind::Table,
                ..
            }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The named table. Loaded from the store the first time it is asked
    /// for and served from the cache afterwards.
    pub fn table_by_name(&mut self, name: &str) -> SqlResult<&Table> {
        if !self.tables.contains_key(name) {
            let table = self
                .store
                .load_table(&self.name, name)?
                .ok_or_else(|| SqlError::no_such(EntityKind::Table, name))?;
            debug!(database = %self.name, table = name, "loaded table");
            if !self.table_names.iter().any(|n| n == name) {
                self.table_names.push(name.to_string());
            }
            self.tables.insert(name.to_string(), table);
        }
        self.tables
            .get(name)
            .ok_or_else(|| SqlError::no_such(EntityKind::Table, name))
    }

    /// Cache `table` and return its `CREATE TABLE` statement.
    pub fn create_table(&mut self, table: Table) -> SqlResult<String> {
        if self.tables.contains_key(&table.name) || self.table_names.contains(&table.name) {
            return Err(SqlError::illegal(
                "create table",
                format!("'{}' already exists", table.name),
            ));
        }
        let sql = self.dialect.generator().build_create_table(&table)?;
        debug!(database = %self.name, table = %table.name, "created table");
        self.table_names.push(table.name.clone());
        self.tables.insert(table.name.clone(), table);
        Ok(sql)
    }

    /// Evict `name` from the cache and return its `DROP TABLE` statement.
    pub fn drop_table(&mut self, name: &str) -> SqlResult<String> {
        let known = self.tables.remove(name).is_some();
        let listed = self.table_names.iter().position(|n| n == name);
        if let Some(i) = listed {
            self.table_names.remove(i);
        }
        if !known && listed.is_none() {
            return Err(SqlError::no_such(EntityKind::Table, name));
        }
        debug!(database = %self.name, table = name, "evicted table");
        Ok(self.dialect.generator().build_drop_table(name))
    }

    pub fn rename_table(&mut self, from: &str, _to: &str) -> SqlResult<String> {
        Err(SqlError::unsupported(format!("rename table '{}'", from)))
    }

    pub fn add_index(&mut self, table: &str, _columns: &[&str]) -> SqlResult<String> {
        Err(SqlError::unsupported(format!("add index on '{}'", table)))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("dialect", &self.dialect)
            .field("table_names", &self.table_names)
            .field("cached", &self.tables.len())
            .finish()
    }
}

/// Databases reachable through one store, cached by name.
pub struct Catalog {
    dialect: Dialect,
    store: Rc<dyn SchemaStore>,
    databases: HashMap<String, Database>,
}

impl Catalog {
    pub fn new(dialect: Dialect, store: Rc<dyn SchemaStore>) -> Self {
        Self {
            dialect,
            store,
            databases: HashMap::new(),
        }
    }

    pub fn database(&mut self, name: &str) -> SqlResult<&mut Database> {
        if !self.databases.contains_key(name) {
            let info = self
                .store
                .load_database(name)?
                .ok_or_else(|| SqlError::no_such(EntityKind::Database, name))?;
            debug!(database = name, tables = info.table_names.len(), "loaded database");
            let db = Database::new(info, self.dialect, Rc::clone(&self.store));
            self.databases.insert(name.to_string(), db);
        }
        self.databases
            .get_mut(name)
            .ok_or_else(|| SqlError::no_such(EntityKind::Database, name))
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }
}
