//! SQLite-backed query provider.
//!
//! Every source maps to one table. By default the table name is the last
//! `/` segment of the source id (`db:/crm/people` reads table `people`);
//! explicit mappings can be registered with [`SqliteProvider::with_table`].

use crate::error::{LookupError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, Statement};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::query::{escape_like_pattern, quote_identifier};
use super::{ContainsFilter, Entry, QueryProvider};

const ROWID: &str = "rowid";

/// Key layout of a table.
#[derive(Debug, Clone)]
struct TableInfo {
    table: String,
    columns: Vec<String>,
    key_columns: Vec<String>,
    /// No declared primary key; the implicit rowid is the key.
    implicit_rowid: bool,
}

impl TableInfo {
    /// Column lookup follows SQLite's ASCII case-insensitive naming.
    fn has_column(&self, name: &str) -> bool {
        (self.implicit_rowid && name.eq_ignore_ascii_case(ROWID))
            || self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    fn select_list(&self) -> &'static str {
        if self.implicit_rowid {
            "rowid AS rowid, *"
        } else {
            "*"
        }
    }

    fn order_by(&self) -> String {
        self.key_columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Query provider reading SQLite tables.
pub struct SqliteProvider {
    db_path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
    tables: HashMap<String, String>,
}

impl SqliteProvider {
    /// Open a database file.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if !db_path.exists() {
            return Err(LookupError::Io {
                message: "Database file does not exist".to_string(),
                path: Some(db_path),
                source: None,
            });
        }

        let conn = Connection::open(&db_path)?;
        Self::configure_connection(&conn)?;

        Ok(Self {
            db_path: Some(db_path),
            conn: Arc::new(Mutex::new(conn)),
            tables: HashMap::new(),
        })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        Self::configure_connection(&conn)?;
        Ok(Self {
            db_path: None,
            conn: Arc::new(Mutex::new(conn)),
            tables: HashMap::new(),
        })
    }

    /// Map `source_id` to an explicit table name.
    pub fn with_table(mut self, source_id: impl Into<String>, table: impl Into<String>) -> Self {
        self.tables.insert(source_id.into(), table.into());
        self
    }

    /// Get the database path, if the provider was opened from a file.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run a closure against the underlying connection (fixtures, imports).
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA busy_timeout=30000;
            PRAGMA temp_store=MEMORY;
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LookupError::Database {
            message: "Failed to acquire connection lock".to_string(),
            source: None,
        })
    }

    /// Table name backing `source_id`.
    pub fn table_name(&self, source_id: &str) -> String {
        if let Some(table) = self.tables.get(source_id) {
            return table.clone();
        }
        source_id
            .rsplit('/')
            .next()
            .unwrap_or(source_id)
            .to_string()
    }

    fn table_info(&self, conn: &Connection, source_id: &str) -> Result<TableInfo> {
        let table = self.table_name(source_id);
        let sql = format!("PRAGMA table_info({})", quote_identifier(&table));
        let mut stmt = conn.prepare(&sql)?;

        let mut columns = Vec::new();
        let mut pk_columns: Vec<(i64, String)> = Vec::new();
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(1)?;
            let pk: i64 = row.get(5)?;
            Ok((pk, name))
        })?;
        for row in rows {
            let (pk, name) = row?;
            if pk > 0 {
                pk_columns.push((pk, name.clone()));
            }
            columns.push(name);
        }

        if columns.is_empty() {
            return Err(LookupError::UnknownSource(source_id.to_string()));
        }

        pk_columns.sort_by_key(|(pk, _)| *pk);
        let implicit_rowid = pk_columns.is_empty();
        let key_columns = if implicit_rowid {
            vec![ROWID.to_string()]
        } else {
            pk_columns.into_iter().map(|(_, name)| name).collect()
        };

        Ok(TableInfo {
            table,
            columns,
            key_columns,
            implicit_rowid,
        })
    }

    fn collect_entries(
        stmt: &mut Statement<'_>,
        params: &[&dyn rusqlite::ToSql],
        source_id: &str,
        info: &TableInfo,
    ) -> Result<Vec<Entry>> {
        let column_names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let rows = stmt.query_map(params, |row| {
            Self::row_to_entry(row, &column_names, source_id, info)
        })?;

        let mut entries = Vec::new();
        let mut skipped = 0;
        for row in rows {
            let entry = row?;
            // A NULL key component cannot be transported or matched by `=`
            if entry.key.iter().any(Value::is_null) {
                skipped += 1;
                continue;
            }
            entries.push(entry);
        }
        if skipped > 0 {
            warn!(
                "Skipped {} row(s) of {} with a NULL key component",
                skipped, info.table
            );
        }
        Ok(entries)
    }

    fn row_to_entry(
        row: &Row<'_>,
        column_names: &[String],
        source_id: &str,
        info: &TableInfo,
    ) -> rusqlite::Result<Entry> {
        let mut attributes = Map::new();
        for (i, name) in column_names.iter().enumerate() {
            attributes.insert(name.clone(), Self::json_value(row.get_ref(i)?));
        }
        let key = info
            .key_columns
            .iter()
            .map(|c| attributes.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        Ok(Entry::new(source_id, key, attributes))
    }

    fn json_value(value: ValueRef<'_>) -> Value {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Number(i.into()),
            ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            ValueRef::Text(t) | ValueRef::Blob(t) => {
                Value::String(String::from_utf8_lossy(t).into_owned())
            }
        }
    }
}

impl QueryProvider for SqliteProvider {
    fn key_columns(&self, source_id: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        Ok(self.table_info(&conn, source_id)?.key_columns)
    }

    fn load_all(&self, source_id: &str) -> Result<Vec<Entry>> {
        let conn = self.lock()?;
        let info = self.table_info(&conn, source_id)?;

        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            info.select_list(),
            quote_identifier(&info.table),
            info.order_by()
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = Self::collect_entries(&mut stmt, &[], source_id, &info)?;

        debug!("Loaded {} entries from {}", entries.len(), info.table);
        Ok(entries)
    }

    fn filter_contains(&self, source_id: &str, filter: &ContainsFilter) -> Result<Vec<Entry>> {
        if filter.targets.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let info = self.table_info(&conn, source_id)?;
        if let Some(target) = filter.targets.iter().find(|t| !info.has_column(&t.attribute)) {
            return Err(LookupError::config(format!(
                "Source '{}' searches attribute '{}', which is not a column of table '{}'",
                source_id, target.attribute, info.table
            )));
        }

        let where_clause = filter
            .targets
            .iter()
            .map(|t| {
                format!(
                    "CAST({} AS TEXT) LIKE ?1 ESCAPE '\\'",
                    quote_identifier(&t.attribute)
                )
            })
            .collect::<Vec<_>>()
            .join(" OR ");

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            info.select_list(),
            quote_identifier(&info.table),
            where_clause,
            info.order_by()
        );
        let pattern = escape_like_pattern(&filter.text);
        let mut stmt = conn.prepare(&sql)?;
        let entries = Self::collect_entries(&mut stmt, &[&pattern], source_id, &info)?;

        debug!(
            "Filter '{}' on {} ({}) matched {} entries",
            filter.text,
            info.table,
            filter.aliases().join(", "),
            entries.len()
        );
        Ok(entries)
    }

    fn get_by_key(&self, source_id: &str, key: &[String]) -> Result<Option<Entry>> {
        let conn = self.lock()?;
        let info = self.table_info(&conn, source_id)?;

        if key.len() != info.key_columns.len() {
            return Err(LookupError::ResolutionMismatch {
                source_id: source_id.to_string(),
                expected: info.key_columns.len(),
                actual: key.len(),
            });
        }

        let where_clause = info
            .key_columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if info.implicit_rowid {
                    format!("rowid = CAST(?{} AS INTEGER)", i + 1)
                } else {
                    format!("{} = ?{}", quote_identifier(c), i + 1)
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ");

        let sql = format!(
            "SELECT {} FROM {} WHERE {} LIMIT 1",
            info.select_list(),
            quote_identifier(&info.table),
            where_clause
        );
        let params: Vec<&dyn rusqlite::ToSql> =
            key.iter().map(|k| k as &dyn rusqlite::ToSql).collect();
        let mut stmt = conn.prepare(&sql)?;
        let mut entries = Self::collect_entries(&mut stmt, &params, source_id, &info)?;

        Ok(if entries.is_empty() {
            None
        } else {
            Some(entries.swap_remove(0))
        })
    }
}
