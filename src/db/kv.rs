//! Single-item key-value store over SQLite.
//!
//! Items are JSON objects partitioned by logical table name and keyed by
//! their identifier. Every operation touches exactly one item (or one
//! read-only query), under the connection mutex. There are no
//! multi-item transactions.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::sqlite::{open_database, open_memory_database, MEMORY_PATH};
use super::DatabaseError;
use crate::config::{DatabaseConfig, TableNames};

/// Logical tables in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Patients,
    Consultations,
    Triage,
}

pub struct KvStore {
    conn: Mutex<Connection>,
    tables: TableNames,
}

impl KvStore {
    pub fn open(config: &DatabaseConfig, tables: TableNames) -> Result<Self, DatabaseError> {
        let conn = if config.path == MEMORY_PATH {
            open_memory_database()?
        } else {
            open_database(Path::new(&config.path))?
        };
        tracing::info!(path = %config.path, "Key-value store opened");
        Ok(Self::from_connection(conn, tables))
    }

    pub fn in_memory(tables: TableNames) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?, tables))
    }

    fn from_connection(conn: Connection, tables: TableNames) -> Self {
        Self {
            conn: Mutex::new(conn),
            tables,
        }
    }

    pub fn table_name(&self, table: Table) -> &str {
        match table {
            Table::Patients => &self.tables.patients,
            Table::Consultations => &self.tables.consultations,
            Table::Triage => &self.tables.triage,
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Cheap liveness check for readiness probes.
    pub fn ping(&self) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Insert or replace an item.
    pub fn put_item(&self, table: Table, key: &str, item: &Value) -> Result<(), DatabaseError> {
        let table_name = self.table_name(table);
        if !item.is_object() {
            return Err(DatabaseError::InvalidItem {
                table: table_name.to_string(),
                key: key.to_string(),
            });
        }
        let conn = self.conn()?;
        write_item(&conn, table_name, key, item)?;
        tracing::debug!(table = table_name, key, "Item stored");
        Ok(())
    }

    pub fn get_item(&self, table: Table, key: &str) -> Result<Option<Value>, DatabaseError> {
        let conn = self.conn()?;
        read_item(&conn, self.table_name(table), key)
    }

    /// Merge top-level fields into an existing item. Returns `false` when
    /// no item exists under `key`.
    pub fn update_item(
        &self,
        table: Table,
        key: &str,
        updates: &Map<String, Value>,
    ) -> Result<bool, DatabaseError> {
        let table_name = self.table_name(table);
        let conn = self.conn()?;
        let Some(mut item) = read_item(&conn, table_name, key)? else {
            return Ok(false);
        };
        let Some(fields) = item.as_object_mut() else {
            return Err(DatabaseError::InvalidItem {
                table: table_name.to_string(),
                key: key.to_string(),
            });
        };
        for (field, value) in updates {
            fields.insert(field.clone(), value.clone());
        }
        write_item(&conn, table_name, key, &item)?;
        tracing::debug!(table = table_name, key, fields = updates.len(), "Item updated");
        Ok(true)
    }

    /// All items of `table` whose `patient_id` field equals `patient_id`.
    pub fn query_by_patient(&self, table: Table, patient_id: &str) -> Result<Vec<Value>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT body FROM kv_items WHERE table_name = ?1 AND patient_id = ?2 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![self.table_name(table), patient_id], |row| {
            row.get::<_, String>(0)
        })?;
        collect_bodies(rows)
    }

    /// Items of `table` in insertion order, optionally capped.
    pub fn scan(&self, table: Table, limit: Option<usize>) -> Result<Vec<Value>, DatabaseError> {
        let conn = self.conn()?;
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let mut stmt =
            conn.prepare("SELECT body FROM kv_items WHERE table_name = ?1 ORDER BY rowid LIMIT ?2")?;
        let rows = stmt.query_map(params![self.table_name(table), limit], |row| {
            row.get::<_, String>(0)
        })?;
        collect_bodies(rows)
    }

    /// Typed `put_item`.
    pub fn put<T: Serialize>(&self, table: Table, key: &str, item: &T) -> Result<(), DatabaseError> {
        self.put_item(table, key, &serde_json::to_value(item)?)
    }

    /// Typed `get_item`.
    pub fn get<T: DeserializeOwned>(&self, table: Table, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.get_item(table, key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Drop the backing table so every later operation fails.
    #[cfg(test)]
    pub(crate) fn break_storage(&self) {
        self.conn()
            .unwrap()
            .execute_batch("DROP TABLE kv_items")
            .unwrap();
    }
}

fn write_item(conn: &Connection, table_name: &str, key: &str, item: &Value) -> Result<(), DatabaseError> {
    let patient_id = item.get("patient_id").and_then(Value::as_str);
    conn.execute(
        "INSERT INTO kv_items (table_name, item_key, patient_id, body, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (table_name, item_key) DO UPDATE SET
            patient_id = excluded.patient_id,
            body = excluded.body,
            updated_at = excluded.updated_at",
        params![
            table_name,
            key,
            patient_id,
            serde_json::to_string(item)?,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn read_item(conn: &Connection, table_name: &str, key: &str) -> Result<Option<Value>, DatabaseError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM kv_items WHERE table_name = ?1 AND item_key = ?2",
            params![table_name, key],
            |row| row.get(0),
        )
        .optional()?;
    match body {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}

fn collect_bodies(
    rows: impl Iterator<Item = rusqlite::Result<String>>,
) -> Result<Vec<Value>, DatabaseError> {
    let mut items = Vec::new();
    for row in rows {
        items.push(serde_json::from_str(&row?)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> KvStore {
        KvStore::in_memory(TableNames::default()).unwrap()
    }

    #[test]
    fn put_then_get_returns_item() {
        let store = store();
        let item = json!({"patient_id": "PAT-1", "name": "Ana"});
        store.put_item(Table::Patients, "PAT-1", &item).unwrap();
        assert_eq!(store.get_item(Table::Patients, "PAT-1").unwrap(), Some(item));
    }

    #[test]
    fn get_missing_returns_none() {
        assert!(store().get_item(Table::Patients, "nope").unwrap().is_none());
    }

    #[test]
    fn put_is_an_upsert() {
        let store = store();
        store.put_item(Table::Triage, "TRI-1", &json!({"v": 1})).unwrap();
        store.put_item(Table::Triage, "TRI-1", &json!({"v": 2})).unwrap();
        assert_eq!(store.scan(Table::Triage, None).unwrap(), vec![json!({"v": 2})]);
    }

    #[test]
    fn tables_are_partitioned() {
        let store = store();
        store.put_item(Table::Patients, "X", &json!({"t": "patients"})).unwrap();
        store.put_item(Table::Consultations, "X", &json!({"t": "consultations"})).unwrap();
        assert_eq!(
            store.get_item(Table::Patients, "X").unwrap().unwrap()["t"],
            "patients"
        );
        assert_eq!(store.scan(Table::Triage, None).unwrap().len(), 0);
    }

    #[test]
    fn non_object_items_rejected() {
        let err = store().put_item(Table::Patients, "k", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidItem { .. }));
    }

    #[test]
    fn update_merges_fields() {
        let store = store();
        store
            .put_item(Table::Patients, "PAT-1", &json!({"a": 1, "b": 2}))
            .unwrap();
        let mut updates = Map::new();
        updates.insert("b".into(), json!(3));
        updates.insert("c".into(), json!("new"));
        assert!(store.update_item(Table::Patients, "PAT-1", &updates).unwrap());
        assert_eq!(
            store.get_item(Table::Patients, "PAT-1").unwrap().unwrap(),
            json!({"a": 1, "b": 3, "c": "new"})
        );
    }

    #[test]
    fn update_missing_item_returns_false() {
        let updated = store()
            .update_item(Table::Patients, "ghost", &Map::new())
            .unwrap();
        assert!(!updated);
    }

    #[test]
    fn query_by_patient_uses_secondary_key() {
        let store = store();
        store.put_item(Table::Consultations, "C1", &json!({"patient_id": "P1"})).unwrap();
        store.put_item(Table::Consultations, "C2", &json!({"patient_id": "P2"})).unwrap();
        store.put_item(Table::Consultations, "C3", &json!({"patient_id": "P1"})).unwrap();
        let items = store.query_by_patient(Table::Consultations, "P1").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn scan_honours_limit() {
        let store = store();
        for i in 0..5 {
            store
                .put_item(Table::Patients, &format!("P{i}"), &json!({"i": i}))
                .unwrap();
        }
        assert_eq!(store.scan(Table::Patients, Some(3)).unwrap().len(), 3);
        assert_eq!(store.scan(Table::Patients, None).unwrap().len(), 5);
    }

    #[test]
    fn ping_succeeds_on_open_store() {
        assert!(store().ping().is_ok());
    }

    #[test]
    fn writes_fail_once_storage_is_gone() {
        let store = store();
        store.break_storage();
        let err = store
            .put_item(Table::Triage, "TRI-1", &json!({"v": 1}))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
        assert!(store.ping().is_ok());
    }

    #[test]
    fn open_with_memory_path() {
        let config = DatabaseConfig {
            path: MEMORY_PATH.into(),
        };
        let store = KvStore::open(&config, TableNames::default()).unwrap();
        assert!(store.ping().is_ok());
    }
}
