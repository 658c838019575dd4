use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Query, RecordStore, StoreError, Table};

/// In-process `RecordStore` with the same select semantics the hosted
/// store exposes to this client: equality filters, one order clause,
/// foreign-key expansion over `doctor_id` / `patient_id`.
///
/// Failures can be injected per table and operation, and every call is
/// counted so callers can assert that nothing was sent.
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    select_failures: Mutex<HashMap<Table, StoreError>>,
    insert_failures: Mutex<HashMap<Table, StoreError>>,
    selects: Mutex<HashMap<Table, usize>>,
    inserts: Mutex<HashMap<Table, usize>>,
    last_bearer: Mutex<Option<String>>,
    defaults: Mutex<HashMap<Table, Map<String, Value>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to a table as-is.
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        lock(&self.tables).entry(table).or_default().extend(rows);
    }

    /// Value filled into `column` when an inserted row omits it, like a
    /// column default in the hosted schema.
    pub fn with_column_default(self, table: Table, column: &str, value: Value) -> Self {
        lock(&self.defaults)
            .entry(table)
            .or_default()
            .insert(column.to_string(), value);
        self
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        lock(&self.tables).get(&table).cloned().unwrap_or_default()
    }

    pub fn fail_selects(&self, table: Table, error: StoreError) {
        lock(&self.select_failures).insert(table, error);
    }

    pub fn fail_inserts(&self, table: Table, error: StoreError) {
        lock(&self.insert_failures).insert(table, error);
    }

    pub fn clear_failures(&self) {
        lock(&self.select_failures).clear();
        lock(&self.insert_failures).clear();
    }

    pub fn select_count(&self, table: Table) -> usize {
        lock(&self.selects).get(&table).copied().unwrap_or(0)
    }

    pub fn insert_count(&self, table: Table) -> usize {
        lock(&self.inserts).get(&table).copied().unwrap_or(0)
    }

    /// Bearer token seen on the most recent call.
    pub fn last_bearer(&self) -> Option<String> {
        lock(&self.last_bearer).clone()
    }

    fn record_call(&self, counter: &Mutex<HashMap<Table, usize>>, table: Table, bearer: Option<&str>) {
        *lock(counter).entry(table).or_insert(0) += 1;
        *lock(&self.last_bearer) = bearer.map(str::to_string);
    }

    fn expand(&self, row: &Value, query: &Query, tables: &HashMap<Table, Vec<Value>>) -> Value {
        let Some(source) = row.as_object() else {
            return row.clone();
        };

        let mut out: Map<String, Value> = if query.columns.is_empty() {
            source.clone()
        } else {
            query
                .columns
                .iter()
                .filter_map(|c| source.get(c).map(|v| (c.clone(), v.clone())))
                .collect()
        };

        for embed in &query.embeds {
            let related = embed
                .relation
                .foreign_key()
                .and_then(|fk| source.get(fk))
                .and_then(|key| {
                    tables
                        .get(&embed.relation)?
                        .iter()
                        .find(|candidate| candidate.get("id") == Some(key))
                })
                .map(|found| project(found, &embed.columns))
                .unwrap_or(Value::Null);
            out.insert(embed.relation.as_str().to_string(), related);
        }

        Value::Object(out)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn select(&self, query: &Query, bearer: Option<&str>) -> Result<Vec<Value>, StoreError> {
        self.record_call(&self.selects, query.table, bearer);
        if let Some(err) = lock(&self.select_failures).get(&query.table) {
            return Err(err.clone());
        }

        let tables = lock(&self.tables);
        let mut rows: Vec<&Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query.filters.iter().all(|f| {
                            row.get(&f.column).map(param_text).as_deref()
                                == Some(f.value.to_param().as_str())
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| self.expand(row, query, &tables))
            .collect())
    }

    fn insert(
        &self,
        table: Table,
        rows: Vec<Value>,
        bearer: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        self.record_call(&self.inserts, table, bearer);
        if let Some(err) = lock(&self.insert_failures).get(&table) {
            return Err(err.clone());
        }

        let defaults = lock(&self.defaults).get(&table).cloned().unwrap_or_default();
        let stored: Vec<Value> = rows
            .into_iter()
            .map(|mut row| {
                if let Some(obj) = row.as_object_mut() {
                    obj.entry("id")
                        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
                    for (column, value) in &defaults {
                        obj.entry(column.as_str()).or_insert_with(|| value.clone());
                    }
                }
                row
            })
            .collect();

        lock(&self.tables)
            .entry(table)
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    match row.as_object() {
        Some(obj) => Value::Object(
            columns
                .iter()
                .filter_map(|c| obj.get(c).map(|v| (c.clone(), v.clone())))
                .collect(),
        ),
        None => Value::Null,
    }
}

/// Text form of a JSON scalar, comparable with `FilterValue::to_param`.
fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Timestamps compare as instants, numbers numerically, everything else as
/// text. Nulls sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::<FixedOffset>::parse_from_rfc3339(x),
                DateTime::<FixedOffset>::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doctor(id: Uuid, name: &str, active: bool) -> Value {
        json!({ "id": id, "name": name, "specialization": "Cardiology", "is_active": active })
    }

    #[test]
    fn bool_filter_matches() {
        let store = InMemoryRecordStore::new();
        store.seed(
            Table::Doctors,
            vec![
                doctor(Uuid::new_v4(), "A", true),
                doctor(Uuid::new_v4(), "B", false),
            ],
        );
        let rows = store
            .select(&Query::select(Table::Doctors).eq("is_active", true), None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "A");
        assert_eq!(store.select_count(Table::Doctors), 1);
    }

    #[test]
    fn column_default_fills_only_missing_values() {
        let store = InMemoryRecordStore::new().with_column_default(
            Table::Doctors,
            "is_active",
            json!(true),
        );
        store
            .insert(
                Table::Doctors,
                vec![json!({ "name": "A" }), json!({ "name": "B", "is_active": false })],
                None,
            )
            .unwrap();
        let rows = store.rows(Table::Doctors);
        assert_eq!(rows[0]["is_active"], json!(true));
        assert_eq!(rows[1]["is_active"], json!(false));
    }

    #[test]
    fn order_compares_timestamps_across_offsets() {
        let store = InMemoryRecordStore::new();
        store.seed(
            Table::Surgeries,
            vec![
                json!({ "id": "a", "surgery_date": "2026-01-01T10:00:00+02:00" }),
                json!({ "id": "b", "surgery_date": "2026-01-01T09:00:00Z" }),
                json!({ "id": "c", "surgery_date": null }),
            ],
        );
        let rows = store
            .select(&Query::select(Table::Surgeries).order_asc("surgery_date"), None)
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        // 10:00+02:00 is 08:00Z.
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn embed_projects_related_columns() {
        let store = InMemoryRecordStore::new();
        let doc_id = Uuid::new_v4();
        store.seed(Table::Doctors, vec![doctor(doc_id, "Sarah Smith", true)]);
        store.seed(
            Table::Appointments,
            vec![
                json!({ "id": "x", "doctor_id": doc_id }),
                json!({ "id": "y", "doctor_id": Uuid::new_v4() }),
            ],
        );
        let rows = store
            .select(
                &Query::select(Table::Appointments).embed(Table::Doctors, &["name"]),
                None,
            )
            .unwrap();
        assert_eq!(rows[0]["doctors"], json!({ "name": "Sarah Smith" }));
        assert!(rows[1]["doctors"].is_null());
    }

    #[test]
    fn column_projection_still_embeds_through_hidden_fk() {
        let store = InMemoryRecordStore::new();
        let doc_id = Uuid::new_v4();
        store.seed(Table::Doctors, vec![doctor(doc_id, "Sarah Smith", true)]);
        store.seed(
            Table::Surgeries,
            vec![json!({ "id": "s1", "doctor_id": doc_id, "patient_id": "p1", "pre_op_events": "n" })],
        );
        let rows = store
            .select(
                &Query::select(Table::Surgeries)
                    .columns(&["id"])
                    .embed(Table::Doctors, &["name"]),
                None,
            )
            .unwrap();
        assert_eq!(rows[0], json!({ "id": "s1", "doctors": { "name": "Sarah Smith" } }));
    }

    #[test]
    fn insert_assigns_id_and_counts() {
        let store = InMemoryRecordStore::new();
        let out = store
            .insert(Table::Appointments, vec![json!({ "reason": "r" })], Some("tok"))
            .unwrap();
        assert!(out[0]["id"].is_string());
        assert_eq!(store.rows(Table::Appointments).len(), 1);
        assert_eq!(store.insert_count(Table::Appointments), 1);
        assert_eq!(store.last_bearer().as_deref(), Some("tok"));
    }

    #[test]
    fn injected_failures_are_returned_and_counted() {
        let store = InMemoryRecordStore::new();
        store.fail_inserts(
            Table::Surgeries,
            StoreError::Rejected { status: 403, message: "denied".into() },
        );
        let err = store.insert(Table::Surgeries, vec![json!({})], None).unwrap_err();
        assert_eq!(err.to_string(), "denied");
        assert_eq!(store.insert_count(Table::Surgeries), 1);
        assert!(store.rows(Table::Surgeries).is_empty());

        store.clear_failures();
        assert!(store.insert(Table::Surgeries, vec![json!({})], None).is_ok());
    }
}
