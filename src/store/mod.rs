//! Record Store access: the hosted relational data service reached through
//! a generic select / insert API.
//!
//! `RecordStore` is the seam. `RestRecordStore` talks to the hosted REST
//! surface; `InMemoryRecordStore` backs tests and local wiring.

pub mod memory;
pub mod query;
pub mod rest;

pub use memory::*;
pub use query::*;
pub use rest::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Record store is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The store refused the request. `message` is the store's own text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Row decode error on {table}: {reason}")]
    Decode { table: String, reason: String },
}

/// Generic table-oriented store. `bearer` is the signed-in user's access
/// token; implementations fall back to the public key when it is `None`.
pub trait RecordStore: Send + Sync {
    fn select(&self, query: &Query, bearer: Option<&str>) -> Result<Vec<Value>, StoreError>;

    fn insert(
        &self,
        table: Table,
        rows: Vec<Value>,
        bearer: Option<&str>,
    ) -> Result<Vec<Value>, StoreError>;
}

/// Run a select and decode every row into `T`.
pub fn select_as<T: DeserializeOwned>(
    store: &dyn RecordStore,
    query: &Query,
    bearer: Option<&str>,
) -> Result<Vec<T>, StoreError> {
    tracing::debug!(table = %query.table, select = %query.select_clause(), "select");
    store
        .select(query, bearer)?
        .into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| StoreError::Decode {
                table: query.table.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Insert a single row and return the stored representation.
pub fn insert_one<T: Serialize>(
    store: &dyn RecordStore,
    table: Table,
    row: &T,
    bearer: Option<&str>,
) -> Result<Value, StoreError> {
    let value = serde_json::to_value(row).map_err(|e| StoreError::Decode {
        table: table.to_string(),
        reason: e.to_string(),
    })?;
    let mut inserted = store.insert(table, vec![value], bearer)?;
    if inserted.is_empty() {
        // Stores configured without return=representation answer with no body.
        return Ok(Value::Null);
    }
    Ok(inserted.swap_remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Doctor;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn rejected_error_displays_store_message_verbatim() {
        let err = StoreError::Rejected {
            status: 409,
            message: "duplicate key value violates unique constraint".into(),
        };
        assert_eq!(err.to_string(), "duplicate key value violates unique constraint");
    }

    #[test]
    fn select_as_decodes_rows() {
        let store = InMemoryRecordStore::new();
        store.seed(
            Table::Doctors,
            vec![json!({
                "id": Uuid::new_v4(),
                "name": "Sarah Smith",
                "specialization": "Cardiology",
                "is_active": true
            })],
        );
        let doctors: Vec<Doctor> =
            select_as(&store, &Query::select(Table::Doctors), None).unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].name, "Sarah Smith");
    }

    #[test]
    fn select_as_reports_decode_failures() {
        let store = InMemoryRecordStore::new();
        store.seed(Table::Doctors, vec![json!({ "id": "not-a-uuid", "name": "X" })]);
        let result: Result<Vec<Doctor>, _> =
            select_as(&store, &Query::select(Table::Doctors), None);
        match result.unwrap_err() {
            StoreError::Decode { table, .. } => assert_eq!(table, "doctors"),
            other => panic!("Expected Decode, got: {other}"),
        }
    }

    #[test]
    fn insert_one_returns_stored_row() {
        let store = InMemoryRecordStore::new();
        let row = insert_one(&store, Table::Doctors, &json!({ "name": "A" }), None).unwrap();
        assert_eq!(row["name"], "A");
        assert!(row["id"].is_string());
        assert_eq!(store.insert_count(Table::Doctors), 1);
    }
}
