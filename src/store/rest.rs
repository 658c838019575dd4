use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use super::{Query, RecordStore, StoreError, Table};
use crate::config::ClientConfig;

/// HTTP client for the hosted REST data surface (`/rest/v1/{table}`).
pub struct RestRecordStore {
    base_url: String,
    anon_key: String,
    client: reqwest::blocking::Client,
}

/// Error body returned by the REST surface.
#[derive(Debug, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl RestRecordStore {
    pub fn new(config: &ClientConfig) -> Result<Self, StoreError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.http_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            client,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn headers(&self, bearer: Option<&str>) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        let token = bearer.unwrap_or(&self.anon_key);
        headers.insert("apikey", header_value(&self.anon_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        Ok(headers)
    }

    fn map_send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_connect() {
            StoreError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::HttpClient(e.to_string())
        }
    }

    fn read_rows(response: reqwest::blocking::Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(rejection(status.as_u16(), &body));
        }

        let body = response
            .text()
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&body)
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?
        {
            Value::Array(rows) => Ok(rows),
            single @ Value::Object(_) => Ok(vec![single]),
            other => Err(StoreError::ResponseParsing(format!(
                "expected rows, got {other}"
            ))),
        }
    }
}

impl RecordStore for RestRecordStore {
    fn select(&self, query: &Query, bearer: Option<&str>) -> Result<Vec<Value>, StoreError> {
        let response = self
            .client
            .get(self.table_url(query.table))
            .headers(self.headers(bearer)?)
            .query(&query.to_params())
            .send()
            .map_err(|e| self.map_send_error(e))?;

        Self::read_rows(response)
    }

    fn insert(
        &self,
        table: Table,
        rows: Vec<Value>,
        bearer: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut headers = self.headers(bearer)?;
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(self.table_url(table))
            .headers(headers)
            .json(&rows)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        Self::read_rows(response)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, StoreError> {
    HeaderValue::from_str(raw).map_err(|e| StoreError::HttpClient(e.to_string()))
}

/// Turn an error response into `Rejected`, keeping the store's own message.
fn rejection(status: u16, body: &str) -> StoreError {
    let message = serde_json::from_str::<RestErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.details).or(b.hint))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Request failed with status {status}")
            } else {
                body.trim().to_string()
            }
        });
    StoreError::Rejected { status, message }
}
