//! Persisted record format for cached snapshots.
//!
//! One JSON document per key. Field names are fixed so that records written
//! by earlier deployments stay readable:
//!
//! ```json
//! {
//!   "StatusCode": 200,
//!   "ResponseHeaders": { "date": ["Mon, 19 Oct 2026 10:00:00 GMT"] },
//!   "ResponseContentHeaders": { "content-type": ["application/json"] },
//!   "DadosBody": "{\"Valido\":true}"
//! }
//! ```
//!
//! Bodies that aren't valid UTF-8 are stored base64-encoded and flagged with
//! `"BodyEncoding": "base64"`; plain-text bodies omit the field.

use crate::snapshot::{HeaderValues, Snapshot};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

const BASE64_ENCODING: &str = "base64";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(rename = "StatusCode")]
    pub status_code: u16,
    #[serde(rename = "ResponseHeaders", default)]
    pub response_headers: HeaderValues,
    #[serde(rename = "ResponseContentHeaders", default)]
    pub response_content_headers: HeaderValues,
    #[serde(rename = "DadosBody", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(
        rename = "BodyEncoding",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub body_encoding: Option<String>,
}

impl CacheRecord {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let (body, body_encoding) = match std::str::from_utf8(snapshot.body()) {
            Ok(text) => (text.to_string(), None),
            Err(_) => (
                STANDARD.encode(snapshot.body()),
                Some(BASE64_ENCODING.to_string()),
            ),
        };

        Self {
            status_code: snapshot.status,
            response_headers: snapshot.headers.clone(),
            response_content_headers: snapshot.content_headers.clone(),
            body: Some(body),
            body_encoding,
        }
    }

    /// Rebuild the snapshot. Fails on values no response could carry.
    pub fn into_snapshot(self) -> Result<Snapshot, String> {
        if !(100..=999).contains(&self.status_code) {
            return Err(format!("invalid status code {}", self.status_code));
        }

        let body = match (self.body, self.body_encoding.as_deref()) {
            (None, _) => Vec::new(),
            (Some(text), None) => text.into_bytes(),
            (Some(encoded), Some(BASE64_ENCODING)) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| format!("invalid base64 body: {e}"))?,
            (Some(_), Some(other)) => return Err(format!("unknown body encoding '{other}'")),
        };

        let mut snapshot = Snapshot::new(self.status_code).with_body(body);
        snapshot.headers = self.response_headers;
        snapshot.content_headers = self.response_content_headers;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
