//! Captured, replayable HTTP responses.
//!
//! A [`Snapshot`] is produced once per upstream call or cache read and is
//! consumed once by the response writer. The body is an immutable byte
//! sequence; readers get their own cursor via [`Snapshot::body_reader`], so
//! there is no shared position to reset.

use bytes::Bytes;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Cursor;

/// Header name → ordered list of values. Multi-value headers keep arrival order.
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// Status, headers and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub status: u16,
    /// Transfer/message-level headers.
    pub headers: HeaderValues,
    /// Headers describing the body itself (length, type, encoding, ...).
    pub content_headers: HeaderValues,
    body: Bytes,
}

impl Snapshot {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderValues::new(),
            content_headers: HeaderValues::new(),
            body: Bytes::new(),
        }
    }

    /// The safe response sent to a client when anything in the proxy chain fails:
    /// status 500, no headers, empty body.
    pub fn internal_error() -> Self {
        Self::new(500)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        push_value(&mut self.headers, name, value);
        self
    }

    pub fn with_content_header(mut self, name: &str, value: &str) -> Self {
        push_value(&mut self.content_headers, name, value);
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// A fresh cursor positioned at the start of the body.
    pub fn body_reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.body.clone())
    }

    /// The full body decoded as UTF-8 (invalid sequences replaced).
    /// Reading never consumes anything, so repeated calls return the same text.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// Append a value under `name`, creating the entry if needed.
pub(crate) fn push_value(map: &mut HeaderValues, name: &str, value: &str) {
    map.entry(name.to_ascii_lowercase())
        .or_default()
        .push(value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_body_text_is_idempotent() {
        let snapshot = Snapshot::new(200).with_body(r#"{"Valido":true}"#);
        let first = snapshot.body_text().into_owned();
        let second = snapshot.body_text().into_owned();
        assert_eq!(first, r#"{"Valido":true}"#);
        assert_eq!(first, second);
    }

    #[test]
    fn test_body_reader_starts_at_beginning_each_time() {
        let snapshot = Snapshot::new(200).with_body("hello world");

        let mut first = String::new();
        snapshot.body_reader().read_to_string(&mut first).unwrap();

        let mut reader = snapshot.body_reader();
        let mut partial = [0u8; 5];
        reader.read_exact(&mut partial).unwrap();
        assert_eq!(&partial, b"hello");

        // A partially consumed reader doesn't affect the snapshot
        assert_eq!(snapshot.body_text(), "hello world");
        assert_eq!(first, "hello world");
    }

    #[test]
    fn test_body_text_lossy_on_invalid_utf8() {
        let snapshot = Snapshot::new(200).with_body(vec![b'o', b'k', 0xff]);
        assert_eq!(snapshot.body_text(), "ok\u{fffd}");
        assert_eq!(snapshot.body().as_ref(), &[b'o', b'k', 0xff]);
    }

    #[test]
    fn test_multi_value_headers_keep_order() {
        let snapshot = Snapshot::new(200)
            .with_header("Set-Cookie", "a=1")
            .with_header("set-cookie", "b=2")
            .with_content_header("Content-Type", "application/json");

        assert_eq!(
            snapshot.headers.get("set-cookie").unwrap(),
            &vec!["a=1".to_string(), "b=2".to_string()]
        );
        assert_eq!(
            snapshot.content_headers.get("content-type").unwrap(),
            &vec!["application/json".to_string()]
        );
    }

    #[test]
    fn test_internal_error_is_empty_500() {
        let snapshot = Snapshot::internal_error();
        assert_eq!(snapshot.status, 500);
        assert!(snapshot.headers.is_empty());
        assert!(snapshot.content_headers.is_empty());
        assert!(snapshot.body().is_empty());
        assert!(!snapshot.is_ok());
    }
}
