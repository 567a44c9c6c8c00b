//! Header classification and conversion helpers.
//!
//! Headers describing a message body (its type, length, encoding, ...) are
//! kept apart from message-level headers. On the request side the forwarder
//! owns them, since it rebuilds the body; on the response side they're
//! captured into the snapshot's content headers.

use crate::snapshot::{push_value, HeaderValues};
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Headers that describe the body rather than the message.
pub static CONTENT_HEADERS: [HeaderName; 11] = [
    header::ALLOW,
    header::CONTENT_DISPOSITION,
    header::CONTENT_ENCODING,
    header::CONTENT_LANGUAGE,
    header::CONTENT_LENGTH,
    header::CONTENT_LOCATION,
    HeaderName::from_static("content-md5"),
    header::CONTENT_RANGE,
    header::CONTENT_TYPE,
    header::EXPIRES,
    header::LAST_MODIFIED,
];

/// Content type of every forwarded request body.
pub static JSON_UTF8: HeaderValue = HeaderValue::from_static("application/json; charset=utf-8");

pub fn is_content_header(name: &HeaderName) -> bool {
    CONTENT_HEADERS.contains(name)
}

/// Split a header map into (message headers, content headers), grouping
/// values per name in arrival order.
pub fn split_headers(headers: &HeaderMap) -> (HeaderValues, HeaderValues) {
    let mut message = HeaderValues::new();
    let mut content = HeaderValues::new();

    for (name, value) in headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes());
        let target = if is_content_header(name) {
            &mut content
        } else {
            &mut message
        };
        push_value(target, name.as_str(), &value);
    }

    (message, content)
}

/// Replace every header named in `values` with the given values.
///
/// Returns the names that couldn't be converted (invalid name or value);
/// those are skipped.
pub fn apply_header_values(headers: &mut HeaderMap, values: &HeaderValues) -> Vec<String> {
    let mut skipped = Vec::new();

    for (name, list) in values {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            skipped.push(name.clone());
            continue;
        };

        let converted: Result<Vec<HeaderValue>, _> =
            list.iter().map(|v| HeaderValue::from_str(v)).collect();
        let Ok(converted) = converted else {
            skipped.push(name.clone());
            continue;
        };

        headers.remove(&header_name);
        for value in converted {
            headers.append(header_name.clone(), value);
        }
    }

    skipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_header_classification() {
        assert!(is_content_header(&header::CONTENT_TYPE));
        assert!(is_content_header(&header::CONTENT_LENGTH));
        assert!(is_content_header(&header::EXPIRES));
        assert!(is_content_header(&HeaderName::from_static("content-md5")));
        assert!(!is_content_header(&header::HOST));
        assert!(!is_content_header(&header::TRANSFER_ENCODING));
        assert!(!is_content_header(&header::SET_COOKIE));
    }

    #[test]
    fn test_split_headers_groups_multi_values() {
        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(header::SERVER, HeaderValue::from_static("nginx"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("5"));

        let (message, content) = split_headers(&headers);

        assert_eq!(message.get("set-cookie").unwrap(), &vec!["a=1", "b=2"]);
        assert_eq!(message.get("server").unwrap(), &vec!["nginx"]);
        assert!(!message.contains_key("content-type"));
        assert_eq!(content.get("content-type").unwrap(), &vec!["text/plain"]);
        assert_eq!(content.get("content-length").unwrap(), &vec!["5"]);
    }

    #[test]
    fn test_split_headers_non_utf8_value_is_lossy() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-raw"),
            HeaderValue::from_bytes(&[b'a', 0xe9]).unwrap(),
        );
        let (message, _) = split_headers(&headers);
        assert_eq!(message.get("x-raw").unwrap()[0], "a\u{fffd}");
    }

    #[test]
    fn test_apply_header_values_overwrites() {
        let mut headers = HeaderMap::new();
        headers.insert(header::SERVER, HeaderValue::from_static("old"));
        headers.insert(header::DATE, HeaderValue::from_static("kept"));

        let mut values = HeaderValues::new();
        values.insert("server".to_string(), vec!["new".to_string()]);
        values.insert(
            "set-cookie".to_string(),
            vec!["a=1".to_string(), "b=2".to_string()],
        );

        let skipped = apply_header_values(&mut headers, &values);

        assert!(skipped.is_empty());
        assert_eq!(headers.get_all(header::SERVER).iter().count(), 1);
        assert_eq!(headers.get(header::SERVER).unwrap(), "new");
        assert_eq!(headers.get(header::DATE).unwrap(), "kept");
        assert_eq!(headers.get_all(header::SET_COOKIE).iter().count(), 2);
    }

    #[test]
    fn test_apply_header_values_skips_invalid() {
        let mut headers = HeaderMap::new();
        let mut values = HeaderValues::new();
        values.insert("bad name".to_string(), vec!["x".to_string()]);
        values.insert("x-bad-value".to_string(), vec!["line\nbreak".to_string()]);
        values.insert("x-ok".to_string(), vec!["fine".to_string()]);

        let mut skipped = apply_header_values(&mut headers, &values);
        skipped.sort();

        assert_eq!(skipped, vec!["bad name", "x-bad-value"]);
        assert_eq!(headers.get("x-ok").unwrap(), "fine");
    }
}
