//! Classifies upstream response bodies as valid or invalid.

/// Marker the upstream embeds in payloads it considers invalid.
pub const INVALID_MARKER: &str = r#"Valido":false"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid,
}

/// Predicate over a decoded response body.
pub trait ResponseValidator: Send + Sync {
    fn classify(&self, body: &str) -> Validity;
}

/// Textual check for the upstream's `Valido` flag.
///
/// Invalid if and only if the body contains `Valido":false` verbatim.
/// Whitespace variants such as `"Valido": false` are deliberately not matched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidoFlagValidator;

impl ResponseValidator for ValidoFlagValidator {
    fn classify(&self, body: &str) -> Validity {
        if body.contains(INVALID_MARKER) {
            Validity::Invalid
        } else {
            Validity::Valid
        }
    }
}

impl<F> ResponseValidator for F
where
    F: Fn(&str) -> Validity + Send + Sync,
{
    fn classify(&self, body: &str) -> Validity {
        self(body)
    }
}
