//! Canonical policy documents.
//!
//! The policy document is the exact byte sequence the signature covers.
//! Its shape is fixed for compatibility with tokens issued by the legacy
//! scheme, so serialization must stay whitespace-free and field order must
//! never change.

use serde::{Deserialize, Serialize};

/// The signed policy: one statement binding a resource URL to an expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Statement")]
    statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PolicyStatement {
    #[serde(rename = "Resource")]
    resource: String,
    #[serde(rename = "Condition")]
    condition: PolicyCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PolicyCondition {
    #[serde(rename = "DateLessThan")]
    date_less_than: DateLessThan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DateLessThan {
    #[serde(rename = "AWS:EpochTime")]
    epoch_time: i64,
}

impl PolicyDocument {
    pub fn new(resource: &str, expires_at: i64) -> Self {
        Self {
            statement: vec![PolicyStatement {
                resource: resource.to_string(),
                condition: PolicyCondition {
                    date_less_than: DateLessThan {
                        epoch_time: expires_at,
                    },
                },
            }],
        }
    }

    /// Resource URL of the first statement. `None` for a decoded document
    /// with no statements (treated as malformed by the verifier).
    pub fn resource(&self) -> Option<&str> {
        self.statement.first().map(|s| s.resource.as_str())
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.statement
            .first()
            .map(|s| s.condition.date_less_than.epoch_time)
    }

    /// Whitespace-free serialization. These are the bytes that get signed.
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_shape_is_byte_exact() {
        let doc = PolicyDocument::new("https://cdn.example.com/assets/logo.png", 1_700_000_000);
        assert_eq!(
            doc.canonical_json().unwrap(),
            r#"{"Statement":[{"Resource":"https://cdn.example.com/assets/logo.png","Condition":{"DateLessThan":{"AWS:EpochTime":1700000000}}}]}"#
        );
    }

    #[test]
    fn test_round_trip() {
        let doc = PolicyDocument::new("https://cdn.example.com/x", 42);
        let json = doc.canonical_json().unwrap();
        let decoded = PolicyDocument::from_json(json.as_bytes()).unwrap();
        assert_eq!(decoded, doc);
        assert_eq!(decoded.resource(), Some("https://cdn.example.com/x"));
        assert_eq!(decoded.expires_at(), Some(42));
    }

    #[test]
    fn test_empty_statement_list_yields_no_fields() {
        let decoded = PolicyDocument::from_json(br#"{"Statement":[]}"#).unwrap();
        assert_eq!(decoded.resource(), None);
        assert_eq!(decoded.expires_at(), None);
    }
}
