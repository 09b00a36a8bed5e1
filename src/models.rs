use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::LookupError;

// Untyped record exactly as the directory service sent it
pub type RawUserRecord = Map<String, Value>;

// Validated numeric identifier, kept as text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(LookupError::InvalidInput(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Canonical profile handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProfile {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
}

// Directory response body: a bare array or an object wrapping one
#[derive(Deserialize)]
#[serde(untagged)]
pub enum UserListEnvelope {
    Bare(Vec<RawUserRecord>),
    Users { users: Vec<RawUserRecord> },
    Data { data: Vec<RawUserRecord> },
}

impl UserListEnvelope {
    pub fn into_records(self) -> Vec<RawUserRecord> {
        match self {
            UserListEnvelope::Bare(records) => records,
            UserListEnvelope::Users { users } => users,
            UserListEnvelope::Data { data } => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifier_accepts_digits_only() {
        assert_eq!(Identifier::parse("2").unwrap().as_str(), "2");
        assert_eq!(Identifier::parse("0012").unwrap().as_str(), "0012");

        for bad in ["", "abc", "12a", "1,2", " 3", "-4", "5.0", "٣"] {
            assert_eq!(
                Identifier::parse(bad),
                Err(LookupError::InvalidInput(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn envelope_accepts_all_shapes() {
        let bare: UserListEnvelope = serde_json::from_value(json!([{ "fid": 1 }])).unwrap();
        assert_eq!(bare.into_records().len(), 1);

        let users: UserListEnvelope = serde_json::from_value(json!({ "users": [{ "fid": 1 }, { "fid": 2 }] })).unwrap();
        assert_eq!(users.into_records().len(), 2);

        let data: UserListEnvelope = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(data.into_records().is_empty());

        assert!(serde_json::from_value::<UserListEnvelope>(json!({ "result": [] })).is_err());
    }

    #[test]
    fn profile_serializes_camel_case_without_absent_fields() {
        let profile = NormalizedProfile {
            identifier: "2".into(),
            display_name: Some("Alice".into()),
            handle: None,
            avatar_url: None,
            bio: None,
            follower_count: Some(10),
        };
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({ "identifier": "2", "displayName": "Alice", "followerCount": 10 })
        );
    }
}
