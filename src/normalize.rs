//! Maps loosely-shaped directory records onto [`NormalizedProfile`].
//!
//! The directory is inconsistent about field naming, so every target field has an
//! ordered list of key paths. The first path that resolves to a usable value wins.

use serde_json::Value;

use crate::models::{NormalizedProfile, RawUserRecord};

type KeyPath = &'static [&'static str];

const IDENTIFIER_KEYS: &[KeyPath] = &[&["fid"], &["id"], &["userId"], &["user_id"], &["identifier"]];
const DISPLAY_NAME_KEYS: &[KeyPath] = &[&["displayName"], &["display_name"], &["name"]];
const HANDLE_KEYS: &[KeyPath] = &[&["username"], &["handle"], &["userName"], &["user_name"], &["fname"]];
const AVATAR_KEYS: &[KeyPath] = &[
    &["avatarUrl"],
    &["avatar_url"],
    &["pfp_url"],
    &["pfpUrl"],
    &["pfp", "url"],
    &["profile", "avatar_url"],
];
const BIO_KEYS: &[KeyPath] = &[&["bio"], &["about"], &["description"], &["profile", "bio", "text"], &["profile", "bio"]];
const FOLLOWER_KEYS: &[KeyPath] = &[&["followerCount"], &["follower_count"], &["followers_count"], &["followers"]];

/// Normalizes a record. `identifier` is empty when the record carries none.
pub fn normalize(raw: &RawUserRecord) -> NormalizedProfile {
    NormalizedProfile {
        identifier: extract_identifier(raw).unwrap_or_default(),
        display_name: first_of(raw, DISPLAY_NAME_KEYS, as_text),
        handle: first_of(raw, HANDLE_KEYS, as_text),
        avatar_url: first_of(raw, AVATAR_KEYS, as_text),
        bio: first_of(raw, BIO_KEYS, as_text),
        follower_count: first_of(raw, FOLLOWER_KEYS, as_count),
    }
}

/// Like [`normalize`], but fills a missing identifier from `fallback`.
pub fn normalize_with_fallback(raw: &RawUserRecord, fallback: &str) -> NormalizedProfile {
    let mut profile = normalize(raw);
    if profile.identifier.is_empty() {
        profile.identifier = fallback.to_string();
    }
    profile
}

/// The record's own identifier, as a digit string.
pub fn extract_identifier(raw: &RawUserRecord) -> Option<String> {
    first_of(raw, IDENTIFIER_KEYS, as_identifier)
}

fn first_of<T>(raw: &RawUserRecord, paths: &[KeyPath], accessor: fn(&Value) -> Option<T>) -> Option<T> {
    paths.iter().find_map(|path| lookup_path(raw, path).and_then(accessor))
}

fn lookup_path<'a>(raw: &'a RawUserRecord, path: &[&str]) -> Option<&'a Value> {
    let (head, rest) = path.split_first()?;
    rest.iter().try_fold(raw.get(*head)?, |value, key| value.get(key))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn as_identifier(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n.to_string()),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => Some(s.clone()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
