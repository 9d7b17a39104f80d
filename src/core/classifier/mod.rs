//! # Classifier Module
//!
//! Decides whether a single key is "big" and computes its member count.
//!
//! Both decisions are pure functions of their inputs: the threshold verdict
//! never touches the store, and the cardinality lookup makes at most one
//! probe call, chosen by the key's value type.
//!
//! ## Example
//! ```rust
//! use redis_bigkeys::core::classifier::{self, KeyType, MemberCount};
//!
//! assert!(classifier::is_big(20_000, 10_240));
//! let count: Result<_, ()> = classifier::member_count(KeyType::String, |_| unreachable!());
//! assert_eq!(count.unwrap(), MemberCount::Count(1));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value type of a Redis key, as reported by the TYPE command.
///
/// Closed set: anything the tool does not recognise (streams, module
/// types, future additions) lands in `Other` and is still reported,
/// just without a member count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    String,
    List,
    Hash,
    Set,
    #[serde(rename = "zset")]
    SortedSet,
    Other,
}

impl KeyType {
    /// Map a TYPE reply to a tag. Unrecognised replies degrade to `Other`
    /// rather than failing, so new server-side types never break a scan.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "string" => KeyType::String,
            "list" => KeyType::List,
            "hash" => KeyType::Hash,
            "set" => KeyType::Set,
            "zset" => KeyType::SortedSet,
            _ => KeyType::Other,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Hash => "hash",
            KeyType::Set => "set",
            KeyType::SortedSet => "zset",
            KeyType::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Member count of a key, or "N/A" for types where cardinality is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberCount {
    Count(u64),
    /// Serialized as JSON `null`
    NotApplicable,
}

impl fmt::Display for MemberCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberCount::Count(n) => write!(f, "{}", n),
            MemberCount::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Which cardinality query a composite type needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityKind {
    /// HLEN
    HashFields,
    /// LLEN
    ListEntries,
    /// SCARD
    SetMembers,
    /// ZCARD
    SortedSetMembers,
}

/// A key is big iff its footprint strictly exceeds the threshold.
///
/// A key sitting exactly at the threshold is not reported.
pub fn is_big(size_bytes: u64, threshold_bytes: u64) -> bool {
    size_bytes > threshold_bytes
}

/// Compute the member count for a key of the given type.
///
/// Dispatches to at most one `probe` call: strings are always 1 member
/// with no probe, and unknown types are `NotApplicable` with no probe.
/// A probe failure propagates so the caller can treat it as a per-key
/// skip; the classifier itself never fails.
pub fn member_count<E>(
    key_type: KeyType,
    probe: impl FnOnce(CardinalityKind) -> std::result::Result<u64, E>,
) -> std::result::Result<MemberCount, E> {
    match key_type {
        KeyType::String => Ok(MemberCount::Count(1)),
        KeyType::Hash => probe(CardinalityKind::HashFields).map(MemberCount::Count),
        KeyType::List => probe(CardinalityKind::ListEntries).map(MemberCount::Count),
        KeyType::Set => probe(CardinalityKind::SetMembers).map(MemberCount::Count),
        KeyType::SortedSet => probe(CardinalityKind::SortedSetMembers).map(MemberCount::Count),
        KeyType::Other => Ok(MemberCount::NotApplicable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        assert!(!is_big(10_240, 10_240));
        assert!(is_big(10_241, 10_240));
        assert!(!is_big(0, 10_240));
        assert!(is_big(1, 0));
    }

    #[test]
    fn string_is_always_one_member_without_probing() {
        let count: Result<_, ()> = member_count(KeyType::String, |_| {
            panic!("string must not probe the store")
        });
        assert_eq!(count.unwrap(), MemberCount::Count(1));
    }

    #[test]
    fn unknown_type_is_not_applicable_without_probing() {
        let count: Result<_, ()> = member_count(KeyType::Other, |_| {
            panic!("unknown types must not probe the store")
        });
        assert_eq!(count.unwrap(), MemberCount::NotApplicable);
    }

    #[test]
    fn composite_types_dispatch_the_right_probe() {
        let cases = [
            (KeyType::Hash, CardinalityKind::HashFields),
            (KeyType::List, CardinalityKind::ListEntries),
            (KeyType::Set, CardinalityKind::SetMembers),
            (KeyType::SortedSet, CardinalityKind::SortedSetMembers),
        ];
        for (key_type, expected_kind) in cases {
            let count: Result<_, ()> = member_count(key_type, |kind| {
                assert_eq!(kind, expected_kind);
                Ok(7)
            });
            assert_eq!(count.unwrap(), MemberCount::Count(7));
        }
    }

    #[test]
    fn probe_errors_propagate() {
        let count = member_count(KeyType::Hash, |_| Err("key expired"));
        assert_eq!(count.unwrap_err(), "key expired");
    }

    #[test]
    fn type_names_round_trip() {
        assert_eq!(KeyType::from_type_name("string"), KeyType::String);
        assert_eq!(KeyType::from_type_name("zset"), KeyType::SortedSet);
        assert_eq!(KeyType::from_type_name("stream"), KeyType::Other);
        assert_eq!(KeyType::from_type_name("ReJSON-RL"), KeyType::Other);
        assert_eq!(KeyType::SortedSet.to_string(), "zset");
    }

    #[test]
    fn member_count_serializes_as_number_or_null() {
        assert_eq!(
            serde_json::to_string(&MemberCount::Count(5)).unwrap(),
            "5"
        );
        assert_eq!(
            serde_json::to_string(&MemberCount::NotApplicable).unwrap(),
            "null"
        );
    }
}
