//! Manifest text codec.
//!
//! Manifests and parts are persisted as small YAML documents with the fields
//! `hash`, `concatenatedHashes` and `next`. Absent fields are omitted rather
//! than written as null, so a record's text (and therefore its content hash)
//! depends only on the fields it actually carries.

use cairn_cas::ContentHash;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::Result;
use crate::HashList;

/// Wire shape shared by root manifests and parts.
///
/// Every field is optional on the wire: a root carries `hash`, a part does not,
/// and either may carry `concatenatedHashes`, `next`, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concatenated_hashes: Option<HashList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<ContentHash>,
}

impl ManifestRecord {
    /// Record holding only a hash list, as measured against the size limit.
    pub fn hashes_only(list: HashList) -> Self {
        Self {
            concatenated_hashes: Some(list),
            ..Self::default()
        }
    }

    /// Stored form of a part: its segment plus the link to its successor.
    pub fn part(segment: HashList, next: Option<ContentHash>) -> Self {
        Self {
            hash: None,
            concatenated_hashes: Some(segment),
            next,
        }
    }
}

/// Serialize a record to text.
pub fn to_text<T: Serialize>(record: &T) -> Result<String> {
    Ok(serde_yaml::to_string(record)?)
}

/// Parse a record from text.
pub fn from_text<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_yaml::from_str(text)?)
}

/// Parse a record from stored bytes.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_yaml::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManifestError;

    fn list(n: usize) -> HashList {
        HashList::new(
            (0..n)
                .map(|i| ContentHash::compute(&i.to_le_bytes()))
                .collect(),
        )
    }

    #[test]
    fn test_record_roundtrip() {
        let record = ManifestRecord {
            hash: Some(ContentHash::compute(b"file")),
            concatenated_hashes: Some(list(3)),
            next: Some(ContentHash::compute(b"part")),
        };
        let text = to_text(&record).unwrap();
        let parsed: ManifestRecord = from_text(&text).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_absent_fields_omitted() {
        let text = to_text(&ManifestRecord::hashes_only(list(1))).unwrap();
        assert!(text.contains("concatenatedHashes"));
        assert!(!text.contains("hash:"));
        assert!(!text.contains("next"));
        assert!(!text.contains("null"));
    }

    #[test]
    fn test_empty_hash_list_roundtrip() {
        let record = ManifestRecord::hashes_only(HashList::default());
        let text = to_text(&record).unwrap();
        let parsed: ManifestRecord = from_text(&text).unwrap();
        assert_eq!(parsed.concatenated_hashes, Some(HashList::default()));
    }

    #[test]
    fn test_serialized_size_tracks_hash_count() {
        let small = to_text(&ManifestRecord::hashes_only(list(10))).unwrap();
        let large = to_text(&ManifestRecord::hashes_only(list(11))).unwrap();
        assert_eq!(large.len() - small.len(), cairn_cas::HASH_LENGTH);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let record = ManifestRecord::part(list(4), Some(ContentHash::compute(b"n")));
        assert_eq!(to_text(&record).unwrap(), to_text(&record).unwrap());
    }

    #[test]
    fn test_bad_hash_list_rejected() {
        let err = from_text::<ManifestRecord>("concatenatedHashes: abc\n").unwrap_err();
        assert!(matches!(err, ManifestError::Codec(_)));
    }

    #[test]
    fn test_from_bytes() {
        let record = ManifestRecord::part(list(2), None);
        let text = to_text(&record).unwrap();
        let parsed: ManifestRecord = from_bytes(text.as_bytes()).unwrap();
        assert_eq!(parsed, record);
    }
}
