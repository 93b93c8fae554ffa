//! Ordered lists of chunk hashes.

use std::fmt;

use cairn_cas::{ContentHash, HASH_LENGTH};
use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, Result};

/// Ordered sequence of chunk hashes.
///
/// The textual form is the hashes' base64 strings concatenated with no
/// separator; the fixed [`HASH_LENGTH`] is what makes it re-splittable. Order
/// is the byte-offset order of the chunks and is never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashList(Vec<ContentHash>);

impl HashList {
    pub fn new(hashes: Vec<ContentHash>) -> Self {
        Self(hashes)
    }

    /// Parse the concatenated textual form.
    pub fn parse(text: &str) -> Result<Self> {
        if text.len() % HASH_LENGTH != 0 {
            return Err(ManifestError::InvalidHashList { len: text.len() });
        }

        let hashes = (0..text.len())
            .step_by(HASH_LENGTH)
            .map(|start| {
                let token = text
                    .get(start..start + HASH_LENGTH)
                    .ok_or(ManifestError::InvalidHashList { len: text.len() })?;
                Ok(ContentHash::from_base64(token)?)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self(hashes))
    }

    /// Render the concatenated textual form.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.text_len());
        for hash in &self.0 {
            text.push_str(&hash.to_base64());
        }
        text
    }

    /// Length of the textual form in characters.
    pub fn text_len(&self) -> usize {
        self.0.len() * HASH_LENGTH
    }

    /// Number of hashes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn hashes(&self) -> &[ContentHash] {
        &self.0
    }

    /// Split into consecutive runs of at most `per_segment` hashes, in order.
    pub fn segments(&self, per_segment: usize) -> impl Iterator<Item = HashList> + '_ {
        self.0
            .chunks(per_segment.max(1))
            .map(|run| HashList(run.to_vec()))
    }
}

impl From<Vec<ContentHash>> for HashList {
    fn from(hashes: Vec<ContentHash>) -> Self {
        Self(hashes)
    }
}

impl TryFrom<String> for HashList {
    type Error = ManifestError;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

impl From<HashList> for String {
    fn from(list: HashList) -> Self {
        list.to_text()
    }
}

impl fmt::Display for HashList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hash in &self.0 {
            write!(f, "{}", hash)?;
        }
        Ok(())
    }
}
