//! Content hash type.
//!
//! A [`ContentHash`] is a 32-byte BLAKE3 digest. Its textual form is standard
//! padded base64, which is always exactly [`HASH_LENGTH`] characters. That fixed
//! width is what lets hash lists be stored as plain concatenations.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CasError;

/// Length of the textual (base64) form of a [`ContentHash`].
pub const HASH_LENGTH: usize = 44;

/// BLAKE3 content hash (32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a ContentHash from raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Compute the BLAKE3 hash of the given bytes.
    #[inline]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Parse the 44-character base64 form.
    pub fn from_base64(s: &str) -> Result<Self, CasError> {
        if s.len() != HASH_LENGTH {
            return Err(CasError::InvalidHash(format!(
                "expected {} chars, got {}",
                HASH_LENGTH,
                s.len()
            )));
        }
        let bytes = STANDARD
            .decode(s)
            .map_err(|e| CasError::InvalidHash(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| CasError::InvalidHash(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Self(arr))
    }

    /// Encode as the 44-character base64 form.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Encode as lowercase hex (used for on-disk blob names).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse lowercase hex.
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_base64()[..12])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for ContentHash {
    type Err = CasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}
