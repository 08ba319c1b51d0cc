//! Content identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CasError;

/// Prefix marking a BLAKE3 digest.
pub const BLAKE3_PREFIX: &str = "b3";

/// Opaque identifier returned by a [`ContentStore`](crate::ContentStore).
///
/// Callers treat it as a string token. The backends in this crate derive it
/// as `"b3"` followed by the 64-char hex BLAKE3 digest of the content.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Hash `bytes` into the id the local backends would assign.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        let digest = blake3::hash(bytes);
        Self(format!("{BLAKE3_PREFIX}{}", hex::encode(digest.as_bytes())))
    }

    /// Wrap an id minted elsewhere without checking its shape.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digest portion, if this is a well-formed BLAKE3 id.
    pub fn blake3_hex(&self) -> Option<&str> {
        let hex = self.0.strip_prefix(BLAKE3_PREFIX)?;
        let well_formed = hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit());
        well_formed.then_some(hex)
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> &str {
        let hex = self.0.strip_prefix(BLAKE3_PREFIX).unwrap_or(&self.0);
        hex.get(..8).unwrap_or(hex)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short())
    }
}

impl FromStr for ContentId {
    type Err = CasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CasError::InvalidId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
