//! Core types shared across the sync engine.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// Separator placed between document id and sub-document id before hashing.
const KEY_SEPARATOR: &str = "||";

/// Stable identifier for one (document, sub-document) pair.
///
/// Used both as the shared-store key and as the broadcast topic, so every
/// process running a manager for the same pair lands on the same key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetKey(pub [u8; 32]);

impl SheetKey {
    /// Derive the key for a document and optional sub-document.
    pub fn derive(document_id: &str, sub_document_id: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(document_id.as_bytes());
        hasher.update(KEY_SEPARATOR.as_bytes());
        hasher.update(sub_document_id.unwrap_or_default().as_bytes());
        SheetKey(hasher.finalize().into())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(SheetKey(arr))
    }
}

impl fmt::Debug for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SheetKey({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Whole seconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    /// Current wall-clock time.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Timestamp(secs)
    }

    /// Floor a fractional seconds value, as carried by broadcast messages.
    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp(secs.floor() as i64)
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is in the future).
    pub fn seconds_since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the data currently held by a sheet came from.
///
/// Provenance only; correctness decisions are made on timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    /// Fetched from the remote document by this process.
    RemoteApi,
    /// Read from the shared store.
    SharedStore,
    /// Another process won the write-back race; its record was adopted.
    SharedStoreOverride,
    /// Pushed by a peer over the broadcast topic.
    Broadcast,
}

impl fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateSource::RemoteApi => "remote_api",
            UpdateSource::SharedStore => "shared_store",
            UpdateSource::SharedStoreOverride => "shared_store_override",
            UpdateSource::Broadcast => "broadcast",
        };
        f.write_str(name)
    }
}

/// Persisted shape of a sheet in the shared store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedStoreRecord {
    pub timestamp: Timestamp,
    pub csv: String,
}

impl SharedStoreRecord {
    pub fn new(timestamp: Timestamp, csv: impl Into<String>) -> Self {
        Self {
            timestamp,
            csv: csv.into(),
        }
    }

    /// Encode as a JSON value for stores that persist structured documents.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the JSON produced by [`SharedStoreRecord::to_json`].
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// One data line of a sheet document: name, type tag, raw text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueRow {
    pub name: String,
    pub type_tag: String,
    pub raw: String,
}

impl ValueRow {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            raw: raw.into(),
        }
    }
}
