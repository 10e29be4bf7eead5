use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AblistError, Result};
use crate::util::trim_trailing_chars;

/// Number of trailing characters dropped from a composite key when a removed
/// entry is reported. Fixed-width by convention of the upstream manifest.
pub const REMOVED_KEY_TRIM: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Entry {
    pub hash: String,
    pub path: String,
    #[serde(deserialize_with = "string_or_number")]
    pub crc: String,
}

impl Entry {
    pub fn key(&self) -> EntryKey {
        EntryKey {
            hash: self.hash.clone(),
            path: self.path.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(rename = "baseVersion", deserialize_with = "string_or_number")]
    pub base_version: String,
    pub data: Vec<Entry>,
}

impl Manifest {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| AblistError::parse("manifest parse error", e))
    }

    /// Map every composite key to its crc. Later duplicates overwrite earlier ones.
    pub fn crc_index(&self) -> HashMap<EntryKey, &str> {
        self.data
            .iter()
            .map(|entry| (entry.key(), entry.crc.as_str()))
            .collect()
    }
}

/// Composite identity of an entry across manifest versions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub hash: String,
    pub path: String,
}

impl EntryKey {
    /// Label used in the "Removed Asset" line.
    pub fn removed_label(&self) -> String {
        trim_trailing_chars(&self.to_string(), REMOVED_KEY_TRIM).to_owned()
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.hash, self.path)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangedAsset {
    pub key: EntryKey,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub appended: Vec<ChangedAsset>,
    pub updated: Vec<ChangedAsset>,
    pub removed: Vec<EntryKey>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.appended.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Accept either a JSON string or a JSON number and keep its text form.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}
