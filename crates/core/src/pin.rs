//! Pin records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One pinned content identifier.
///
/// The identifier is opaque; no validation of CID syntax is performed.
/// Serializes as a bare string so a full listing exports as a JSON array
/// of identifiers.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinRecord(String);

impl PinRecord {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for PinRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinRecord({})", self.0)
    }
}

impl fmt::Display for PinRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PinRecord {
    fn from(value: String) -> Self {
        Self(value)
    }
}
