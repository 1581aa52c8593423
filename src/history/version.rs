//! Layer identifiers, content references and versions.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a layer within a scene (e.g. "object", "background").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for LayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque handle to a generated artifact.
///
/// Usually a `data:` URL, but the store never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // data URLs are huge; keep log lines readable
        const PREVIEW: usize = 48;
        match self.0.char_indices().nth(PREVIEW) {
            Some((idx, _)) => write!(f, "{}…", &self.0[..idx]),
            None => f.write_str(&self.0),
        }
    }
}

impl From<&str> for ContentRef {
    fn from(content: &str) -> Self {
        Self(content.to_string())
    }
}

impl From<String> for ContentRef {
    fn from(content: String) -> Self {
        Self(content)
    }
}

/// One immutable snapshot of a layer's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Unique identifier for this version.
    pub id: Uuid,

    /// Store-wide monotonically increasing sequence number. Orders versions.
    pub sequence: u64,

    /// Reference to the generated artifact.
    pub content_ref: ContentRef,

    /// Wall-clock creation time. Informational only.
    pub timestamp: DateTime<Utc>,

    /// Optional human-readable description (prompt, merge note, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Version {
    pub(crate) fn new(sequence: u64, content_ref: ContentRef, label: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            content_ref,
            timestamp: Utc::now(),
            label,
        }
    }

    /// Label if present, otherwise a short preview of the content reference.
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.content_ref.to_string(),
        }
    }
}
