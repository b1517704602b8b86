//! Narrated content as supplied by the content source.

use serde::{Deserialize, Serialize};

/// The structural role of a content unit within a chapter.
///
/// The role decides how long narration pauses after the unit is spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Heading,
    Paragraph,
    List,
    Formula,
    ImageDescription,
}

/// One discrete piece of narrated content.
///
/// Immutable once loaded; the playback engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Identifier assigned by the content source.
    pub id: u64,

    /// Text handed to the speech synthesiser.
    pub text: String,

    /// Structural role of the unit.
    #[serde(rename = "type")]
    pub kind: UnitKind,
}

impl ContentUnit {
    /// Convenience constructor.
    pub fn new(id: u64, kind: UnitKind, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            kind,
        }
    }
}

/// An ordered list of content units, as delivered for one textbook chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Chapter identifier from the content source.
    #[serde(default)]
    pub chapter_id: u64,

    /// Human-readable chapter title.
    #[serde(default)]
    pub title: String,

    /// The units to narrate, in reading order.
    pub sections: Vec<ContentUnit>,
}

impl Chapter {
    /// Parse a chapter from its JSON wire format.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Whether the chapter has anything to narrate.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
