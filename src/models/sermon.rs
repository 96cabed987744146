//! Sermon model matching the frontend Sermon interface.

use serde::{Deserialize, Serialize};

/// A single outline point within a sermon.
///
/// `reveal` is the word or phrase hidden behind the blank until the
/// attendee taps the point. Reveal *state* is per browsing session and
/// never reaches the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutlinePoint {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub verses: String,
    #[serde(default)]
    pub reveal: String,
}

/// One congregation message.
///
/// At most one sermon in the collection has `live = true` at any time;
/// the repository enforces that invariant on every set-live call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sermon {
    pub id: i64,
    pub title: String,
    pub passage: String,
    /// Display date, free text (e.g. "18 January"). Older records may
    /// lack it; it resolves to empty at load time.
    #[serde(default)]
    pub date: String,
    pub main_point: String,
    #[serde(default)]
    pub points: Vec<OutlinePoint>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub live: bool,
}

impl Sermon {
    /// A blank record as created by the admin "add" action. The caller
    /// assigns the id; everything else defaults.
    pub fn blank(id: i64) -> Self {
        Self {
            id,
            title: String::new(),
            passage: String::new(),
            date: String::new(),
            main_point: String::new(),
            points: Vec::new(),
            questions: Vec::new(),
            live: false,
        }
    }
}

/// Request body for replacing a sermon wholesale.
///
/// There is deliberately no partial-field merge: the editor saves the
/// whole draft, and the record at that id is replaced with exactly these
/// fields. `live` is not part of the body; the live designation is only
/// ever changed through set-live.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSermonRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub passage: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub main_point: String,
    #[serde(default)]
    pub points: Vec<OutlinePoint>,
    #[serde(default)]
    pub questions: Vec<String>,
}
