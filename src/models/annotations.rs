//! Per-sermon annotation record and its storage encoding.
//!
//! Annotations persist under one storage key per sermon
//! (`harmony-notes-<id>`). Loading is always lossless for the caller:
//! missing, malformed, or legacy-shaped values come back as a usable
//! record, never as an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Sermon;

/// Storage key prefix for annotation records.
pub const ANNOTATION_KEY_PREFIX: &str = "harmony-notes-";

/// Storage key for the uploaded church logo (data-URI string).
pub const LOGO_KEY: &str = "church-logo";

/// Build the storage key for a sermon's annotations.
pub fn annotation_key(sermon_id: i64) -> String {
    format!("{}{}", ANNOTATION_KEY_PREFIX, sermon_id)
}

/// The attendee's notes for one sermon: per-point notes, a general
/// free-text note, and per-question answers. Maps are keyed by the
/// outline-point / question index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    #[serde(default)]
    pub notes: BTreeMap<u32, String>,
    #[serde(default)]
    pub general: String,
    #[serde(default)]
    pub answers: BTreeMap<u32, String>,
}

impl AnnotationRecord {
    /// Decode a stored value. Three shapes are accepted:
    ///
    /// - the current `{notes, general, answers}` wrapper,
    /// - the legacy flat `index -> string` map, read as a notes map with
    ///   empty general/answers,
    /// - anything else (invalid JSON, wrong types), which recovers
    ///   silently to the all-empty default.
    pub fn decode(raw: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(_) => return Self::default(),
        };

        let Some(map) = value.as_object() else {
            return Self::default();
        };

        // Legacy shape: no wrapper keys, every entry is index -> string.
        let is_wrapper = map.contains_key("notes")
            || map.contains_key("general")
            || map.contains_key("answers");
        if !is_wrapper {
            let mut notes = BTreeMap::new();
            for (key, entry) in map {
                match (key.parse::<u32>(), entry.as_str()) {
                    (Ok(index), Some(text)) => {
                        notes.insert(index, text.to_string());
                    }
                    _ => return Self::default(),
                }
            }
            return Self {
                notes,
                ..Self::default()
            };
        }

        serde_json::from_value(value).unwrap_or_default()
    }

    /// Serialize for storage. Always writes the current wrapper shape.
    pub fn encode(&self) -> String {
        // A struct of maps and strings cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Render the record as a plain-text block for download.
    ///
    /// Deterministic: same sermon and record always produce the same
    /// text. This is a view over the same data path as load, not an
    /// independent one.
    pub fn render_export(&self, sermon: &Sermon) -> String {
        let mut out = String::new();
        out.push_str(&sermon.title);
        out.push('\n');
        if !sermon.passage.is_empty() {
            out.push_str(&sermon.passage);
            out.push('\n');
        }
        if !sermon.date.is_empty() {
            out.push_str(&sermon.date);
            out.push('\n');
        }
        if !sermon.main_point.is_empty() {
            out.push('\n');
            out.push_str(&sermon.main_point);
            out.push('\n');
        }

        for (i, point) in sermon.points.iter().enumerate() {
            out.push('\n');
            out.push_str(&format!(
                "{}. {} ({}) - {}\n",
                i + 1,
                point.title,
                point.verses,
                point.reveal
            ));
            if let Some(note) = self.notes.get(&(i as u32)) {
                if !note.trim().is_empty() {
                    out.push_str(&format!("   Notes: {}\n", note));
                }
            }
        }

        if !self.general.trim().is_empty() {
            out.push('\n');
            out.push_str("General notes:\n");
            out.push_str(&self.general);
            out.push('\n');
        }

        if !sermon.questions.is_empty() {
            out.push('\n');
            out.push_str("Questions for the week:\n");
            for (i, question) in sermon.questions.iter().enumerate() {
                out.push_str(&format!("Q{}: {}\n", i + 1, question));
                if let Some(answer) = self.answers.get(&(i as u32)) {
                    if !answer.trim().is_empty() {
                        out.push_str(&format!("   {}\n", answer));
                    }
                }
            }
        }

        out
    }
}
