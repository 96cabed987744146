//! Library snapshot model matching the frontend's initial-load shape.

use serde::{Deserialize, Serialize};

use super::Sermon;

/// Everything the browser needs on first load: the sermon collection
/// (newest first) plus revision metadata for change polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub schema_version: i32,
    pub generated_at: String,
    pub revision_id: i64,
    pub sermons: Vec<Sermon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
