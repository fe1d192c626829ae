//! The shared board document and its partial-write patch

use super::board::Board;
use serde::{Deserialize, Serialize};

/// Default checklist instantiated on every new task
pub const DEFAULT_SUBTASKS: [&str; 6] = [
    "Outline Key Features",
    "Draft Script",
    "Finalize Script",
    "Record Video",
    "Edit Video",
    "Design Thumbnail",
];

/// Board-scoped settings stored alongside the columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSettings {
    #[serde(default)]
    pub show_published: bool,
    #[serde(default)]
    pub default_subtasks: Vec<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            show_published: false,
            default_subtasks: DEFAULT_SUBTASKS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One stored snapshot: board, settings and the access list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub columns: Board,
    #[serde(default)]
    pub settings: BoardSettings,
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

impl Document {
    /// Fresh document owned by `identity`
    pub fn initial(identity: Option<&str>) -> Self {
        Self {
            columns: Board::new(),
            settings: BoardSettings::default(),
            allowed_users: identity.map(|id| vec![id.to_string()]).unwrap_or_default(),
        }
    }

    /// Client-side allow-list check. An empty list means the board is unshared.
    pub fn grants_access(&self, identity: &str) -> bool {
        self.allowed_users.is_empty()
            || self
                .allowed_users
                .iter()
                .any(|u| u.trim().eq_ignore_ascii_case(identity.trim()))
    }

    /// Merge a patch in place; absent fields are left untouched
    pub fn apply(&mut self, patch: DocumentPatch) {
        if let Some(columns) = patch.columns {
            self.columns = columns;
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        if let Some(allowed_users) = patch.allowed_users {
            self.allowed_users = allowed_users;
        }
    }
}

/// A merge-write: only the fields present are written
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Board>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<BoardSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_users: Option<Vec<String>>,
}

impl DocumentPatch {
    /// Patch writing only the board
    pub fn board(board: Board) -> Self {
        Self {
            columns: Some(board),
            ..Self::default()
        }
    }

    /// Also write the settings
    pub fn with_settings(mut self, settings: BoardSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Also write the access list
    pub fn with_allowed_users(mut self, users: Vec<String>) -> Self {
        self.allowed_users = Some(users);
        self
    }

    /// Patch carrying every field of a document
    pub fn full(document: Document) -> Self {
        Self {
            columns: Some(document.columns),
            settings: Some(document.settings),
            allowed_users: Some(document.allowed_users),
        }
    }

    /// Whether the patch writes nothing
    pub fn is_empty(&self) -> bool {
        self.columns.is_none() && self.settings.is_none() && self.allowed_users.is_none()
    }

    /// Whether every field this patch writes already holds in `document`
    pub fn is_reflected_in(&self, document: &Document) -> bool {
        self.columns.as_ref().is_none_or(|c| *c == document.columns)
            && self.settings.as_ref().is_none_or(|s| *s == document.settings)
            && self
                .allowed_users
                .as_ref()
                .is_none_or(|u| *u == document.allowed_users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Stage, Task};

    #[test]
    fn test_document_shape() {
        let doc = Document::initial(Some("owner@example.com"));
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value["columns"].is_array());
        assert_eq!(value["settings"]["showPublished"], false);
        assert_eq!(value["settings"]["defaultSubtasks"][2], "Finalize Script");
        assert_eq!(value["allowedUsers"][0], "owner@example.com");
    }

    #[test]
    fn test_missing_fields_default() {
        let doc: Document = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.columns.columns().len(), 7);
        assert!(doc.allowed_users.is_empty());
    }

    #[test]
    fn test_patch_leaves_absent_fields() {
        let mut doc = Document::initial(Some("a@example.com"));
        let mut board = Board::new();
        board
            .column_mut(Stage::Ideation)
            .tasks
            .push(Task::with_id("t1", "Vlog"));

        doc.apply(DocumentPatch::board(board.clone()));
        assert_eq!(doc.columns, board);
        assert_eq!(doc.allowed_users, vec!["a@example.com"]);
        assert_eq!(doc.settings, BoardSettings::default());
    }

    #[test]
    fn test_grants_access() {
        let mut doc = Document::initial(None);
        assert!(doc.grants_access("anyone@example.com"));

        doc.allowed_users = vec!["Editor@Example.com".into()];
        assert!(doc.grants_access("editor@example.com"));
        assert!(!doc.grants_access("stranger@example.com"));
    }

    #[test]
    fn test_patch_reflected_in_document() {
        let mut doc = Document::initial(Some("a@example.com"));
        let settings = BoardSettings {
            show_published: true,
            ..BoardSettings::default()
        };
        let patch = DocumentPatch::default().with_settings(settings);
        assert!(!patch.is_reflected_in(&doc));

        doc.apply(patch.clone());
        assert!(patch.is_reflected_in(&doc));
        assert!(DocumentPatch::default().is_reflected_in(&doc));
    }

    #[test]
    fn test_patch_serialization_skips_absent() {
        let patch = DocumentPatch::default().with_allowed_users(vec!["x".into()]);
        let value = serde_json::to_value(&patch).unwrap();
        assert!(value.get("columns").is_none());
        assert_eq!(value["allowedUsers"][0], "x");
        assert!(DocumentPatch::default().is_empty());
    }
}
