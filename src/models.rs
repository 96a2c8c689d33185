use serde::{Deserialize, Serialize};

/// A notebook as the service describes it. `guid` is server-assigned and
/// absent until the notebook has been created remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub guid: Option<String>,
    pub name: String,
    pub stack: Option<String>,
}

impl Notebook {
    pub fn named(name: impl Into<String>) -> Self {
        Notebook {
            guid: None,
            name: name.into(),
            stack: None,
        }
    }
}

/// A note in pass-through form. `content` is a markup document; this crate
/// only ever generates it via [`crate::enml::wrap_plain_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub guid: Option<String>,
    pub title: String,
    pub content: Option<String>,
    pub notebook_guid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteSortOrder {
    Created,
    Updated,
    Relevance,
    UpdateSequenceNumber,
    Title,
}

/// Query parameters for a note search; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteFilter {
    pub notebook_guid: Option<String>,
    pub order: NoteSortOrder,
    pub ascending: bool,
}

/// Title constraints the service advertises to clients. User-generated
/// titles must be validated against these before they go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteLimits {
    pub title_len_min: usize,
    pub title_len_max: usize,
    pub title_regex: String,
}

impl Default for NoteLimits {
    fn default() -> Self {
        NoteLimits {
            title_len_min: 1,
            title_len_max: 255,
            title_regex: r"^[^\s\r\n]([^\n\r]{0,253}[^\s\r\n])?$".to_string(),
        }
    }
}
