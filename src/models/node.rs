use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single document entry in a project forest.
///
/// Nodes form an ordered n-ary tree through exclusively owned `children`;
/// there are no parent back-pointers, parent lookup re-traverses from the
/// roots. The `id` is allocated once at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: Uuid,
    /// On-disk content key, derived from `id` at creation (`{id}.md`).
    /// Never derived from the title, so renames never move files.
    pub filename: String,
    pub title: String,
    /// Ordered child documents. Serialized only when non-empty so the
    /// manifest shape stays canonical and round-trips byte-identically.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// Settings documents only: opted into AI context assembly.
    /// Other categories carry the field through untouched.
    #[serde(
        rename = "isActive",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_active: Option<bool>,
    /// Content chapters only: cached summary consumed by the context window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Node {
    /// Allocate a fresh node with a new id and the filename derived from it.
    pub fn new(title: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            filename: format!("{id}.md"),
            title: title.into(),
            children: Vec::new(),
            is_active: None,
            summary: None,
        }
    }
}

/// The document collection a node belongs to.
///
/// Each category owns an independent forest in the manifest and a sibling
/// directory of content files at the project root. The string form is both
/// the manifest key and the directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Outlines,
    Content,
    Settings,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Outlines, Category::Content, Category::Settings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outlines => "outlines",
            Self::Content => "content",
            Self::Settings => "settings",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "outlines" => Some(Self::Outlines),
            "content" => Some(Self::Content),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }
}
