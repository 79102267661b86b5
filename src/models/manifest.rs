use serde::{Deserialize, Serialize};

use super::{Category, Node};

/// The complete persisted state of one project.
///
/// A project root directory holds this manifest as `project.json` next to
/// one directory per category. The manifest is the sole source of truth for
/// tree shape across restarts and is always rewritten whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub title: String,
    pub files: CategoryFiles,
}

/// The three forests, keyed by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryFiles {
    #[serde(default)]
    pub outlines: Vec<Node>,
    #[serde(default)]
    pub content: Vec<Node>,
    #[serde(default)]
    pub settings: Vec<Node>,
}

impl Default for ProjectManifest {
    fn default() -> Self {
        Self {
            title: "Untitled Project".to_string(),
            files: CategoryFiles::default(),
        }
    }
}

impl CategoryFiles {
    pub fn forest(&self, category: Category) -> &Vec<Node> {
        match category {
            Category::Outlines => &self.outlines,
            Category::Content => &self.content,
            Category::Settings => &self.settings,
        }
    }

    pub fn forest_mut(&mut self, category: Category) -> &mut Vec<Node> {
        match category {
            Category::Outlines => &mut self.outlines,
            Category::Content => &mut self.content,
            Category::Settings => &mut self.settings,
        }
    }
}
