//! Story Bible assembly: the system context injected into AI calls.

use tokio::fs;

use crate::models::{Category, Node};
use crate::project::{tree, ProjectStore};

const STORY_BIBLE_HEADER: &str = "--- STORY BIBLE ---";
const STORY_BIBLE_FOOTER: &str = "-------------------";

/// Options for [`build_story_context`].
#[derive(Debug, Clone, Copy)]
pub struct ContextOptions {
    /// Upper bound on trailing chapter summaries injected after the
    /// settings blocks. A strict cap: fewer summaries than the bound means
    /// all of them, more means only the trailing window, never reordered.
    pub max_history_chapters: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_history_chapters: 20,
        }
    }
}

/// Concatenate the active settings documents, plus the trailing window of
/// chapter summaries, into the Story Bible string.
///
/// An empty result means no settings document is opted in; the AI call
/// then proceeds without any system instruction, never with an empty one.
pub async fn build_story_context(store: &ProjectStore, opts: ContextOptions) -> String {
    let manifest = store.load().await;
    let active: Vec<&Node> = tree::flatten(&manifest.files.settings)
        .into_iter()
        .filter(|n| n.is_active == Some(true))
        .collect();
    if active.is_empty() {
        return String::new();
    }

    let mut parts: Vec<String> = vec![STORY_BIBLE_HEADER.to_string()];
    let dir = store.category_dir(Category::Settings);
    for node in active {
        let title = node.title.trim();
        let label = if title.ends_with(".md") {
            title.to_string()
        } else {
            format!("{title}.md")
        };
        parts.push(format!("[File: {label}]"));
        match fs::read_to_string(dir.join(&node.filename)).await {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    parts.push("(empty)".to_string());
                } else {
                    parts.push(trimmed.to_string());
                }
            }
            Err(_) => parts.push("(read error)".to_string()),
        }
    }

    // Trailing window of chapter summaries, in manuscript order. Chapters
    // without a summary do not occupy a slot.
    let summaries: Vec<(&str, &str)> = tree::flatten(&manifest.files.content)
        .into_iter()
        .filter_map(|n| {
            let summary = n.summary.as_deref().map(str::trim)?;
            if summary.is_empty() {
                None
            } else {
                Some((n.title.as_str(), summary))
            }
        })
        .collect();
    let skip = summaries.len().saturating_sub(opts.max_history_chapters);
    for (title, summary) in &summaries[skip..] {
        parts.push(format!("[Chapter summary: {title}]"));
        parts.push((*summary).to_string());
    }

    parts.push(STORY_BIBLE_FOOTER.to_string());
    parts.join("\n\n")
}
