//! Flatten-and-concatenate export of one category.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use crate::models::Category;
use crate::project::{tree, ProjectStore};

const SEPARATOR: &str = "\n\n---\n\n";

/// Assemble every document of `category` into a single text (depth-first,
/// parents before children, sibling order preserved) and write it to
/// `target_path`, replacing any existing file there.
///
/// Each section is `### <title>` (the filename when the title is blank)
/// followed by the trimmed content; an unreadable content file degrades to
/// an empty section body. The final separator is trimmed so the export ends
/// with a single newline.
pub async fn export_category(
    store: &ProjectStore,
    category: Category,
    target_path: &Path,
) -> Result<()> {
    let manifest = store.load().await;
    let ordered = tree::flatten(manifest.files.forest(category));
    let dir = store.category_dir(category);

    let mut out = String::new();
    for node in ordered {
        let title = node.title.trim();
        let heading = if title.is_empty() {
            node.filename.as_str()
        } else {
            title
        };
        out.push_str("### ");
        out.push_str(heading);
        out.push_str("\n\n");
        let content = fs::read_to_string(dir.join(&node.filename))
            .await
            .unwrap_or_default();
        out.push_str(content.trim_end());
        out.push_str(SEPARATOR);
    }

    let out = match out.strip_suffix(SEPARATOR) {
        Some(body) => format!("{body}\n"),
        None => out,
    };
    fs::write(target_path, out)
        .await
        .with_context(|| format!("failed to write export to {}", target_path.display()))?;
    tracing::info!(category = category.as_str(), target = %target_path.display(), "exported category");
    Ok(())
}
