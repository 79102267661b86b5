//! Filesystem-backed project store.
//!
//! A project root holds `project.json` next to one directory per category,
//! with one markdown file per node keyed by the node's `filename`. Every
//! structural operation re-reads the manifest, mutates it in memory, and
//! rewrites it whole, so disk stays ground truth and the next load
//! reconciles after a failed write. Callers serialize mutations per project;
//! racing writers degrade to last-writer-wins.

pub mod context;
pub mod export;
pub(crate) mod tree;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use uuid::Uuid;

use crate::models::{Category, Node, ProjectManifest};

const PROJECT_JSON: &str = "project.json";

/// Handle on one project root.
///
/// This is the session context object for a project: opened when the user
/// selects a project directory, dropped (or replaced) when they switch.
/// It owns the root path only; the manifest is re-read per operation.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(PROJECT_JSON)
    }

    pub(crate) fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.as_str())
    }

    // ============================================================
    // Manifest lifecycle
    // ============================================================

    /// Ensure the three category directories exist and load the manifest,
    /// creating and persisting a default one when none can be read.
    /// Idempotent.
    pub async fn init(&self) -> Result<ProjectManifest> {
        for category in Category::ALL {
            fs::create_dir_all(self.category_dir(category))
                .await
                .with_context(|| {
                    format!("failed to create {} directory", category.as_str())
                })?;
        }
        match self.read_manifest().await {
            Some(manifest) => Ok(manifest),
            None => {
                let manifest = ProjectManifest::default();
                self.save_manifest(&manifest).await?;
                Ok(manifest)
            }
        }
    }

    /// Load the manifest. A missing or corrupt manifest yields the default
    /// empty project; "no valid manifest" is never an error here.
    pub async fn load(&self) -> ProjectManifest {
        self.read_manifest().await.unwrap_or_default()
    }

    async fn read_manifest(&self) -> Option<ProjectManifest> {
        let raw = fs::read_to_string(self.manifest_path()).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                tracing::warn!(%err, "manifest unreadable, treating project as empty");
                None
            }
        }
    }

    async fn save_manifest(&self, manifest: &ProjectManifest) -> Result<()> {
        let raw = serde_json::to_string_pretty(manifest)?;
        fs::write(self.manifest_path(), raw)
            .await
            .with_context(|| format!("failed to write {}", self.manifest_path().display()))
    }

    // ============================================================
    // Structural operations
    // ============================================================

    /// Create a document: allocate the node, write its empty content file,
    /// and append it as the last child of `parent_id` when that resolves,
    /// or as a new last root otherwise.
    pub async fn create_file(
        &self,
        category: Category,
        title: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Node> {
        let node = Node::new(title);
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&node.filename), "")
            .await
            .with_context(|| format!("failed to create content file {}", node.filename))?;

        let mut manifest = self.load().await;
        let forest = manifest.files.forest_mut(category);
        let attached = match parent_id {
            Some(pid) => match tree::find_mut(forest, pid) {
                Some(parent) => {
                    parent.children.push(node.clone());
                    true
                }
                None => false,
            },
            None => false,
        };
        if !attached {
            forest.push(node.clone());
        }
        self.save_manifest(&manifest).await?;
        tracing::debug!(category = category.as_str(), id = %node.id, "created document");
        Ok(node)
    }

    /// Retitle a document. A trimmed-empty new title keeps the old one but
    /// still counts as success; only an unresolved id is a failure.
    pub async fn rename_file(
        &self,
        category: Category,
        id: Uuid,
        new_title: &str,
    ) -> Result<bool> {
        let mut manifest = self.load().await;
        let Some(node) = tree::find_mut(manifest.files.forest_mut(category), id) else {
            return Ok(false);
        };
        let trimmed = new_title.trim();
        if !trimmed.is_empty() {
            node.title = trimmed.to_string();
        }
        self.save_manifest(&manifest).await?;
        Ok(true)
    }

    /// Delete a document and its whole subtree. Content file removal is
    /// best-effort per descendant; a file that is already gone never
    /// aborts the structural excision.
    pub async fn delete_file(&self, category: Category, id: Uuid) -> Result<bool> {
        let mut manifest = self.load().await;
        let forest = manifest.files.forest_mut(category);
        let Some(node) = tree::find(forest, id) else {
            return Ok(false);
        };
        let doomed = tree::collect_ids(node);

        let dir = self.category_dir(category);
        for node_id in &doomed {
            let Some(path) = tree::find(forest, *node_id).map(|n| dir.join(&n.filename)) else {
                continue;
            };
            if let Err(err) = fs::remove_file(&path).await {
                tracing::debug!(path = %path.display(), %err, "content file not removed");
            }
        }
        tree::remove(forest, id);
        self.save_manifest(&manifest).await?;
        tracing::debug!(category = category.as_str(), %id, count = doomed.len(), "deleted subtree");
        Ok(true)
    }

    /// Re-sequence one sibling list: the forest roots when `parent_id` is
    /// `None`, else the named parent's children. Fails only when a named
    /// parent does not resolve.
    pub async fn reorder_files(
        &self,
        category: Category,
        parent_id: Option<Uuid>,
        ids: &[Uuid],
    ) -> Result<bool> {
        let mut manifest = self.load().await;
        let forest = manifest.files.forest_mut(category);
        match parent_id {
            Some(pid) => match tree::find_mut(forest, pid) {
                Some(parent) => tree::reorder(&mut parent.children, ids),
                None => return Ok(false),
            },
            None => tree::reorder(forest, ids),
        }
        self.save_manifest(&manifest).await?;
        Ok(true)
    }

    /// Toggle a settings document's participation in AI context assembly.
    /// Only the settings forest is searched.
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<bool> {
        let mut manifest = self.load().await;
        let Some(node) = tree::find_mut(&mut manifest.files.settings, id) else {
            return Ok(false);
        };
        node.is_active = Some(is_active);
        self.save_manifest(&manifest).await?;
        Ok(true)
    }

    /// Cache a summary on a document (chapters use this for the context
    /// window).
    pub async fn set_summary(&self, category: Category, id: Uuid, summary: &str) -> Result<bool> {
        let mut manifest = self.load().await;
        let Some(node) = tree::find_mut(manifest.files.forest_mut(category), id) else {
            return Ok(false);
        };
        node.summary = Some(summary.to_string());
        self.save_manifest(&manifest).await?;
        Ok(true)
    }

    // ============================================================
    // Content files
    // ============================================================

    /// Read a document's content. An unresolved id or unreadable file is an
    /// empty string; a file that was never written reads the same as one
    /// that is missing.
    pub async fn read_content(&self, category: Category, id: Uuid) -> String {
        let manifest = self.load().await;
        let Some(node) = tree::find(manifest.files.forest(category), id) else {
            return String::new();
        };
        fs::read_to_string(self.category_dir(category).join(&node.filename))
            .await
            .unwrap_or_default()
    }

    /// Overwrite a document's content file. Fails with `Ok(false)` when the
    /// id does not resolve; content writes never touch the manifest.
    pub async fn save_content(&self, category: Category, id: Uuid, content: &str) -> Result<bool> {
        let manifest = self.load().await;
        let Some(node) = tree::find(manifest.files.forest(category), id) else {
            return Ok(false);
        };
        let path = self.category_dir(category).join(&node.filename);
        fs::write(&path, content)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(true)
    }
}
