use std::collections::HashSet;

use inkstone::models::*;
use inkstone::project::ProjectStore;
use speculate2::speculate;
use tempfile::TempDir;
use tokio_test::block_on;
use uuid::Uuid;

fn content_path(store: &ProjectStore, category: Category, node: &Node) -> std::path::PathBuf {
    store.root().join(category.as_str()).join(&node.filename)
}

fn create(store: &ProjectStore, category: Category, title: &str, parent: Option<Uuid>) -> Node {
    block_on(store.create_file(category, title, parent)).expect("Failed to create document")
}

speculate! {
    before {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = ProjectStore::open(dir.path());
        block_on(store.init()).expect("Failed to init project");
    }

    describe "init" {
        it "creates the three category directories" {
            for category in Category::ALL {
                assert!(dir.path().join(category.as_str()).is_dir());
            }
        }

        it "persists a default manifest" {
            let manifest = block_on(store.load());
            assert_eq!(manifest.title, "Untitled Project");
            assert!(manifest.files.outlines.is_empty());
            assert!(manifest.files.content.is_empty());
            assert!(manifest.files.settings.is_empty());
            assert!(dir.path().join("project.json").is_file());
        }

        it "does not clobber an existing manifest" {
            create(&store, Category::Content, "Chapter 1", None);
            let manifest = block_on(store.init()).expect("Failed to re-init");
            assert_eq!(manifest.files.content.len(), 1);
        }
    }

    describe "load" {
        it "returns the default manifest when the file is missing" {
            let empty = ProjectStore::open(dir.path().join("nowhere"));
            let manifest = block_on(empty.load());
            assert_eq!(manifest.title, "Untitled Project");
            assert!(manifest.files.content.is_empty());
        }

        it "returns the default manifest when the file is corrupt" {
            std::fs::write(dir.path().join("project.json"), "{ not json").unwrap();
            let manifest = block_on(store.load());
            assert_eq!(manifest.title, "Untitled Project");
        }

        it "round-trips the forest across all categories" {
            let outline = create(&store, Category::Outlines, "Plot", None);
            let root = create(&store, Category::Content, "Book One", None);
            let chapter = create(&store, Category::Content, "Chapter 1", Some(root.id));
            let setting = create(&store, Category::Settings, "World", None);
            assert!(block_on(store.set_active(setting.id, true)).unwrap());
            assert!(block_on(store.set_summary(Category::Content, chapter.id, "It begins.")).unwrap());

            let manifest = block_on(store.load());
            assert_eq!(manifest.files.outlines[0].id, outline.id);
            assert_eq!(manifest.files.content[0].id, root.id);
            assert_eq!(manifest.files.content[0].children[0].id, chapter.id);
            assert_eq!(manifest.files.content[0].children[0].summary.as_deref(), Some("It begins."));
            assert_eq!(manifest.files.settings[0].is_active, Some(true));
        }

        it "serializes leaves without a children key and the active flag in camel case" {
            let node = create(&store, Category::Settings, "World", None);
            assert!(block_on(store.set_active(node.id, true)).unwrap());

            let raw = std::fs::read_to_string(dir.path().join("project.json")).unwrap();
            assert!(!raw.contains("\"children\""));
            assert!(raw.contains("\"isActive\": true"));
        }
    }

    describe "create_file" {
        it "appends roots in creation order" {
            let first = create(&store, Category::Content, "Chapter 1", None);
            let second = create(&store, Category::Content, "Chapter 2", None);

            let manifest = block_on(store.load());
            let ids: Vec<Uuid> = manifest.files.content.iter().map(|n| n.id).collect();
            assert_eq!(ids, vec![first.id, second.id]);
        }

        it "appends as the last child of a resolved parent" {
            let parent = create(&store, Category::Content, "Book One", None);
            let first = create(&store, Category::Content, "Chapter 1", Some(parent.id));
            let second = create(&store, Category::Content, "Chapter 2", Some(parent.id));

            let manifest = block_on(store.load());
            let children = &manifest.files.content[0].children;
            assert_eq!(children.len(), 2);
            assert_eq!(children[0].id, first.id);
            assert_eq!(children[1].id, second.id);
        }

        it "falls back to a new root when the parent does not resolve" {
            let node = create(&store, Category::Content, "Orphan", Some(Uuid::new_v4()));

            let manifest = block_on(store.load());
            assert_eq!(manifest.files.content.len(), 1);
            assert_eq!(manifest.files.content[0].id, node.id);
        }

        it "writes an empty content file keyed by the node id" {
            let node = create(&store, Category::Content, "Chapter 1", None);
            assert_eq!(node.filename, format!("{}.md", node.id));
            let path = content_path(&store, Category::Content, &node);
            assert_eq!(std::fs::read_to_string(path).unwrap(), "");
        }

        it "never hands out a duplicate id" {
            let mut ids = HashSet::new();
            let parent = create(&store, Category::Content, "Book", None);
            ids.insert(parent.id);
            for i in 0..50 {
                let parent_id = if i % 2 == 0 { None } else { Some(parent.id) };
                let node = create(&store, Category::Content, &format!("Chapter {i}"), parent_id);
                assert!(ids.insert(node.id));
            }
        }
    }

    describe "rename_file" {
        it "trims and stores the new title" {
            let node = create(&store, Category::Content, "Draft", None);
            assert!(block_on(store.rename_file(Category::Content, node.id, "  Chapter 1  ")).unwrap());

            let manifest = block_on(store.load());
            assert_eq!(manifest.files.content[0].title, "Chapter 1");
        }

        it "keeps the old title when the new one trims to empty" {
            let node = create(&store, Category::Content, "Draft", None);
            assert!(block_on(store.rename_file(Category::Content, node.id, "   ")).unwrap());

            let manifest = block_on(store.load());
            assert_eq!(manifest.files.content[0].title, "Draft");
        }

        it "fails for an unknown id without touching anything" {
            create(&store, Category::Content, "Draft", None);
            assert!(!block_on(store.rename_file(Category::Content, Uuid::new_v4(), "New")).unwrap());

            let manifest = block_on(store.load());
            assert_eq!(manifest.files.content[0].title, "Draft");
        }
    }

    describe "delete_file" {
        it "removes a subtree of size k and exactly its k content files" {
            let root = create(&store, Category::Content, "Book One", None);
            let chapter = create(&store, Category::Content, "Chapter 1", Some(root.id));
            let scene = create(&store, Category::Content, "Scene 1", Some(chapter.id));
            let survivor = create(&store, Category::Content, "Book Two", None);

            assert!(block_on(store.delete_file(Category::Content, root.id)).unwrap());

            let manifest = block_on(store.load());
            assert_eq!(manifest.files.content.len(), 1);
            assert_eq!(manifest.files.content[0].id, survivor.id);
            for node in [&root, &chapter, &scene] {
                assert!(!content_path(&store, Category::Content, node).exists());
            }
            assert!(content_path(&store, Category::Content, &survivor).exists());
        }

        it "completes structurally even when content files are already gone" {
            let root = create(&store, Category::Content, "Book One", None);
            let chapter = create(&store, Category::Content, "Chapter 1", Some(root.id));
            std::fs::remove_file(content_path(&store, Category::Content, &chapter)).unwrap();

            assert!(block_on(store.delete_file(Category::Content, root.id)).unwrap());
            let manifest = block_on(store.load());
            assert!(manifest.files.content.is_empty());
        }

        it "fails for an unknown id" {
            assert!(!block_on(store.delete_file(Category::Content, Uuid::new_v4())).unwrap());
        }
    }

    describe "reorder_files" {
        it "front-loads the named ids and keeps the rest stable" {
            let a = create(&store, Category::Content, "a", None);
            let b = create(&store, Category::Content, "b", None);
            let c = create(&store, Category::Content, "c", None);
            let d = create(&store, Category::Content, "d", None);

            assert!(block_on(store.reorder_files(Category::Content, None, &[c.id, a.id])).unwrap());

            let manifest = block_on(store.load());
            let ids: Vec<Uuid> = manifest.files.content.iter().map(|n| n.id).collect();
            assert_eq!(ids, vec![c.id, a.id, b.id, d.id]);
        }

        it "reorders one parent's children without touching the roots" {
            let parent = create(&store, Category::Content, "Book", None);
            let x = create(&store, Category::Content, "x", Some(parent.id));
            let y = create(&store, Category::Content, "y", Some(parent.id));
            let other = create(&store, Category::Content, "Other", None);

            assert!(block_on(store.reorder_files(Category::Content, Some(parent.id), &[y.id, x.id])).unwrap());

            let manifest = block_on(store.load());
            let children: Vec<Uuid> = manifest.files.content[0].children.iter().map(|n| n.id).collect();
            assert_eq!(children, vec![y.id, x.id]);
            assert_eq!(manifest.files.content[1].id, other.id);
        }

        it "fails when the named parent does not resolve" {
            create(&store, Category::Content, "a", None);
            assert!(!block_on(store.reorder_files(Category::Content, Some(Uuid::new_v4()), &[])).unwrap());
        }
    }

    describe "content" {
        it "round-trips document content independently of the manifest" {
            let node = create(&store, Category::Content, "Chapter 1", None);
            assert!(block_on(store.save_content(Category::Content, node.id, "It was a dark night.")).unwrap());
            assert_eq!(
                block_on(store.read_content(Category::Content, node.id)),
                "It was a dark night."
            );
        }

        it "reads an unknown id as empty" {
            assert_eq!(block_on(store.read_content(Category::Content, Uuid::new_v4())), "");
        }

        it "reads a missing content file as empty" {
            let node = create(&store, Category::Content, "Chapter 1", None);
            std::fs::remove_file(content_path(&store, Category::Content, &node)).unwrap();
            assert_eq!(block_on(store.read_content(Category::Content, node.id)), "");
        }

        it "refuses to save for an unknown id" {
            assert!(!block_on(store.save_content(Category::Content, Uuid::new_v4(), "text")).unwrap());
        }
    }

    describe "flags" {
        it "toggles the active flag on settings documents" {
            let node = create(&store, Category::Settings, "World", None);
            assert!(block_on(store.set_active(node.id, true)).unwrap());
            assert_eq!(block_on(store.load()).files.settings[0].is_active, Some(true));

            assert!(block_on(store.set_active(node.id, false)).unwrap());
            assert_eq!(block_on(store.load()).files.settings[0].is_active, Some(false));
        }

        it "does not find non-settings documents by active toggle" {
            let chapter = create(&store, Category::Content, "Chapter 1", None);
            assert!(!block_on(store.set_active(chapter.id, true)).unwrap());
        }

        it "caches a summary on a chapter" {
            let chapter = create(&store, Category::Content, "Chapter 1", None);
            assert!(block_on(store.set_summary(Category::Content, chapter.id, "Heroes meet.")).unwrap());
            assert_eq!(
                block_on(store.load()).files.content[0].summary.as_deref(),
                Some("Heroes meet.")
            );
        }

        it "fails to summarize an unknown id" {
            assert!(!block_on(store.set_summary(Category::Content, Uuid::new_v4(), "x")).unwrap());
        }
    }
}
