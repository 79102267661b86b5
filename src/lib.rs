//! Inkstone: story project backend for AI-assisted long-form writing.
//!
//! A project is a directory of three document trees (outlines, chapters,
//! setting notes) plus one manifest describing their shape. The crate owns
//! all structural tree operations, content persistence, Story Bible context
//! assembly, and single-file export; the desktop shell consumes it over the
//! local HTTP API in [`api`], and the text-generation vendor sits behind
//! the gateway trait in [`ai`].

pub mod ai;
pub mod api;
pub mod config;
pub mod models;
pub mod project;
