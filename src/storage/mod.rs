//! Storage layer for lexgraph
//!
//! A single SQLite database holds the case graph and the section vectors.

pub mod migrations;
pub mod sqlite;

pub use sqlite::{Database, SectionRow, WriteStats, content_hash};
