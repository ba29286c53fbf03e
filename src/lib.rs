//! taskstore - a small task-tracking backend with swappable storage
//!
//! Tasks are created, read, updated, completed, deleted and filtered by
//! tag through the [`Model`] trait. Two backends implement it: an
//! in-memory map ([`MemoryModel`]) and a JSON-file-backed store
//! ([`JsonModel`]). A hosting layer (HTTP server, CLI, tests) owns a
//! store instance and calls the trait; nothing here does routing or
//! rendering.

pub mod domain;
pub mod storage;

pub use domain::{Id, IdGenerator, State, Tag, TagError, Tags, Task, Tasks};
pub use storage::{JsonModel, MemoryModel, Model};
