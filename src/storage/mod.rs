//! # Storage Layer
//!
//! Two interchangeable backends behind the [`Model`] trait.
//!
//! | Backend | Backing | Survives restart |
//! |---------|---------|------------------|
//! | [`MemoryModel`] | Ordered in-process map | No |
//! | [`JsonModel`] | `tasks.json` + `id.json` | Yes |
//!
//! Both expose the same operations with identical semantics; a hosting
//! layer picks one at startup and drives it through the trait. Neither
//! provides mutual exclusion — single-threaded, single-writer access is
//! assumed throughout.
//!
//! The JSON backend performs a full read-modify-write cycle per
//! operation, trading performance for simplicity: no partial in-place
//! edits, no indexes, no cached state that can drift from disk.

mod json;
mod memory;
mod model;

pub use json::JsonModel;
pub use memory::MemoryModel;
pub use model::Model;
