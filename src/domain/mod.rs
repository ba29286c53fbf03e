//! Domain model
//!
//! Value types for tasks plus the sequential id generator, without any
//! I/O concerns.

mod id;
mod task;

pub use id::{Id, IdGenerator};
pub use task::{State, Tag, TagError, Tags, Task, Tasks};
