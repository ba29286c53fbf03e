//! Storage capability contract

use anyhow::Result;
use chrono::Utc;

use crate::domain::{Id, Tag, Tags, Task, Tasks};

/// Storage contract implemented by both backends
///
/// Missing entities are not errors: `read`/`update`/`complete` return
/// `None` and `delete` returns `false` for an unknown id. Errors are
/// reserved for I/O and decode failures, which only the JSON file
/// backend can produce.
///
/// Neither backend is safe for unsynchronized concurrent use; callers
/// that share a store across threads must add their own locking.
pub trait Model {
    /// Stores `task` under a fresh id and returns it
    ///
    /// The returned id is strictly greater than any id previously
    /// issued by this store instance.
    fn create(&mut self, task: Task) -> Result<Id>;

    /// Returns the task stored under `id`, if any
    fn read(&self, id: Id) -> Result<Option<Task>>;

    /// Applies `transform` to the task under `id` and stores the result
    ///
    /// Returns the updated task, or `None` (changing nothing) if the id
    /// is unknown.
    fn update(&mut self, id: Id, transform: &mut dyn FnMut(&mut Task)) -> Result<Option<Task>>;

    /// Removes the task under `id`, returning whether one existed
    fn delete(&mut self, id: Id) -> Result<bool>;

    /// Returns a full snapshot of the stored tasks, in id order
    fn tasks(&self) -> Result<Tasks>;

    /// Removes all tasks and restarts the id sequence at 0
    fn clear(&mut self) -> Result<()>;

    /// Marks the task under `id` completed now
    ///
    /// An already-completed task keeps its original completion time.
    fn complete(&mut self, id: Id) -> Result<Option<Task>> {
        let now = Utc::now();
        self.update(id, &mut |task| task.complete(now))
    }

    /// Returns the tasks carrying `tag`, preserving id order
    fn tasks_with_tag(&self, tag: &Tag) -> Result<Tasks> {
        Ok(self.tasks()?.with_tag(tag))
    }

    /// Returns each distinct tag across all stored tasks exactly once
    fn tags(&self) -> Result<Tags> {
        Ok(self.tasks()?.tags())
    }
}
