//! In-memory task storage
//!
//! Each store owns its map and id generator outright, so independent
//! instances (one per test, say) never interfere. State is lost when
//! the store is dropped.

use anyhow::Result;

use crate::domain::{Id, IdGenerator, Task, Tasks};

use super::Model;

/// Volatile task store backed by an ordered in-process map
///
/// Lookup, insert and delete are O(1) amortized; tag filtering and
/// distinct-tag listing scan the whole collection.
#[derive(Debug, Default)]
pub struct MemoryModel {
    tasks: Tasks,
    ids: IdGenerator,
}

impl MemoryModel {
    /// Creates an empty store issuing ids from 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with `tasks`
    ///
    /// The id generator is seeded past the largest preloaded id, so
    /// created tasks never collide with the seed data.
    pub fn with_tasks(tasks: Tasks) -> Self {
        let start = tasks.max_id().map_or(Id::new(0), Id::next);
        Self {
            tasks,
            ids: IdGenerator::new(start),
        }
    }
}

impl Model for MemoryModel {
    fn create(&mut self, task: Task) -> Result<Id> {
        let id = self.ids.next_id();
        self.tasks.insert(id, task);
        Ok(id)
    }

    fn read(&self, id: Id) -> Result<Option<Task>> {
        Ok(self.tasks.get(id).cloned())
    }

    fn update(&mut self, id: Id, transform: &mut dyn FnMut(&mut Task)) -> Result<Option<Task>> {
        let Some(task) = self.tasks.get_mut(id) else {
            return Ok(None);
        };
        transform(task);
        Ok(Some(task.clone()))
    }

    fn delete(&mut self, id: Id) -> Result<bool> {
        Ok(self.tasks.remove(id).is_some())
    }

    fn tasks(&self) -> Result<Tasks> {
        Ok(self.tasks.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.tasks = Tasks::new();
        self.ids = IdGenerator::new(Id::new(0));
        Ok(())
    }
}
