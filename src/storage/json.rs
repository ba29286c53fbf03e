//! JSON file task storage
//!
//! Tasks live in `tasks.json` (array of `{"id", "task"}` objects) and
//! the next unused id in `id.json` (`{"id": <int>}`), both pretty-printed
//! UTF-8 in a caller-supplied directory. Every operation reloads the
//! documents it needs and rewrites the changed ones in full; there is no
//! caching, no indexing and no locking. A missing file reads as
//! empty/zero; a malformed one is a fatal decode error.
//!
//! Each file is written via temp file + rename, so a crashed write never
//! leaves a truncated document. The two files are still written
//! separately: a crash between the task write and the counter write in
//! `create` leaves a stale counter, and the next `create` can reuse an
//! id. Single-writer access is assumed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{Id, Task, Tasks};

use super::Model;

/// Persistent task store backed by two JSON documents
pub struct JsonModel {
    dir: PathBuf,
}

impl JsonModel {
    /// Creates a store rooted at `dir`
    ///
    /// Neither document has to exist yet; the first write creates the
    /// directory and files.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the path of the task collection document
    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join("tasks.json")
    }

    /// Returns the path of the next-id counter document
    pub fn id_path(&self) -> PathBuf {
        self.dir.join("id.json")
    }

    fn load_tasks(&self) -> Result<Tasks> {
        Ok(load_document(&self.tasks_path())?.unwrap_or_default())
    }

    fn load_next_id(&self) -> Result<Id> {
        Ok(load_document::<NextId>(&self.id_path())?.map_or(Id::new(0), |doc| doc.0))
    }

    fn save_tasks(&self, tasks: &Tasks) -> Result<()> {
        tracing::debug!(count = tasks.len(), "writing task collection");
        save_document(&self.tasks_path(), tasks)
    }

    fn save_next_id(&self, id: Id) -> Result<()> {
        tracing::debug!(next = id.value(), "writing id counter");
        save_document(&self.id_path(), &NextId(id))
    }
}

impl Model for JsonModel {
    fn create(&mut self, task: Task) -> Result<Id> {
        let mut tasks = self.load_tasks()?;
        let id = self.load_next_id()?;
        tasks.insert(id, task);
        // Tasks first, then the advanced counter; the counter must stay
        // >= 1 + max stored id.
        self.save_tasks(&tasks)?;
        self.save_next_id(id.next())?;
        Ok(id)
    }

    fn read(&self, id: Id) -> Result<Option<Task>> {
        Ok(self.load_tasks()?.get(id).cloned())
    }

    fn update(&mut self, id: Id, transform: &mut dyn FnMut(&mut Task)) -> Result<Option<Task>> {
        let mut tasks = self.load_tasks()?;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(None);
        };
        transform(task);
        let updated = task.clone();
        self.save_tasks(&tasks)?;
        Ok(Some(updated))
    }

    fn delete(&mut self, id: Id) -> Result<bool> {
        let mut tasks = self.load_tasks()?;
        let removed = tasks.remove(id).is_some();
        if removed {
            self.save_tasks(&tasks)?;
        }
        Ok(removed)
    }

    fn tasks(&self) -> Result<Tasks> {
        self.load_tasks()
    }

    fn clear(&mut self) -> Result<()> {
        self.save_tasks(&Tasks::new())?;
        self.save_next_id(Id::new(0))
    }
}

/// On-disk form of the next-id counter: `{"id": <int>}`
struct NextId(Id);

impl Serialize for NextId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("id", &self.0)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for NextId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NextIdVisitor;

        impl<'de> Visitor<'de> for NextIdVisitor {
            type Value = NextId;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a map with an \"id\" field")
            }

            fn visit_map<A>(self, mut map: A) -> Result<NextId, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut id: Option<Id> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "id" => id = Some(map.next_value()?),
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                let id = id.ok_or_else(|| de::Error::missing_field("id"))?;
                Ok(NextId(id))
            }
        }

        deserializer.deserialize_map(NextIdVisitor)
    }
}

/// Reads and decodes a JSON document; `None` if the file is absent
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(value))
}

/// Rewrites a JSON document in full as pretty-printed (2-space) text
fn save_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let text = serde_json::to_string_pretty(value).context("Failed to serialize document")?;

    // Write to temp file first, then rename into place
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, text)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}
