//! Task domain model
//!
//! A task is a unit of work with a lifecycle state, a description,
//! optional free-form notes and a list of tags. Every type here carries
//! hand-written serde impls so the on-disk JSON shape stays fixed
//! regardless of field or variant renames:
//!
//! | Type | JSON |
//! |------|------|
//! | [`State`] | `{"state": "active"}` or `{"state": "completed", "date": ...}` |
//! | [`Tag`] | `{"tag": "label"}` |
//! | [`Task`] | object with `state`/`date`/`description`/`notes`/`tags` |
//! | [`Tasks`] | array of `{"id": .., "task": ..}` objects |
//!
//! Unknown extra fields are ignored on decode; missing required fields
//! fail decode. `notes` is the only optional field.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::id::Id;

#[derive(Debug, Error, PartialEq)]
pub enum TagError {
    #[error("Tag label must not be empty")]
    EmptyLabel,
}

/// A textual label used to categorize tasks
///
/// Wraps a non-empty string; equality is by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Creates a tag, rejecting empty labels
    pub fn new(label: impl Into<String>) -> Result<Self, TagError> {
        let label = label.into();
        if label.is_empty() {
            return Err(TagError::EmptyLabel);
        }
        Ok(Self(label))
    }

    /// Returns the label
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("tag", &self.0)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TagVisitor;

        impl<'de> Visitor<'de> for TagVisitor {
            type Value = Tag;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map with a \"tag\" field")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Tag, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut label: Option<String> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "tag" => label = Some(map.next_value()?),
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                let label = label.ok_or_else(|| de::Error::missing_field("tag"))?;
                Tag::new(label).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(TagVisitor)
    }
}

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not yet done
    Active,
    /// Done, carrying the completion time
    Completed(DateTime<Utc>),
}

impl State {
    /// Returns true if this state represents completion
    pub fn is_completed(&self) -> bool {
        matches!(self, State::Completed(_))
    }
}

/// Reconstructs a state from its decoded `state`/`date` fields
///
/// Shared by the [`State`] and [`Task`] deserializers, since a task
/// carries the same two fields inline.
fn state_from_parts<E>(label: &str, date: Option<DateTime<Utc>>) -> Result<State, E>
where
    E: de::Error,
{
    match label {
        "active" => Ok(State::Active),
        "completed" => date
            .map(State::Completed)
            .ok_or_else(|| de::Error::missing_field("date")),
        other => Err(de::Error::custom(format!(
            "unknown task state '{other}', expected \"active\" or \"completed\""
        ))),
    }
}

impl Serialize for State {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            State::Active => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("state", "active")?;
                map.end()
            }
            State::Completed(date) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("state", "completed")?;
                map.serialize_entry("date", date)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StateVisitor;

        impl<'de> Visitor<'de> for StateVisitor {
            type Value = State;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map with a \"state\" field")
            }

            fn visit_map<A>(self, mut map: A) -> Result<State, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut label: Option<String> = None;
                let mut date: Option<DateTime<Utc>> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "state" => label = Some(map.next_value()?),
                        "date" => date = Some(map.next_value()?),
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                let label = label.ok_or_else(|| de::Error::missing_field("state"))?;
                state_from_parts(&label, date)
            }
        }

        deserializer.deserialize_map(StateVisitor)
    }
}

/// A unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Current lifecycle state
    pub state: State,

    /// Human-readable description
    pub description: String,

    /// Optional free-form notes
    pub notes: Option<String>,

    /// Tags attached to this task
    ///
    /// Duplicates are permitted at this layer; [`Tasks::tags`]
    /// deduplicates when deriving the distinct tag list.
    pub tags: Vec<Tag>,
}

impl Task {
    /// Creates an active task with no notes or tags
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            state: State::Active,
            description: description.into(),
            notes: None,
            tags: Vec::new(),
        }
    }

    /// Sets the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Adds a tag
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Returns true if the task carries the given tag
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Marks the task completed at `at`
    ///
    /// Completing an already-completed task is a no-op; the original
    /// completion time is kept.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        if !self.state.is_completed() {
            self.state = State::Completed(at);
        }
    }
}

impl Serialize for Task {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut len = 3; // state, description, tags
        if self.state.is_completed() {
            len += 1;
        }
        if self.notes.is_some() {
            len += 1;
        }

        let mut map = serializer.serialize_map(Some(len))?;
        match &self.state {
            State::Active => map.serialize_entry("state", "active")?,
            State::Completed(date) => {
                map.serialize_entry("state", "completed")?;
                map.serialize_entry("date", date)?;
            }
        }
        map.serialize_entry("description", &self.description)?;
        if let Some(notes) = &self.notes {
            map.serialize_entry("notes", notes)?;
        }
        map.serialize_entry("tags", &self.tags)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Task {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TaskVisitor;

        impl<'de> Visitor<'de> for TaskVisitor {
            type Value = Task;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a task object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Task, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut label: Option<String> = None;
                let mut date: Option<DateTime<Utc>> = None;
                let mut description: Option<String> = None;
                let mut notes: Option<String> = None;
                let mut tags: Option<Vec<Tag>> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "state" => label = Some(map.next_value()?),
                        "date" => date = Some(map.next_value()?),
                        "description" => description = Some(map.next_value()?),
                        "notes" => notes = map.next_value()?,
                        "tags" => tags = Some(map.next_value()?),
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }

                let label = label.ok_or_else(|| de::Error::missing_field("state"))?;
                let state = state_from_parts(&label, date)?;
                let description =
                    description.ok_or_else(|| de::Error::missing_field("description"))?;
                let tags = tags.ok_or_else(|| de::Error::missing_field("tags"))?;

                Ok(Task {
                    state,
                    description,
                    notes,
                    tags,
                })
            }
        }

        deserializer.deserialize_map(TaskVisitor)
    }
}

/// Distinct tags derived from a [`Tasks`] collection
pub type Tags = Vec<Tag>;

/// Ordered collection of tasks keyed by id
///
/// Backed by a `BTreeMap`. Ids are issued in strictly increasing order,
/// so id order equals insertion order, which keeps listings stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tasks(BTreeMap<Id, Task>);

impl Tasks {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Stores `task` under `id`, returning any previous task
    pub fn insert(&mut self, id: Id, task: Task) -> Option<Task> {
        self.0.insert(id, task)
    }

    /// Returns the task under `id`, if any
    pub fn get(&self, id: Id) -> Option<&Task> {
        self.0.get(&id)
    }

    /// Returns the task under `id` mutably, if any
    pub fn get_mut(&mut self, id: Id) -> Option<&mut Task> {
        self.0.get_mut(&id)
    }

    /// Removes and returns the task under `id`, if any
    pub fn remove(&mut self, id: Id) -> Option<Task> {
        self.0.remove(&id)
    }

    /// Returns true if a task is stored under `id`
    pub fn contains(&self, id: Id) -> bool {
        self.0.contains_key(&id)
    }

    /// Returns the number of stored tasks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no tasks are stored
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all tasks in id order
    pub fn iter(&self) -> impl Iterator<Item = (Id, &Task)> {
        self.0.iter().map(|(id, task)| (*id, task))
    }

    /// Returns the largest id currently stored
    pub fn max_id(&self) -> Option<Id> {
        self.0.keys().next_back().copied()
    }

    /// Returns the tasks carrying the given tag, preserving id order
    pub fn with_tag(&self, tag: &Tag) -> Tasks {
        Tasks(
            self.0
                .iter()
                .filter(|(_, task)| task.has_tag(tag))
                .map(|(id, task)| (*id, task.clone()))
                .collect(),
        )
    }

    /// Returns each distinct tag exactly once, in first-seen order
    pub fn tags(&self) -> Tags {
        let mut tags = Vec::new();
        for task in self.0.values() {
            for tag in &task.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }
}

impl<'a> IntoIterator for &'a Tasks {
    type Item = (&'a Id, &'a Task);
    type IntoIter = std::collections::btree_map::Iter<'a, Id, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Id, Task)> for Tasks {
    fn from_iter<I: IntoIterator<Item = (Id, Task)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// One array entry in the tasks document: `{"id": .., "task": ..}`.
struct EntryRef<'a> {
    id: Id,
    task: &'a Task,
}

impl Serialize for EntryRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("task", self.task)?;
        map.end()
    }
}

struct Entry {
    id: Id,
    task: Task,
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = Entry;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map with \"id\" and \"task\" fields")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Entry, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut id: Option<Id> = None;
                let mut task: Option<Task> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "id" => id = Some(map.next_value()?),
                        "task" => task = Some(map.next_value()?),
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                let id = id.ok_or_else(|| de::Error::missing_field("id"))?;
                let task = task.ok_or_else(|| de::Error::missing_field("task"))?;
                Ok(Entry { id, task })
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}

impl Serialize for Tasks {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for (id, task) in &self.0 {
            seq.serialize_element(&EntryRef { id: *id, task })?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Tasks {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TasksVisitor;

        impl<'de> Visitor<'de> for TasksVisitor {
            type Value = Tasks;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an array of {\"id\", \"task\"} objects")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Tasks, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut tasks = BTreeMap::new();
                while let Some(Entry { id, task }) = seq.next_element()? {
                    tasks.insert(id, task);
                }
                Ok(Tasks(tasks))
            }
        }

        deserializer.deserialize_seq(TasksVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tag(label: &str) -> Tag {
        Tag::new(label).unwrap()
    }

    #[test]
    fn tag_rejects_empty_label() {
        assert_eq!(Tag::new(""), Err(TagError::EmptyLabel));
        assert!("".parse::<Tag>().is_err());
        assert!("home".parse::<Tag>().is_ok());
    }

    #[test]
    fn tag_json_shape() {
        let value = serde_json::to_value(tag("home")).unwrap();
        assert_eq!(value, json!({"tag": "home"}));

        let parsed: Tag = serde_json::from_value(json!({"tag": "home"})).unwrap();
        assert_eq!(parsed, tag("home"));
    }

    #[test]
    fn tag_decode_rejects_empty_label() {
        let result = serde_json::from_value::<Tag>(json!({"tag": ""}));
        assert!(result.is_err());
    }

    #[test]
    fn active_state_json_shape() {
        let value = serde_json::to_value(State::Active).unwrap();
        assert_eq!(value, json!({"state": "active"}));
    }

    #[test]
    fn completed_state_json_shape() {
        let date: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let value = serde_json::to_value(State::Completed(date)).unwrap();
        assert_eq!(
            value,
            json!({"state": "completed", "date": "2024-05-01T12:00:00Z"})
        );
    }

    #[test]
    fn state_roundtrip() {
        let date: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        for state in [State::Active, State::Completed(date)] {
            let value = serde_json::to_value(state).unwrap();
            let parsed: State = serde_json::from_value(value).unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn unknown_state_fails_naming_the_bad_value() {
        let result = serde_json::from_value::<State>(json!({"state": "done"}));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("unknown task state 'done'"), "{message}");
    }

    #[test]
    fn completed_state_requires_date() {
        let result = serde_json::from_value::<State>(json!({"state": "completed"}));
        assert!(result.is_err());
    }

    #[test]
    fn complete_is_one_directional() {
        let first: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let later: DateTime<Utc> = "2024-06-01T12:00:00Z".parse().unwrap();

        let mut task = Task::new("Water the plants");
        task.complete(first);
        assert_eq!(task.state, State::Completed(first));

        // Completing again keeps the original timestamp
        task.complete(later);
        assert_eq!(task.state, State::Completed(first));
    }

    #[test]
    fn task_json_shape_with_all_fields() {
        let date: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let mut task = Task::new("Water the plants")
            .with_notes("Front porch first")
            .with_tag(tag("home"));
        task.complete(date);

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            json!({
                "state": "completed",
                "date": "2024-05-01T12:00:00Z",
                "description": "Water the plants",
                "notes": "Front porch first",
                "tags": [{"tag": "home"}],
            })
        );
    }

    #[test]
    fn active_task_omits_date_and_absent_notes() {
        let task = Task::new("Water the plants");
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            json!({
                "state": "active",
                "description": "Water the plants",
                "tags": [],
            })
        );
    }

    #[test]
    fn task_roundtrip() {
        let date: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let mut completed = Task::new("Ship the release")
            .with_tag(tag("work"))
            .with_tag(tag("urgent"));
        completed.complete(date);

        let active = Task::new("Water the plants").with_notes("Front porch first");

        for task in [completed, active] {
            let json = serde_json::to_string(&task).unwrap();
            let parsed: Task = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, task);
        }
    }

    #[test]
    fn task_decode_ignores_unknown_fields() {
        let task: Task = serde_json::from_value(json!({
            "state": "active",
            "description": "Water the plants",
            "tags": [],
            "color": "green",
        }))
        .unwrap();
        assert_eq!(task.description, "Water the plants");
    }

    #[test]
    fn task_decode_requires_description() {
        let result = serde_json::from_value::<Task>(json!({
            "state": "active",
            "tags": [],
        }));
        assert!(result.is_err());
    }

    #[test]
    fn null_notes_decode_as_absent() {
        let task: Task = serde_json::from_value(json!({
            "state": "active",
            "description": "Water the plants",
            "notes": null,
            "tags": [],
        }))
        .unwrap();
        assert_eq!(task.notes, None);
    }

    #[test]
    fn tasks_json_shape() {
        let mut tasks = Tasks::new();
        tasks.insert(Id::new(0), Task::new("First"));
        tasks.insert(Id::new(1), Task::new("Second"));

        let value = serde_json::to_value(&tasks).unwrap();
        assert_eq!(
            value,
            json!([
                {"id": 0, "task": {"state": "active", "description": "First", "tags": []}},
                {"id": 1, "task": {"state": "active", "description": "Second", "tags": []}},
            ])
        );

        let parsed: Tasks = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, tasks);
    }

    #[test]
    fn with_tag_filters_preserving_order() {
        let mut tasks = Tasks::new();
        tasks.insert(Id::new(0), Task::new("First").with_tag(tag("home")));
        tasks.insert(Id::new(1), Task::new("Second").with_tag(tag("work")));
        tasks.insert(Id::new(2), Task::new("Third").with_tag(tag("home")));

        let home = tasks.with_tag(&tag("home"));
        let ids: Vec<Id> = home.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![Id::new(0), Id::new(2)]);
    }

    #[test]
    fn tags_are_deduplicated() {
        let mut tasks = Tasks::new();
        tasks.insert(
            Id::new(0),
            Task::new("First").with_tag(tag("home")).with_tag(tag("work")),
        );
        tasks.insert(Id::new(1), Task::new("Second").with_tag(tag("home")));

        assert_eq!(tasks.tags(), vec![tag("home"), tag("work")]);
    }

    #[test]
    fn max_id_tracks_largest_key() {
        let mut tasks = Tasks::new();
        assert_eq!(tasks.max_id(), None);

        tasks.insert(Id::new(3), Task::new("Late"));
        tasks.insert(Id::new(1), Task::new("Early"));
        assert_eq!(tasks.max_id(), Some(Id::new(3)));
    }
}
