use crate::error::AppError;
use crate::model::{Task, TaskId, TaskRecord, validate_description};
use crate::storage::KeyValueStore;
use std::collections::HashSet;
use time::OffsetDateTime;

pub const DEFAULT_STORE_KEY: &str = "autumn_leaves_notes";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub deadline: Option<OffsetDateTime>,
}

impl NewTask {
    pub fn new<D: Into<String>>(description: D) -> Self {
        Self {
            description: description.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<OffsetDateTime>) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Ordered collection of active tasks backed by a key-value slot.
///
/// Every mutation writes the whole collection back before returning. Reads
/// hand out shared borrows only, so nothing outside the store can change a
/// task without going through a persisting operation.
#[derive(Debug)]
pub struct TaskStore<S> {
    backend: S,
    key: String,
    tasks: Vec<Task>,
    last_id: u64,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new<K: Into<String>>(backend: S, key: K) -> Self {
        Self {
            backend,
            key: key.into(),
            tasks: Vec::new(),
            last_id: 0,
        }
    }

    /// Creates the store and loads whatever the backend holds.
    pub fn open<K: Into<String>>(backend: S, key: K) -> Result<Self, AppError> {
        let mut store = Self::new(backend, key);
        store.load()?;
        Ok(store)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn find_by_id(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    pub fn create(&mut self, new_task: NewTask) -> Result<Task, AppError> {
        let description = validate_description(&new_task.description)?;
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| AppError::invalid_data("task id sequence exhausted"))?;
        let id = TaskId::new(next);
        let task = Task::new(
            id,
            &description,
            new_task.deadline,
            OffsetDateTime::now_utc(),
        )?;

        self.last_id = id.get();
        self.tasks.push(task.clone());
        self.save()?;

        tracing::debug!(id = %id, "created task");
        Ok(task)
    }

    pub fn edit(&mut self, id: TaskId, new_description: &str) -> Result<Task, AppError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id() == id)
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))?;
        task.update_description(new_description)?;
        let updated = task.clone();
        self.save()?;

        Ok(updated)
    }

    /// Soft-deletes and drops the task. Unknown ids are ignored.
    pub fn remove(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        let Some(index) = self.tasks.iter().position(|task| task.id() == id) else {
            tracing::debug!(id = %id, "remove ignored unknown task");
            return Ok(None);
        };

        let mut removed = self.tasks.remove(index);
        removed.soft_delete();
        self.save()?;

        Ok(Some(removed))
    }

    /// Flips pending/completed. Unknown ids are ignored.
    pub fn toggle(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id() == id) else {
            tracing::debug!(id = %id, "toggle ignored unknown task");
            return Ok(None);
        };

        task.toggle_status();
        let updated = task.clone();
        self.save()?;

        Ok(Some(updated))
    }

    pub fn clear_all(&mut self) -> Result<(), AppError> {
        self.tasks.clear();
        self.save()
    }

    pub fn save(&self) -> Result<(), AppError> {
        let records: Vec<TaskRecord> = self.tasks.iter().map(Task::to_record).collect();
        let content = serde_json::to_string_pretty(&records)?;
        self.backend.write(&self.key, &content)?;
        self.backend
            .write(&self.sequence_key(), &self.last_id.to_string())?;

        tracing::debug!(key = %self.key, tasks = records.len(), "saved tasks");
        Ok(())
    }

    /// Replaces the active collection with the stored one. Entries flagged
    /// deleted never come back; malformed entries are skipped.
    pub fn load(&mut self) -> Result<(), AppError> {
        let entries: Vec<serde_json::Value> = match self.backend.read(&self.key)? {
            Some(content) if !content.trim().is_empty() => serde_json::from_str(&content)
                .map_err(|err| {
                    AppError::invalid_data(format!("stored tasks under '{}': {err}", self.key))
                })?,
            _ => Vec::new(),
        };

        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if entry.is_null() || entry.get("deleted").and_then(|v| v.as_bool()) == Some(true) {
                continue;
            }

            let task = serde_json::from_value::<TaskRecord>(entry)
                .map_err(AppError::from)
                .and_then(Task::from_record);
            match task {
                Ok(task) if seen.insert(task.id()) => tasks.push(task),
                Ok(task) => {
                    tracing::warn!(index, id = %task.id(), "skipping duplicate stored task");
                }
                Err(err) => {
                    tracing::warn!(index, error = %err, "skipping malformed stored task");
                }
            }
        }

        let highest_loaded = tasks.iter().map(|task| task.id().get()).max().unwrap_or(0);
        self.last_id = self.stored_sequence()?.max(highest_loaded);
        self.tasks = tasks;

        tracing::debug!(key = %self.key, tasks = self.tasks.len(), "loaded tasks");
        Ok(())
    }

    fn sequence_key(&self) -> String {
        format!("{}.seq", self.key)
    }

    fn stored_sequence(&self) -> Result<u64, AppError> {
        let Some(raw) = self.backend.read(&self.sequence_key())? else {
            return Ok(0);
        };
        match raw.trim().parse::<u64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(key = %self.sequence_key(), "ignoring malformed id sequence");
                Ok(0)
            }
        }
    }
}
