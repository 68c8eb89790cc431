use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Shortest description accepted after trimming, counted in characters.
pub const MIN_DESCRIPTION_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("id is required"));
        }
        trimmed
            .parse::<u64>()
            .map(TaskId)
            .map_err(|_| AppError::invalid_input(format!("'{trimmed}' is not a task id")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    fn flipped(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

/// Durable shape of a task. Field names are the storage format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub description: String,
    pub status: TaskStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    #[serde(default)]
    pub deleted: bool,
}

/// A single note. Fields are private so every write goes through the
/// validating mutators below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    description: String,
    status: TaskStatus,
    created_at: OffsetDateTime,
    deadline: Option<OffsetDateTime>,
    deleted: bool,
}

/// Trims `text` and checks the minimum length, returning the trimmed value.
pub fn validate_description(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_DESCRIPTION_LEN {
        return Err(AppError::validation(format!(
            "description must be at least {MIN_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

impl Task {
    pub fn new(
        id: TaskId,
        description: &str,
        deadline: Option<OffsetDateTime>,
        created_at: OffsetDateTime,
    ) -> Result<Self, AppError> {
        Ok(Self {
            id,
            description: validate_description(description)?,
            status: TaskStatus::Pending,
            created_at,
            deadline,
            deleted: false,
        })
    }

    /// Rebuilds a task from its stored record, keeping id and timestamps.
    pub fn from_record(record: TaskRecord) -> Result<Self, AppError> {
        Ok(Self {
            id: record.id,
            description: validate_description(&record.description)?,
            status: record.status,
            created_at: record.created_at,
            deadline: record.deadline,
            deleted: record.deleted,
        })
    }

    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            id: self.id,
            description: self.description.clone(),
            status: self.status,
            created_at: self.created_at,
            deadline: self.deadline,
            deleted: self.deleted,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn deadline(&self) -> Option<OffsetDateTime> {
        self.deadline
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn toggle_status(&mut self) {
        self.status = self.status.flipped();
    }

    pub fn update_description(&mut self, text: &str) -> Result<(), AppError> {
        self.description = validate_description(text)?;
        Ok(())
    }

    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskId, TaskRecord, TaskStatus, validate_description};
    use time::macros::datetime;

    fn demo_task() -> Task {
        Task::new(
            TaskId::new(1),
            "  Buy milk  ",
            Some(datetime!(2025-12-21 09:00 UTC)),
            datetime!(2025-12-20 00:00 UTC),
        )
        .unwrap()
    }

    #[test]
    fn new_task_is_pending_and_trimmed() {
        let task = demo_task();

        assert_eq!(task.id(), TaskId::new(1));
        assert_eq!(task.description(), "Buy milk");
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(!task.is_deleted());
    }

    #[test]
    fn new_task_rejects_short_description() {
        let err = Task::new(TaskId::new(1), " ab ", None, datetime!(2025-12-20 00:00 UTC))
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn validate_description_counts_characters_not_bytes() {
        assert_eq!(validate_description("ñé").unwrap_err().code(), "validation_error");
        assert_eq!(validate_description(" ñéü ").unwrap(), "ñéü");
    }

    #[test]
    fn toggle_status_twice_restores_status() {
        let mut task = demo_task();
        task.toggle_status();
        assert_eq!(task.status(), TaskStatus::Completed);
        task.toggle_status();
        assert_eq!(task.status(), TaskStatus::Pending);
    }

    #[test]
    fn update_description_failure_keeps_old_text() {
        let mut task = demo_task();
        let err = task.update_description("  x ").unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert_eq!(task.description(), "Buy milk");

        task.update_description(" Buy oat milk ").unwrap();
        assert_eq!(task.description(), "Buy oat milk");
    }

    #[test]
    fn soft_delete_is_idempotent() {
        let mut task = demo_task();
        task.soft_delete();
        task.soft_delete();
        assert!(task.is_deleted());
    }

    #[test]
    fn record_serializes_all_six_fields() {
        let value = serde_json::to_value(demo_task().to_record()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "id": 1,
                "description": "Buy milk",
                "status": "pending",
                "created_at": "2025-12-20T00:00:00Z",
                "deadline": "2025-12-21T09:00:00Z",
                "deleted": false
            })
        );
    }

    #[test]
    fn from_record_preserves_identity_and_timestamps() {
        let mut task = demo_task();
        task.toggle_status();
        let rebuilt = Task::from_record(task.to_record()).unwrap();

        assert_eq!(rebuilt, task);
    }

    #[test]
    fn record_without_optional_fields_defaults() {
        let record: TaskRecord = serde_json::from_value(serde_json::json!({
            "id": 7,
            "description": "demo",
            "status": "completed",
            "created_at": "2025-12-20T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.deadline, None);
        assert!(!record.deleted);
        assert_eq!(record.status, TaskStatus::Completed);
    }

    #[test]
    fn task_id_parses_from_text() {
        assert_eq!(" 42 ".parse::<TaskId>().unwrap(), TaskId::new(42));
        assert_eq!("".parse::<TaskId>().unwrap_err().code(), "invalid_input");
        assert_eq!("abc".parse::<TaskId>().unwrap_err().code(), "invalid_input");
    }
}
