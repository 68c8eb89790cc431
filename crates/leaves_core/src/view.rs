use crate::error::AppError;
use crate::model::{Task, TaskId, TaskStatus};
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            Self::All => true,
            Self::Pending => status == TaskStatus::Pending,
            Self::Completed => status == TaskStatus::Completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(AppError::invalid_input(format!(
                "unknown filter '{other}' (expected all, pending or completed)"
            ))),
        }
    }
}

/// Transient presentation state. Each change produces a new value; a render
/// only ever reads one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    search: String,
    filter: StatusFilter,
    editing: Option<TaskId>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    pub fn is_editing(&self, id: TaskId) -> bool {
        self.editing == Some(id)
    }

    /// Edit affordances are disabled everywhere while one task is in edit mode.
    pub fn edit_controls_enabled(&self) -> bool {
        self.editing.is_none()
    }

    pub fn with_search<T: Into<String>>(&self, search: T) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn with_filter(&self, filter: StatusFilter) -> Self {
        Self {
            filter,
            ..self.clone()
        }
    }

    /// Enters edit mode for `id`. Refused while another task is being edited.
    pub fn begin_edit(&self, id: TaskId) -> Self {
        if !self.edit_controls_enabled() {
            return self.clone();
        }
        Self {
            editing: Some(id),
            ..self.clone()
        }
    }

    pub fn cancel_edit(&self) -> Self {
        Self {
            editing: None,
            ..self.clone()
        }
    }

    /// Commits the edited text. On failure the caller keeps `self`, which is
    /// still in edit mode.
    pub fn confirm_edit<S: KeyValueStore>(
        &self,
        store: &mut TaskStore<S>,
        text: &str,
    ) -> Result<Self, AppError> {
        let id = self
            .editing
            .ok_or_else(|| AppError::invalid_input("no task is being edited"))?;
        store.edit(id, text)?;
        Ok(self.cancel_edit())
    }
}

/// Tasks matching the search text and status filter, in store order.
pub fn visible_tasks<'a>(tasks: &'a [Task], state: &ViewState) -> Vec<&'a Task> {
    let needle = state.search.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| task.description().to_lowercase().contains(&needle))
        .filter(|task| state.filter.matches(task.status()))
        .collect()
}
