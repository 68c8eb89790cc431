use crate::model::{Task, TaskStatus};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Urgent,
    Warning,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: String,
    pub severity: Severity,
}

impl Badge {
    fn new<T: Into<String>>(text: T, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

/// Time-remaining label for a task's deadline, evaluated against `now`.
pub fn deadline_badge(task: &Task, now: OffsetDateTime) -> Option<Badge> {
    let deadline = task.deadline()?;
    let remaining = deadline - now;
    if remaining <= time::Duration::ZERO {
        return Some(Badge::new("time's up", Severity::Urgent));
    }

    let minutes = remaining.whole_minutes();
    if minutes < 60 {
        return Some(Badge::new(format!("{minutes} minutes left"), Severity::Warning));
    }

    let hours = minutes / 60;
    if hours < 24 {
        return Some(Badge::new(
            format!("{hours} {} left", plural(hours, "hour")),
            Severity::Neutral,
        ));
    }

    let days = hours / 24;
    Some(Badge::new(
        format!("{days} {} left", plural(days, "day")),
        Severity::Neutral,
    ))
}

fn plural(count: i64, unit: &str) -> String {
    if count > 1 {
        format!("{unit}s")
    } else {
        unit.to_string()
    }
}

pub fn status_badge(status: TaskStatus) -> Badge {
    match status {
        TaskStatus::Pending => Badge::new("Pending", Severity::Neutral),
        TaskStatus::Completed => Badge::new("Completed", Severity::Neutral),
    }
}

/// Whether a periodic refresh would change anything on screen: some pending
/// task carries a deadline.
pub fn needs_refresh(tasks: &[Task]) -> bool {
    tasks
        .iter()
        .any(|task| task.is_pending() && task.deadline().is_some())
}
