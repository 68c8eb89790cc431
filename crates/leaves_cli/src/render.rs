use leaves_core::badge::{deadline_badge, status_badge};
use leaves_core::config::Palette;
use leaves_core::error::AppError;
use leaves_core::model::{Task, TaskStatus};
use leaves_core::view::ViewState;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const EMPTY_STATE: &str = "No notes yet. Add one to get started.";

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = " ")]
    check: &'static str,
    #[tabled(rename = "Note")]
    description: String,
    #[tabled(rename = "Added")]
    added: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
}

pub fn format_timestamp(value: OffsetDateTime, offset: UtcOffset) -> Result<String, AppError> {
    value
        .to_offset(offset)
        .format(format_description!(
            "[day]/[month]/[year] [hour]:[minute]"
        ))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn check_mark(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::Completed => "[x]",
    }
}

/// Table of the visible tasks. The task being edited is marked with `*`.
pub fn render_table(
    tasks: &[&Task],
    view: &ViewState,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<String, AppError> {
    if tasks.is_empty() {
        return Ok(EMPTY_STATE.to_string());
    }

    let mut rows = Vec::with_capacity(tasks.len());
    for task in tasks {
        let marker = if view.is_editing(task.id()) { "* " } else { "" };
        rows.push(TaskRow {
            id: task.id().get(),
            check: check_mark(task.status()),
            description: format!("{marker}{}", task.description()),
            added: format_timestamp(task.created_at(), offset)?,
            deadline: deadline_badge(task, now)
                .map(|badge| badge.text)
                .unwrap_or_else(|| "-".to_string()),
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::psql());
    Ok(table.to_string())
}

/// Multi-line detail view for one task.
pub fn render_detail(
    task: &Task,
    now: OffsetDateTime,
    offset: UtcOffset,
    palette: &Palette,
) -> Result<String, AppError> {
    let mut lines = vec![
        format!("{} {}", palette.accentize(&format!("#{}", task.id())), task.description()),
        format!("  status:   {}", status_badge(task.status()).text),
        palette.mutedize(&format!(
            "  added:    {}",
            format_timestamp(task.created_at(), offset)?
        )),
    ];

    if let Some(deadline) = task.deadline() {
        let badge = deadline_badge(task, now)
            .map(|badge| format!(" ({})", palette.severity(badge.severity, &badge.text)))
            .unwrap_or_default();
        lines.push(format!(
            "  deadline: {}{}",
            format_timestamp(deadline, offset)?,
            badge
        ));
    }

    Ok(lines.join("\n"))
}

pub fn task_json(task: &Task, now: OffsetDateTime) -> serde_json::Value {
    let mut value = serde_json::to_value(task.to_record()).unwrap_or(serde_json::Value::Null);
    if let Some(object) = value.as_object_mut() {
        object.remove("deleted");
        object.insert(
            "badge".to_string(),
            serde_json::to_value(deadline_badge(task, now)).unwrap_or(serde_json::Value::Null),
        );
    }
    value
}

pub fn tasks_json(tasks: &[&Task], now: OffsetDateTime) -> serde_json::Value {
    serde_json::Value::Array(tasks.iter().map(|task| task_json(task, now)).collect())
}
