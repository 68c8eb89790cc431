use crate::badge::{Severity, deadline_badge};
use crate::config::{Config, Palette, palette_for_theme};
use crate::error::AppError;
use crate::model::{Task, TaskId};
use time::OffsetDateTime;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "LEAVES_DISABLE_NOTIFICATIONS";

/// Short-lived toast messages.
pub trait Notifier {
    fn notify(&self, message: &str) -> Result<(), AppError>;

    /// Toast about one task. Desktop notifiers attach an "Open" action.
    fn notify_task(&self, task: &Task, message: &str) -> Result<(), AppError> {
        let _ = task;
        self.notify(message)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, message: &str) -> Result<(), AppError> {
        (**self).notify(message)
    }

    fn notify_task(&self, task: &Task, message: &str) -> Result<(), AppError> {
        (**self).notify_task(task, message)
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _message: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Prints toasts on stdout.
pub struct ConsoleNotifier {
    palette: Palette,
}

impl ConsoleNotifier {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) -> Result<(), AppError> {
        println!("{}", self.palette.accentize(&format!("» {message}")));
        Ok(())
    }
}

/// Console toasts, or desktop notifications when the config asks for them
/// and the platform supports it.
pub fn notifier_from_config(config: &Config) -> Box<dyn Notifier> {
    let console = || Box::new(ConsoleNotifier::new(palette_for_theme(config.theme.as_deref())));
    if !config.desktop_notifications || std::env::var(DISABLE_ENV_VAR).is_ok() {
        return console();
    }

    match platform_notifier() {
        Ok(notifier) => notifier,
        Err(err) => {
            tracing::warn!(error = %err, "desktop notifications unavailable, using console");
            console()
        }
    }
}

const ACTION_PREFIX: &str = "show:";

pub fn activation_argument(task_id: TaskId) -> String {
    format!("{ACTION_PREFIX}{task_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<TaskId> {
    argument
        .strip_prefix(ACTION_PREFIX)
        .and_then(|id| id.parse().ok())
}

/// Re-launches the current executable as `show <id>`.
pub fn launch_show(task_id: TaskId) -> Result<(), AppError> {
    let exe = std::env::current_exe().map_err(|err| AppError::io(err.to_string()))?;
    std::process::Command::new(exe)
        .arg("show")
        .arg(task_id.to_string())
        .spawn()
        .map_err(|err| AppError::io(err.to_string()))?;
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: TaskId,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct DueOutcome {
    pub notified: Vec<TaskId>,
    pub failures: Vec<NotificationFailure>,
}

/// Sends a "time's up" toast for every pending task whose deadline passed.
pub fn notify_due(tasks: &[Task], now: OffsetDateTime, notifier: &dyn Notifier) -> DueOutcome {
    let mut outcome = DueOutcome::default();

    for task in tasks.iter().filter(|task| task.is_pending()) {
        let Some(badge) = deadline_badge(task, now) else {
            continue;
        };
        if badge.severity != Severity::Urgent {
            continue;
        }

        let message = format!("{}: {}", task.description(), badge.text);
        match notifier.notify_task(task, &message) {
            Ok(()) => outcome.notified.push(task.id()),
            Err(error) => {
                tracing::warn!(id = %task.id(), error = %error, "notification failed");
                outcome.failures.push(NotificationFailure {
                    task_id: task.id(),
                    error,
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::{Notifier, activation_argument, notify_due, parse_activation_argument};
    use crate::error::AppError;
    use crate::model::{Task, TaskId};
    use std::cell::RefCell;
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    const NOW: OffsetDateTime = datetime!(2025-12-20 12:00 UTC);

    #[derive(Default)]
    struct MockNotifier {
        messages: RefCell<Vec<String>>,
    }

    impl Notifier for MockNotifier {
        fn notify(&self, message: &str) -> Result<(), AppError> {
            self.messages.borrow_mut().push(message.to_string());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _message: &str) -> Result<(), AppError> {
            Err(AppError::io("no display"))
        }
    }

    fn task(id: u64, description: &str, due_in: Option<Duration>) -> Task {
        Task::new(
            TaskId::new(id),
            description,
            due_in.map(|offset| NOW + offset),
            datetime!(2025-12-01 00:00 UTC),
        )
        .unwrap()
    }

    #[test]
    fn activation_argument_round_trip() {
        let argument = activation_argument(TaskId::new(12));
        assert_eq!(parse_activation_argument(&argument), Some(TaskId::new(12)));
        assert!(parse_activation_argument("other:12").is_none());
        assert!(parse_activation_argument("show:abc").is_none());
    }

    #[test]
    fn notify_due_selects_pending_overdue_tasks() {
        let mut done = task(4, "finished", Some(Duration::hours(-2)));
        done.toggle_status();
        let tasks = vec![
            task(1, "overdue", Some(Duration::minutes(-5))),
            task(2, "later", Some(Duration::hours(3))),
            task(3, "undated", None),
            done,
        ];
        let notifier = MockNotifier::default();

        let outcome = notify_due(&tasks, NOW, &notifier);

        assert_eq!(outcome.notified, vec![TaskId::new(1)]);
        assert!(outcome.failures.is_empty());
        assert_eq!(
            notifier.messages.borrow().clone(),
            vec!["overdue: time's up".to_string()]
        );
    }

    #[test]
    fn notify_due_reports_failures() {
        let tasks = vec![task(1, "overdue", Some(Duration::minutes(-5)))];

        let outcome = notify_due(&tasks, NOW, &FailingNotifier);

        assert!(outcome.notified.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].task_id, TaskId::new(1));
        assert!(outcome.failures[0].error.message().contains("no display"));
    }
}
