use crate::error::AppError;
use crate::model::Task;
use crate::notify::{Notifier, activation_argument, launch_show};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, message: &str) -> Result<(), AppError> {
        Notification::new()
            .summary("Leaves")
            .body(message)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }

    fn notify_task(&self, task: &Task, message: &str) -> Result<(), AppError> {
        let action = activation_argument(task.id());
        let handle = Notification::new()
            .summary("Leaves")
            .body(message)
            .action(&action, "Open")
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        let task_id = task.id();
        std::thread::spawn(move || {
            handle.wait_for_action(|selected| {
                if selected == action || selected == "default" {
                    if let Err(err) = launch_show(task_id) {
                        tracing::warn!(error = %err, "failed to open task");
                    }
                }
            });
        });

        Ok(())
    }
}
