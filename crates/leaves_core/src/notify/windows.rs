use crate::error::AppError;
use crate::model::Task;
use crate::notify::{Notifier, activation_argument, launch_show, parse_activation_argument};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, message: &str) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title("Leaves")
            .text1(message)
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }

    fn notify_task(&self, task: &Task, message: &str) -> Result<(), AppError> {
        let task_id = task.id();
        let action = activation_argument(task_id);

        Toast::new(Toast::POWERSHELL_APP_ID)
            .title("Leaves")
            .text1(message)
            .add_button("Open", &action)
            .on_activated(move |args| {
                let target = args
                    .as_deref()
                    .and_then(parse_activation_argument)
                    .unwrap_or(task_id);
                if let Err(err) = launch_show(target) {
                    tracing::warn!(error = %err, "failed to open task");
                }
                Ok(())
            })
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }
}
