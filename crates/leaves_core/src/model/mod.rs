mod task;

pub use task::{MIN_DESCRIPTION_LEN, Task, TaskId, TaskRecord, TaskStatus, validate_description};
