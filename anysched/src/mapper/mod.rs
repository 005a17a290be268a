//! Backend record → unified record translation

pub mod kubernetes;
pub mod marathon;

use crate::models::Task;

/// Stable ascending sort by ready time
///
/// Tasks without a ready time compare equal to each other and go last.
pub fn sort_tasks_by_ready_time(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (task.ready_time.is_none(), task.ready_time));
}
