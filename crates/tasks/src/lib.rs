//! Staff to-do items.

pub mod task;

pub use task::{NewTask, Task, TaskFilter, TaskPriority, TaskUpdate, upcoming_tasks};
