pub mod task;
pub mod user;

pub use task::{
    total_pages, Task, TaskInput, TaskListQuery, TaskPage, TaskPriority, TaskSearchPage,
    TaskSearchQuery, TaskStatus, TaskUpdate,
};
pub use user::User;
