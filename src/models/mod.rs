pub mod task;
pub mod user;

pub use task::{
    parse_datetime, CreateTaskInput, NewTask, Task, TaskStatus, UpdateStatusInput, UpdateTaskInput,
};
pub use user::{CurrentUser, NewUser, PublicUser, User, UserRole};
