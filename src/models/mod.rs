pub mod label;
pub mod named;
pub mod status;
pub mod task;
pub mod user;

pub use label::Label;
pub use named::NameInput;
pub use status::Status;
pub use task::{CleanError, Task, TaskChanges, TaskCriteria, TaskDetail, TaskFilter, TaskInput, TaskRow};
pub use user::{User, UserInput};
