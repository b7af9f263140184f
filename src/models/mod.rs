mod forms;
mod record;
mod task;
mod timestamp;

pub use forms::{FilterQuery, PointerForm, SubmitForm};
pub use record::Record;
pub use task::{CreateTaskRequest, CreatedTask, Task, TaskStatus};
