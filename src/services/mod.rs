mod backend;
mod http_backend;
mod task_store;
#[cfg(test)]
pub mod testing;

pub use backend::{with_timeout, TaskBackend};
pub use http_backend::HttpBackend;
pub use task_store::TaskStore;
