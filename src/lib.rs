// todostore - embedded to-do task persistence with incremental list views

pub mod error;
pub mod events;
pub mod json;
pub mod models;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use events::{EventBus, SubscriptionId, TaskEvent};
pub use models::{NewTask, Partition, Task, TaskFilter, TaskRecord};
pub use store::TaskStore;
pub use view::TaskViewState;

// Re-export rusqlite for callers that need engine-level error details
pub use rusqlite;
