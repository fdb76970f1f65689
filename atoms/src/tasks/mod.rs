// Re-export model types and store implementations
pub mod memory;
pub mod model;
pub mod service;

pub use memory::MemoryRecordStore;
pub use model::{
    CreateTaskPayload, Task, TaskChanges, TaskKey, TaskStatus, TaskView, UpdateTaskPayload,
};
pub use service::{DynamoRecordStore, RecordStore};
