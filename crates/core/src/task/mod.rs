//! Task module
//!
//! This module contains task-related types, the per-user repository
//! interface and the local store implementations.

mod file_store;
mod memory_store;
mod model;
mod repository;

pub use file_store::FileTaskStore;
pub use memory_store::InMemoryTaskStore;
pub use model::*;
pub use repository::TaskRepository;
