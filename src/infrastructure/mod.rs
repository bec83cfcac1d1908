pub mod storage;

pub use storage::{LocalStorage, MemoryStorage, StorageReader};
