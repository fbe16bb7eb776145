mod notification;
mod storage;

pub use notification::NotificationConfiguration;
pub use storage::{JsonFileStorage, OpenStorageError};
