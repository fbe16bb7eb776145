pub mod notification;
pub mod storage;

pub use notification::{GetNotificationError, NotificationRepository};
pub use storage::{StorageChange, StorageError, StorageKey, StorageRepository};
