pub mod relation;
pub mod sqlite;
pub mod traits;

pub use relation::{OnDelete, Relation};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageRead, StorageTx, StorageWrite};
