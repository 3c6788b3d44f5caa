pub mod engine;
pub mod persistence;
pub mod table;

pub use engine::StorageEngine;
pub use persistence::SnapshotStore;
pub use table::{NamedRow, Row, Table, TableSchema};
