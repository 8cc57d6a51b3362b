pub mod memory;
pub mod persistence;
pub mod source;
pub mod table;

pub use memory::InMemorySnapshotStore;
pub use persistence::{SnapshotManager, SnapshotMetadata, StoreSnapshot};
pub use source::SnapshotSource;
pub use table::{check_partition, CumulativeTable, HistoryTable};
