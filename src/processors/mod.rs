pub mod cache;
pub mod pipeline;
pub mod report;

pub use cache::{CacheStatus, CachedLoad, TableCache};
pub use pipeline::{DataPreparer, PreparedTable};
pub use report::{DropReason, DroppedRow, PreparationReport};
