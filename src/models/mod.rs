pub mod observation;
pub mod region;
pub mod table;

pub use observation::{ErrorMetrics, FeatureValues, ObservationRecord};
pub use region::{parse_state_id, region_label, RegionFilter};
pub use table::{Capabilities, CleanedTable};
