pub mod drivers;
pub mod hazard;
pub mod metrics;
pub mod views;

pub use drivers::{DriverInsight, DriverNarrative};
pub use hazard::HazardLevel;
pub use metrics::{location_series, HazardCounts, PointMetrics, SeriesPoint, SliceSummary};
pub use views::{Selection, SelectionView, ViewSelector};
