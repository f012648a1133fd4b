pub mod constants;
pub mod coordinates;
pub mod dates;
pub mod progress;

pub use constants::*;
pub use coordinates::{format_coordinate, location_label, parse_coordinate};
pub use dates::parse_date;
pub use progress::ProgressReporter;
