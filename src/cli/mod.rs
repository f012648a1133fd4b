pub mod args;
pub mod commands;
pub mod logging;

pub use args::{Cli, Commands};
pub use commands::{run, DashboardReport};
pub use logging::init_logging;
