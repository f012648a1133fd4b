use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smoke-signal")]
#[command(about = "Prepare and query SmokeSignal wildfire PM2.5 forecasts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file [default: smoke-signal.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare the source file and print the preparation report
    Inspect {
        #[arg(
            short,
            long,
            help = "Input CSV or zip archive [default: final_predictions.csv.zip]"
        )]
        input: Option<PathBuf>,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },

    /// Show the dashboard view for a date, region and location
    View {
        #[arg(short, long, help = "Input CSV or zip archive")]
        input: Option<PathBuf>,

        #[arg(short, long, help = "Date to display (YYYY-MM-DD) [default: earliest]")]
        date: Option<String>,

        #[arg(short, long, default_value = "All", help = "Region name, or 'All'")]
        region: String,

        #[arg(short, long, help = "Location label [default: first on the day]")]
        location: Option<String>,

        #[arg(long, help = "Print the view as JSON")]
        json: bool,
    },

    /// Print the actual-vs-predicted time series for one location
    Series {
        #[arg(short, long, help = "Input CSV or zip archive")]
        input: Option<PathBuf>,

        #[arg(short, long, help = "Location label, e.g. '38.5, -121.3'")]
        location: String,

        #[arg(long, help = "Print the series as JSON")]
        json: bool,
    },

    /// Poll the source and re-prepare it whenever its content changes
    Watch {
        #[arg(short, long, help = "Input CSV or zip archive")]
        input: Option<PathBuf>,

        #[arg(long, help = "Polling interval in seconds")]
        interval: Option<u64>,

        #[arg(long, help = "Stop after this many polls (0 = forever)", default_value = "0")]
        max_polls: u64,
    },
}
