use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analyzers::{
    location_series, DriverNarrative, PointMetrics, Selection, SelectionView, SliceSummary,
    ViewSelector,
};
use crate::cli::args::{Cli, Commands};
use crate::cli::logging::init_logging;
use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{CleanedTable, RegionFilter};
use crate::processors::{CachedLoad, DataPreparer, TableCache};
use crate::readers::SourceReader;
use crate::utils::dates::parse_date;
use crate::utils::progress::ProgressReporter;

/// Everything printed by `view`
#[derive(Debug, Serialize)]
pub struct DashboardReport<'a> {
    pub view: SelectionView<'a>,
    pub point_metrics: Option<PointMetrics>,
    pub summary: SliceSummary,
    pub narrative: Option<DriverNarrative>,
}

impl<'a> DashboardReport<'a> {
    pub fn build(table: &'a CleanedTable, selection: &Selection, settings: &Settings) -> Self {
        let view = ViewSelector::new(table).select(selection);
        let point_metrics = view
            .point
            .map(|record| PointMetrics::from_record(record, &settings.hazard));
        let summary = SliceSummary::from_records(&view.region_slice, &settings.hazard);
        let narrative = view
            .point
            .and_then(|record| DriverNarrative::for_record(record, &table.capabilities()));

        Self {
            view,
            point_metrics,
            summary,
            narrative,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let selection = &self.view.selection;

        out.push_str(&format!("=== SmokeSignal: {} ===\n", selection.date));
        let region = match &selection.region {
            RegionFilter::All => "All Regions",
            RegionFilter::Only(label) => label.as_str(),
        };
        out.push_str(&format!("Region: {}\n", region));

        if self.view.is_empty() {
            out.push_str("No data for this selection.\n");
            return out;
        }

        out.push_str(&format!(
            "Regions on this day: {}\n",
            self.view.region_options.join(" | ")
        ));
        out.push_str(&format!(
            "Locations in view: {}\n",
            self.view.location_options.len()
        ));

        match (&selection.location, &self.point_metrics) {
            (Some(location), Some(metrics)) => {
                out.push_str(&format!("\nLocation: {}\n", location));
                out.push_str(&format!(
                    "  Predicted PM2.5: {}\n",
                    fmt_optional(metrics.predicted_pm25)
                ));
                out.push_str(&format!(
                    "  Actual PM2.5: {}\n",
                    fmt_optional(metrics.actual_pm25)
                ));
                if let Some(error) = metrics.error {
                    out.push_str(&format!("  Error: {:+.1}\n", error));
                }
                if let Some(hazard) = metrics.hazard {
                    out.push_str(&format!("  Status: {} ({})\n", hazard, hazard.color()));
                }
            }
            (Some(location), None) => {
                out.push_str(&format!("\nLocation {} has no data for this selection.\n", location));
            }
            _ => {}
        }

        let summary = &self.summary;
        out.push_str(&format!("\nRows in view: {}\n", summary.rows));
        if let Some(mae) = summary.mean_absolute_error {
            out.push_str(&format!(
                "Mean absolute error: {:.2} over {} rows\n",
                mae, summary.rows_with_metrics
            ));
        }
        if let Some(bias) = summary.mean_error {
            out.push_str(&format!("Mean error (bias): {:+.2}\n", bias));
        }
        if let Some(max) = summary.max_predicted_pm25 {
            out.push_str(&format!("Max predicted PM2.5: {:.1}\n", max));
        }
        let counts = &summary.hazard_counts;
        out.push_str(&format!(
            "Hazard levels: {} safe, {} moderate, {} hazardous\n",
            counts.safe, counts.moderate, counts.hazardous
        ));

        if let Some(narrative) = &self.narrative {
            out.push_str("\nKey Driver Analysis:\n");
            out.push_str(&format!(
                "  Smoke intensity (yesterday): {} (scale 0-3)\n",
                narrative.smoke_yesterday
            ));
            out.push_str(&format!(
                "  Pollution velocity: {:.1}\n",
                narrative.velocity_yesterday
            ));
            out.push_str(&format!("  {}\n", narrative.insight.message()));
        }

        out
    }
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}", v))
}

fn load_source(
    path: &Path,
    preparer: &DataPreparer,
    reader: &SourceReader,
    silent: bool,
) -> Result<CachedLoad> {
    let progress = ProgressReporter::new_spinner(&format!("Preparing {}...", path.display()), silent);
    let load = TableCache::global().load(path, preparer, reader);
    progress.finish_and_clear();
    load
}

fn resolve_input(input: Option<PathBuf>, settings: &Settings) -> PathBuf {
    input.unwrap_or_else(|| settings.source.clone())
}

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "Loaded settings");

    let preparer = DataPreparer::new(settings.pipeline.clone());
    let reader = SourceReader::with_mmap(settings.use_mmap);

    match cli.command {
        Commands::Inspect { input, json } => {
            let path = resolve_input(input, &settings);
            let load = load_source(&path, &preparer, &reader, json)?;
            let prepared = &load.prepared;

            if json {
                println!("{}", serde_json::to_string_pretty(&prepared.report)?);
                return Ok(());
            }

            println!("Source: {}", path.display());
            println!("SHA-256: {}", load.fingerprint.digest);
            println!("\n{}", prepared.report.summary());
            if let Some((start, end)) = prepared.table.date_bounds() {
                println!("Date Range: {} to {}", start, end);
            }
        }

        Commands::View {
            input,
            date,
            region,
            location,
            json,
        } => {
            let path = resolve_input(input, &settings);
            let load = load_source(&path, &preparer, &reader, json)?;
            let table = &load.prepared.table;

            let date = match date {
                Some(raw) => parse_date(&raw).ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!("Invalid date argument: '{}'", raw))
                })?,
                None => match table.date_bounds() {
                    Some((earliest, _)) => earliest,
                    None => {
                        println!("No data for this selection.");
                        return Ok(());
                    }
                },
            };

            let mut selection = Selection::for_date(date).with_region(RegionFilter::parse(&region));
            selection.location = choose_location(table, &selection, location.as_deref());

            let report = DashboardReport::build(table, &selection, &settings);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }

        Commands::Series {
            input,
            location,
            json,
        } => {
            let path = resolve_input(input, &settings);
            let load = load_source(&path, &preparer, &reader, json)?;
            let location = location.trim();
            let series = location_series(&load.prepared.table, location);

            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
                return Ok(());
            }

            if series.is_empty() {
                println!("No data for location {}", location);
                return Ok(());
            }

            println!("Actual vs. Predicted for {}", location);
            println!("{:<12} {:>10} {:>10}", "Date", "Actual", "Predicted");
            for point in &series {
                println!(
                    "{:<12} {:>10} {:>10}",
                    point.date.to_string(),
                    fmt_optional(point.actual_pm25),
                    fmt_optional(point.predicted_pm25)
                );
            }
        }

        Commands::Watch {
            input,
            interval,
            max_polls,
        } => {
            let path = resolve_input(input, &settings);
            let secs = interval.unwrap_or(settings.watch_interval_secs).max(1);
            let rebuilds =
                watch(&path, &preparer, &reader, Duration::from_secs(secs), max_polls).await?;
            info!(rebuilds, "Watch finished");
        }
    }

    Ok(())
}

/// A requested location, trimmed like the labels it is compared with, or the
/// first location on offer when none was given
fn choose_location(
    table: &CleanedTable,
    selection: &Selection,
    requested: Option<&str>,
) -> Option<String> {
    match requested.map(str::trim) {
        Some(location) => Some(location.to_string()),
        None => ViewSelector::new(table)
            .select(selection)
            .location_options
            .into_iter()
            .next(),
    }
}

/// Poll the source, reporting every time the cache has to rebuild the table.
/// Returns how many times the table was (re)built.
async fn watch(
    path: &Path,
    preparer: &DataPreparer,
    reader: &SourceReader,
    period: Duration,
    max_polls: u64,
) -> Result<usize> {
    info!(path = %path.display(), ?period, "Watching source");
    let mut ticker = tokio::time::interval(period);
    let mut polls = 0u64;
    let mut rebuilds = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
        }

        match TableCache::global().load(path, preparer, reader) {
            Ok(load) if load.status.was_prepared() => {
                rebuilds += 1;
                println!(
                    "[{:?}] {} rows kept, {} dropped (sha256 {})",
                    load.status,
                    load.prepared.report.rows_kept,
                    load.prepared.report.rows_dropped(),
                    &load.fingerprint.digest[..12]
                );
            }
            Ok(load) => debug!(status = ?load.status, "Source unchanged"),
            Err(e) => warn!(error = %e, "Source could not be prepared"),
        }

        polls += 1;
        if max_polls > 0 && polls >= max_polls {
            break;
        }
    }

    Ok(rebuilds)
}
