//! `submit-listener simulate` command implementation.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::simulate::{SimulationReport, TraceEvent, load_scenario, simulate};
use chrono::{DateTime, Local, Utc};
use std::io::{self, Write};
use std::path::Path;

/// Run the simulate command.
///
/// Loads the scenario, runs it and prints the report to stdout.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or stdout fails.
pub fn run(path: &Path, format: OutputFormat) -> Result<()> {
    let scenario = load_scenario(path)?;
    let report = simulate(&scenario)?;

    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => write_text(&mut out, &report)?,
    }
    Ok(())
}

/// Write the report as one line per event followed by the final state.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_text(out: &mut impl Write, report: &SimulationReport) -> Result<()> {
    writeln!(out, "{:<4} {:<14} {:<24} Payload", "#", "Time", "Event")?;
    writeln!(out, "{}", "─".repeat(80))?;

    for (index, event) in report.events.iter().enumerate() {
        writeln!(
            out,
            "{:<4} {:<14} {:<24} {}",
            index + 1,
            format_local_time(event.timestamp),
            event.event_type.label(),
            format_payload(event),
        )?;
    }

    writeln!(out, "{}", "─".repeat(80))?;
    let state = &report.final_state;
    writeln!(
        out,
        "engine calls: {}  submit_succeeded: {}  submit_failed: {}",
        report.engine_calls, state.submit_succeeded, state.submit_failed
    )?;
    Ok(())
}

/// Format UTC time as local time for display.
fn format_local_time(utc: DateTime<Utc>) -> String {
    let local: DateTime<Local> = utc.into();
    local.format("%H:%M:%S%.3f").to_string()
}

/// Compact payload, omitting empty objects.
fn format_payload(event: &TraceEvent) -> String {
    match event.payload.as_object() {
        Some(map) if map.is_empty() => String::new(),
        _ => event.payload.to_string(),
    }
}
