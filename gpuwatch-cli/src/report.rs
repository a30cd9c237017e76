use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use gpuwatch_hardware::{MetricStats, TelemetrySummary};
use humansize::{format_size, BINARY};
use serde::Serialize;

use crate::runner::ProcessResult;
use crate::watch::WatchOutcome;

/// Reserved exit code for tool-internal failures (launch error, fatal device
/// error). Distinct from any child exit code we propagate and below the
/// 128+signo band.
pub const SENTINEL_EXIT_CODE: i32 = 125;

/// Below this many successful samples the statistics get an accuracy warning.
const MIN_RELIABLE_SAMPLES: usize = 5;

/// Overall exit code for a completed run: the child's own code, with signal
/// deaths already mapped to 128+signo by the runner.
pub fn exit_code(process: &ProcessResult) -> i32 {
    process.exit_code
}

/// Render the summary block. Printed to stderr by the caller so it never
/// interleaves with the child's stdout.
pub fn render(command_line: &str, device_label: &str, outcome: &WatchOutcome) -> String {
    let mut out = String::new();
    let rule = "━".repeat(46);

    let _ = writeln!(out, "{}", rule.bright_black());
    let _ = writeln!(out, "{}", "GPU monitoring summary".bold().cyan());
    let _ = writeln!(out, "Command:  {}", command_line);
    let _ = writeln!(out, "Device:   {}", device_label);
    let _ = writeln!(out, "Status:   {}", status_line(&outcome.process));
    let _ = writeln!(out, "Wall:     {:.2}s", outcome.process.wall.as_secs_f64());
    let _ = writeln!(
        out,
        "Samples:  {} ok, {} failed",
        outcome.summary.samples_ok, outcome.summary.samples_failed
    );

    match &outcome.summary.stats {
        None => {
            let _ = writeln!(
                out,
                "{}",
                "no data: no telemetry sample succeeded during the run".yellow()
            );
        }
        Some(stats) => {
            let _ = writeln!(out, "{}", "Memory".bold());
            let _ = writeln!(
                out,
                "  min {}   mean {}   max {}   ({} total)",
                format_size(stats.memory_used_bytes.min as u64, BINARY),
                format_size(stats.memory_used_bytes.mean as u64, BINARY),
                format_size(stats.memory_used_bytes.max as u64, BINARY),
                format_size(stats.memory_total_bytes, BINARY),
            );
            let _ = writeln!(out, "{}", "Temperature".bold());
            let _ = writeln!(out, "  {}", stats_line(&stats.temperature_c, "C", 1));
            let _ = writeln!(out, "{}", "Power".bold());
            let _ = writeln!(out, "  {}", stats_line(&stats.power_w, "W", 1));
            let _ = writeln!(out, "{}", "Clocks".bold());
            let _ = writeln!(out, "  SM  {}", stats_line(&stats.sm_clock_mhz, "MHz", 0));
            let _ = writeln!(out, "  Mem {}", stats_line(&stats.memory_clock_mhz, "MHz", 0));

            if outcome.summary.samples_ok < MIN_RELIABLE_SAMPLES {
                let _ = writeln!(
                    out,
                    "{}",
                    format!(
                        "warning: only {} sample(s) collected, statistics may be inaccurate",
                        outcome.summary.samples_ok
                    )
                    .yellow()
                );
            }
        }
    }

    let _ = write!(out, "{}", rule.bright_black());
    out
}

fn status_line(process: &ProcessResult) -> String {
    if process.signaled {
        format!("terminated by signal {}", process.signal.unwrap_or(0))
    } else {
        format!("exited with code {}", process.exit_code)
    }
}

fn stats_line(stats: &MetricStats, unit: &str, decimals: usize) -> String {
    format!(
        "min {:.d$} {u}   mean {:.1} {u}   max {:.d$} {u}",
        stats.min,
        stats.mean,
        stats.max,
        d = decimals,
        u = unit
    )
}

#[derive(Serialize)]
struct ExportRecord<'a> {
    command: &'a str,
    process: &'a ProcessResult,
    summary: &'a TelemetrySummary,
}

/// Write the run outcome as pretty JSON for machine consumption.
pub fn export_json(path: &Path, command_line: &str, outcome: &WatchOutcome) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;

    serde_json::to_writer_pretty(
        file,
        &ExportRecord {
            command: command_line,
            process: &outcome.process,
            summary: &outcome.summary,
        },
    )
    .with_context(|| format!("failed to write export file {}", path.display()))?;

    Ok(())
}
