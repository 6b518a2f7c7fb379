//! Plain-text rendering of the dashboard view model.

use std::fmt::Write;

use dashboard_core::{
    format_bytes, format_percent, format_rate, AggregateStats, DashboardViewModel, JobRowView,
    StatusVariant,
};

const ID_WIDTH: usize = 24;
const NAME_WIDTH: usize = 28;
const STATUS_WIDTH: usize = 22;

pub fn render_dashboard(view: &DashboardViewModel) -> String {
    let mut out = String::new();
    let Some(cycle) = view.cycle else {
        out.push_str("Waiting for the first refresh...\n");
        return out;
    };

    let fetched = view.fetched_utc.as_deref().unwrap_or("-");
    let _ = writeln!(out, "Cycle {cycle} fetched {fetched}");
    if view.rows.is_empty() {
        out.push_str("No jobs.\n");
    } else {
        let _ = writeln!(
            out,
            "{:<ID_WIDTH$} {:<NAME_WIDTH$} {:<STATUS_WIDTH$} {:>8} {:>22} {:>12}",
            "JOB ID", "NAME", "STATUS", "PROGRESS", "TRANSFERRED", "RATE"
        );
        for row in &view.rows {
            out.push_str(&render_row(row));
            out.push('\n');
        }
    }
    out.push_str(&render_stats(&view.stats));
    out.push('\n');
    out
}

pub fn render_row(row: &JobRowView) -> String {
    let derived = &row.derived;
    let marker = match derived.status_variant {
        StatusVariant::Danger => "!",
        StatusVariant::Warning => "*",
        _ => " ",
    };
    let status = format!("{marker}{}", derived.display_status);
    let transferred = match (derived.bytes_transferred, derived.total_bytes) {
        (Some(done), Some(total)) => format!("{} / {}", format_bytes(done), format_bytes(total)),
        _ => "-".to_string(),
    };
    let progress = if row.transfer.is_some() {
        format_percent(derived.percent_complete)
    } else {
        "-".to_string()
    };
    let rate = derived
        .rate_bits_per_second
        .map(format_rate)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<ID_WIDTH$} {:<NAME_WIDTH$} {:<STATUS_WIDTH$} {:>8} {:>22} {:>12}",
        clip(row.job_id().as_str(), ID_WIDTH),
        clip(&row.job.name, NAME_WIDTH),
        clip(&status, STATUS_WIDTH),
        progress,
        transferred,
        rate
    )
}

pub fn render_stats(stats: &AggregateStats) -> String {
    format!(
        "{} jobs: {} ready, {} in progress, {} error, {} paused, {} with alerts, {} transferred",
        stats.total,
        stats.ready,
        stats.in_progress,
        stats.error,
        stats.paused,
        stats.with_alerts,
        format_bytes(stats.bytes_transferred)
    )
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width - 1).collect();
    clipped.push('~');
    clipped
}
