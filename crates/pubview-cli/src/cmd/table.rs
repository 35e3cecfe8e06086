//! `pubview table`: the time-ordered message table.

use anyhow::{Context as _, Result, bail};
use clap::{Args, ValueEnum};
use pubview_core::normalize::{NormalizeMode, Normalized, normalize};
use pubview_core::present::{DisplayRow, Presenter, TimeZoneMode};
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

use super::{Context, RemoteArgs, fetch_remote};
use crate::output::{pretty_rule, render_mode, truncate};
use crate::store::ResponseStore;

const HEADERS: [&str; 7] = [
    "Alias",
    "Version",
    "Business Event",
    "Lifecycle Events",
    "Key",
    "Timestamp",
    "Δt",
];

const TEXT_HEADERS: [&str; 7] = [
    "ALIAS",
    "VERSION",
    "BUSINESS_EVENT",
    "LIFECYCLE_EVENTS",
    "KEY",
    "TIMESTAMP",
    "DELTA",
];

/// Lifecycle summaries longer than this are cut in pretty output.
const LIFECYCLE_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Zone {
    Utc,
    Local,
}

impl From<Zone> for TimeZoneMode {
    fn from(zone: Zone) -> Self {
        match zone {
            Zone::Utc => Self::Utc,
            Zone::Local => Self::Local,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Position id to fetch (or to look up with --cached).
    #[arg(required_unless_present = "input")]
    pub position_id: Option<String>,

    /// Read the response body from a JSON file instead of fetching.
    #[arg(long, value_name = "FILE", conflicts_with = "cached")]
    pub input: Option<PathBuf>,

    /// Use the last stored response for the position instead of fetching.
    #[arg(long)]
    pub cached: bool,

    /// Zone for the timestamp column. Defaults to `display.timezone`.
    #[arg(long, value_enum)]
    pub timezone: Option<Zone>,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

pub fn run_table(args: &TableArgs, ctx: &Context) -> Result<()> {
    let raw = load_source(args, ctx)?;
    let set = match normalize(&raw, NormalizeMode::FullTable) {
        Normalized::FullTable(set) => set,
        Normalized::KeySummary(_) => Default::default(),
    };
    debug!(messages = set.message_count(), "normalized response");

    let zone = args
        .timezone
        .map_or(ctx.config.display.timezone, TimeZoneMode::from);
    let rows = Presenter::new(zone).present(&set);

    render_mode(ctx.output, &rows, |rows, w| write_text(w, rows), |rows, w| write_pretty(w, rows))
}

fn load_source(args: &TableArgs, ctx: &Context) -> Result<Value> {
    if let Some(path) = &args.input {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as JSON", path.display()));
    }

    let Some(position_id) = args.position_id.as_deref() else {
        bail!("a position id is required unless --input is given");
    };

    if args.cached {
        let Some(store) = ctx.store() else {
            bail!("no store directory is available");
        };
        return store
            .load(position_id)?
            .with_context(|| format!("no stored response for position '{position_id}'"));
    }

    fetch_remote(ctx, &args.remote, position_id)
}

fn cells(row: &DisplayRow) -> [String; 7] {
    [
        row.alias.clone(),
        row.version.to_string(),
        row.business_event_type.clone(),
        row.lifecycle_summary.clone(),
        row.key.clone(),
        row.formatted_timestamp.clone(),
        row.delta_from_previous.clone(),
    ]
}

fn write_text(w: &mut dyn Write, rows: &[DisplayRow]) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(w, "{}", TEXT_HEADERS.join("  "))?;
    for row in rows {
        writeln!(w, "{}", cells(row).join("  "))?;
    }
    Ok(())
}

fn write_pretty(w: &mut dyn Write, rows: &[DisplayRow]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(w, "(no messages)");
    }

    let body: Vec<[String; 7]> = rows
        .iter()
        .map(|row| {
            let mut cells = cells(row);
            cells[3] = truncate(&cells[3], LIFECYCLE_WIDTH);
            cells
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_aligned(w, &HEADERS.map(str::to_string), &widths)?;
    pretty_rule(w, widths.iter().sum::<usize>() + 2 * (widths.len() - 1))?;
    for cells in &body {
        write_aligned(w, cells, &widths)?;
    }
    Ok(())
}

fn write_aligned(w: &mut dyn Write, cells: &[String; 7], widths: &[usize; 7]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(w, "{}", line.trim_end())
}
