//! Rendering of nearest record results

use std::io::Write;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{errors::LocatorError, models::PositionRecord, nearest::QueryResult};

const SEPARATOR_WIDTH: usize = 110;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One neighbour of one reference point, flattened for serialization
#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    position: u32,
    #[serde(flatten)]
    record: &'a PositionRecord,
    distance_m: f64,
}

pub fn render<W: Write>(
    out: &mut W,
    results: &[QueryResult<'_>],
    format: OutputFormat,
) -> Result<(), LocatorError> {
    match format {
        OutputFormat::Table => render_table(out, results),
        OutputFormat::Json => render_json(out, results),
    }
}

/// Fixed-width table, one block per reference point
pub fn render_table<W: Write>(
    out: &mut W,
    results: &[QueryResult<'_>],
) -> Result<(), LocatorError> {
    for result in results {
        writeln!(out)?;
        writeln!(out, "{} Nearest Records", result.reference.position)?;
        writeln!(out)?;
        writeln!(
            out,
            "{:<10} {:<30} {:<15} {:<15} {:<30} {:<30}",
            "VehicleID",
            "Registration",
            "Latitude",
            "Longitude",
            "Recorded Time UTC",
            "Dis from Target"
        )?;
        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;

        for neighbor in &result.neighbors {
            let record = neighbor.record;
            writeln!(
                out,
                "{:<10} {:<30} {:<15} {:<15} {:<30} {:<30}",
                record.vehicle_id,
                record.registration,
                record.latitude,
                record.longitude,
                format_time(&record.recorded_at),
                format!("{:.0} meters", neighbor.distance_m)
            )?;
        }
    }
    Ok(())
}

pub fn render_json<W: Write>(
    out: &mut W,
    results: &[QueryResult<'_>],
) -> Result<(), LocatorError> {
    let rows: Vec<ResultRow> = results
        .iter()
        .flat_map(|result| {
            result.neighbors.iter().map(|neighbor| ResultRow {
                position: result.reference.position,
                record: neighbor.record,
                distance_m: neighbor.distance_m,
            })
        })
        .collect();

    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)?;
    Ok(())
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}
