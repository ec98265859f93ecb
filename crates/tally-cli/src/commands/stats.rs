//! Statistics commands over the recorded ledger.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

use tally_core::{DailyStats, RangeStats, local_date_key};
use tally_db::Database;

/// Parses and re-formats a user-supplied date so the stored fixed-width
/// `YYYY-MM-DD` form is always what gets queried.
fn parse_date_key(input: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{input}', expected YYYY-MM-DD"))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

pub fn daily<W: Write>(writer: &mut W, db: &Database, date: Option<&str>, json: bool) -> Result<()> {
    let date = match date {
        Some(date) => parse_date_key(date)?,
        None => local_date_key(Utc::now()),
    };
    let records = db.records_for_date(&date)?;
    let stats = tally_core::daily(&date, records);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        render_daily(writer, &stats)?;
    }
    Ok(())
}

pub fn range<W: Write>(
    writer: &mut W,
    db: &Database,
    start: &str,
    end: &str,
    json: bool,
) -> Result<()> {
    let start = parse_date_key(start)?;
    let end = parse_date_key(end)?;
    let records = db.records_in_range(&start, &end)?;
    let stats = tally_core::range(&start, &end, &records);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        render_range(writer, &stats)?;
    }
    Ok(())
}

fn render_daily<W: Write>(writer: &mut W, stats: &DailyStats) -> Result<()> {
    writeln!(writer, "Stats for {}", stats.date)?;
    writeln!(
        writer,
        "Total: {}s ({} min / {} h)",
        stats.total_seconds, stats.total_minutes, stats.total_hours
    )?;
    if stats.breakdown.is_empty() {
        writeln!(writer, "No records.")?;
        return Ok(());
    }
    writeln!(writer, "By category:")?;
    for (name, seconds) in stats.breakdown.iter() {
        writeln!(writer, "- {name}: {seconds}s")?;
    }
    writeln!(writer, "Records: {}", stats.records.len())?;
    Ok(())
}

fn render_range<W: Write>(writer: &mut W, stats: &RangeStats) -> Result<()> {
    writeln!(writer, "Stats for {} .. {}", stats.start_date, stats.end_date)?;
    writeln!(
        writer,
        "Total: {}s ({} min / {} h)",
        stats.total_seconds, stats.total_minutes, stats.total_hours
    )?;
    if stats.by_category.is_empty() {
        writeln!(writer, "No records.")?;
        return Ok(());
    }
    writeln!(writer, "By category:")?;
    for (name, seconds) in stats.by_category.iter() {
        writeln!(writer, "- {name}: {seconds}s")?;
    }
    writeln!(writer, "By date:")?;
    for (date, seconds) in stats.by_date.iter() {
        writeln!(writer, "- {date}: {seconds}s")?;
    }
    Ok(())
}
