//! Interactive timer session.
//!
//! Hosts the in-process [`TimerController`] for the lifetime of the
//! loop. The running session is never persisted, so quitting (or
//! killing the process) while a timer runs discards it; only `stop`
//! writes a record.

use std::io::{BufRead, Write};

use anyhow::Result;

use tally_core::{Error, TimerController};
use tally_db::Database;

pub fn run<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, db: &Database) -> Result<()> {
    let controller = TimerController::new();
    writeln!(
        writer,
        "Commands: start [key], category [key], stop, status, quit"
    )?;
    for line in reader.lines() {
        let line = line?;
        if !handle_line(&controller, db, line.trim(), writer)? {
            return Ok(());
        }
    }
    // EOF behaves like quit.
    warn_if_running(&controller, writer)?;
    Ok(())
}

/// Handles one input line. Returns `false` when the loop should exit.
fn handle_line<W: Write>(
    controller: &TimerController,
    db: &Database,
    line: &str,
    writer: &mut W,
) -> Result<bool> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

    match command {
        "" => {}
        "start" => match controller.start(db, arg) {
            Ok(session) => {
                let label = session.category_key.as_deref().unwrap_or("uncategorized");
                writeln!(writer, "Started {label}")?;
            }
            Err(err) => report(writer, err)?,
        },
        "category" => match controller.update_category(db, arg) {
            Ok(session) => {
                let label = session.category_key.as_deref().unwrap_or("uncategorized");
                writeln!(writer, "Now tracking {label}")?;
            }
            Err(err) => report(writer, err)?,
        },
        "stop" => match controller.stop(db) {
            Ok(record) => writeln!(
                writer,
                "Recorded {}s on {} ({})",
                record.duration_seconds, record.category_name, record.date
            )?,
            Err(err) => report(writer, err)?,
        },
        "status" => match controller.current() {
            Some(session) => {
                let label = session.category_key.as_deref().unwrap_or("uncategorized");
                writeln!(writer, "Running since {} ({label})", session.start_time)?;
            }
            None => writeln!(writer, "Idle")?,
        },
        "quit" | "exit" => {
            warn_if_running(controller, writer)?;
            return Ok(false);
        }
        other => writeln!(writer, "Unknown command: {other}")?,
    }
    Ok(true)
}

/// Domain errors are conversational; storage failures abort the loop.
fn report<W: Write>(writer: &mut W, err: Error) -> Result<()> {
    match err {
        Error::Storage(_) => Err(err.into()),
        err => {
            writeln!(writer, "Error: {err}")?;
            Ok(())
        }
    }
}

fn warn_if_running<W: Write>(controller: &TimerController, writer: &mut W) -> Result<()> {
    if controller.current().is_some() {
        writeln!(writer, "Timer still running; session discarded.")?;
    }
    Ok(())
}
