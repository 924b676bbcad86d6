//! Reporters writing the findings of a run to the log or to stdout.

use std::io::Write;

use chain_diff::{DriverError, MismatchRecord, Reporter, Unit};
use serde::Serialize;
use tracing::{error, info, warn};

/// Logs every finding through `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn mismatches(&mut self, unit: Unit, records: &[MismatchRecord]) {
        warn!(%unit, count = records.len(), "mismatch");
        for record in records {
            match &record.note {
                Some(note) => warn!(
                    %unit,
                    field = %record.field_path,
                    a = %record.a,
                    b = %record.b,
                    %note
                ),
                None => warn!(%unit, field = %record.field_path, a = %record.a, b = %record.b),
            }
        }
    }

    fn failure(&mut self, unit: Unit, error: &DriverError) {
        error!(%unit, %error, "comparison failed");
    }

    fn progress(&mut self, height: u64) {
        info!(height, "progress");
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Mismatches {
        unit: Unit,
        records: &'a [MismatchRecord],
    },
    Failure {
        unit: Unit,
        error: String,
    },
    Progress {
        height: u64,
    },
}

/// Writes one JSON object per event.
#[derive(Debug)]
pub struct JsonReporter<W> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: &Event<'_>) {
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            error!(error = %e, "could not write report");
        }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn mismatches(&mut self, unit: Unit, records: &[MismatchRecord]) {
        self.emit(&Event::Mismatches { unit, records })
    }

    fn failure(&mut self, unit: Unit, error: &DriverError) {
        self.emit(&Event::Failure {
            unit,
            error: error.to_string(),
        })
    }

    fn progress(&mut self, height: u64) {
        self.emit(&Event::Progress { height })
    }
}
