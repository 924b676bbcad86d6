//! The sink the drivers forward their findings to.

use std::fmt::{self, Display};

use alloy::primitives::TxHash;
use serde::Serialize;

use crate::error::DriverError;
use crate::mismatch::MismatchRecord;

/// A comparison unit: what a mismatch sequence or a failure refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum Unit {
    Block { height: u64 },
    Receipt { height: u64, tx_hash: TxHash },
    Trace { tx_hash: TxHash },
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Block { height } => write!(f, "block {height}"),
            Unit::Receipt { height, tx_hash } => write!(f, "receipt {tx_hash} in block {height}"),
            Unit::Trace { tx_hash } => write!(f, "trace {tx_hash}"),
        }
    }
}

/// Receives the findings of a run.
///
/// Drivers only call [`Reporter::mismatches`] with non-empty sequences, in
/// emission order.
pub trait Reporter {
    fn mismatches(&mut self, unit: Unit, records: &[MismatchRecord]);

    fn failure(&mut self, unit: Unit, error: &DriverError);

    /// Marks that a long running scan has gone past `height`.
    fn progress(&mut self, _height: u64) {}
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn mismatches(&mut self, unit: Unit, records: &[MismatchRecord]) {
        (**self).mismatches(unit, records)
    }

    fn failure(&mut self, unit: Unit, error: &DriverError) {
        (**self).failure(unit, error)
    }

    fn progress(&mut self, height: u64) {
        (**self).progress(height)
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct Collect {
    pub mismatches: Vec<(Unit, Vec<MismatchRecord>)>,
    /// Failed units with the rendered error.
    pub failures: Vec<(Unit, String)>,
    pub progress: Vec<u64>,
}

impl Collect {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records reported for `unit`.
    pub fn records_for(&self, unit: Unit) -> impl Iterator<Item = &MismatchRecord> {
        self.mismatches
            .iter()
            .filter(move |(u, _)| *u == unit)
            .flat_map(|(_, records)| records)
    }
}

impl Reporter for Collect {
    fn mismatches(&mut self, unit: Unit, records: &[MismatchRecord]) {
        self.mismatches.push((unit, records.to_vec()));
    }

    fn failure(&mut self, unit: Unit, error: &DriverError) {
        self.failures.push((unit, error.to_string()));
    }

    fn progress(&mut self, height: u64) {
        self.progress.push(height);
    }
}

/// Forwards `records` unless they are empty. Returns whether anything was
/// forwarded.
pub(crate) fn forward(
    reporter: &mut impl Reporter,
    unit: Unit,
    records: &[MismatchRecord],
) -> bool {
    if records.is_empty() {
        return false;
    }
    reporter.mismatches(unit, records);
    true
}
