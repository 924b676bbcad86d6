//! Locates the block height at which two EVM JSON-RPC endpoints start to
//! disagree and explains the disagreement field by field.
//!
//! The engine is split into pure comparators ([`block`], [`receipt`],
//! [`trace`]) that turn two records into an ordered list of
//! [`MismatchRecord`]s, and drivers ([`finder`], [`scanner`], [`trace_run`])
//! that pull records from an [`EndpointPair`] of [`ChainDataSource`]s and
//! forward findings to a [`Reporter`].
//!
//! An empty list of mismatches means the two records are equal. Mismatches
//! are never errors: only failing to fetch a record is.

pub mod block;
mod error;
pub mod finder;
pub mod mismatch;
mod pair;
pub mod receipt;
pub mod report;
pub mod scanner;
mod source;
pub mod trace;
pub mod trace_run;
pub mod views;

pub use error::{DriverError, Endpoint, FetchError};
pub use mismatch::{bytes_eq, FieldValue, MismatchRecord};
pub use pair::{BlockComparison, EndpointPair};
pub use report::{Collect, Reporter, Unit};
pub use source::ChainDataSource;
