//! Binary search for the lowest height at which the endpoints disagree.
//!
//! The search assumes that disagreement persists: once the block hashes
//! differ at some height they differ at every height above it. This is not
//! verified. Use the [scanner](crate::scanner) when endpoints may disagree
//! only at isolated heights.

use std::future::Future;
use std::ops::RangeInclusive;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::DriverError;
use crate::pair::{BlockComparison, EndpointPair};
use crate::report::Reporter;
use crate::source::ChainDataSource;

/// Outcome of a bisection over `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bisection {
    /// The lowest disagreeing height, or `end + 1` if the oracle agreed
    /// everywhere.
    pub height: u64,
    pub end: u64,
    /// Number of oracle calls made.
    pub probes: u32,
}

impl Bisection {
    pub fn diverged(&self) -> bool {
        self.height <= self.end
    }
}

/// Boundary search driven by `agrees_at`.
///
/// Maintains `lo`, the lowest height not known to agree, and `hi`, the lowest
/// height known to disagree, and probes the midpoint until they meet. Any
/// oracle error aborts the search. `cancel` is checked before every probe.
pub async fn bisect<F, Fut>(
    range: RangeInclusive<u64>,
    cancel: &CancellationToken,
    mut agrees_at: F,
) -> Result<Bisection, DriverError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<bool, DriverError>>,
{
    let (start, end) = range.into_inner();
    if start > end {
        return Err(DriverError::InvalidConfig(format!(
            "empty search range {start}..={end}"
        )));
    }
    let mut lo = start;
    let mut hi = end.checked_add(1).ok_or_else(|| {
        DriverError::InvalidConfig(format!("search range end {end} is too large"))
    })?;
    let mut probes = 0;

    while lo < hi {
        if cancel.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        let mid = lo + (hi - lo) / 2;
        probes += 1;
        match agrees_at(mid).await? {
            true => lo = mid + 1,
            false => hi = mid,
        }
        debug!(lo, hi, probes, "bisection step");
    }

    Ok(Bisection {
        height: lo,
        end,
        probes,
    })
}

/// The result of [`find_divergence`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divergence {
    pub bisection: Bisection,
    /// Full comparison at the divergence height, if one was found.
    pub comparison: Option<BlockComparison>,
}

/// Locates the first height in `range` at which the block hashes of the
/// pair differ and reports the full comparison at that height.
pub async fn find_divergence<A, B>(
    pair: &EndpointPair<A, B>,
    range: RangeInclusive<u64>,
    cancel: &CancellationToken,
    reporter: &mut impl Reporter,
) -> Result<Divergence, DriverError>
where
    A: ChainDataSource,
    B: ChainDataSource,
{
    info!(start = range.start(), end = range.end(), "searching for divergence");
    let bisection = bisect(range, cancel, move |height| pair.agrees_at(height)).await?;

    if !bisection.diverged() {
        info!(probes = bisection.probes, "no divergence found");
        return Ok(Divergence {
            bisection,
            comparison: None,
        });
    }

    if cancel.is_cancelled() {
        return Err(DriverError::Cancelled);
    }
    let comparison = pair.compare_block(bisection.height).await?;
    info!(
        height = bisection.height,
        probes = bisection.probes,
        reference = %comparison.reference_hash,
        candidate = %comparison.candidate_hash,
        "divergence found"
    );
    if comparison.is_match() {
        warn!(
            height = bisection.height,
            "block hashes differ but no compared field does"
        );
    }
    comparison.report(reporter);

    Ok(Divergence {
        bisection,
        comparison: Some(comparison),
    })
}
