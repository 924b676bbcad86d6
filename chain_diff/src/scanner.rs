//! Sampled sweep over a height range.
//!
//! Unlike the [finder](crate::finder) the scanner does not rely on
//! disagreement being persistent. It runs the full comparator stack at every
//! multiple of the stride, so isolated discrepancies between samples go
//! unnoticed.

use std::ops::RangeInclusive;

use futures::StreamExt as _;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::DriverError;
use crate::pair::EndpointPair;
use crate::report::{Reporter, Unit};
use crate::source::ChainDataSource;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    pub range: RangeInclusive<u64>,
    /// Only multiples of the stride are sampled.
    pub stride: u64,
    /// Emit a progress marker every time the scan passes a multiple of this.
    pub progress_every: u64,
    /// Upper bound on heights compared at the same time.
    pub concurrency: usize,
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.range.is_empty() {
            return Err(DriverError::InvalidConfig(format!(
                "empty scan range {}..={}",
                self.range.start(),
                self.range.end()
            )));
        }
        if self.stride == 0 {
            return Err(DriverError::InvalidConfig("stride must be at least 1".into()));
        }
        if self.progress_every < self.stride {
            return Err(DriverError::InvalidConfig(format!(
                "progress interval {} is smaller than the stride {}",
                self.progress_every, self.stride
            )));
        }
        if self.concurrency == 0 {
            return Err(DriverError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The heights of the range that are multiples of the stride, ascending.
    pub fn sample_heights(&self) -> impl Iterator<Item = u64> {
        let end = *self.range.end();
        let stride = self.stride.max(1);
        let first = self.range.start().checked_next_multiple_of(stride);
        let mut next = first.filter(|first| *first <= end);
        std::iter::from_fn(move || {
            let height = next?;
            next = height.checked_add(stride).filter(|h| *h <= end);
            Some(height)
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of heights that were compared, successfully or not.
    pub sampled: u64,
    /// Heights at which at least one field differs.
    pub mismatching: Vec<u64>,
    /// Heights that could not be compared.
    pub failed: Vec<u64>,
    /// The scan stopped before the end of the range.
    pub cancelled: bool,
}

/// Tracks the next multiple of the progress interval.
struct Progress {
    every: u64,
    next: Option<u64>,
}

impl Progress {
    fn new(start: u64, every: u64) -> Self {
        Self {
            every,
            next: start.checked_next_multiple_of(every),
        }
    }

    /// The marker passed by `height`, if any.
    fn passed(&mut self, height: u64) -> Option<u64> {
        let next = self.next?;
        if height < next {
            return None;
        }
        let marker = height - height % self.every;
        self.next = marker.checked_add(self.every);
        Some(marker)
    }
}

/// Compares every sampled height of `config.range`.
///
/// A failed height is reported and the scan moves on. Once `cancel` fires
/// no further heights are started; the ones already in flight are finished
/// and reported.
pub async fn scan<A, B>(
    pair: &EndpointPair<A, B>,
    config: &ScanConfig,
    cancel: &CancellationToken,
    reporter: &mut impl Reporter,
) -> Result<ScanSummary, DriverError>
where
    A: ChainDataSource,
    B: ChainDataSource,
{
    config.validate()?;
    info!(
        start = config.range.start(),
        end = config.range.end(),
        stride = config.stride,
        concurrency = config.concurrency,
        "starting scan"
    );

    let mut progress = Progress::new(*config.range.start(), config.progress_every);
    let mut summary = ScanSummary::default();

    let mut comparisons = futures::stream::iter(
        config
            .sample_heights()
            .take_while(|_| !cancel.is_cancelled())
            .map(|height| async move { (height, pair.compare_block(height).await) }),
    )
    .buffered(config.concurrency);

    while let Some((height, result)) = comparisons.next().await {
        summary.sampled += 1;
        match result {
            Ok(comparison) if comparison.is_match() => {}
            Ok(comparison) => {
                warn!(
                    height,
                    reference = %comparison.reference_hash,
                    candidate = %comparison.candidate_hash,
                    "mismatch"
                );
                comparison.report(reporter);
                summary.mismatching.push(height);
            }
            Err(e) => {
                error!(height, error = %e, "comparison failed");
                reporter.failure(Unit::Block { height }, &e);
                summary.failed.push(height);
            }
        }

        if let Some(marker) = progress.passed(height) {
            info!(
                height = marker,
                mismatching = summary.mismatching.len(),
                failed = summary.failed.len(),
                "progress"
            );
            reporter.progress(marker);
        }
    }

    summary.cancelled = cancel.is_cancelled();
    info!(
        sampled = summary.sampled,
        mismatching = summary.mismatching.len(),
        failed = summary.failed.len(),
        cancelled = summary.cancelled,
        "scan finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(range: RangeInclusive<u64>, stride: u64) -> ScanConfig {
        ScanConfig {
            range,
            stride,
            progress_every: stride * 10,
            concurrency: 4,
        }
    }

    #[test]
    fn samples_multiples_of_the_stride() {
        let heights = config(0..=1000, 100).sample_heights().collect::<Vec<_>>();
        assert_eq!(heights, (0..=1000).step_by(100).collect::<Vec<_>>());

        let heights = config(150..=420, 100).sample_heights().collect::<Vec<_>>();
        assert_eq!(heights, [200, 300, 400]);

        assert_eq!(config(101..=199, 100).sample_heights().count(), 0);
        assert_eq!(config(5..=9, 1).sample_heights().count(), 5);
    }

    #[test]
    fn sampling_stops_at_the_end_of_the_domain() {
        let heights = config(u64::MAX - 5..=u64::MAX, 2)
            .sample_heights()
            .collect::<Vec<_>>();
        assert_eq!(heights, [u64::MAX - 5, u64::MAX - 3, u64::MAX - 1]);
    }

    #[test]
    fn validation() {
        assert!(config(0..=10, 1).validate().is_ok());
        assert!(config(0..=10, 0).validate().is_err());

        let mut c = config(0..=10, 5);
        c.progress_every = 4;
        assert!(c.validate().is_err());

        let mut c = config(0..=10, 5);
        c.concurrency = 0;
        assert!(c.validate().is_err());

        #[allow(clippy::reversed_empty_ranges)]
        let c = config(10..=0, 5);
        assert!(c.validate().is_err());
    }

    #[test]
    fn progress_markers() {
        let mut p = Progress::new(0, 1000);
        let markers = (0..=3500)
            .step_by(300)
            .filter_map(|h| p.passed(h))
            .collect::<Vec<_>>();
        assert_eq!(markers, [0, 1000, 2000, 3000]);

        let mut p = Progress::new(1, 1000);
        assert_eq!(p.passed(999), None);
        assert_eq!(p.passed(2500), Some(2000));
        assert_eq!(p.passed(2900), None);
    }
}
