//! The `OutputWriter` trait implemented by all backend writers.

use crate::{EpisodeSummaryRow, OutputResult, StatisticRow};

/// A telemetry sink.
///
/// Errors are returned to the caller; [`AgentOutputObserver`] keeps the first
/// one for [`take_error`].
///
/// [`AgentOutputObserver`]: crate::AgentOutputObserver
/// [`take_error`]: crate::AgentOutputObserver::take_error
pub trait OutputWriter {
    fn write_episode_summary(&mut self, row: &EpisodeSummaryRow) -> OutputResult<()>;

    /// Write a batch of statistic values taken at the same step.
    fn write_statistics(&mut self, rows: &[StatisticRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
