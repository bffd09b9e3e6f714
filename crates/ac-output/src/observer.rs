//! `AgentOutputObserver<W>` — bridges `AgentObserver` to an `OutputWriter`.

use std::collections::BTreeMap;

use ac_agent::{AgentObserver, EpisodeSummary};
use ac_core::Step;
use tracing::warn;

use crate::row::{EpisodeSummaryRow, StatisticRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// An [`AgentObserver`] that writes episode summaries and statistics to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `AgentObserver`
/// methods have no return value.  After `on_destroy`, check for errors with
/// [`take_error`][Self::take_error].
pub struct AgentOutputObserver<W: OutputWriter> {
    writer:           W,
    statistics_every: u64,
    last_error:       Option<OutputError>,
}

impl<W: OutputWriter> AgentOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            statistics_every: 1,
            last_error:       None,
        }
    }

    /// Only record statistics on steps divisible by `n`.  `0` disables
    /// statistics output.
    pub fn statistics_every(mut self, n: u64) -> Self {
        self.statistics_every = n;
        self
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            warn!(error = %e, "telemetry write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> AgentObserver for AgentOutputObserver<W> {
    fn on_statistics(&mut self, agent_id: &str, step: Step, values: &BTreeMap<String, f32>) {
        if self.statistics_every == 0 || step.0 % self.statistics_every != 0 || values.is_empty() {
            return;
        }
        let rows: Vec<StatisticRow> = values
            .iter()
            .map(|(key, &value)| StatisticRow {
                agent_id: agent_id.to_string(),
                step:     step.0,
                key:      key.clone(),
                value,
            })
            .collect();
        let result = self.writer.write_statistics(&rows);
        self.store_err(result);
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        let result = self.writer.write_episode_summary(&EpisodeSummaryRow::from(summary));
        self.store_err(result);
    }

    fn on_destroy(&mut self, _agent_id: &str) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
