//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `episode_summaries.csv`
//! - `statistics.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EpisodeSummaryRow, OutputResult, StatisticRow};

/// Writes telemetry to two CSV files.
pub struct CsvWriter {
    episodes:   Writer<File>,
    statistics: Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the two CSV files and write the header
    /// rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut episodes = Writer::from_path(dir.join("episode_summaries.csv"))?;
        episodes.write_record([
            "agent_id",
            "behavior",
            "episode",
            "steps",
            "cumulative_reward",
            "reason",
            "duration_secs",
            "invalid_reward_steps",
        ])?;

        let mut statistics = Writer::from_path(dir.join("statistics.csv"))?;
        statistics.write_record(["agent_id", "step", "key", "value"])?;

        Ok(Self {
            episodes,
            statistics,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_episode_summary(&mut self, row: &EpisodeSummaryRow) -> OutputResult<()> {
        self.episodes.write_record(&[
            row.agent_id.clone(),
            row.behavior_name.clone(),
            row.episode.to_string(),
            row.steps.to_string(),
            row.cumulative_reward.to_string(),
            row.reason.clone(),
            row.duration_secs.to_string(),
            row.invalid_reward_steps.to_string(),
        ])?;
        Ok(())
    }

    fn write_statistics(&mut self, rows: &[StatisticRow]) -> OutputResult<()> {
        for row in rows {
            self.statistics.write_record(&[
                row.agent_id.clone(),
                row.step.to_string(),
                row.key.clone(),
                row.value.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.episodes.flush()?;
        self.statistics.flush()?;
        Ok(())
    }
}
