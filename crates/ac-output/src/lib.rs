//! `ac-output` — telemetry writers for the rust_ac framework.
//!
//! | Backend | Files created                               |
//! |---------|---------------------------------------------|
//! | CSV     | `episode_summaries.csv`, `statistics.csv`   |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`AgentOutputObserver`], which implements `ac_agent::AgentObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ac_output::{AgentOutputObserver, CsvWriter};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut agent = AgentBuilder::new("chaser-0", behavior)
//!     // …providers…
//!     .observer(AgentOutputObserver::new(writer))
//!     .build()?;
//! // …drive the agent…
//! agent.on_destroy();
//! if let Some(e) = agent.observer_mut().take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::AgentOutputObserver;
pub use row::{EpisodeSummaryRow, StatisticRow};
pub use writer::OutputWriter;
