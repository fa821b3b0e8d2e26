//! Output module for persisting harvested records
//!
//! This module handles:
//! - The [`Sink`] interface the orchestrator flushes snapshots through
//! - CSV, JSON and SQLite sinks
//! - Fanning one flush out to every configured sink
//! - Reporting statistics from the listing database

mod files;
mod sqlite_sink;
pub mod stats;
mod traits;

pub use files::{run_stamp, CsvSink, JsonSink, IMAGE_LINK_SEPARATOR};
pub use sqlite_sink::{open_database, SqliteSink, SCHEMA_SQL};
pub use stats::{load_statistics, print_statistics, ListingStatistics};
pub use traits::{RunStatus, Sink, SinkError, SinkResult};

use crate::config::{Config, OutputFormat};
use crate::record::PropertyRecord;
use std::path::Path;
use std::sync::Arc;

/// Fans each flush out to several sinks
///
/// A failing sink is logged and does not prevent the others from being
/// written; the first failure is returned once every sink was tried.
#[derive(Clone, Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn for_each(&self, mut op: impl FnMut(&dyn Sink) -> SinkResult<()>) -> SinkResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = op(sink.as_ref()) {
                tracing::error!(sink = sink.name(), error = %e, "Sink failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Sink for MultiSink {
    fn name(&self) -> &str {
        "multi"
    }

    fn flush(&self, records: &[PropertyRecord], label: &str) -> SinkResult<()> {
        self.for_each(|sink| sink.flush(records, label))
    }

    fn finalize(&self, status: RunStatus) -> SinkResult<()> {
        self.for_each(|sink| sink.finalize(status))
    }
}

/// Builds every sink enabled in the output configuration
///
/// # Arguments
///
/// * `config` - The full configuration
/// * `config_hash` - Hash recorded with the SQLite run
///
/// # Returns
///
/// * `Ok(MultiSink)` - All configured sinks, ready to flush
/// * `Err(SinkError)` - A sink could not be created (e.g. unwritable directory)
pub fn build_sinks(config: &Config, config_hash: &str) -> SinkResult<MultiSink> {
    let output = &config.output;
    let mut sinks = MultiSink::default();

    for format in &output.formats {
        let sink: Arc<dyn Sink> = match format {
            OutputFormat::Csv => Arc::new(CsvSink::new(&output.directory)?),
            OutputFormat::Json => Arc::new(JsonSink::new(&output.directory)?),
            OutputFormat::Sqlite => Arc::new(SqliteSink::open(
                Path::new(&output.database_path),
                config_hash,
            )?),
        };
        tracing::debug!(sink = sink.name(), "Configured sink");
        sinks.push(sink);
    }

    Ok(sinks)
}
