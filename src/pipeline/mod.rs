// Tabulation pipeline: flatten, coerce, write

pub mod coerce;
pub mod csv_out;
pub mod flatten;

use crate::app::ports::Fetcher;
use crate::error::Result;
use crate::types::{DataSource, Dataset, FlatTable};
use metrics::{counter, histogram};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument};

/// Outcome of writing one dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub output_file: PathBuf,
}

/// Result of a complete pipeline run for one source
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub source: String,
    pub datasets: Vec<DatasetSummary>,
    /// Records dropped while collecting
    pub skipped: usize,
}

impl PipelineResult {
    pub fn total_rows(&self) -> usize {
        self.datasets.iter().map(|d| d.rows).sum()
    }
}

/// Flatten and coerce a dataset's records.
pub fn tabulate(dataset: &Dataset) -> FlatTable {
    let mut table = flatten::flatten_records(&dataset.records, &dataset.rules);
    coerce::coerce_table(&mut table, &dataset.columns);
    table
}

pub struct Pipeline;

impl Pipeline {
    /// Collect every dataset of `source` and write each one as CSV under `output_dir`.
    #[instrument(skip(source, fetcher), fields(source = %source.source_name()))]
    pub async fn run(
        source: &dyn DataSource,
        fetcher: &dyn Fetcher,
        output_dir: &Path,
    ) -> Result<PipelineResult> {
        let name = source.source_name();
        info!("Starting pipeline for {}", name);
        counter!("ods_pipeline_runs_total", "source" => name).increment(1);
        let t_pipeline = Instant::now();

        let datasets = source.collect(fetcher).await?;

        let mut summaries = Vec::with_capacity(datasets.len());
        let mut skipped = 0;
        for dataset in &datasets {
            let summary = Self::write_dataset(dataset, output_dir)?;
            counter!("ods_rows_written_total", "source" => name).increment(summary.rows as u64);
            skipped += dataset.skipped;
            summaries.push(summary);
        }
        counter!("ods_records_skipped_total", "source" => name).increment(skipped as u64);
        histogram!("ods_pipeline_duration_seconds", "source" => name)
            .record(t_pipeline.elapsed().as_secs_f64());

        Ok(PipelineResult {
            source: name.to_string(),
            datasets: summaries,
            skipped,
        })
    }

    fn write_dataset(dataset: &Dataset, output_dir: &Path) -> Result<DatasetSummary> {
        let table = tabulate(dataset);
        let output_file = csv_out::write_csv_file(&table, output_dir, &dataset.output_file)?;
        info!(
            "{}: {} rows x {} columns -> {}",
            dataset.name,
            table.len(),
            table.columns.len(),
            output_file.display()
        );
        Ok(DatasetSummary {
            name: dataset.name.clone(),
            rows: table.len(),
            columns: table.columns.len(),
            output_file,
        })
    }
}
