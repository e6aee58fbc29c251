//! Node-age batch analysis functionality
//!
//! This module drives the whole pipeline for one directory of log files:
//! discovery, per-file loading and summarization, label cleanup, CSV
//! export, console output, and plot generation.

use crate::common::data_structures::{format_summary_table, NodeAgeSummary, SummaryTable};
use crate::common::plots::create_forest_plot;
use crate::common::{stats, PlotError};
use crate::parsing::{load_log, AgeChain, ParsingError};
use indicatif::ProgressBar;
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during node-age analysis
#[derive(Error, Debug)]
pub enum NodeAgeError {
    #[error("Parsing error: {0}")]
    Parsing(#[from] ParsingError),

    #[error("Plot generation error: {0}")]
    PlotGeneration(#[from] PlotError),

    #[error("failed to read log directory {}: {source}", path.display())]
    DirRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no .log input files found in {}", path.display())]
    NoInputFiles { path: PathBuf },

    #[error("duplicate taxon label '{taxon}' after cleaning; row labels must be unique")]
    DuplicateTaxon { taxon: String },

    #[error("failed to write CSV file {}: {source}", path.display())]
    CsvExport { path: PathBuf, source: csv::Error },
}

type Result<T> = core::result::Result<T, NodeAgeError>;

/// Collect all `.log` files in a directory, sorted by file name
///
/// File names are sorted lexicographically so the output ordering is
/// reproducible across platforms.
///
/// # Arguments
/// * `dir` - Directory to scan
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - The matching files, in sorted order
/// * `Err(NodeAgeError)` - If the directory is unreadable or holds no logs
pub fn collect_log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| NodeAgeError::DirRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| NodeAgeError::DirRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "log") {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(NodeAgeError::NoInputFiles {
            path: dir.to_path_buf(),
        });
    }
    Ok(files)
}

/// Summarize one node-age chain into a single table row
pub fn summarize_chain(chain: &AgeChain) -> NodeAgeSummary {
    let (lower, upper) = stats::hdi_95(&chain.samples);
    NodeAgeSummary {
        taxon: chain.parameter.clone(),
        mean: stats::mean(&chain.samples),
        stdev: stats::std_dev_population(&chain.samples),
        lower,
        upper,
        ess: stats::effective_sample_size(&chain.samples),
    }
}

/// Generate the complete node-age analysis for a directory of log files
///
/// Runs the loader and summarizer over every `.log` file, cleans the row
/// labels, sorts them descending, writes `<output_base>.csv`, and prints
/// the table to standard output. Labels are cleaned before the CSV is
/// written so the persisted table and the plot agree.
///
/// # Arguments
/// * `dir` - Directory containing the `.log` files
/// * `output_base` - Base name for the CSV output (`<output_base>.csv`)
/// * `burnin_fraction` - Fraction of leading samples to discard, in [0, 1)
///
/// # Returns
/// * `Ok(SummaryTable)` - The aggregated table, ready for plotting
/// * `Err(NodeAgeError)` - On the first file that fails to parse, on
///   duplicate labels, or on CSV export failure
pub fn generate_node_age_analysis(
    dir: &Path,
    output_base: &str,
    burnin_fraction: f64,
) -> Result<SummaryTable> {
    let files = collect_log_files(dir)?;
    info!("found {} log file(s) in {}", files.len(), dir.display());

    let progress = ProgressBar::new(files.len() as u64);
    let mut table = SummaryTable::default();
    for file in &files {
        let chain = load_log(file, burnin_fraction)?;
        debug!(
            "{}: {} samples retained for {}",
            file.display(),
            chain.samples.len(),
            chain.parameter
        );
        table.push(summarize_chain(&chain));
        progress.inc(1);
    }
    progress.finish_and_clear();

    table.clean_labels();
    if let Some(taxon) = table.duplicate_label() {
        return Err(NodeAgeError::DuplicateTaxon { taxon });
    }
    table.sort_descending();

    let csv_path = PathBuf::from(format!("{output_base}.csv"));
    write_summary_csv(&table, &csv_path)?;
    info!("wrote {}", csv_path.display());

    println!(
        "{}",
        format_summary_table(&table.records, Some("Node Age Summary"))
    );

    Ok(table)
}

/// Generate the forest plot for an aggregated summary table
///
/// # Arguments
/// * `table` - The aggregated table, in display order
/// * `output_base` - Base name for the plot output (`<output_base>.png`)
///
/// # Returns
/// * `Ok(())` - If the plot was successfully generated
/// * `Err(NodeAgeError)` - If plot generation failed
pub fn generate_node_age_plots(table: &SummaryTable, output_base: &str) -> Result<()> {
    let png_path = PathBuf::from(format!("{output_base}.png"));
    create_forest_plot(&table.records, &png_path)?;
    info!("wrote {}", png_path.display());
    Ok(())
}

/// Write the summary table to a CSV file
///
/// Columns: `taxon,mean,stdev,95%lower,95%upper,ess`, one row per taxon,
/// in table order.
fn write_summary_csv(table: &SummaryTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|source| NodeAgeError::CsvExport {
        path: path.to_path_buf(),
        source,
    })?;
    for record in &table.records {
        writer
            .serialize(record)
            .map_err(|source| NodeAgeError::CsvExport {
                path: path.to_path_buf(),
                source,
            })?;
    }
    writer.flush().map_err(|source| NodeAgeError::CsvExport {
        path: path.to_path_buf(),
        source: source.into(),
    })?;
    Ok(())
}
