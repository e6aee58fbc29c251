//! Summary record and result table types shared across the pipeline

use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Summary statistics for one node-age parameter, one row per input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct NodeAgeSummary {
    /// Row label; the raw parameter name until [`SummaryTable::clean_labels`]
    /// reduces it to the taxon
    #[tabled(rename = "Taxon")]
    pub taxon: String,
    /// Posterior mean age
    #[tabled(rename = "Mean")]
    pub mean: f64,
    /// Population standard deviation of the chain
    #[tabled(rename = "Stdev")]
    pub stdev: f64,
    /// Lower bound of the 95% highest-density interval
    #[serde(rename = "95%lower")]
    #[tabled(rename = "95% Lower")]
    pub lower: f64,
    /// Upper bound of the 95% highest-density interval
    #[serde(rename = "95%upper")]
    #[tabled(rename = "95% Upper")]
    pub upper: f64,
    /// Effective sample size of the chain
    #[tabled(rename = "ESS")]
    pub ess: f64,
}

/// Ordered collection of per-file summary records
#[derive(Debug, Clone, Default)]
pub struct SummaryTable {
    pub records: Vec<NodeAgeSummary>,
}

impl SummaryTable {
    pub fn push(&mut self, record: NodeAgeSummary) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reduce every row label to its taxon name via [`clean_taxon_label`]
    pub fn clean_labels(&mut self) {
        for record in &mut self.records {
            record.taxon = clean_taxon_label(&record.taxon);
        }
    }

    /// First label occurring more than once, if any
    pub fn duplicate_label(&self) -> Option<String> {
        for (idx, record) in self.records.iter().enumerate() {
            if self.records[..idx].iter().any(|r| r.taxon == record.taxon) {
                return Some(record.taxon.clone());
            }
        }
        None
    }

    /// Sort rows by label, descending lexicographic order
    pub fn sort_descending(&mut self) {
        self.records.sort_by(|a, b| b.taxon.cmp(&a.taxon));
    }
}

/// Derive the taxon name from a raw parameter name
///
/// Strips the literal `age(` prefix and `)` suffix, then truncates at the
/// first `_`: `age(Homo_sapiens)` becomes `Homo`. Idempotent, so cleaning
/// an already-cleaned label returns it unchanged.
pub fn clean_taxon_label(raw: &str) -> String {
    let stripped = raw.strip_prefix("age(").unwrap_or(raw);
    let stripped = stripped.strip_suffix(')').unwrap_or(stripped);
    match stripped.split_once('_') {
        Some((taxon, _)) => taxon.to_string(),
        None => stripped.to_string(),
    }
}

/// Formats summary records as an ASCII table using the [`tabled`] crate
///
/// # Arguments
/// * `records` - A slice of [`NodeAgeSummary`] to format
/// * `title` - Optional title for the table
///
/// # Returns
/// A formatted ASCII table as a [`String`]
pub fn format_summary_table(records: &[NodeAgeSummary], title: Option<&str>) -> String {
    if records.is_empty() {
        return "No summaries available".to_string();
    }

    let table = Table::new(records).to_string();

    if let Some(title) = title {
        format!("{}\n{}\n{}", title, "=".repeat(title.len()), table)
    } else {
        table
    }
}
