//! Log file parsing functionality for BEAST-style trace output
//!
//! This module handles loading one divergence-time log file: patching the
//! malformed header block, stripping comment lines, parsing the tabular
//! sample data, applying the burn-in cutoff, and selecting the node-age
//! column.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker comment that must be followed by a blank line for the tabular
/// section to parse.
pub const SKYGRID_MARKER: &str = "# keywords: skygrid";

/// Errors that can occur while parsing a log file
#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("failed to read log file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to rewrite log file {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no header row found in {}", path.display())]
    MissingHeader { path: PathBuf },

    #[error("no data rows found in {}", path.display())]
    NoDataRows { path: PathBuf },

    #[error("{}, line {line}: expected {expected} fields, found {found}", path.display())]
    RowWidthMismatch {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{}, line {line}: '{token}' is not a number", path.display())]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("no age-parameter column found in {} (columns: {columns:?})", path.display())]
    NoAgeColumn {
        path: PathBuf,
        columns: Vec<String>,
    },

    #[error("multiple age-parameter columns found in {}: {candidates:?}", path.display())]
    AmbiguousAgeColumn {
        path: PathBuf,
        candidates: Vec<String>,
    },

    #[error(
        "no samples remain in {} after discarding a burn-in fraction of {burnin}",
        path.display()
    )]
    EmptyAfterBurnin { path: PathBuf, burnin: f64 },
}

type Result<T> = core::result::Result<T, ParsingError>;

/// The node-age samples extracted from one log file
#[derive(Debug, Clone)]
pub struct AgeChain {
    /// Raw parameter name of the selected column, e.g. `age(Taxon_ND5)`
    pub parameter: String,
    /// Post-burn-in sample values, in chain order
    pub samples: Vec<f64>,
}

/// Rewrite a log file in place so a blank line follows the skygrid marker
///
/// The tabular reader requires the marker comment to be separated from the
/// lines after it. All other lines are copied unchanged, in their original
/// order. Idempotent: if the line after the marker is already blank the file
/// content is left byte-identical.
///
/// # Arguments
/// * `path` - Path of the log file to patch, rewritten destructively
///
/// # Returns
/// * `Ok(())` - If the file was patched (or already patched)
/// * `Err(ParsingError)` - If the file could not be read or rewritten
pub fn patch_header(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|source| ParsingError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<&str> = content.lines().collect();
    let mut patched: Vec<&str> = Vec::with_capacity(lines.len() + 1);
    let mut changed = false;

    for (idx, line) in lines.iter().enumerate() {
        patched.push(line);
        if line.contains(SKYGRID_MARKER) {
            let next_is_blank = lines.get(idx + 1).is_some_and(|next| next.trim().is_empty());
            if !next_is_blank {
                patched.push("");
                changed = true;
            }
        }
    }

    if !changed {
        return Ok(());
    }

    let mut output = patched.join("\n");
    output.push('\n');
    fs::write(path, output).map_err(|source| ParsingError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one log file and extract its node-age chain
///
/// This function:
/// - Patches the header block (always, even if already patched)
/// - Skips comment lines (prefix `#`) and blank lines
/// - Parses the first remaining line as the header row; the first field is
///   the sample-index column and carries no parameter
/// - Parses every following line as whitespace/tab-delimited numbers
/// - Discards the first `floor(rows × burnin_fraction)` rows as burn-in
/// - Selects the single column whose name marks it as a node-age parameter
///
/// # Arguments
/// * `path` - Path to the log file
/// * `burnin_fraction` - Fraction of leading samples to discard, in [0, 1)
///
/// # Returns
/// * `Ok(AgeChain)` - The selected column's post-burn-in samples and name
/// * `Err(ParsingError)` - If the file is unreadable, malformed, has no
///   (or several) matching columns, or retains no samples after burn-in
pub fn load_log(path: &Path, burnin_fraction: f64) -> Result<AgeChain> {
    patch_header(path)?;

    let content = fs::read_to_string(path).map_err(|source| ParsingError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut parameters: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match &parameters {
            None => {
                // Header row; drop the sample-index column name.
                parameters = Some(fields.iter().skip(1).map(|f| f.to_string()).collect());
            }
            Some(names) => {
                if fields.len() != names.len() + 1 {
                    return Err(ParsingError::RowWidthMismatch {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        expected: names.len() + 1,
                        found: fields.len(),
                    });
                }
                let mut row = Vec::with_capacity(names.len());
                for token in fields.iter().skip(1) {
                    let value =
                        token
                            .parse::<f64>()
                            .map_err(|_| ParsingError::InvalidNumber {
                                path: path.to_path_buf(),
                                line: idx + 1,
                                token: token.to_string(),
                            })?;
                    row.push(value);
                }
                rows.push(row);
            }
        }
    }

    let parameters = parameters.ok_or_else(|| ParsingError::MissingHeader {
        path: path.to_path_buf(),
    })?;
    if rows.is_empty() {
        return Err(ParsingError::NoDataRows {
            path: path.to_path_buf(),
        });
    }

    let burn_in = (rows.len() as f64 * burnin_fraction).floor() as usize;
    let retained = &rows[burn_in.min(rows.len())..];
    if retained.is_empty() {
        return Err(ParsingError::EmptyAfterBurnin {
            path: path.to_path_buf(),
            burnin: burnin_fraction,
        });
    }

    let matches: Vec<usize> = parameters
        .iter()
        .enumerate()
        .filter(|(_, name)| is_age_parameter(name))
        .map(|(idx, _)| idx)
        .collect();

    let column = match matches.as_slice() {
        [] => {
            return Err(ParsingError::NoAgeColumn {
                path: path.to_path_buf(),
                columns: parameters,
            })
        }
        [single] => *single,
        several => {
            return Err(ParsingError::AmbiguousAgeColumn {
                path: path.to_path_buf(),
                candidates: several.iter().map(|&i| parameters[i].clone()).collect(),
            })
        }
    };

    Ok(AgeChain {
        parameter: parameters[column].clone(),
        samples: retained.iter().map(|row| row[column]).collect(),
    })
}

/// Whether a column name denotes a node-age parameter
///
/// Node-age columns carry both the `age` marker and an `ND` node label,
/// e.g. `age(Taxon_ND5)`.
fn is_age_parameter(name: &str) -> bool {
    name.contains("age") && name.contains("ND")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_log(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const SAMPLE_LOG: &str = "\
# BEAST v1.10.4
# keywords: skygrid
# generated Tue May 10
state\tposterior\tage(Taxon_ND5)\tclock.rate
0\t-123.4\t150000.0\t0.001
1\t-122.9\t160000.0\t0.001
2\t-121.7\t170000.0\t0.002
3\t-120.2\t180000.0\t0.002
4\t-119.8\t190000.0\t0.002
";

    #[test]
    fn test_patch_header_inserts_blank_line_once() {
        let file = write_log(SAMPLE_LOG);
        patch_header(file.path()).unwrap();
        let first = fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = first.lines().collect();
        let marker = lines
            .iter()
            .position(|l| l.contains(SKYGRID_MARKER))
            .unwrap();
        assert_eq!(lines[marker + 1], "");

        // Patching again must leave the file byte-identical.
        patch_header(file.path()).unwrap();
        let second = fs::read_to_string(file.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_patch_header_preserves_other_lines() {
        let file = write_log(SAMPLE_LOG);
        patch_header(file.path()).unwrap();
        let patched = fs::read_to_string(file.path()).unwrap();

        let original: Vec<&str> = SAMPLE_LOG.lines().collect();
        let kept: Vec<&str> = patched.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(original, kept);
    }

    #[test]
    fn test_load_log_selects_age_column() {
        let file = write_log(SAMPLE_LOG);
        let chain = load_log(file.path(), 0.0).unwrap();
        assert_eq!(chain.parameter, "age(Taxon_ND5)");
        assert_eq!(
            chain.samples,
            vec![150000.0, 160000.0, 170000.0, 180000.0, 190000.0]
        );
    }

    #[test]
    fn test_load_log_burnin_row_count() {
        let file = write_log(SAMPLE_LOG);

        // floor(5 * 0.2) = 1 row dropped
        let chain = load_log(file.path(), 0.2).unwrap();
        assert_eq!(chain.samples.len(), 4);
        assert_eq!(chain.samples[0], 160000.0);

        // floor(5 * 0.5) = 2 rows dropped
        let chain = load_log(file.path(), 0.5).unwrap();
        assert_eq!(chain.samples.len(), 3);
        assert_eq!(chain.samples[0], 170000.0);
    }

    #[test]
    fn test_load_log_burnin_of_one_is_insufficient_data() {
        // The CLI validates the fraction to [0, 1); a cutoff that still
        // consumes every row must surface as an explicit error.
        let file = write_log(SAMPLE_LOG);
        let result = load_log(file.path(), 1.0);
        assert!(matches!(
            result,
            Err(ParsingError::EmptyAfterBurnin { .. })
        ));
    }

    #[test]
    fn test_load_log_retains_all_rows_for_fraction_just_below_one() {
        let file = write_log(SAMPLE_LOG);
        let chain = load_log(file.path(), 0.99).unwrap();
        // floor(5 * 0.99) = 4 rows dropped, one retained
        assert_eq!(chain.samples, vec![190000.0]);
    }

    #[test]
    fn test_load_log_no_age_column() {
        let log = "\
# keywords: skygrid
state\tposterior\tclock.rate
0\t-10.0\t0.001
1\t-11.0\t0.002
";
        let file = write_log(log);
        let result = load_log(file.path(), 0.0);
        assert!(matches!(result, Err(ParsingError::NoAgeColumn { .. })));
    }

    #[test]
    fn test_load_log_ambiguous_age_columns() {
        let log = "\
# keywords: skygrid
state\tage(A_ND1)\tage(B_ND2)
0\t10.0\t20.0
1\t11.0\t21.0
";
        let file = write_log(log);
        let result = load_log(file.path(), 0.0);
        assert!(matches!(
            result,
            Err(ParsingError::AmbiguousAgeColumn { .. })
        ));
    }

    #[test]
    fn test_load_log_missing_header_and_rows() {
        let comments_only = write_log("# keywords: skygrid\n# nothing else\n");
        assert!(matches!(
            load_log(comments_only.path(), 0.0),
            Err(ParsingError::MissingHeader { .. })
        ));

        let header_only = write_log("# keywords: skygrid\nstate\tage(A_ND1)\n");
        assert!(matches!(
            load_log(header_only.path(), 0.0),
            Err(ParsingError::NoDataRows { .. })
        ));
    }

    #[test]
    fn test_load_log_row_width_mismatch() {
        let log = "\
state\tage(A_ND1)\tclock.rate
0\t10.0\t0.001
1\t11.0
";
        let file = write_log(log);
        let result = load_log(file.path(), 0.0);
        assert!(matches!(
            result,
            Err(ParsingError::RowWidthMismatch { line: 3, .. })
        ));
    }

    #[test]
    fn test_load_log_invalid_number() {
        let log = "\
state\tage(A_ND1)
0\t10.0
1\tnot-a-number
";
        let file = write_log(log);
        let result = load_log(file.path(), 0.0);
        assert!(matches!(
            result,
            Err(ParsingError::InvalidNumber { line: 3, .. })
        ));
    }

    #[test]
    fn test_is_age_parameter() {
        assert!(is_age_parameter("age(Taxon_ND5)"));
        assert!(!is_age_parameter("age(root)"));
        assert!(!is_age_parameter("ND5.frequencies"));
        assert!(!is_age_parameter("clock.rate"));
    }
}
