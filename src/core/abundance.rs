//! Abundance table loading and normalization check

use crate::core::error::{ColumnExcess, FileRole, PipelineError};
use std::path::Path;
use tracing::{debug, info};

/// Largest per-sample total accepted as "normalized"; the slack above 1.0
/// absorbs rounding in exported relative abundances
pub const NORMALIZATION_TOLERANCE: f64 = 1.01;

/// Relative abundances: one row per feature (organism), one column per sample
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceTable {
    /// Sample labels from the header row, label column excluded
    pub samples: Vec<String>,
    /// Feature labels from the first column
    pub features: Vec<String>,
    /// `values[row][sample]`; missing or non-numeric cells are 0.0
    pub values: Vec<Vec<f64>>,
}

impl AbundanceTable {
    /// Load a delimited table. The first row and first column are labels.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::missing(FileRole::Abundance, path));
        }
        if is_spreadsheet(path) {
            return Err(PipelineError::validation(
                "abundancePath",
                format!(
                    "{} is a spreadsheet workbook; export the table as CSV or TSV",
                    path.display()
                ),
            ));
        }
        let bytes = std::fs::read(path)?;
        let delimiter = delimiter_for(path, &bytes);
        debug!(
            "Reading abundance table {} (delimiter {:?})",
            path.display(),
            delimiter as char
        );
        Self::from_reader(&bytes[..], delimiter).map_err(|source| PipelineError::AbundanceParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a table from any reader with an explicit delimiter
    pub fn from_reader<R: std::io::Read>(reader: R, delimiter: u8) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(delimiter)
            .from_reader(reader);

        let mut records = reader.byte_records();
        let samples: Vec<String> = match records.next() {
            Some(header) => header?.iter().skip(1).map(label).collect(),
            None => Vec::new(),
        };

        let mut features = Vec::new();
        let mut values = Vec::new();
        for record in records {
            let record = record?;
            if record.iter().all(<[u8]>::is_empty) {
                continue;
            }
            features.push(record.get(0).map(label).unwrap_or_default());
            let row = (0..samples.len())
                .map(|col| parse_cell(record.get(col + 1)))
                .collect();
            values.push(row);
        }

        Ok(Self {
            samples,
            features,
            values,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Per-sample totals, in sample order
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.samples.len()];
        for row in &self.values {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value;
            }
        }
        sums
    }
}

/// Checks that no sample's total abundance exceeds the tolerance
#[derive(Debug, Clone, Copy)]
pub struct AbundanceValidator {
    tolerance: f64,
}

impl Default for AbundanceValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl AbundanceValidator {
    pub fn new() -> Self {
        Self::with_tolerance(NORMALIZATION_TOLERANCE)
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Load the table at `path` and check it; returns the loaded table
    pub fn validate(&self, path: &Path) -> Result<AbundanceTable, PipelineError> {
        let table = AbundanceTable::from_path(path)?;
        self.check(&table)?;
        info!(
            "Abundance table {} is normalized ({} features x {} samples)",
            path.display(),
            table.feature_count(),
            table.sample_count()
        );
        Ok(table)
    }

    /// Check an already loaded table
    pub fn check(&self, table: &AbundanceTable) -> Result<(), PipelineError> {
        if table.samples.is_empty() {
            return Err(PipelineError::validation(
                "abundancePath",
                "abundance table has no sample columns",
            ));
        }

        let columns: Vec<ColumnExcess> = table
            .column_sums()
            .into_iter()
            .enumerate()
            .filter(|(_, total)| *total > self.tolerance)
            .map(|(index, total)| ColumnExcess {
                index,
                sample: table.samples[index].clone(),
                total,
            })
            .collect();

        if columns.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::NotNormalized {
                tolerance: self.tolerance,
                columns,
            })
        }
    }
}

/// Labels keep undecodable bytes as U+FFFD instead of failing the table
fn label(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_cell(cell: Option<&[u8]>) -> f64 {
    cell.and_then(|c| std::str::from_utf8(c).ok())
        .and_then(|c| c.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Binary workbook formats the delimited reader cannot parse
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pick the delimiter from the extension, falling back to sniffing the
/// header line
fn delimiter_for(path: &Path, bytes: &[u8]) -> u8 {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => b',',
        Some("tsv") | Some("tab") => b'\t',
        _ => {
            let header = bytes.split(|b| *b == b'\n').next().unwrap_or(&[]);
            if header.contains(&b'\t') {
                b'\t'
            } else if header.contains(&b';') && !header.contains(&b',') {
                b';'
            } else {
                b','
            }
        }
    }
}
