//! Delimited-text parsing into the canonical tables.
//!
//! Every format shares one reading step ([`read_table`]) that picks the
//! delimiter, drops QIIME directive rows, and returns a [`RawTable`]. The
//! typed parsers then coerce a `RawTable` into a [`SampleMetricTable`],
//! [`DistanceMatrix`], taxonomy records, or rarefaction curves.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use ::csv::{ReaderBuilder, Trim};
use yara_core::{
    DistanceMatrix, RarefactionCurve, Result, SampleMetricTable, Summarizable, TaxonomyRecord,
    YaraError,
};

/// First-cell prefix of QIIME metadata directive rows.
pub const DIRECTIVE_PREFIX: &str = "#q2:";

/// A header and string rows, exactly as read.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse delimited text with a header row.
    ///
    /// Cells are trimmed, blank lines ignored, and rows whose first cell
    /// starts with [`DIRECTIVE_PREFIX`] skipped.
    ///
    /// # Errors
    ///
    /// Returns [`YaraError::MalformedInput`] for a missing header or a row
    /// whose width differs from the header.
    pub fn parse(text: &str, delimiter: u8) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| YaraError::MalformedInput(e.to_string()))?
            .iter()
            .map(|s| s.to_string())
            .collect();
        if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return Err(YaraError::MalformedInput("missing header row".into()));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| YaraError::MalformedInput(e.to_string()))?;
            if record.get(0).is_some_and(|c| c.starts_with(DIRECTIVE_PREFIX)) {
                continue;
            }
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Number of data rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column named `name`, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Cells of column `index`, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[index].as_str())
    }
}

impl Summarizable for RawTable {
    fn summary(&self) -> String {
        format!(
            "{} rows x {} columns ({})",
            self.rows.len(),
            self.columns.len(),
            self.columns.join(", ")
        )
    }
}

// ── Reading ────────────────────────────────────────────────────────────────

/// Delimiter for `path`: by extension, else sniffed from `header_line`.
///
/// `.csv` is comma; `.tsv` and `.txt` are tab. Otherwise a tab anywhere in
/// the header selects tab, and comma is the fallback.
pub fn delimiter_for(path: &Path, header_line: &str) -> u8 {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => b',',
        Some("tsv") | Some("txt") => b'\t',
        _ if header_line.contains('\t') => b'\t',
        _ => b',',
    }
}

/// Whether `file_name` has a delimited-text extension.
pub fn is_tabular(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    [".tsv", ".csv", ".txt"].iter().any(|ext| lower.ends_with(ext))
}

/// Read a delimited file into a [`RawTable`].
pub fn read_table(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| with_source(path, e))?;
    read_table_from(file, path)
}

/// Read delimited text from `reader`.
///
/// `source` names the stream: its extension picks the delimiter and it
/// prefixes error messages. It is never opened.
pub fn read_table_from<R: Read>(mut reader: R, source: &Path) -> Result<RawTable> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| with_source(source, e))?;
    let header = text.lines().next().unwrap_or("");
    let delimiter = delimiter_for(source, header);
    RawTable::parse(&text, delimiter).map_err(|e| match e {
        YaraError::MalformedInput(msg) => {
            YaraError::MalformedInput(format!("{}: {}", source.display(), msg))
        }
        other => other,
    })
}

pub(crate) fn with_source(source: &Path, e: io::Error) -> YaraError {
    YaraError::Io(io::Error::new(
        e.kind(),
        format!("{}: {}", source.display(), e),
    ))
}

// ── Typed parsers ──────────────────────────────────────────────────────────

fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}

fn non_numeric(raw: &RawTable, row: usize, column: usize) -> YaraError {
    YaraError::MalformedInput(format!(
        "row {} ('{}'), column '{}': '{}' is not numeric",
        row + 1,
        raw.rows[row][0],
        raw.columns[column],
        raw.rows[row][column]
    ))
}

fn numeric_column(raw: &RawTable, column: usize) -> Result<Vec<f64>> {
    raw.column(column)
        .enumerate()
        .map(|(row, cell)| parse_cell(cell).ok_or_else(|| non_numeric(raw, row, column)))
        .collect()
}

enum ColumnKind {
    Numeric,
    Categorical,
}

/// Numeric if every non-empty cell parses, categorical if none does.
fn classify(raw: &RawTable, column: usize) -> Result<ColumnKind> {
    let mut first_numeric = None;
    let mut first_text = None;
    for (row, cell) in raw.column(column).enumerate() {
        if cell.is_empty() {
            continue;
        }
        if cell.parse::<f64>().is_ok() {
            first_numeric.get_or_insert(row);
        } else {
            first_text.get_or_insert(row);
        }
    }
    match (first_numeric, first_text) {
        (Some(_), Some(row)) => Err(YaraError::MalformedInput(format!(
            "column '{}' mixes numeric and non-numeric values (row {}: '{}')",
            raw.columns[column],
            row + 1,
            raw.rows[row][column]
        ))),
        (None, Some(_)) => Ok(ColumnKind::Categorical),
        _ => Ok(ColumnKind::Numeric),
    }
}

/// Coerce a raw table into a [`SampleMetricTable`].
///
/// The first column holds sample identifiers. Columns named in
/// `group_columns` are categorical and all others must be numeric. With no
/// declared group columns, a column whose non-empty cells are all
/// non-numeric is taken as categorical. Empty numeric cells become `NaN`.
///
/// # Errors
///
/// - [`YaraError::MissingData`] if a declared group column is absent.
/// - [`YaraError::MalformedInput`] for a non-numeric cell in a numeric
///   column, a mixed column, or a repeated sample identifier.
pub fn alpha_table(raw: &RawTable, group_columns: &[String]) -> Result<SampleMetricTable> {
    for g in group_columns {
        if !raw.columns.iter().skip(1).any(|c| c == g) {
            return Err(YaraError::MissingData(format!(
                "group column '{}' not found; available: {}",
                g,
                raw.columns.iter().skip(1).cloned().collect::<Vec<_>>().join(", ")
            )));
        }
    }

    let ids = raw.column(0).map(str::to_string).collect();
    let mut table = SampleMetricTable::new(ids)?;

    for (c, name) in raw.columns.iter().enumerate().skip(1) {
        let kind = if group_columns.contains(name) {
            ColumnKind::Categorical
        } else if group_columns.is_empty() {
            classify(raw, c)?
        } else {
            ColumnKind::Numeric
        };
        table = match kind {
            ColumnKind::Categorical => {
                table.with_group(name.as_str(), raw.column(c).collect::<Vec<_>>())?
            }
            ColumnKind::Numeric => table.with_metric(name.as_str(), numeric_column(raw, c)?)?,
        };
    }
    Ok(table)
}

/// Coerce a raw table into a [`DistanceMatrix`].
///
/// The header (after the first cell) and the first column must list the
/// same sample identifiers in the same order.
///
/// # Errors
///
/// Returns [`YaraError::MalformedInput`] for mismatched identifiers, a
/// non-numeric or empty cell, or a matrix that is not a valid distance
/// matrix.
pub fn distance_matrix(raw: &RawTable) -> Result<DistanceMatrix> {
    let ids: Vec<String> = raw.columns[1..].to_vec();
    if raw.rows.len() != ids.len() {
        return Err(YaraError::MalformedInput(format!(
            "distance matrix has {} rows for {} header identifiers",
            raw.rows.len(),
            ids.len()
        )));
    }

    let mut rows = Vec::with_capacity(ids.len());
    for (i, record) in raw.rows.iter().enumerate() {
        if record[0] != ids[i] {
            return Err(YaraError::MalformedInput(format!(
                "row {} is labelled '{}' but header position {} is '{}'",
                i + 1,
                record[0],
                i + 1,
                ids[i]
            )));
        }
        let row = (1..record.len())
            .map(|c| match record[c].parse::<f64>() {
                Ok(v) => Ok(v),
                Err(_) => Err(non_numeric(raw, i, c)),
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    DistanceMatrix::new(ids, rows)
}

/// Coerce a raw table into taxonomy records.
///
/// The feature identifier comes from the `Feature ID` column (any case) or,
/// failing that, the first column. `Taxon` is required and `Confidence` is
/// optional; an empty confidence cell is `None`.
///
/// # Errors
///
/// - [`YaraError::MissingData`] if there is no `Taxon` column.
/// - [`YaraError::MalformedInput`] for a confidence that is not a number
///   in `[0, 1]`.
pub fn taxonomy_records(raw: &RawTable) -> Result<Vec<TaxonomyRecord>> {
    let id_col = raw.column_index("Feature ID").unwrap_or(0);
    let taxon_col = raw.column_index("Taxon").ok_or_else(|| {
        YaraError::MissingData(format!(
            "taxonomy table has no 'Taxon' column; found: {}",
            raw.columns.join(", ")
        ))
    })?;
    let confidence_col = raw.column_index("Confidence");

    raw.rows
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let confidence = match confidence_col.map(|c| record[c].as_str()) {
                None | Some("") => None,
                Some(cell) => match cell.parse::<f64>() {
                    Ok(v) if (0.0..=1.0).contains(&v) => Some(v),
                    _ => {
                        return Err(YaraError::MalformedInput(format!(
                            "row {} ('{}'): confidence '{}' is not a number in [0, 1]",
                            i + 1,
                            record[id_col],
                            cell
                        )))
                    }
                },
            };
            Ok(TaxonomyRecord::from_label(
                record[id_col].as_str(),
                &record[taxon_col],
                confidence,
            ))
        })
        .collect()
}

/// Depth named by a rarefaction column header.
///
/// Accepts a bare integer (`5000`) or the iterated form
/// (`depth-5000_iter-3`). Anything else is a metadata column.
fn header_depth(header: &str) -> Option<u64> {
    if let Ok(d) = header.parse::<u64>() {
        return Some(d);
    }
    let rest = header.strip_prefix("depth-")?;
    let (depth, iter) = rest.split_once("_iter-")?;
    iter.parse::<u64>().ok()?;
    depth.parse().ok()
}

/// Coerce a raw table into one curve per row.
///
/// Iterations of the same depth are averaged; empty cells are skipped. A
/// curve whose values ever decrease is kept but logged as a warning.
///
/// # Errors
///
/// Returns [`YaraError::MalformedInput`] if no column names a depth, a cell
/// is not numeric, or a curve is invalid (zero depth, negative count).
pub fn rarefaction_curves(raw: &RawTable) -> Result<Vec<RarefactionCurve>> {
    let depth_columns: Vec<(usize, u64)> = raw
        .columns
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(c, h)| header_depth(h).map(|d| (c, d)))
        .collect();
    if depth_columns.is_empty() {
        return Err(YaraError::MalformedInput(format!(
            "no depth columns among: {}",
            raw.columns.join(", ")
        )));
    }

    let mut curves = Vec::with_capacity(raw.rows.len());
    for (i, record) in raw.rows.iter().enumerate() {
        let mut sums: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
        for &(c, depth) in &depth_columns {
            let v = parse_cell(&record[c]).ok_or_else(|| non_numeric(raw, i, c))?;
            if v.is_nan() {
                continue;
            }
            let slot = sums.entry(depth).or_insert((0.0, 0));
            slot.0 += v;
            slot.1 += 1;
        }
        let curve = RarefactionCurve::new(
            record[0].as_str(),
            sums.into_iter().map(|(d, (sum, n))| (d, sum / n as f64)),
        )?;
        let drops = curve.monotonicity_violations();
        if !drops.is_empty() {
            log::warn!(
                "rarefaction curve for '{}' decreases at depths {:?}",
                curve.sample_id(),
                drops
            );
        }
        curves.push(curve);
    }
    Ok(curves)
}
