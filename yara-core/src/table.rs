//! Per-sample metric tables.

use std::collections::HashSet;

use crate::{Result, YaraError};

/// Rows keyed by unique sample identifiers; named numeric metric columns plus
/// categorical group-label columns.
///
/// Missing numeric cells are stored as `NaN` and dropped by the analyzers.
/// Missing group labels are stored as empty strings and excluded from any
/// grouping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TableParts"))]
pub struct SampleMetricTable {
    sample_ids: Vec<String>,
    metrics: Vec<(String, Vec<f64>)>,
    groups: Vec<(String, Vec<String>)>,
}

impl SampleMetricTable {
    /// Create an empty table over the given samples.
    ///
    /// # Errors
    ///
    /// Returns [`YaraError::MalformedInput`] if a sample identifier repeats.
    pub fn new(sample_ids: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(sample_ids.len());
        for id in &sample_ids {
            if !seen.insert(id.as_str()) {
                return Err(YaraError::MalformedInput(format!(
                    "duplicate sample identifier '{}'",
                    id
                )));
            }
        }
        Ok(Self {
            sample_ids,
            metrics: Vec::new(),
            groups: Vec::new(),
        })
    }

    /// Add a numeric metric column.
    ///
    /// # Errors
    ///
    /// Returns [`YaraError::MalformedInput`] if the length does not match the
    /// number of samples or the column name is already used.
    pub fn with_metric(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        self.check_column(&name, values.len())?;
        self.metrics.push((name, values));
        Ok(self)
    }

    /// Add a categorical group column.
    ///
    /// # Errors
    ///
    /// Same conditions as [`with_metric`](Self::with_metric).
    pub fn with_group<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        labels: Vec<S>,
    ) -> Result<Self> {
        let name = name.into();
        self.check_column(&name, labels.len())?;
        self.groups
            .push((name, labels.into_iter().map(Into::into).collect()));
        Ok(self)
    }

    fn check_column(&self, name: &str, len: usize) -> Result<()> {
        if len != self.sample_ids.len() {
            return Err(YaraError::MalformedInput(format!(
                "column '{}' has {} values, expected {}",
                name,
                len,
                self.sample_ids.len()
            )));
        }
        if self.has_column(name) {
            return Err(YaraError::MalformedInput(format!(
                "duplicate column '{}'",
                name
            )));
        }
        Ok(())
    }

    /// Sample identifiers in row order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Number of rows.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Names of the numeric columns, in column order.
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|(n, _)| n.as_str())
    }

    /// Names of the group columns, in column order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(n, _)| n.as_str())
    }

    /// Whether a numeric or group column with this exact name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.metrics.iter().any(|(n, _)| n == name) || self.groups.iter().any(|(n, _)| n == name)
    }

    /// Values of a numeric column (exact name match).
    pub fn metric(&self, name: &str) -> Option<&[f64]> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Labels of a group column (exact name match).
    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Like [`metric`](Self::metric) but fails with [`YaraError::MissingData`].
    pub fn require_metric(&self, name: &str) -> Result<&[f64]> {
        self.metric(name).ok_or_else(|| {
            let available: Vec<&str> = self.metric_names().collect();
            YaraError::MissingData(format!(
                "metric '{}' not found; available: {:?}",
                name, available
            ))
        })
    }

    /// Like [`group`](Self::group) but fails with [`YaraError::MissingData`].
    pub fn require_group(&self, name: &str) -> Result<&[String]> {
        self.group(name).ok_or_else(|| {
            YaraError::MissingData(format!("group column '{}' not found", name))
        })
    }

    /// Non-missing values of `metric`, partitioned by the labels of `group`.
    ///
    /// Groups are returned in order of first appearance. Rows with an empty
    /// group label or a `NaN` metric value are skipped; a group whose rows are
    /// all `NaN` is still listed, with no values.
    pub fn partition(&self, group: &str, metric: &str) -> Result<Vec<(String, Vec<f64>)>> {
        let labels = self.require_group(group)?;
        let values = self.require_metric(metric)?;

        let mut parts: Vec<(String, Vec<f64>)> = Vec::new();
        for (label, &value) in labels.iter().zip(values) {
            if label.is_empty() {
                continue;
            }
            let idx = match parts.iter().position(|(l, _)| l == label) {
                Some(i) => i,
                None => {
                    parts.push((label.clone(), Vec::new()));
                    parts.len() - 1
                }
            };
            if !value.is_nan() {
                parts[idx].1.push(value);
            }
        }
        Ok(parts)
    }
}

/// Drop `NaN` entries, returning the defined values.
pub fn defined_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Serialized form, rebuilt column by column through the checked builders.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct TableParts {
    sample_ids: Vec<String>,
    metrics: Vec<(String, Vec<f64>)>,
    groups: Vec<(String, Vec<String>)>,
}

#[cfg(feature = "serde")]
impl TryFrom<TableParts> for SampleMetricTable {
    type Error = YaraError;

    fn try_from(parts: TableParts) -> Result<Self> {
        let mut table = Self::new(parts.sample_ids)?;
        for (name, values) in parts.metrics {
            table = table.with_metric(name, values)?;
        }
        for (name, labels) in parts.groups {
            table = table.with_group(name, labels)?;
        }
        Ok(table)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("S{}", i)).collect()
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = SampleMetricTable::new(vec!["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, YaraError::MalformedInput(_)));
    }

    #[test]
    fn column_length_checked() {
        let table = SampleMetricTable::new(ids(3)).unwrap();
        assert!(table.with_metric("shannon", vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn duplicate_column_rejected() {
        let table = SampleMetricTable::new(ids(2))
            .unwrap()
            .with_metric("shannon", vec![1.0, 2.0])
            .unwrap();
        assert!(table.with_group("shannon", vec!["a", "b"]).is_err());
    }

    #[test]
    fn exact_name_lookup() {
        let table = SampleMetricTable::new(ids(2))
            .unwrap()
            .with_metric("shannon_entropy", vec![1.0, 2.0])
            .unwrap();
        assert!(table.metric("shannon").is_none());
        let err = table.require_metric("shannon").unwrap_err();
        assert!(matches!(err, YaraError::MissingData(_)));
        assert!(err.to_string().contains("shannon_entropy"));
    }

    #[test]
    fn partition_first_appearance_order() {
        let table = SampleMetricTable::new(ids(6))
            .unwrap()
            .with_metric("m", vec![1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0])
            .unwrap()
            .with_group("site", vec!["river", "soil", "river", "", "soil", "lake"])
            .unwrap();
        let parts = table.partition("site", "m").unwrap();
        let names: Vec<&str> = parts.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["river", "soil", "lake"]);
        assert_eq!(parts[0].1, vec![1.0]);
        assert_eq!(parts[1].1, vec![2.0, 5.0]);
        assert_eq!(parts[2].1, vec![6.0]);
    }

    #[test]
    fn defined_values_drops_nan() {
        assert_eq!(defined_values(&[1.0, f64::NAN, 3.0]), vec![1.0, 3.0]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_checks_column_lengths() {
        let ok = r#"{"sample_ids":["S1","S2"],"metrics":[["shannon",[1.0,2.0]]],"groups":[["site",["a","b"]]]}"#;
        let t: SampleMetricTable = serde_json::from_str(ok).unwrap();
        assert_eq!(t.group("site").unwrap()[1], "b");

        let short = r#"{"sample_ids":["S1","S2"],"metrics":[["shannon",[1.0]]],"groups":[]}"#;
        assert!(serde_json::from_str::<SampleMetricTable>(short).is_err());
        let dup = r#"{"sample_ids":["S1","S1"],"metrics":[],"groups":[]}"#;
        assert!(serde_json::from_str::<SampleMetricTable>(dup).is_err());
    }
}
