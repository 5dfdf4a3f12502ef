//! Path-level entry point: detect the kind, unpack archives, parse.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use yara_core::{
    DistanceMatrix, RarefactionCurve, Result, SampleMetricTable, Summarizable, TaxonomyRecord,
    YaraError,
};

use crate::delimited::{
    alpha_table, distance_matrix, rarefaction_curves, read_table, read_table_from, taxonomy_records,
    with_source, RawTable,
};
use crate::kind::DataKind;

/// File extensions treated as zip-style archives.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "qza", "qzv"];

/// Options for [`load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Alpha-table columns to read as categorical group labels.
    pub group_columns: Vec<String>,
}

impl LoadOptions {
    /// Options declaring `columns` as group columns.
    pub fn with_groups<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            group_columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// A loaded file in its canonical shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadedData {
    Alpha(SampleMetricTable),
    Beta(DistanceMatrix),
    Taxonomy(Vec<TaxonomyRecord>),
    Rarefaction(Vec<RarefactionCurve>),
    Raw(RawTable),
}

impl LoadedData {
    /// The kind this value was parsed as.
    pub fn kind(&self) -> DataKind {
        match self {
            Self::Alpha(_) => DataKind::Alpha,
            Self::Beta(_) => DataKind::Beta,
            Self::Taxonomy(_) => DataKind::Taxonomy,
            Self::Rarefaction(_) => DataKind::Rarefaction,
            Self::Raw(_) => DataKind::Raw,
        }
    }
}

impl Summarizable for LoadedData {
    fn summary(&self) -> String {
        match self {
            Self::Alpha(t) => format!(
                "alpha table: {} samples, metrics [{}]",
                t.n_samples(),
                t.metric_names().collect::<Vec<_>>().join(", ")
            ),
            Self::Beta(m) => format!("distance matrix: {} samples", m.len()),
            Self::Taxonomy(r) => format!("taxonomy: {} features", r.len()),
            Self::Rarefaction(c) => format!("rarefaction: {} curves", c.len()),
            Self::Raw(t) => format!("table: {}", t.summary()),
        }
    }
}

/// Whether `path` has an archive extension.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| ARCHIVE_EXTENSIONS.contains(&e.as_str()))
}

/// Load `path` as `kind`.
///
/// [`DataKind::Auto`] detects the kind from the file name. For an archive
/// whose own name carries no keyword, the kind is detected from the chosen
/// entry's name instead. Archive contents live in a temporary directory that
/// is removed before this function returns.
///
/// # Errors
///
/// - [`YaraError::MissingData`] if the file does not exist, an archive has
///   no matching entry, archive support is not compiled in, or a required
///   column is absent.
/// - [`YaraError::MalformedInput`] if the content does not fit the kind.
pub fn load(path: impl AsRef<Path>, kind: DataKind, options: &LoadOptions) -> Result<LoadedData> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(YaraError::MissingData(format!(
            "{}: file not found",
            path.display()
        )));
    }

    if is_archive(path) {
        return load_archive(path, path, kind, options);
    }

    let file = File::open(path).map_err(|e| with_source(path, e))?;
    load_reader(file, path, kind, options)
}

/// Load an in-memory or streamed input as `kind`.
///
/// `source` names the input. It drives kind detection, delimiter choice and
/// archive handling, and prefixes error messages. It is never opened. An
/// archive stream is spooled to a temporary file first, which is removed
/// before this function returns.
///
/// # Errors
///
/// As for [`load`], plus [`YaraError::Io`] if reading the stream fails.
pub fn load_reader<R: Read>(
    reader: R,
    source: impl AsRef<Path>,
    kind: DataKind,
    options: &LoadOptions,
) -> Result<LoadedData> {
    let source = source.as_ref();
    if is_archive(source) {
        return load_archive_stream(reader, source, kind, options);
    }

    let kind = match kind {
        DataKind::Auto => DataKind::detect_path(source),
        k => k,
    };
    log::debug!("loading {} as {} data", source.display(), kind);
    convert(read_table_from(reader, source)?, kind, options)
}

#[cfg(feature = "archive")]
fn load_archive_stream<R: Read>(
    mut reader: R,
    source: &Path,
    kind: DataKind,
    options: &LoadOptions,
) -> Result<LoadedData> {
    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("zip");
    let mut spool = tempfile::Builder::new()
        .prefix("yara-")
        .suffix(&format!(".{}", extension))
        .tempfile()?;
    std::io::copy(&mut reader, &mut spool)?;
    load_archive(spool.path(), source, kind, options)
}

#[cfg(not(feature = "archive"))]
fn load_archive_stream<R: Read>(
    _reader: R,
    source: &Path,
    kind: DataKind,
    options: &LoadOptions,
) -> Result<LoadedData> {
    load_archive(source, source, kind, options)
}

/// `path` is the archive on disk; `name` is what detection and messages see.
#[cfg(feature = "archive")]
fn load_archive(
    path: &Path,
    name: &Path,
    kind: DataKind,
    options: &LoadOptions,
) -> Result<LoadedData> {
    use crate::archive::ScopedExtraction;

    let wanted = match kind {
        DataKind::Auto => match DataKind::detect_path(name) {
            DataKind::Raw => DataKind::Auto,
            detected => detected,
        },
        k => k,
    };
    let extraction = ScopedExtraction::open(path, wanted)?;
    let kind = match wanted {
        DataKind::Auto => DataKind::detect(extraction.entry_name()),
        k => k,
    };
    log::debug!(
        "loading {}:{} as {} data",
        name.display(),
        extraction.entry_name(),
        kind
    );
    convert(read_table(extraction.path())?, kind, options)
}

#[cfg(not(feature = "archive"))]
fn load_archive(
    _path: &Path,
    name: &Path,
    _kind: DataKind,
    _options: &LoadOptions,
) -> Result<LoadedData> {
    Err(YaraError::MissingData(format!(
        "{}: archive support is not enabled in this build",
        name.display()
    )))
}

fn convert(raw: RawTable, kind: DataKind, options: &LoadOptions) -> Result<LoadedData> {
    Ok(match kind {
        DataKind::Alpha => LoadedData::Alpha(alpha_table(&raw, &options.group_columns)?),
        DataKind::Beta => LoadedData::Beta(distance_matrix(&raw)?),
        DataKind::Taxonomy => LoadedData::Taxonomy(taxonomy_records(&raw)?),
        DataKind::Rarefaction => LoadedData::Rarefaction(rarefaction_curves(&raw)?),
        DataKind::Raw | DataKind::Auto => LoadedData::Raw(raw),
    })
}

fn unexpected(wanted: DataKind, got: &LoadedData) -> YaraError {
    YaraError::MalformedInput(format!(
        "expected {} data, loaded {} data",
        wanted,
        got.kind()
    ))
}

/// Load an alpha-diversity table.
pub fn load_alpha(path: impl AsRef<Path>, group_columns: &[&str]) -> Result<SampleMetricTable> {
    let options = LoadOptions::with_groups(group_columns.iter().copied());
    match load(path, DataKind::Alpha, &options)? {
        LoadedData::Alpha(t) => Ok(t),
        other => Err(unexpected(DataKind::Alpha, &other)),
    }
}

/// Load a distance matrix.
pub fn load_distance_matrix(path: impl AsRef<Path>) -> Result<DistanceMatrix> {
    match load(path, DataKind::Beta, &LoadOptions::default())? {
        LoadedData::Beta(m) => Ok(m),
        other => Err(unexpected(DataKind::Beta, &other)),
    }
}

/// Load a taxonomy table.
pub fn load_taxonomy(path: impl AsRef<Path>) -> Result<Vec<TaxonomyRecord>> {
    match load(path, DataKind::Taxonomy, &LoadOptions::default())? {
        LoadedData::Taxonomy(r) => Ok(r),
        other => Err(unexpected(DataKind::Taxonomy, &other)),
    }
}

/// Load rarefaction curves.
pub fn load_rarefaction(path: impl AsRef<Path>) -> Result<Vec<RarefactionCurve>> {
    match load(path, DataKind::Rarefaction, &LoadOptions::default())? {
        LoadedData::Rarefaction(c) => Ok(c),
        other => Err(unexpected(DataKind::Rarefaction, &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use yara_core::ErrorKind;

    fn write(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn auto_detects_from_name() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "alpha-diversity.tsv", "id\tshannon\nS1\t2.0\nS2\t3.0\n");
        let data = load(&path, DataKind::Auto, &LoadOptions::default()).unwrap();
        assert_eq!(data.kind(), DataKind::Alpha);
        assert!(data.summary().contains("shannon"));

        let path = write(&dir, "metadata.tsv", "id\tsite\nS1\tgut\n");
        let data = load(&path, DataKind::Auto, &LoadOptions::default()).unwrap();
        assert_eq!(data.kind(), DataKind::Raw);
    }

    #[test]
    fn declared_kind_overrides_name() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "results.csv", ",A,B\nA,0,1\nB,1,0\n");
        let m = load_distance_matrix(&path).unwrap();
        assert_eq!(m.ids(), &["A", "B"]);
    }

    #[test]
    fn missing_file() {
        let err = load("/nonexistent/alpha.tsv", DataKind::Auto, &LoadOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingData);
    }

    #[test]
    fn group_columns_flow_through() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "alpha.tsv", "id\tshannon\tsite\nS1\t2.0\t1\nS2\t3.0\t2\n");
        let table = load_alpha(&path, &["site"]).unwrap();
        assert_eq!(table.group("site").unwrap(), &["1", "2"]);
    }

    #[test]
    fn archive_extensions() {
        assert!(is_archive(Path::new("x.qza")));
        assert!(is_archive(Path::new("x.QZV")));
        assert!(is_archive(Path::new("x.zip")));
        assert!(!is_archive(Path::new("x.tsv")));
    }

    #[test]
    fn load_reader_from_bytes() {
        let body = b"sample-id,shannon,site\nS1,2.0,gut\nS2,3.5,tongue\n";
        let options = LoadOptions::with_groups(["site"]);
        let data = load_reader(&body[..], "alpha-diversity.csv", DataKind::Auto, &options).unwrap();
        let LoadedData::Alpha(table) = data else {
            panic!("expected an alpha table");
        };
        assert_eq!(table.metric("shannon").unwrap(), &[2.0, 3.5]);
        assert_eq!(table.group("site").unwrap()[1], "tongue");

        let err = load_reader(&b"\tA\tB\nA\t0\t1\t2\n"[..], "matrix.tsv", DataKind::Beta, &options)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(err.to_string().contains("matrix.tsv"));
    }

    #[cfg(feature = "archive")]
    #[test]
    fn load_reader_spools_archives() {
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("a1/data/distance-matrix.tsv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"\tA\tB\nA\t0\t0.4\nB\t0.4\t0\n").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let data = load_reader(
            std::io::Cursor::new(bytes),
            "upload.qza",
            DataKind::Auto,
            &LoadOptions::default(),
        )
        .unwrap();
        let LoadedData::Beta(m) = data else {
            panic!("expected a distance matrix");
        };
        assert_eq!(m.get(0, 1), 0.4);
    }
}
