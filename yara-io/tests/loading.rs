//! Loader integration: files and archives written to a temporary directory,
//! loaded through the public entry point, then fed to the analyzers' input
//! types.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use yara_core::{ErrorKind, Rank};
use yara_io::{load, load_rarefaction, load_taxonomy, DataKind, LoadOptions, LoadedData};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const ALPHA: &str = "sample-id\tshannon_entropy\tbody-site\n\
                     #q2:types\tnumeric\tcategorical\n\
                     S1\t2.5\tgut\n\
                     S2\t3.1\tgut\n\
                     S3\t4.2\ttongue\n";

const DISTANCE: &str = "\tS1\tS2\tS3\n\
                        S1\t0\t0.2\t0.5\n\
                        S2\t0.2\t0\t0.6\n\
                        S3\t0.5\t0.6\t0\n";

const TAXONOMY: &str = "Feature ID\tTaxon\tConfidence\n\
                        a1\tk__Bacteria; p__Firmicutes; c__; o__; f__Lachnospiraceae; g__; s__\t0.91\n\
                        a2\tk__Bacteria; p__Bacteroidetes\t0.88\n";

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

fn write_archive(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    for (entry, body) in entries {
        writer
            .start_file(*entry, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

// ── Plain files ─────────────────────────────────────────────────

#[test]
fn alpha_file_auto_detected() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "alpha-diversity.tsv", ALPHA);
    let LoadedData::Alpha(table) = load(&path, DataKind::Auto, &LoadOptions::default()).unwrap()
    else {
        panic!("expected an alpha table");
    };
    assert_eq!(table.n_samples(), 3);
    assert_eq!(table.metric("shannon_entropy").unwrap()[2], 4.2);
    assert_eq!(table.group("body-site").unwrap()[2], "tongue");
}

#[test]
fn distance_file_auto_detected() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "distance-matrix.tsv", DISTANCE);
    let data = load(&path, DataKind::Auto, &LoadOptions::default()).unwrap();
    let LoadedData::Beta(m) = data else {
        panic!("expected a distance matrix");
    };
    assert_eq!(m.len(), 3);
    assert_eq!(m.get(0, 2), 0.5);
}

#[test]
fn taxonomy_file_parses_placeholders() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "taxonomy.tsv", TAXONOMY);
    let records = load_taxonomy(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].lineage.get(Rank::Class), Some("Unassigned"));
    assert_eq!(records[0].lineage.get(Rank::Family), Some("Lachnospiraceae"));
    assert_eq!(records[1].confidence, Some(0.88));
}

#[test]
fn rarefaction_csv_with_iterations() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "observed_features.csv",
        "sample-id,depth-1000_iter-1,depth-1000_iter-2,depth-5000_iter-1,depth-5000_iter-2\n\
         S1,48,52,94,96\n\
         S2,30,34,,\n",
    );
    let curves = load_rarefaction(&path).unwrap();
    assert_eq!(curves.len(), 2);
    assert_eq!(curves[0].value_at(1000), Some(50.0));
    assert_eq!(curves[0].value_at(5000), Some(95.0));
    assert_eq!(curves[1].len(), 1);
}

#[test]
fn malformed_alpha_names_row_and_column() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "alpha.csv",
        "id,shannon,site\nS1,2.0,gut\nS2,abc,gut\n",
    );
    let options = LoadOptions::with_groups(["site"]);
    let err = load(&path, DataKind::Alpha, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    let msg = err.to_string();
    assert!(msg.contains("row 2"), "{}", msg);
    assert!(msg.contains("shannon"), "{}", msg);
}

#[test]
fn failed_load_does_not_affect_next_call() {
    let dir = TempDir::new().unwrap();
    let bad = write(dir.path(), "taxonomy-bad.tsv", "Feature ID\tLabel\nf1\tx\n");
    let good = write(dir.path(), "taxonomy.tsv", TAXONOMY);
    assert_eq!(
        load_taxonomy(&bad).unwrap_err().kind(),
        ErrorKind::MissingData
    );
    assert_eq!(load_taxonomy(&good).unwrap().len(), 2);
}

// ── Archives ────────────────────────────────────────────────────

#[test]
fn artifact_with_keyword_in_archive_name() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(
        dir.path(),
        "alpha-diversity.qza",
        &[
            ("3f2a/metadata.yaml", "uuid: 3f2a\n"),
            ("3f2a/data/alpha-diversity.tsv", ALPHA),
        ],
    );
    let data = load(&path, DataKind::Auto, &LoadOptions::default()).unwrap();
    assert_eq!(data.kind(), DataKind::Alpha);
}

#[test]
fn archive_kind_from_entry_name() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(
        dir.path(),
        "export.zip",
        &[
            ("export/README.md", "exported\n"),
            ("export/distance-matrix.tsv", DISTANCE),
        ],
    );
    let data = load(&path, DataKind::Auto, &LoadOptions::default()).unwrap();
    assert_eq!(data.kind(), DataKind::Beta);
}

#[test]
fn archive_without_match_is_missing_data() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(
        dir.path(),
        "bundle.zip",
        &[("bundle/alpha-diversity.tsv", ALPHA)],
    );
    let err = load(&path, DataKind::Taxonomy, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingData);
}

#[test]
fn archive_parse_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(
        dir.path(),
        "bundle.qza",
        &[("x/data/distance-matrix.tsv", "\tA\tB\nA\t0\tfar\nB\t1\t0\n")],
    );
    let err = load(&path, DataKind::Beta, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn archive_support_flag_matches_build() {
    assert!(yara_io::ARCHIVE_SUPPORT);
}
