//! Integration tests for TOML configuration loading and the isolated worker.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use yara_core::worker::run_isolated;
use yara_core::{EngineConfig, ErrorKind, OrdinationMethod, YaraError};

#[test]
fn loads_every_section_from_file() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    write!(
        file,
        r#"
[ordination]
method = "pcoa"
seed = 7
retry_seed_offset = 100
max_iter = 250

[rarefaction]
plateau_threshold = 0.9
min_retained_fraction = 0.75

[tests]
significance_level = 0.01
kruskal_min_group_size = 3
"#
    )
    .unwrap();
    file.flush().unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.ordination.method, OrdinationMethod::Pcoa);
    assert_eq!(config.ordination.seed, 7);
    assert_eq!(config.ordination.retry_seed(), 107);
    assert_eq!(config.ordination.max_iter, 250);
    assert_eq!(config.ordination.tolerance, 1e-5);
    assert_eq!(config.rarefaction.plateau_threshold, 0.9);
    assert_eq!(config.rarefaction.min_retained_fraction, 0.75);
    assert_eq!(config.rarefaction.saturated_threshold, 0.95);
    assert_eq!(config.tests.significance_level, 0.01);
    assert_eq!(config.tests.kruskal_min_group_size, 3);
    assert_eq!(config.tests.mann_whitney_min_group_size, 3);
}

#[test]
fn out_of_range_threshold_is_malformed() {
    let err = EngineConfig::from_toml_str("[rarefaction]\nplateau_threshold = 1.5\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert!(err.to_string().contains("plateau_threshold"));
}

#[test]
fn unknown_method_is_malformed() {
    let err = EngineConfig::from_toml_str("[ordination]\nmethod = \"tsne\"\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn worker_timeout_is_computation_error() {
    let err = run_isolated(Duration::from_millis(20), || {
        std::thread::sleep(Duration::from_secs(2));
        Ok(())
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Computation);
}

#[test]
fn worker_runs_independent_calls() {
    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            std::thread::spawn(move || {
                run_isolated(Duration::from_secs(5), move || {
                    if i == 2 {
                        Err(YaraError::InsufficientSamples("group too small".into()))
                    } else {
                        Ok(i * 10)
                    }
                })
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results[0].as_ref().unwrap(), &0);
    assert_eq!(results[1].as_ref().unwrap(), &10);
    assert_eq!(
        results[2].as_ref().unwrap_err().kind(),
        ErrorKind::InsufficientSample
    );
    assert_eq!(results[3].as_ref().unwrap(), &30);
}
