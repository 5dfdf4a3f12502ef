//! Scoped extraction of one tabular member from a zip-style archive.
//!
//! QIIME artifacts (`.qza`) and visualizations (`.qzv`) are zip files; the
//! table of interest sits somewhere under `<uuid>/data/`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use yara_core::{Result, YaraError};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::delimited::is_tabular;
use crate::kind::DataKind;

/// An archive member extracted into a private temporary directory.
///
/// The directory and everything in it are removed when this value is
/// dropped, whichever way the owning call exits.
#[derive(Debug)]
pub struct ScopedExtraction {
    dir: TempDir,
    member: PathBuf,
    entry_name: String,
}

impl ScopedExtraction {
    /// Extract the first tabular entry of `archive` whose file name matches
    /// `kind`. Entries are scanned in archive order.
    ///
    /// # Errors
    ///
    /// - [`YaraError::MissingData`] if no entry matches.
    /// - [`YaraError::MalformedInput`] if the file is not a readable archive
    ///   or an entry name escapes the extraction root.
    /// - [`YaraError::Io`] if extraction fails.
    pub fn open(archive: &Path, kind: DataKind) -> Result<Self> {
        let file = File::open(archive).map_err(|e| {
            YaraError::Io(io::Error::new(
                e.kind(),
                format!("{}: {}", archive.display(), e),
            ))
        })?;
        let mut zip = ZipArchive::new(file).map_err(|e| zip_error(archive, e))?;

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(|e| zip_error(archive, e))?;
            if entry.is_dir() {
                continue;
            }
            let Some(relative) = entry.enclosed_name() else {
                return Err(YaraError::MalformedInput(format!(
                    "{}: entry '{}' escapes the extraction directory",
                    archive.display(),
                    entry.name()
                )));
            };
            let file_name = relative
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !is_tabular(&file_name) || !kind.matches_name(&file_name) {
                continue;
            }

            let dir = tempfile::Builder::new().prefix("yara-").tempdir()?;
            let member = dir.path().join(&relative);
            if let Some(parent) = member.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&member)?;
            io::copy(&mut entry, &mut out)?;

            log::debug!(
                "extracted '{}' from {} for {} data",
                entry.name(),
                archive.display(),
                kind
            );
            return Ok(Self {
                dir,
                member,
                entry_name: entry.name().to_string(),
            });
        }

        Err(YaraError::MissingData(format!(
            "{}: no tabular entry matching {} data",
            archive.display(),
            kind
        )))
    }

    /// Path of the extracted member.
    pub fn path(&self) -> &Path {
        &self.member
    }

    /// Entry name as stored in the archive.
    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn zip_error(archive: &Path, e: ZipError) -> YaraError {
    match e {
        ZipError::Io(e) => YaraError::Io(e),
        other => YaraError::MalformedInput(format!("{}: {}", archive.display(), other)),
    }
}
