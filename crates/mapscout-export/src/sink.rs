//! Append-or-create CSV files, one per file key.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mapscout_core::Place;
use uuid::Uuid;

use crate::encode::{encode_rows, HEADER};
use crate::ExportError;

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// What one [`CsvSink::append_records`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendSummary {
    pub path: PathBuf,
    pub rows_written: usize,
    /// `true` if the file did not exist before this call.
    pub created: bool,
}

/// Writes places under a fixed output directory.
///
/// Assumes a single writer per file key.
#[derive(Debug, Clone)]
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination file for `file_key`.
    ///
    /// # Errors
    ///
    /// [`ExportError::InvalidFileKey`] if nothing usable is left after
    /// replacing reserved characters.
    pub fn path_for(&self, file_key: &str) -> Result<PathBuf, ExportError> {
        let sanitized: String = file_key
            .trim()
            .chars()
            .map(|c| {
                if c.is_control() || RESERVED.contains(&c) {
                    '_'
                } else {
                    c
                }
            })
            .collect();
        let sanitized = sanitized.trim_matches('.').trim();
        if sanitized.is_empty() {
            return Err(ExportError::InvalidFileKey(file_key.to_owned()));
        }
        Ok(self.output_dir.join(format!("{sanitized}.csv")))
    }

    /// Persists every identified place in `places` to the file for
    /// `file_key`.
    ///
    /// A new file gets the header row. Each call is all-or-nothing: a new
    /// file only appears once fully written, and a failed append leaves an
    /// existing file at its previous length.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the key is unusable, the output directory
    /// cannot be created, or the file cannot be written.
    pub fn append_records(&self, places: &[Place], file_key: &str) -> Result<AppendSummary, ExportError> {
        let path = self.path_for(file_key)?;
        let rows_written = places.iter().filter(|p| p.is_identified()).count();
        if rows_written == 0 {
            tracing::debug!(path = %path.display(), "no named places to write");
            return Ok(AppendSummary {
                path,
                rows_written: 0,
                created: false,
            });
        }
        let body = encode_rows(places);

        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let created = match fs::metadata(&path) {
            Ok(meta) => {
                append(&path, meta.len(), &body)?;
                false
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                create(&path, &format!("{HEADER}\n{body}"))?;
                true
            }
            Err(source) => return Err(ExportError::Write { path, source }),
        };

        tracing::info!(path = %path.display(), rows = rows_written, created, "wrote places");
        Ok(AppendSummary {
            path,
            rows_written,
            created,
        })
    }
}

fn create(path: &Path, contents: &str) -> Result<(), ExportError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    let written = fs::write(&tmp, contents).and_then(|()| fs::rename(&tmp, path));
    if let Err(source) = written {
        if let Err(e) = fs::remove_file(&tmp) {
            tracing::debug!(path = %tmp.display(), error = %e, "temp file cleanup failed");
        }
        return Err(ExportError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn append(path: &Path, prior_len: u64, body: &str) -> Result<(), ExportError> {
    let failed = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new().append(true).open(path).map_err(failed)?;

    write_or_rollback(
        &mut file,
        body.as_bytes(),
        |file| file.sync_data(),
        |file| file.set_len(prior_len),
    )
    .map_err(failed)
}

/// Writes `body` and commits it, or undoes whatever part of it landed.
///
/// The original write error is returned; a failed rollback is only logged.
fn write_or_rollback<W, C, R>(writer: &mut W, body: &[u8], commit: C, rollback: R) -> io::Result<()>
where
    W: Write,
    C: FnOnce(&mut W) -> io::Result<()>,
    R: FnOnce(&mut W) -> io::Result<()>,
{
    let mut written = writer.write_all(body).and_then(|()| writer.flush());
    if written.is_ok() {
        written = commit(&mut *writer);
    }
    if let Err(source) = written {
        if let Err(e) = rollback(&mut *writer) {
            tracing::error!(error = %e, "could not roll back partial append");
        }
        return Err(source);
    }
    Ok(())
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod tests;
