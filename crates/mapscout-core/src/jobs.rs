use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One collection request: a search query scoped to a city label, persisted
/// under its own output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub city: String,
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub file_key: Option<String>,
}

fn default_limit() -> usize {
    5
}

impl Job {
    /// The output file key: the explicit `file_key`, or a slug of the city.
    #[must_use]
    pub fn file_key(&self) -> String {
        self.file_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map_or_else(|| slugify(&self.city), str::to_string)
    }

    /// Checks the fields a single collection needs before any browsing starts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an empty city or query, a zero
    /// limit, or a city that slugs to nothing without an explicit `file_key`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.city.trim().is_empty() {
            return Err(ConfigError::Validation(
                "job city must be non-empty".to_string(),
            ));
        }
        if self.query.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "job for '{}' has an empty query",
                self.city
            )));
        }
        if self.limit == 0 {
            return Err(ConfigError::Validation(format!(
                "job '{}' has limit 0; must be at least 1",
                self.query
            )));
        }
        if self.file_key().is_empty() {
            return Err(ConfigError::Validation(format!(
                "city '{}' has no usable file key; set file_key explicitly",
                self.city
            )));
        }
        Ok(())
    }
}

/// Lowercase ASCII alphanumerics joined by single dashes.
#[must_use]
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Deserialize)]
pub struct JobsFile {
    pub jobs: Vec<Job>,
}

/// Load and validate the batch job file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_jobs(path: &Path) -> Result<JobsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::JobsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let jobs_file: JobsFile = serde_yaml::from_str(&content)?;
    validate_jobs(&jobs_file)?;

    Ok(jobs_file)
}

fn validate_jobs(jobs_file: &JobsFile) -> Result<(), ConfigError> {
    let mut seen_keys = HashSet::new();

    for job in &jobs_file.jobs {
        job.validate()?;

        let key = job.file_key();
        if !seen_keys.insert(key.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate file key: '{key}' (from job '{}')",
                job.query
            )));
        }
    }

    Ok(())
}
