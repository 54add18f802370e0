pub mod app_config;
pub mod config;
pub mod jobs;
pub mod normalize;
pub mod place;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use jobs::{load_jobs, Job, JobsFile};
pub use normalize::{clean_text, digits_only};
pub use place::Place;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read jobs file {path}: {source}")]
    JobsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse jobs file: {0}")]
    JobsFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
