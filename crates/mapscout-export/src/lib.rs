pub mod encode;
pub mod sink;

pub use encode::{encode_row, encode_rows, escape_field, HEADER};
pub use sink::{AppendSummary, CsvSink};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file key {0:?}")]
    InvalidFileKey(String),
}
