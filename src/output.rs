// Report document and file writers.
use crate::mapper::Reservation;
use crate::summary::Summary;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const EMPTY_REPORT_MESSAGE: &str = "No reservations found.";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error on {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// JSON document written for one run.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Full {
        summary: Summary,
        reservations: Vec<Reservation>,
    },
    Empty {
        message: String,
    },
}

impl Report {
    pub fn new(summary: Summary, reservations: Vec<Reservation>) -> Self {
        Report::Full {
            summary,
            reservations,
        }
    }

    pub fn empty() -> Self {
        Report::Empty {
            message: EMPTY_REPORT_MESSAGE.to_string(),
        }
    }

    pub fn reservation_count(&self) -> usize {
        match self {
            Report::Full { reservations, .. } => reservations.len(),
            Report::Empty { .. } => 0,
        }
    }
}

/// Serializes the report with 4-space indentation. Non-ASCII text is kept verbatim.
pub fn render_report(report: &Report) -> Result<String, OutputError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    report.serialize(&mut serializer)?;
    // serde_json only emits UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Replaces `path` with `contents`, removing any previous file first.
pub fn write_output(path: &Path, contents: &str) -> Result<(), OutputError> {
    let io_error = |source: std::io::Error| OutputError::IoError {
        path: path.to_path_buf(),
        source,
    };

    match fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "existing file removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_error(e)),
    }

    fs::write(path, contents).map_err(io_error)?;
    info!(path = %path.display(), bytes = contents.len(), "file created");
    Ok(())
}
