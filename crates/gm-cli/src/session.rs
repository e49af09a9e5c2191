//! Session file persistence.
//!
//! The file wraps the tracker state with a format version and a save
//! timestamp. Loading accepts older or hand-edited files: missing fields
//! take defaults, unknown fields are ignored, a bare tracker document
//! without the wrapper is accepted, and the result is always normalized.
//! A document with a `tracker` key is always read as the wrapped layout.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use gm_core::TrackerState;

/// Current session file format version.
pub const SESSION_VERSION: u32 = 1;

/// Errors reading or writing a session file.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The file could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        source: io::Error,
    },

    /// The file is not a valid session document.
    #[error("{path} is not a valid session file: {source}")]
    Format {
        /// File involved.
        path: String,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Alias for `Result<T, SessionError>`.
pub type SessionResult<T> = Result<T, SessionError>;

fn current_version() -> u32 {
    SESSION_VERSION
}

/// The on-disk document.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionFile {
    /// Format version the file was written with.
    #[serde(default = "current_version")]
    pub version: u32,
    /// When the file was last written.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// The tracker snapshot.
    pub tracker: TrackerState,
}

/// Load the tracker from `path`. A missing file yields an empty tracker.
pub fn load(path: &Path) -> SessionResult<TrackerState> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no session file, starting empty");
        return Ok(TrackerState::new());
    }
    let text = fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text).map_err(|source| SessionError::Format {
        path: path.display().to_string(),
        source,
    })
}

/// Parse a session document and normalize the tracker it holds.
pub fn parse(text: &str) -> Result<TrackerState, serde_json::Error> {
    let document: Value = serde_json::from_str(text)?;
    // A `tracker` key always selects the wrapped layout, even when the
    // tracker inside it is invalid.
    let tracker = if document.get("tracker").is_some() {
        let file: SessionFile = serde_json::from_value(document)?;
        if file.version > SESSION_VERSION {
            tracing::warn!(
                version = file.version,
                supported = SESSION_VERSION,
                "session file is newer than this build; unknown fields are ignored"
            );
        }
        file.tracker
    } else {
        serde_json::from_value(document)?
    };
    Ok(tracker.normalize())
}

/// Write the tracker to `path`, stamping the save time.
pub fn save(path: &Path, tracker: &TrackerState) -> SessionResult<()> {
    let file = SessionFile {
        version: SESSION_VERSION,
        saved_at: Some(Utc::now()),
        tracker: tracker.clone(),
    };
    let json = serde_json::to_string_pretty(&file).map_err(|source| SessionError::Format {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, json + "\n").map_err(|source| SessionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), entries = tracker.len(), "session saved");
    Ok(())
}
