use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SidechainError {
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("cannot determine home directory")]
    HomeDirectoryNotFound,

    #[error("transcript not found for session_id={session_id}")]
    TranscriptNotFound {
        session_id: String,
        searched_roots: Vec<PathBuf>,
    },

    #[error("transcript file is empty: {path}")]
    EmptyTranscriptFile { path: PathBuf },

    #[error("transcript file is not valid UTF-8: {path}")]
    NonUtf8TranscriptFile { path: PathBuf },

    #[error("invalid subagent group {group_id}: {reason}")]
    InvalidGroupStructure { group_id: String, reason: String },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json line in {path} at line {line}: {source}")]
    InvalidJsonLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, SidechainError>;
