use std::env;
use std::path::PathBuf;

use dirs::home_dir;

use crate::error::{Result, SidechainError};
use crate::model::ResolvedTranscript;

pub mod claude;

pub trait Provider {
    fn resolve(&self, session_id: &str) -> Result<ResolvedTranscript>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRoots {
    pub claude_root: PathBuf,
}

impl TranscriptRoots {
    pub fn from_env_or_home() -> Result<Self> {
        // Precedence:
        // 1) CLAUDE_CONFIG_DIR (official Claude Code config/data root env)
        // 2) ~/.claude (Claude default)
        let claude_root = match env::var_os("CLAUDE_CONFIG_DIR").filter(|path| !path.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => home_dir()
                .ok_or(SidechainError::HomeDirectoryNotFound)?
                .join(".claude"),
        };

        Ok(Self { claude_root })
    }
}
