use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SidechainError};

const CLAUDE_SCHEME: &str = "claude";

static SESSION_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid regex")
});

/// `claude://<session_id>` or `agents://claude/<session_id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptUri {
    pub session_id: String,
}

impl TranscriptUri {
    pub fn parse(input: &str) -> Result<Self> {
        input.parse()
    }

    pub fn as_string(&self) -> String {
        format!("{CLAUDE_SCHEME}://{}", self.session_id)
    }
}

impl FromStr for TranscriptUri {
    type Err = SidechainError;

    fn from_str(input: &str) -> Result<Self> {
        let (scheme, target) = input
            .split_once("://")
            .ok_or_else(|| SidechainError::InvalidUri(input.to_string()))?;

        let session_id = match scheme {
            CLAUDE_SCHEME => target,
            "agents" => {
                let (provider, session_id) = target
                    .split_once('/')
                    .ok_or_else(|| SidechainError::InvalidUri(input.to_string()))?;
                if provider != CLAUDE_SCHEME {
                    return Err(SidechainError::UnsupportedScheme(provider.to_string()));
                }
                session_id
            }
            other => return Err(SidechainError::UnsupportedScheme(other.to_string())),
        };

        if session_id.is_empty() || session_id.contains('/') {
            return Err(SidechainError::InvalidUri(input.to_string()));
        }
        if !SESSION_ID_RE.is_match(session_id) {
            return Err(SidechainError::InvalidSessionId(session_id.to_string()));
        }

        Ok(Self {
            session_id: session_id.to_ascii_lowercase(),
        })
    }
}
