use std::cmp::Reverse;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{Result, SidechainError};
use crate::model::{ResolutionMeta, ResolvedTranscript};
use crate::provider::Provider;

const HEADER_SCAN_LINES: usize = 30;

#[derive(Debug, Deserialize)]
struct SessionsIndex {
    #[serde(default)]
    entries: Vec<SessionIndexEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionIndexEntry {
    session_id: String,
    full_path: Option<PathBuf>,
}

type Lookup = fn(&[PathBuf], &str) -> Vec<PathBuf>;

/// Lookups tried in order; the first one with any hit wins.
const LOOKUPS: &[(&str, Lookup)] = &[
    ("claude:sessions-index", from_sessions_index),
    ("claude:filename", by_filename),
    ("claude:header-scan", by_header_scan),
];

#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    root: PathBuf,
}

impl ClaudeProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn projects_root(&self) -> PathBuf {
        self.root.join("projects")
    }
}

impl Provider for ClaudeProvider {
    fn resolve(&self, session_id: &str) -> Result<ResolvedTranscript> {
        let projects = self.projects_root();
        let files = if projects.exists() {
            WalkDir::new(&projects)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .collect::<Vec<_>>()
        } else {
            Vec::new()
        };

        for (source, lookup) in LOOKUPS {
            let hits = lookup(&files, session_id);
            let count = hits.len();
            let Some(selected) = latest(hits) else {
                continue;
            };

            let mut metadata = ResolutionMeta {
                source: (*source).to_string(),
                candidate_count: count,
                warnings: Vec::new(),
            };
            if count > 1 {
                tracing::warn!(session_id, count, path = %selected.display(), "multiple transcripts match; using latest");
                metadata.warnings.push(format!(
                    "multiple matches found ({count}) for session_id={session_id}; selected latest: {}",
                    selected.display()
                ));
            }

            return Ok(ResolvedTranscript {
                session_id: session_id.to_string(),
                path: selected,
                metadata,
            });
        }

        Err(SidechainError::TranscriptNotFound {
            session_id: session_id.to_string(),
            searched_roots: vec![projects],
        })
    }
}

fn latest(paths: Vec<PathBuf>) -> Option<PathBuf> {
    paths.into_iter().max_by_key(|path| {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        // Equal mtimes prefer the smallest path so the pick is stable.
        (modified, Reverse(path.clone()))
    })
}

fn has_file_name(path: &Path, name: &str) -> bool {
    path.file_name()
        .and_then(|file_name| file_name.to_str())
        .is_some_and(|file_name| file_name == name)
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "jsonl")
}

fn from_sessions_index(files: &[PathBuf], session_id: &str) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| has_file_name(path, "sessions-index.json"))
        .filter_map(|path| fs::read_to_string(path).ok())
        .filter_map(|content| serde_json::from_str::<SessionsIndex>(&content).ok())
        .flat_map(|index| index.entries)
        .filter(|entry| entry.session_id == session_id)
        .filter_map(|entry| entry.full_path)
        .filter(|path| path.exists())
        .collect()
}

fn by_filename(files: &[PathBuf], session_id: &str) -> Vec<PathBuf> {
    let needle = format!("{session_id}.jsonl");
    files
        .iter()
        .filter(|path| has_file_name(path, &needle))
        .cloned()
        .collect()
}

fn by_header_scan(files: &[PathBuf], session_id: &str) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| is_jsonl(path))
        .filter(|path| header_mentions_session(path, session_id))
        .cloned()
        .collect()
}

fn header_mentions_session(path: &Path, session_id: &str) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return false;
    };

    BufReader::new(file)
        .lines()
        .take(HEADER_SCAN_LINES)
        .map_while(std::result::Result::ok)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(&line).ok())
        .any(|value| {
            ["sessionId", "session_id"]
                .iter()
                .any(|key| value.get(key).and_then(Value::as_str) == Some(session_id))
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::provider::Provider;
    use crate::provider::claude::ClaudeProvider;

    const SESSION_ID: &str = "2823d1df-720a-4c31-ac55-ae8ba726721f";

    #[test]
    fn resolves_from_sessions_index() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/project-a");
        fs::create_dir_all(&project).expect("mkdir");
        let transcript = project.join("stored-elsewhere.jsonl");
        fs::write(&transcript, "{}\n").expect("write transcript");
        fs::write(
            project.join("sessions-index.json"),
            format!(
                "{{\"entries\":[{{\"sessionId\":\"{SESSION_ID}\",\"fullPath\":\"{}\"}}]}}",
                transcript.display()
            ),
        )
        .expect("write index");

        let resolved = ClaudeProvider::new(temp.path())
            .resolve(SESSION_ID)
            .expect("resolve should succeed");
        assert_eq!(resolved.path, transcript);
        assert_eq!(resolved.metadata.source, "claude:sessions-index");
        assert_eq!(resolved.metadata.candidate_count, 1);
    }

    #[test]
    fn resolves_from_filename_when_index_misses() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/project-b");
        fs::create_dir_all(&project).expect("mkdir");
        let transcript = project.join(format!("{SESSION_ID}.jsonl"));
        fs::write(&transcript, "{}\n").expect("write transcript");

        let resolved = ClaudeProvider::new(temp.path())
            .resolve(SESSION_ID)
            .expect("resolve should succeed");
        assert_eq!(resolved.path, transcript);
        assert_eq!(resolved.metadata.source, "claude:filename");
    }

    #[test]
    fn resolves_from_header_scan() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/project-c");
        fs::create_dir_all(&project).expect("mkdir");
        let transcript = project.join("renamed.jsonl");
        fs::write(
            &transcript,
            format!("\n{{\"type\":\"user\",\"sessionId\":\"{SESSION_ID}\"}}\n"),
        )
        .expect("write transcript");

        let resolved = ClaudeProvider::new(temp.path())
            .resolve(SESSION_ID)
            .expect("resolve should succeed");
        assert_eq!(resolved.path, transcript);
        assert_eq!(resolved.metadata.source, "claude:header-scan");
    }

    #[test]
    fn multiple_hits_add_warning() {
        let temp = tempdir().expect("tempdir");
        for project in ["projects/one", "projects/two"] {
            let dir = temp.path().join(project);
            fs::create_dir_all(&dir).expect("mkdir");
            fs::write(dir.join(format!("{SESSION_ID}.jsonl")), "{}\n").expect("write");
        }

        let resolved = ClaudeProvider::new(temp.path())
            .resolve(SESSION_ID)
            .expect("resolve should succeed");
        assert_eq!(resolved.metadata.candidate_count, 2);
        assert_eq!(resolved.metadata.warnings.len(), 1);
    }

    #[test]
    fn missing_transcript_reports_searched_root() {
        let temp = tempdir().expect("tempdir");
        let err = ClaudeProvider::new(temp.path())
            .resolve(SESSION_ID)
            .expect_err("must fail");
        assert!(format!("{err}").contains("transcript not found"));
    }
}
