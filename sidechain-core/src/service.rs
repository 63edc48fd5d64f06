use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SidechainError};
use crate::group::build_render_groups;
use crate::model::Message;
use crate::provider::claude::ClaudeProvider;
use crate::provider::{Provider, TranscriptRoots};
use crate::render;
use crate::transcript::parse_transcript;
use crate::uri::TranscriptUri;

/// Maps a CLI source argument to a transcript file. Anything with a scheme
/// is a transcript URI; everything else is a path.
pub fn resolve_transcript_path(source: &str, roots: &TranscriptRoots) -> Result<PathBuf> {
    if !source.contains("://") {
        return Ok(PathBuf::from(source));
    }

    let uri = TranscriptUri::parse(source)?;
    let resolved = ClaudeProvider::new(&roots.claude_root).resolve(&uri.session_id)?;
    tracing::debug!(
        uri = %uri.as_string(),
        source = %resolved.metadata.source,
        path = %resolved.path.display(),
        "resolved transcript"
    );
    Ok(resolved.path)
}

pub fn read_transcript_raw(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| SidechainError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if bytes.is_empty() {
        return Err(SidechainError::EmptyTranscriptFile {
            path: path.to_path_buf(),
        });
    }

    String::from_utf8(bytes).map_err(|_| SidechainError::NonUtf8TranscriptFile {
        path: path.to_path_buf(),
    })
}

pub fn load_transcript(path: &Path) -> Result<Vec<Message>> {
    let raw = read_transcript_raw(path)?;
    parse_transcript(path, &raw)
}

pub fn render_transcript_markdown(path: &Path, messages: &[Message]) -> String {
    let groups = build_render_groups(messages);
    render::render_markdown(&path.display().to_string(), messages.len(), &groups)
}

pub fn render_transcript_raw_json(messages: &[Message]) -> Result<String> {
    render::groups_to_raw_json(&build_render_groups(messages))
}

pub fn render_transcript_changes_markdown(
    path: &Path,
    previous: &[Message],
    messages: &[Message],
) -> String {
    let prev = build_render_groups(previous);
    let next = build_render_groups(messages);
    render::render_changed_markdown(&path.display().to_string(), messages.len(), &prev, &next)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::tempdir;

    use crate::provider::TranscriptRoots;
    use crate::service::{
        load_transcript, read_transcript_raw, render_transcript_changes_markdown,
        render_transcript_markdown, resolve_transcript_path,
    };

    const SESSION_ID: &str = "8c06e0f0-2978-48ac-bb42-90d13e3b0470";
    const TRANSCRIPT: &str = r#"{"type":"user","message":{"content":"hello"}}
{"type":"assistant","message":{"content":[{"type":"tool_use","id":"toolu_1","name":"Task","input":{"subagent_type":"explorer"}}]}}
{"type":"assistant","parent_tool_use_id":"toolu_1","message":{"content":[{"type":"text","text":"child says hi"}]}}
"#;

    #[test]
    fn empty_file_returns_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("transcript.jsonl");
        fs::write(&path, "").expect("write");

        let err = read_transcript_raw(&path).expect_err("must fail");
        assert!(format!("{err}").contains("transcript file is empty"));
    }

    #[test]
    fn non_utf8_file_returns_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("transcript.jsonl");
        fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");

        let err = read_transcript_raw(&path).expect_err("must fail");
        assert!(format!("{err}").contains("not valid UTF-8"));
    }

    #[test]
    fn plain_source_is_a_path() {
        let roots = TranscriptRoots {
            claude_root: PathBuf::from("/nonexistent"),
        };
        let path = resolve_transcript_path("./session.jsonl", &roots).expect("resolve");
        assert_eq!(path, PathBuf::from("./session.jsonl"));
    }

    #[test]
    fn uri_source_resolves_under_claude_root() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/demo");
        fs::create_dir_all(&project).expect("mkdir");
        let transcript = project.join(format!("{SESSION_ID}.jsonl"));
        fs::write(&transcript, TRANSCRIPT).expect("write");

        let roots = TranscriptRoots {
            claude_root: temp.path().to_path_buf(),
        };
        let path = resolve_transcript_path(&format!("claude://{SESSION_ID}"), &roots)
            .expect("resolve");
        assert_eq!(path, transcript);

        let messages = load_transcript(&path).expect("load");
        let output = render_transcript_markdown(&path, &messages);
        assert!(output.contains("## 2. Subagent `explorer` (`toolu_1`)"));
        assert!(output.contains("child says hi"));
    }

    #[test]
    fn changes_against_identical_snapshot_are_empty() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("transcript.jsonl");
        fs::write(&path, TRANSCRIPT).expect("write");

        let messages = load_transcript(&path).expect("load");
        let previous = load_transcript(&path).expect("load");
        let output = render_transcript_changes_markdown(&path, &previous, &messages);
        assert!(output.contains("- Changed: 0 of 2"));
    }
}
