pub mod aggregate;
pub mod classify;
pub mod equality;
pub mod error;
pub mod group;
pub mod model;
pub mod provider;
pub mod render;
pub mod resolve;
pub mod service;
pub mod transcript;
pub mod uri;

pub use aggregate::aggregate_technical_runs;
pub use classify::{
    extract_task_details, extract_task_ids, get_parent_id, has_task_invocation,
    is_subagent_message, is_technical_message,
};
pub use equality::{changed_group_positions, groups_equal, messages_equal};
pub use error::{Result, SidechainError};
pub use group::{build_intermediate_groups, build_render_groups};
pub use model::{
    ContentItem, Message, MessageContent, MessageKind, RenderGroup, SubagentGroup, TaskDetails,
    Usage,
};
pub use provider::TranscriptRoots;
pub use resolve::{Relationships, TaskOrigin, resolve_relationships};
pub use service::{
    load_transcript, read_transcript_raw, render_transcript_changes_markdown,
    render_transcript_markdown, render_transcript_raw_json, resolve_transcript_path,
};
pub use uri::TranscriptUri;
