use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    System,
    Result,
    Summary,
    Thinking,
    /// Transient control records (`stream_event`, `progress`, ...), kept verbatim.
    Other(String),
}

impl MessageKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "system" => Self::System,
            "result" => Self::Result,
            "summary" => Self::Summary,
            "thinking" => Self::Thinking,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
            Self::System => "System",
            Self::Result => "Result",
            Self::Summary => "Summary",
            Self::Thinking => "Thinking",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
            Self::Result => write!(f, "result"),
            Self::Summary => write!(f, "summary"),
            Self::Thinking => write!(f, "thinking"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

impl Serialize for MessageKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Value,
    },
    Thinking {
        text: String,
    },
    /// Images, documents and block types this crate does not model.
    Other {
        item_type: String,
    },
}

impl ContentItem {
    pub fn type_name(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolUse { .. } => "tool_use",
            Self::ToolResult { .. } => "tool_result",
            Self::Thinking { .. } => "thinking",
            Self::Other { item_type } => item_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Items(Vec<ContentItem>),
    Raw(Value),
}

impl MessageContent {
    pub fn items(&self) -> Option<&[ContentItem]> {
        match self {
            Self::Items(items) => Some(items),
            Self::Text(_) | Self::Raw(_) => None,
        }
    }
}

/// One transcript record. Owned by the caller; the grouping engine only borrows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub parent_tool_use_id: Option<String>,
    pub is_sidechain: Option<bool>,
    pub usage: Option<Usage>,
    pub content: Option<MessageContent>,
}

impl Message {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            id: None,
            timestamp: None,
            parent_tool_use_id: None,
            is_sidechain: None,
            usage: None,
            content: None,
        }
    }

    pub fn content_items(&self) -> Option<&[ContentItem]> {
        self.content.as_ref().and_then(MessageContent::items)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskDetails {
    pub subagent_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubagentGroup<'a> {
    /// Tool-use id of the task invocation that spawned the subagent.
    pub id: String,
    pub task_message: &'a Message,
    pub subagent_messages: Vec<&'a Message>,
    pub start_index: usize,
    pub end_index: usize,
    pub subagent_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderGroup<'a> {
    Normal {
        message: &'a Message,
        index: usize,
    },
    Subagent {
        group: SubagentGroup<'a>,
    },
    Aggregated {
        messages: Vec<&'a Message>,
        index: usize,
    },
}

impl<'a> RenderGroup<'a> {
    /// Every message carried by this entry, in display order.
    pub fn messages(&self) -> Vec<&'a Message> {
        match self {
            Self::Normal { message, .. } => vec![*message],
            Self::Subagent { group } => std::iter::once(group.task_message)
                .chain(group.subagent_messages.iter().copied())
                .collect(),
            Self::Aggregated { messages, .. } => messages.clone(),
        }
    }

    pub fn start_index(&self) -> usize {
        match self {
            Self::Normal { index, .. } | Self::Aggregated { index, .. } => *index,
            Self::Subagent { group } => group.start_index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionMeta {
    pub source: String,
    pub candidate_count: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTranscript {
    pub session_id: String,
    pub path: PathBuf,
    pub metadata: ResolutionMeta,
}
