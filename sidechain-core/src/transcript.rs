use std::path::Path;

use serde_json::Value;

use crate::error::{Result, SidechainError};
use crate::model::{ContentItem, Message, MessageContent, MessageKind, Usage};

/// Parses a transcript into messages. Accepts JSONL or a single JSON array of
/// records. Records of an unexpected shape degrade instead of failing; only
/// text that is not JSON at all is an error.
pub fn parse_transcript(path: &Path, raw: &str) -> Result<Vec<Message>> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        let value =
            serde_json::from_str::<Value>(trimmed).map_err(|source| SidechainError::InvalidJsonLine {
                path: path.to_path_buf(),
                line: 1,
                source,
            })?;
        return Ok(value
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(parse_record)
            .collect());
    }

    let mut messages = Vec::new();
    for (line_idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value = serde_json::from_str::<Value>(trimmed).map_err(|source| {
            SidechainError::InvalidJsonLine {
                path: path.to_path_buf(),
                line: line_idx + 1,
                source,
            }
        })?;

        match parse_record(&value) {
            Some(message) => messages.push(message),
            None => tracing::debug!(line = line_idx + 1, "skipping record without a type"),
        }
    }

    Ok(messages)
}

pub fn parse_record(value: &Value) -> Option<Message> {
    let kind = MessageKind::parse(value.get("type").and_then(Value::as_str)?);
    let inner = value.get("message");

    let id = ["uuid", "id"]
        .iter()
        .find_map(|key| string_field(value, key))
        .or_else(|| inner.and_then(|message| string_field(message, "id")));

    let parent_tool_use_id = string_field(value, "parent_tool_use_id")
        .or_else(|| string_field(value, "parentToolUseId"));

    let is_sidechain = value
        .get("isSidechain")
        .or_else(|| value.get("is_sidechain"))
        .and_then(Value::as_bool);

    let usage = inner
        .and_then(|message| message.get("usage"))
        .or_else(|| value.get("usage"))
        .filter(|usage| usage.is_object())
        .map(|usage| Usage {
            input_tokens: usage.get("input_tokens").and_then(Value::as_u64),
            output_tokens: usage.get("output_tokens").and_then(Value::as_u64),
        });

    let content = inner
        .and_then(|message| message.get("content"))
        .or_else(|| value.get("content"))
        .map(parse_content)
        .or_else(|| thinking_fallback(&kind, value));

    Some(Message {
        kind,
        id,
        timestamp: string_field(value, "timestamp"),
        parent_tool_use_id,
        is_sidechain,
        usage,
        content,
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn thinking_fallback(kind: &MessageKind, value: &Value) -> Option<MessageContent> {
    if *kind != MessageKind::Thinking {
        return None;
    }

    let text = string_field(value, "thinking").or_else(|| string_field(value, "text"))?;
    Some(MessageContent::Items(vec![ContentItem::Thinking { text }]))
}

fn parse_content(content: &Value) -> MessageContent {
    if let Some(text) = content.as_str() {
        return MessageContent::Text(text.to_string());
    }

    match content.as_array() {
        Some(items) => MessageContent::Items(items.iter().map(parse_content_item).collect()),
        None => MessageContent::Raw(content.clone()),
    }
}

fn parse_content_item(item: &Value) -> ContentItem {
    if let Some(text) = item.as_str() {
        return ContentItem::Text {
            text: text.to_string(),
        };
    }

    let Some(item_type) = item.get("type").and_then(Value::as_str) else {
        return ContentItem::Other {
            item_type: "unknown".to_string(),
        };
    };

    match item_type {
        "text" => ContentItem::Text {
            text: string_field(item, "text").unwrap_or_default(),
        },
        "tool_use" => ContentItem::ToolUse {
            id: string_field(item, "id").unwrap_or_default(),
            name: string_field(item, "name").unwrap_or_default(),
            input: item.get("input").cloned().unwrap_or(Value::Null),
        },
        "tool_result" => ContentItem::ToolResult {
            tool_use_id: string_field(item, "tool_use_id").unwrap_or_default(),
            content: item.get("content").cloned().unwrap_or(Value::Null),
        },
        "thinking" => ContentItem::Thinking {
            text: string_field(item, "thinking")
                .or_else(|| string_field(item, "text"))
                .unwrap_or_default(),
        },
        other => ContentItem::Other {
            item_type: other.to_string(),
        },
    }
}
