use serde_json::Value;

use crate::classify::{extract_task_ids, get_parent_id};
use crate::equality::changed_group_positions;
use crate::error::{Result, SidechainError};
use crate::model::{ContentItem, Message, MessageContent, RenderGroup, SubagentGroup};

const PREVIEW_CHARS: usize = 96;
const NO_CONTENT_PLACEHOLDER: &str = "_No content._";

/// Rejects subagent groups that cannot be rendered as a nested conversation.
pub fn validate_subagent_group(group: &SubagentGroup<'_>) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(SidechainError::InvalidGroupStructure {
            group_id: group.id.clone(),
            reason: reason.to_string(),
        })
    };

    if group.subagent_messages.is_empty() {
        return invalid("no subagent messages");
    }
    if group.end_index <= group.start_index {
        return invalid("end index does not follow start index");
    }
    if !extract_task_ids(group.task_message).contains(&group.id) {
        return invalid("task message does not carry the group id");
    }
    if group
        .subagent_messages
        .iter()
        .any(|message| get_parent_id(message) != Some(group.id.as_str()))
    {
        return invalid("subagent message is not linked to the group");
    }

    Ok(())
}

pub fn render_markdown(source: &str, message_count: usize, groups: &[RenderGroup<'_>]) -> String {
    let mut output = render_header(source, message_count, groups.len());
    output.push('\n');

    if groups.is_empty() {
        output.push_str("_No messages found._\n");
        return output;
    }

    for (position, group) in groups.iter().enumerate() {
        push_group_section(&mut output, position + 1, group);
    }

    output
}

/// Renders only the groups that differ from an earlier snapshot, keeping
/// their position numbers.
pub fn render_changed_markdown(
    source: &str,
    message_count: usize,
    prev: &[RenderGroup<'_>],
    next: &[RenderGroup<'_>],
) -> String {
    let changed = changed_group_positions(prev, next);
    let mut output = render_header(source, message_count, next.len());
    output.push_str(&format!(
        "- Changed: {} of {}\n\n",
        changed.len(),
        next.len()
    ));

    if changed.is_empty() {
        output.push_str("_No changes since the previous snapshot._\n");
        return output;
    }

    for position in changed {
        push_group_section(&mut output, position + 1, &next[position]);
    }

    output
}

pub fn groups_to_raw_json(groups: &[RenderGroup<'_>]) -> Result<String> {
    let mut raw = serde_json::to_string_pretty(groups)
        .map_err(|err| SidechainError::Serialization(err.to_string()))?;
    raw.push('\n');
    Ok(raw)
}

fn render_header(source: &str, message_count: usize, group_count: usize) -> String {
    let mut output = String::new();
    output.push_str("# Transcript\n\n");
    output.push_str(&format!("- Source: `{source}`\n"));
    output.push_str(&format!("- Messages: {message_count}\n"));
    output.push_str(&format!("- Groups: {group_count}\n"));
    output
}

fn push_group_section(output: &mut String, number: usize, group: &RenderGroup<'_>) {
    match group {
        RenderGroup::Normal { message, .. } => {
            output.push_str(&format!("## {number}. {}\n\n", message.kind.title()));
            output.push_str(&message_body(message));
            output.push_str("\n\n");
        }
        RenderGroup::Subagent { group } => {
            if let Err(err) = validate_subagent_group(group) {
                tracing::warn!(position = number, "skipping subagent entry: {err}");
                return;
            }
            push_subagent_section(output, number, group);
        }
        RenderGroup::Aggregated { messages, .. } => {
            output.push_str(&format!(
                "## {number}. Technical Steps ({})\n\n",
                messages.len()
            ));
            for message in messages {
                push_technical_lines(output, message);
            }
            output.push('\n');
        }
    }
}

fn push_subagent_section(output: &mut String, number: usize, group: &SubagentGroup<'_>) {
    output.push_str(&format!(
        "## {number}. Subagent `{}` (`{}`)\n\n",
        group.subagent_type.as_deref().unwrap_or("unknown"),
        group.id
    ));
    if let Some(description) = task_description(group) {
        output.push_str(&format!("- Task: {description}\n"));
    }
    output.push_str(&format!(
        "- Messages: {}\n\n",
        group.subagent_messages.len()
    ));

    for (idx, message) in group.subagent_messages.iter().enumerate() {
        output.push_str(&format!(
            "### {number}.{} {}\n\n",
            idx + 1,
            message.kind.title()
        ));
        output.push_str(&message_body(message));
        output.push_str("\n\n");
    }
}

fn task_description(group: &SubagentGroup<'_>) -> Option<String> {
    group
        .task_message
        .content_items()?
        .iter()
        .find_map(|item| match item {
            ContentItem::ToolUse { id, input, .. } if *id == group.id => ["description", "prompt"]
                .iter()
                .find_map(|key| input.get(key).and_then(Value::as_str)),
            _ => None,
        })
        .map(|text| truncate_preview(text, PREVIEW_CHARS))
        .filter(|text| !text.is_empty())
}

fn message_body(message: &Message) -> String {
    let body = match &message.content {
        None => String::new(),
        Some(MessageContent::Text(text)) => text.trim().to_string(),
        Some(MessageContent::Raw(value)) => value.to_string(),
        Some(MessageContent::Items(items)) => items
            .iter()
            .filter_map(item_body)
            .collect::<Vec<_>>()
            .join("\n\n"),
    };

    if body.is_empty() {
        NO_CONTENT_PLACEHOLDER.to_string()
    } else {
        body
    }
}

fn item_body(item: &ContentItem) -> Option<String> {
    match item {
        ContentItem::Text { text } => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        ContentItem::Thinking { text } => {
            let text = truncate_preview(text, PREVIEW_CHARS);
            (!text.is_empty()).then(|| format!("_Thinking:_ {text}"))
        }
        ContentItem::ToolUse { id, name, .. } => Some(format!("- Tool `{name}` (`{id}`)")),
        ContentItem::ToolResult { tool_use_id, .. } => {
            Some(format!("- Result for `{tool_use_id}`"))
        }
        ContentItem::Other { item_type } => Some(format!("- Attachment `{item_type}`")),
    }
}

fn push_technical_lines(output: &mut String, message: &Message) {
    let Some(items) = message.content_items() else {
        output.push_str(&format!("- {}\n", message.kind.title()));
        return;
    };

    for item in items {
        let line = match item {
            ContentItem::ToolUse { id, name, .. } => format!("- Tool `{name}` (`{id}`)"),
            ContentItem::ToolResult { tool_use_id, .. } => format!("- Result for `{tool_use_id}`"),
            ContentItem::Thinking { text } => {
                format!("- Thinking: {}", truncate_preview(text, PREVIEW_CHARS))
            }
            ContentItem::Text { .. } | ContentItem::Other { .. } => continue,
        };
        output.push_str(line.trim_end());
        output.push('\n');
    }
}

fn truncate_preview(input: &str, max_chars: usize) -> String {
    let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= max_chars {
        return normalized;
    }

    let mut out = normalized
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}
