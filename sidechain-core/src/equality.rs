//! Shallow structural comparison used to skip re-rendering unchanged groups.
//!
//! This is not deep equality: two `tool_result` items with the same
//! `tool_use_id` compare equal whatever their payload, since a tool-use id
//! is emitted at most once per transcript.

use crate::model::{ContentItem, Message, MessageContent, RenderGroup, Usage};

fn both_present_differ<T: PartialEq + ?Sized>(prev: Option<&T>, next: Option<&T>) -> bool {
    matches!((prev, next), (Some(prev), Some(next)) if prev != next)
}

fn content_items_equal(prev: &ContentItem, next: &ContentItem) -> bool {
    match (prev, next) {
        (ContentItem::Text { text: prev }, ContentItem::Text { text: next })
        | (ContentItem::Thinking { text: prev }, ContentItem::Thinking { text: next }) => {
            prev == next
        }
        (
            ContentItem::ToolUse {
                id: prev_id,
                name: prev_name,
                ..
            },
            ContentItem::ToolUse {
                id: next_id,
                name: next_name,
                ..
            },
        ) => prev_id == next_id && prev_name == next_name,
        (
            ContentItem::ToolResult {
                tool_use_id: prev, ..
            },
            ContentItem::ToolResult {
                tool_use_id: next, ..
            },
        ) => prev == next,
        (ContentItem::Other { item_type: prev }, ContentItem::Other { item_type: next }) => {
            prev == next
        }
        _ => false,
    }
}

fn contents_equal(prev: Option<&MessageContent>, next: Option<&MessageContent>) -> bool {
    match (prev, next) {
        (Some(MessageContent::Items(prev)), Some(MessageContent::Items(next))) => {
            prev.len() == next.len()
                && prev
                    .iter()
                    .zip(next)
                    .all(|(prev, next)| content_items_equal(prev, next))
        }
        (Some(MessageContent::Items(_)), _) | (_, Some(MessageContent::Items(_))) => false,
        (prev, next) => prev == next,
    }
}

fn usage_equal(prev: Option<&Usage>, next: Option<&Usage>) -> bool {
    if prev.is_none() && next.is_none() {
        return true;
    }

    let input = |usage: Option<&Usage>| usage.and_then(|usage| usage.input_tokens);
    let output = |usage: Option<&Usage>| usage.and_then(|usage| usage.output_tokens);
    input(prev) == input(next) && output(prev) == output(next)
}

pub fn messages_equal(prev: &Message, next: &Message) -> bool {
    if std::ptr::eq(prev, next) {
        return true;
    }

    prev.kind == next.kind
        && !both_present_differ(prev.id.as_deref(), next.id.as_deref())
        && !both_present_differ(prev.timestamp.as_deref(), next.timestamp.as_deref())
        && contents_equal(prev.content.as_ref(), next.content.as_ref())
        && usage_equal(prev.usage.as_ref(), next.usage.as_ref())
}

fn message_lists_equal(prev: &[&Message], next: &[&Message]) -> bool {
    prev.len() == next.len()
        && prev
            .iter()
            .zip(next)
            .all(|(prev, next)| messages_equal(prev, next))
}

pub fn groups_equal(prev: &RenderGroup<'_>, next: &RenderGroup<'_>) -> bool {
    match (prev, next) {
        (RenderGroup::Normal { message: prev, .. }, RenderGroup::Normal { message: next, .. }) => {
            messages_equal(prev, next)
        }
        (RenderGroup::Subagent { group: prev }, RenderGroup::Subagent { group: next }) => {
            messages_equal(prev.task_message, next.task_message)
                && message_lists_equal(&prev.subagent_messages, &next.subagent_messages)
        }
        (
            RenderGroup::Aggregated { messages: prev, .. },
            RenderGroup::Aggregated { messages: next, .. },
        ) => message_lists_equal(prev, next),
        _ => false,
    }
}

/// Positions in `next` whose group differs from the group at the same
/// position in `prev`.
pub fn changed_group_positions(prev: &[RenderGroup<'_>], next: &[RenderGroup<'_>]) -> Vec<usize> {
    next.iter()
        .enumerate()
        .filter(|(position, group)| {
            prev.get(*position)
                .is_none_or(|previous| !groups_equal(previous, group))
        })
        .map(|(position, _)| position)
        .collect()
}
