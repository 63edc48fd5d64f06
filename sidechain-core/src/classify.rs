use std::collections::HashMap;

use serde_json::Value;

use crate::model::{ContentItem, Message, MessageKind, TaskDetails};

const TASK_TOOL_NAME: &str = "task";

fn is_task_tool_use(item: &ContentItem) -> bool {
    matches!(item, ContentItem::ToolUse { name, .. } if name.eq_ignore_ascii_case(TASK_TOOL_NAME))
}

fn task_tool_uses(message: &Message) -> impl Iterator<Item = (&str, &Value)> {
    let items = if message.kind == MessageKind::Assistant {
        message.content_items().unwrap_or_default()
    } else {
        &[]
    };

    items
        .iter()
        .filter(|item| is_task_tool_use(item))
        .filter_map(|item| match item {
            ContentItem::ToolUse { id, input, .. } => Some((id.as_str(), input)),
            _ => None,
        })
}

/// True for an assistant message carrying at least one `task` tool use.
pub fn has_task_invocation(message: &Message) -> bool {
    task_tool_uses(message).next().is_some()
}

pub fn extract_task_ids(message: &Message) -> Vec<String> {
    task_tool_uses(message)
        .map(|(id, _)| id.to_string())
        .collect()
}

pub fn extract_task_details(message: &Message) -> HashMap<String, TaskDetails> {
    task_tool_uses(message)
        .map(|(id, input)| {
            let subagent_type = input
                .get("subagent_type")
                .and_then(Value::as_str)
                .map(ToString::to_string);
            (id.to_string(), TaskDetails { subagent_type })
        })
        .collect()
}

pub fn is_subagent_message(message: &Message) -> bool {
    message.parent_tool_use_id.is_some() || message.is_sidechain == Some(true)
}

pub fn get_parent_id(message: &Message) -> Option<&str> {
    message.parent_tool_use_id.as_deref()
}

/// A message with nothing for the user to read: reasoning, tool calls and
/// tool results only. Plain-text content is never technical.
pub fn is_technical_message(message: &Message) -> bool {
    if message.kind == MessageKind::Thinking {
        return true;
    }
    if message.kind != MessageKind::Assistant {
        return false;
    }

    let Some(items) = message.content_items() else {
        return false;
    };

    items.iter().all(|item| match item {
        ContentItem::ToolUse { .. } | ContentItem::ToolResult { .. } | ContentItem::Thinking { .. } => {
            true
        }
        ContentItem::Text { text } => text.trim().is_empty(),
        ContentItem::Other { .. } => false,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::classify::{
        extract_task_details, extract_task_ids, get_parent_id, has_task_invocation,
        is_subagent_message, is_technical_message,
    };
    use crate::model::{ContentItem, Message, MessageContent, MessageKind};

    fn assistant(items: Vec<ContentItem>) -> Message {
        let mut message = Message::new(MessageKind::Assistant);
        message.content = Some(MessageContent::Items(items));
        message
    }

    fn tool_use(id: &str, name: &str, input: serde_json::Value) -> ContentItem {
        ContentItem::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }
    }

    #[test]
    fn detects_task_tool_use_case_insensitively() {
        let message = assistant(vec![
            ContentItem::Text {
                text: "delegating".to_string(),
            },
            tool_use("toolu_1", "Task", json!({"subagent_type": "explorer"})),
            tool_use("toolu_2", "Read", json!({"file_path": "/tmp/a"})),
            tool_use("toolu_3", "TASK", json!({})),
        ]);

        assert!(has_task_invocation(&message));
        assert_eq!(extract_task_ids(&message), vec!["toolu_1", "toolu_3"]);

        let details = extract_task_details(&message);
        assert_eq!(details.len(), 2);
        assert_eq!(
            details["toolu_1"].subagent_type.as_deref(),
            Some("explorer")
        );
        assert_eq!(details["toolu_3"].subagent_type, None);
    }

    #[test]
    fn task_detection_requires_assistant_item_content() {
        let mut user = assistant(vec![tool_use("toolu_1", "task", json!({}))]);
        user.kind = MessageKind::User;
        assert!(!has_task_invocation(&user));
        assert!(extract_task_ids(&user).is_empty());

        let mut text_only = Message::new(MessageKind::Assistant);
        text_only.content = Some(MessageContent::Text("task".to_string()));
        assert!(!has_task_invocation(&text_only));

        let missing = Message::new(MessageKind::Assistant);
        assert!(!has_task_invocation(&missing));
        assert!(extract_task_details(&missing).is_empty());
    }

    #[test]
    fn subagent_linkage_uses_parent_or_sidechain_flag() {
        let mut linked = Message::new(MessageKind::User);
        linked.parent_tool_use_id = Some("toolu_1".to_string());
        assert!(is_subagent_message(&linked));
        assert_eq!(get_parent_id(&linked), Some("toolu_1"));

        let mut sidechain = Message::new(MessageKind::Assistant);
        sidechain.is_sidechain = Some(true);
        assert!(is_subagent_message(&sidechain));
        assert_eq!(get_parent_id(&sidechain), None);

        let mut main = Message::new(MessageKind::Assistant);
        main.is_sidechain = Some(false);
        assert!(!is_subagent_message(&main));
    }

    #[test]
    fn thinking_messages_are_always_technical() {
        let mut thinking = Message::new(MessageKind::Thinking);
        thinking.content = Some(MessageContent::Items(vec![ContentItem::Thinking {
            text: String::new(),
        }]));
        assert!(is_technical_message(&thinking));
        assert!(is_technical_message(&Message::new(MessageKind::Thinking)));
    }

    #[test]
    fn tool_only_assistant_messages_are_technical() {
        let message = assistant(vec![
            ContentItem::Thinking {
                text: "plan".to_string(),
            },
            tool_use("toolu_1", "Bash", json!({"command": "ls"})),
            ContentItem::ToolResult {
                tool_use_id: "toolu_1".to_string(),
                content: json!("ok"),
            },
            ContentItem::Text {
                text: "  \n".to_string(),
            },
        ]);
        assert!(is_technical_message(&message));
    }

    #[test]
    fn visible_text_or_unknown_items_are_not_technical() {
        let with_text = assistant(vec![
            tool_use("toolu_1", "Bash", json!({})),
            ContentItem::Text {
                text: "done".to_string(),
            },
        ]);
        assert!(!is_technical_message(&with_text));

        let with_image = assistant(vec![ContentItem::Other {
            item_type: "image".to_string(),
        }]);
        assert!(!is_technical_message(&with_image));

        let mut bare_text = Message::new(MessageKind::Assistant);
        bare_text.content = Some(MessageContent::Text(String::new()));
        assert!(!is_technical_message(&bare_text));

        let mut user_results = assistant(vec![ContentItem::ToolResult {
            tool_use_id: "toolu_1".to_string(),
            content: json!("ok"),
        }]);
        user_results.kind = MessageKind::User;
        assert!(!is_technical_message(&user_results));
    }
}
