use std::collections::{BTreeMap, HashMap};

use crate::classify::{extract_task_details, extract_task_ids};
use crate::model::Message;

#[derive(Debug, Clone, Copy)]
pub struct TaskOrigin<'a> {
    pub message: &'a Message,
    pub index: usize,
}

/// Lookups from task ids back to the messages that issued them.
#[derive(Debug, Clone, Default)]
pub struct Relationships<'a> {
    pub task_index: HashMap<String, TaskOrigin<'a>>,
    /// Task ids in the order they were first seen.
    pub task_order: Vec<String>,
    pub index_to_task_ids: BTreeMap<usize, Vec<String>>,
    pub task_types: HashMap<String, String>,
}

impl<'a> Relationships<'a> {
    pub fn task_ids_at(&self, index: usize) -> &[String] {
        self.index_to_task_ids
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn origin(&self, task_id: &str) -> Option<TaskOrigin<'a>> {
        self.task_index.get(task_id).copied()
    }
}

pub fn resolve_relationships(messages: &[Message]) -> Relationships<'_> {
    let mut relationships = Relationships::default();

    for (index, message) in messages.iter().enumerate() {
        let task_ids = extract_task_ids(message);
        if task_ids.is_empty() {
            continue;
        }

        let mut details = extract_task_details(message);
        for task_id in &task_ids {
            let previous = relationships
                .task_index
                .insert(task_id.clone(), TaskOrigin { message, index });
            match previous {
                // Later occurrence wins.
                Some(previous) if previous.index != index => {
                    tracing::debug!(
                        task_id = %task_id,
                        previous = previous.index,
                        current = index,
                        "duplicate task id in transcript"
                    );
                }
                Some(_) => {}
                None => relationships.task_order.push(task_id.clone()),
            }

            if let Some(subagent_type) = details
                .remove(task_id)
                .and_then(|detail| detail.subagent_type)
            {
                relationships
                    .task_types
                    .insert(task_id.clone(), subagent_type);
            }
        }

        relationships.index_to_task_ids.insert(index, task_ids);
    }

    relationships
}
