use std::collections::{HashMap, HashSet};

use crate::aggregate::aggregate_technical_runs;
use crate::classify::get_parent_id;
use crate::model::{Message, RenderGroup, SubagentGroup};
use crate::resolve::{Relationships, resolve_relationships};

struct Candidate<'a> {
    group: SubagentGroup<'a>,
    member_indices: Vec<usize>,
}

/// Materialized groups keyed by task id, plus every index they consume.
struct GroupIndex<'a> {
    groups: HashMap<String, SubagentGroup<'a>>,
    hidden: HashSet<usize>,
}

fn collect_candidate<'a>(
    messages: &'a [Message],
    relationships: &Relationships<'a>,
    task_id: &str,
) -> Option<Candidate<'a>> {
    let origin = relationships.origin(task_id)?;

    // Parent linkage is the only membership test: other tasks and other
    // subagents' messages may be interleaved anywhere after the origin.
    let (member_indices, subagent_messages): (Vec<usize>, Vec<&'a Message>) = messages
        .iter()
        .enumerate()
        .skip(origin.index + 1)
        .filter(|(_, message)| get_parent_id(message) == Some(task_id))
        .unzip();

    let end_index = *member_indices.last()?;

    Some(Candidate {
        group: SubagentGroup {
            id: task_id.to_string(),
            task_message: origin.message,
            subagent_messages,
            start_index: origin.index,
            end_index,
            subagent_type: relationships.task_types.get(task_id).cloned(),
        },
        member_indices,
    })
}

fn materialize_groups<'a>(
    messages: &'a [Message],
    relationships: &Relationships<'a>,
) -> GroupIndex<'a> {
    let mut candidates = relationships
        .task_order
        .iter()
        .filter_map(|task_id| collect_candidate(messages, relationships, task_id))
        .collect::<Vec<_>>();

    // A group can only consume messages after its own task message, so
    // admitting by start index settles every enclosing group first.
    candidates.sort_by_key(|candidate| candidate.group.start_index);

    let mut index = GroupIndex {
        groups: HashMap::new(),
        hidden: HashSet::new(),
    };

    for candidate in candidates {
        if index.hidden.contains(&candidate.group.start_index) {
            tracing::debug!(
                task_id = %candidate.group.id,
                start_index = candidate.group.start_index,
                "task message belongs to another subagent; leaving nested group ungrouped"
            );
            continue;
        }

        index.hidden.extend(candidate.member_indices);
        index
            .groups
            .insert(candidate.group.id.clone(), candidate.group);
    }

    index
}

/// Substitutes subagent groups for the messages they own, preserving the
/// original order of everything else.
pub fn build_intermediate_groups(messages: &[Message]) -> Vec<RenderGroup<'_>> {
    let relationships = resolve_relationships(messages);
    let GroupIndex { mut groups, hidden } = materialize_groups(messages, &relationships);

    let mut output = Vec::with_capacity(messages.len() - hidden.len());
    for (index, message) in messages.iter().enumerate() {
        if hidden.contains(&index) {
            continue;
        }

        let mut emitted = false;
        for task_id in relationships.task_ids_at(index) {
            let owned_here = groups
                .get(task_id)
                .is_some_and(|group| group.start_index == index);
            if owned_here && let Some(group) = groups.remove(task_id) {
                output.push(RenderGroup::Subagent { group });
                emitted = true;
            }
        }

        if emitted {
            continue;
        }

        if let Some(parent_id) = get_parent_id(message) {
            tracing::debug!(
                index,
                parent_id,
                "subagent message has no materialized group"
            );
        }
        output.push(RenderGroup::Normal { message, index });
    }

    output
}

/// Full pipeline: subagent grouping followed by technical-run aggregation.
pub fn build_render_groups(messages: &[Message]) -> Vec<RenderGroup<'_>> {
    aggregate_technical_runs(build_intermediate_groups(messages))
}
