use crate::classify::is_technical_message;
use crate::model::{Message, RenderGroup};

/// Consecutive technical messages waiting to be emitted as one entry.
struct TechnicalRun<'a> {
    messages: Vec<&'a Message>,
    index: usize,
}

impl<'a> TechnicalRun<'a> {
    fn into_group(self) -> RenderGroup<'a> {
        RenderGroup::Aggregated {
            messages: self.messages,
            index: self.index,
        }
    }
}

fn flush<'a>(output: &mut Vec<RenderGroup<'a>>, open: Option<TechnicalRun<'a>>) {
    if let Some(run) = open {
        output.push(run.into_group());
    }
}

/// Coalesces runs of technical `Normal` entries into `Aggregated` entries.
/// Subagent groups and user-visible messages close any open run; a run of
/// one is still aggregated.
pub fn aggregate_technical_runs(groups: Vec<RenderGroup<'_>>) -> Vec<RenderGroup<'_>> {
    let capacity = groups.len();
    let (mut output, open) = groups.into_iter().fold(
        (Vec::with_capacity(capacity), None::<TechnicalRun<'_>>),
        |(mut output, open), group| match group {
            RenderGroup::Normal { message, index } if is_technical_message(message) => {
                let run = match open {
                    Some(mut run) => {
                        run.messages.push(message);
                        run
                    }
                    None => TechnicalRun {
                        messages: vec![message],
                        index,
                    },
                };
                (output, Some(run))
            }
            other => {
                flush(&mut output, open);
                output.push(other);
                (output, None)
            }
        },
    );
    flush(&mut output, open);
    output
}
