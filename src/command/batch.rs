use super::CommandError;
use crate::index::MultiIndex;
use crate::model::Model;
use crate::model::person::Person;

/// Outcome of applying a batch action to one addressed item. Declining (for
/// example "already marked") is not an error for the batch; it is tracked and
/// reported alongside the changed items.
pub enum ItemOutcome {
    Changed,
    Unchanged(String),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub changed: Vec<String>,
    pub declined: Vec<(String, String)>,
}

impl BatchReport {
    /// One consolidated message, e.g.
    /// `Deleted 2 student(s): Alice, Bob; skipped 1: Carol (already marked)`.
    pub fn summarize(&self, action: &str) -> String {
        let mut message = format!("{action} {} student(s)", self.changed.len());
        if !self.changed.is_empty() {
            message.push_str(": ");
            message.push_str(&self.changed.join(", "));
        }
        if !self.declined.is_empty() {
            let skipped: Vec<String> = self
                .declined
                .iter()
                .map(|(name, reason)| format!("{name} ({reason})"))
                .collect();
            message.push_str(&format!("; skipped {}: {}", skipped.len(), skipped.join("; ")));
        }
        message
    }
}

/// Shared control flow for every command addressing items by MultiIndex:
/// bounds check, one undo checkpoint, per-item apply in ascending order over
/// the items resolved from the original displayed list, then aggregation
/// (view reset to show-all, consolidated report).
///
/// An out-of-bounds upper index fails before any mutation. A per-item
/// business error restores the checkpoint and fails the whole batch, so
/// execution is all-or-nothing.
pub fn execute_batch<F>(
    model: &mut Model,
    targets: &MultiIndex,
    kind: &'static str,
    mut apply: F,
) -> Result<BatchReport, CommandError>
where
    F: FnMut(&mut Model, &Person) -> Result<ItemOutcome, CommandError>,
{
    let size = model.visible_count();
    if targets.upper().one_based() > size {
        return Err(CommandError::OutOfBounds {
            kind,
            attempted: targets.upper().one_based(),
            size,
        });
    }

    // Resolve every target up front so mutation cannot shift later indices.
    let originals: Vec<Person> = targets
        .iter()
        .map(|index| model.person_at(index).clone())
        .collect();

    model.checkpoint();
    let mut report = BatchReport::default();
    for person in &originals {
        match apply(model, person) {
            Ok(ItemOutcome::Changed) => report.changed.push(person.name.clone()),
            Ok(ItemOutcome::Unchanged(reason)) => {
                report.declined.push((person.name.clone(), reason));
            }
            Err(error) => {
                model.rollback_last_checkpoint();
                return Err(error);
            }
        }
    }
    model.show_all();
    Ok(report)
}
