pub mod batch;

use std::fmt;

use chrono::NaiveDateTime;

use crate::index::{Index, MultiIndex};
use crate::model::person::{EXERCISE_COUNT, Person};
use crate::model::timeslot::{Timeslot, TimeslotError, format_range};
use crate::model::{Model, SemesterContext};
use crate::parser::fields::CmpExpr;
use batch::{ItemOutcome, execute_batch};

/// Business failures raised after parsing succeeds. Bounds and overlap checks
/// run before any mutation; the batch executor rolls back on the rest.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{kind} index {attempted} is out of bounds: valid range is [1, {size}]")]
    OutOfBounds {
        kind: &'static str,
        attempted: usize,
        size: usize,
    },
    #[error("The requested period conflicts with an existing booking: {conflict}")]
    TimeslotConflict { conflict: Timeslot },
    #[error("This consultation has already been booked.")]
    DuplicateConsultation,
    #[error("No booked timeslot overlaps the requested period.")]
    TimeslotNotFound,
    #[error("A student with ID {0} already exists.")]
    DuplicateStudent(String),
    #[error("Exercise {index} does not exist: valid range is [1, {max}]")]
    UnknownExercise { index: usize, max: usize },
    #[error("There is no earlier state to undo to.")]
    NothingToUndo,
}

impl From<TimeslotError> for CommandError {
    fn from(error: TimeslotError) -> Self {
        match error {
            TimeslotError::Conflict(conflict) => Self::TimeslotConflict { conflict },
            TimeslotError::Duplicate => Self::DuplicateConsultation,
            TimeslotError::NotFound => Self::TimeslotNotFound,
            // Parsers construct every timeslot, so an invalid range here is a
            // caller contract breach.
            TimeslotError::InvalidRange => unreachable!("timeslot validated at parse time"),
        }
    }
}

/// What a successful command hands to the presentation layer: a feedback
/// string, plus ranges for timetable-style display where that applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub feedback: String,
    pub ranges: Option<Vec<(NaiveDateTime, NaiveDateTime)>>,
}

impl CommandResult {
    pub fn text(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            ranges: None,
        }
    }

    pub fn with_ranges(
        feedback: impl Into<String>,
        ranges: Vec<(NaiveDateTime, NaiveDateTime)>,
    ) -> Self {
        Self {
            feedback: feedback.into(),
            ranges: Some(ranges),
        }
    }
}

/// Field changes requested by `edit`; `None` leaves a field alone. Tags
/// replace wholesale when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDelta {
    pub student_id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub github: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl EditDelta {
    pub fn is_empty(&self) -> bool {
        self.student_id.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.github.is_none()
            && self.tags.is_none()
    }

    fn apply(&self, person: &Person) -> Person {
        let mut updated = person.clone();
        if let Some(student_id) = &self.student_id {
            updated.student_id = student_id.clone();
        }
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            updated.phone = phone.clone();
        }
        if let Some(email) = &self.email {
            updated.email = email.clone();
        }
        if let Some(github) = &self.github {
            updated.github = github.clone();
        }
        if let Some(tags) = &self.tags {
            updated.tags = tags.clone();
        }
        updated
    }
}

/// Conjunction of per-field keyword criteria; keywords within one field match
/// any-of, case-insensitively, as substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub ids: Vec<String>,
    pub names: Vec<String>,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub githubs: Vec<String>,
    pub tags: Vec<String>,
    pub attendance: Option<CmpExpr>,
}

fn field_matches(haystack: &str, keywords: &[String]) -> bool {
    let lowered = haystack.to_lowercase();
    keywords.is_empty()
        || keywords
            .iter()
            .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
            && self.names.is_empty()
            && self.phones.is_empty()
            && self.emails.is_empty()
            && self.githubs.is_empty()
            && self.tags.is_empty()
            && self.attendance.is_none()
    }

    pub fn matches(&self, person: &Person, context: &SemesterContext) -> bool {
        if !field_matches(&person.student_id, &self.ids)
            || !field_matches(&person.name, &self.names)
            || !field_matches(&person.phone, &self.phones)
            || !field_matches(&person.email, &self.emails)
            || !field_matches(&person.github, &self.githubs)
        {
            return false;
        }
        if !self.tags.is_empty()
            && !person
                .tags
                .iter()
                .any(|tag| field_matches(tag, &self.tags))
        {
            return false;
        }
        if let Some(expr) = &self.attendance
            && !expr.holds(person.attendance_percent(context.week()))
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    StudentId,
    Github,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortKey::Name => "name",
            SortKey::StudentId => "id",
            SortKey::Github => "github",
        };
        write!(f, "{label}")
    }
}

/// One variant per command word. Constructed by a parser, executed once.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(Person),
    List,
    Delete {
        targets: MultiIndex,
    },
    Edit {
        targets: MultiIndex,
        delta: EditDelta,
    },
    Grade {
        targets: MultiIndex,
        exam: String,
        passed: bool,
    },
    MarkExercise {
        targets: MultiIndex,
        exercise: Index,
        done: bool,
    },
    Attendance {
        targets: MultiIndex,
        present: bool,
    },
    Filter(FilterSpec),
    Sort(SortKey),
    BlockTimeslot(Timeslot),
    UnblockTimeslot {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    AddConsultation(Timeslot),
    GetTimeslots,
    GetConsultations,
    ClearTimeslots,
    SetWeek(u8),
    Undo,
}

impl Command {
    pub fn execute(self, model: &mut Model) -> Result<CommandResult, CommandError> {
        match self {
            Command::Add(person) => execute_add(model, person),
            Command::List => Ok(execute_list(model)),
            Command::Delete { targets } => {
                let report = execute_batch(model, &targets, "Student", |model, person| {
                    let removed = model.remove_person(person);
                    assert!(removed, "addressed student missing from roster");
                    Ok(ItemOutcome::Changed)
                })?;
                Ok(CommandResult::text(report.summarize("Deleted")))
            }
            Command::Edit { targets, delta } => execute_edit(model, targets, delta),
            Command::Grade {
                targets,
                exam,
                passed,
            } => execute_grade(model, targets, &exam, passed),
            Command::MarkExercise {
                targets,
                exercise,
                done,
            } => execute_mark_exercise(model, targets, exercise, done),
            Command::Attendance { targets, present } => {
                execute_attendance(model, targets, present)
            }
            Command::Filter(spec) => {
                let context = model.context();
                model.apply_filter(|person| spec.matches(person, &context));
                Ok(CommandResult::text(format!(
                    "{} student(s) listed",
                    model.visible_count()
                )))
            }
            Command::Sort(key) => {
                model.checkpoint();
                match key {
                    SortKey::Name => model.sort_persons_by(|a, b| {
                        a.name.to_lowercase().cmp(&b.name.to_lowercase())
                    }),
                    SortKey::StudentId => {
                        model.sort_persons_by(|a, b| a.student_id.cmp(&b.student_id));
                    }
                    SortKey::Github => model.sort_persons_by(|a, b| {
                        a.github.to_lowercase().cmp(&b.github.to_lowercase())
                    }),
                }
                Ok(CommandResult::text(format!("Sorted students by {key}")))
            }
            Command::BlockTimeslot(slot) => {
                model.checkpoint();
                if let Err(error) = model.timeslots.insert(slot.clone()) {
                    model.rollback_last_checkpoint();
                    return Err(error.into());
                }
                Ok(CommandResult::text(format!("Blocked timeslot: {slot}")))
            }
            Command::UnblockTimeslot { start, end } => {
                model.checkpoint();
                match model.timeslots.unblock(start, end) {
                    Ok(affected) => Ok(CommandResult::text(format!(
                        "Unblocked {}: {affected} booking(s) adjusted",
                        format_range(start, end)
                    ))),
                    Err(error) => {
                        model.rollback_last_checkpoint();
                        Err(error.into())
                    }
                }
            }
            Command::AddConsultation(slot) => {
                model.checkpoint();
                if let Err(error) = model.timeslots.insert_consultation(slot.clone()) {
                    model.rollback_last_checkpoint();
                    return Err(error.into());
                }
                Ok(CommandResult::text(format!("Added consultation: {slot}")))
            }
            Command::GetTimeslots => {
                let merged = model.timeslots.merged_ranges();
                Ok(CommandResult::with_ranges(
                    format!("You have {} booked period(s)", merged.len()),
                    merged,
                ))
            }
            Command::GetConsultations => Ok(execute_get_consultations(model)),
            Command::ClearTimeslots => {
                model.checkpoint();
                let cleared = model.timeslots.clear();
                Ok(CommandResult::text(format!("Cleared {cleared} timeslot(s)")))
            }
            Command::SetWeek(week) => {
                model.checkpoint();
                model.set_context(SemesterContext::new(week));
                Ok(CommandResult::text(format!("Current week set to {week}")))
            }
            Command::Undo => {
                if model.undo() {
                    Ok(CommandResult::text("Undid the last change"))
                } else {
                    Err(CommandError::NothingToUndo)
                }
            }
        }
    }
}

fn execute_add(model: &mut Model, person: Person) -> Result<CommandResult, CommandError> {
    if model.has_student_id(&person.student_id, None) {
        return Err(CommandError::DuplicateStudent(person.student_id));
    }
    model.checkpoint();
    let feedback = format!("New student added: {person}");
    model.push_person(person);
    Ok(CommandResult::text(feedback))
}

fn execute_list(model: &mut Model) -> CommandResult {
    model.show_all();
    let context = model.context();
    let mut lines = vec![format!("Listed {} student(s)", model.visible_count())];
    for (position, person) in model.visible_persons().iter().enumerate() {
        let mut line = format!("{}. {person}", position + 1);
        let overdue = person.overdue_exercises(context.week());
        if !overdue.is_empty() {
            let numbers: Vec<String> = overdue.iter().map(usize::to_string).collect();
            line.push_str(&format!(" [overdue exercises: {}]", numbers.join(", ")));
        }
        lines.push(line);
    }
    CommandResult::text(lines.join("\n"))
}

fn execute_edit(
    model: &mut Model,
    targets: MultiIndex,
    delta: EditDelta,
) -> Result<CommandResult, CommandError> {
    let report = execute_batch(model, &targets, "Student", |model, person| {
        let updated = delta.apply(person);
        if let Some(student_id) = &delta.student_id
            && model.has_student_id(student_id, Some(person))
        {
            return Err(CommandError::DuplicateStudent(student_id.clone()));
        }
        let replaced = model.replace_person(person, updated);
        assert!(replaced, "addressed student missing from roster");
        Ok(ItemOutcome::Changed)
    })?;
    Ok(CommandResult::text(report.summarize("Edited")))
}

fn execute_grade(
    model: &mut Model,
    targets: MultiIndex,
    exam: &str,
    passed: bool,
) -> Result<CommandResult, CommandError> {
    let status = if passed { "passed" } else { "failed" };
    let report = execute_batch(model, &targets, "Student", |model, person| {
        if person.grade(exam) == Some(passed) {
            return Ok(ItemOutcome::Unchanged(format!("{exam} already {status}")));
        }
        let updated = person.with_grade(exam, passed);
        let replaced = model.replace_person(person, updated);
        assert!(replaced, "addressed student missing from roster");
        Ok(ItemOutcome::Changed)
    })?;
    Ok(CommandResult::text(
        report.summarize(&format!("Recorded {exam} as {status} for")),
    ))
}

fn execute_mark_exercise(
    model: &mut Model,
    targets: MultiIndex,
    exercise: Index,
    done: bool,
) -> Result<CommandResult, CommandError> {
    let status = if done { "done" } else { "not done" };
    let report = execute_batch(model, &targets, "Student", |model, person| {
        let slot = exercise.zero_based();
        if slot >= EXERCISE_COUNT {
            return Err(CommandError::UnknownExercise {
                index: exercise.one_based(),
                max: EXERCISE_COUNT,
            });
        }
        if person.exercises[slot] == done {
            return Ok(ItemOutcome::Unchanged(format!("already {status}")));
        }
        let updated = person.with_exercise(slot, done);
        let replaced = model.replace_person(person, updated);
        assert!(replaced, "addressed student missing from roster");
        Ok(ItemOutcome::Changed)
    })?;
    Ok(CommandResult::text(report.summarize(&format!(
        "Marked exercise {} as {status} for",
        exercise.one_based()
    ))))
}

fn execute_attendance(
    model: &mut Model,
    targets: MultiIndex,
    present: bool,
) -> Result<CommandResult, CommandError> {
    let week = model.context().week();
    let status = if present { "present" } else { "absent" };
    let report = execute_batch(model, &targets, "Student", |model, person| {
        if person.attendance[week as usize] == present {
            return Ok(ItemOutcome::Unchanged(format!("already {status}")));
        }
        let updated = person.with_attendance(week as usize, present);
        let replaced = model.replace_person(person, updated);
        assert!(replaced, "addressed student missing from roster");
        Ok(ItemOutcome::Changed)
    })?;
    Ok(CommandResult::text(
        report.summarize(&format!("Marked week {week} as {status} for")),
    ))
}

fn execute_get_consultations(model: &Model) -> CommandResult {
    let consultations = model.timeslots.consultations();
    let mut lines = vec![format!("You have {} consultation(s)", consultations.len())];
    let mut ranges = Vec::new();
    for (position, slot) in consultations.iter().enumerate() {
        lines.push(format!("{}. {slot}", position + 1));
        ranges.push((slot.start(), slot.end()));
    }
    CommandResult::with_ranges(lines.join("\n"), ranges)
}
