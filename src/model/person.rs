use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One exercise per teaching week.
pub const EXERCISE_COUNT: usize = 14;
/// Teaching weeks run 0 through 13.
pub const WEEK_COUNT: usize = 14;

fn week_flags() -> [bool; WEEK_COUNT] {
    [false; WEEK_COUNT]
}

/// A student record. Immutable in spirit: every annotation produces a new
/// value via the `with_*` constructors, and the student id is the duplicate
/// key across the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub student_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub github: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Pass flags keyed by canonical (lowercase) exam name.
    #[serde(default)]
    pub grades: BTreeMap<String, bool>,
    /// Fixed-size per-week flags: a stored array of any other length is
    /// rejected at deserialization, so indexing by a validated week or
    /// exercise slot cannot go out of bounds.
    #[serde(default = "week_flags")]
    pub exercises: [bool; EXERCISE_COUNT],
    #[serde(default = "week_flags")]
    pub attendance: [bool; WEEK_COUNT],
}

impl Person {
    pub fn new(
        student_id: String,
        name: String,
        phone: String,
        email: String,
        github: String,
        tags: Vec<String>,
    ) -> Self {
        Self {
            student_id,
            name,
            phone,
            email,
            github,
            tags,
            grades: BTreeMap::new(),
            exercises: week_flags(),
            attendance: week_flags(),
        }
    }

    pub fn grade(&self, exam: &str) -> Option<bool> {
        self.grades.get(exam).copied()
    }

    pub fn with_grade(&self, exam: &str, passed: bool) -> Self {
        let mut updated = self.clone();
        updated.grades.insert(exam.to_string(), passed);
        updated
    }

    /// `slot` is zero-based and must be below [`EXERCISE_COUNT`].
    pub fn with_exercise(&self, slot: usize, done: bool) -> Self {
        assert!(slot < EXERCISE_COUNT, "exercise slot out of range");
        let mut updated = self.clone();
        updated.exercises[slot] = done;
        updated
    }

    pub fn with_attendance(&self, week: usize, present: bool) -> Self {
        assert!(week < WEEK_COUNT, "week out of range");
        let mut updated = self.clone();
        updated.attendance[week] = present;
        updated
    }

    /// Attendance percentage over weeks 0 through `week` inclusive.
    pub fn attendance_percent(&self, week: u8) -> u32 {
        let through = week as usize + 1;
        let attended = self.attendance[..through].iter().filter(|&&a| a).count();
        (attended * 100 / through) as u32
    }

    /// One-based numbers of exercises not done whose week has already passed.
    pub fn overdue_exercises(&self, current_week: u8) -> Vec<usize> {
        self.exercises
            .iter()
            .enumerate()
            .filter(|&(slot, &done)| !done && slot < current_week as usize)
            .map(|(slot, _)| slot + 1)
            .collect()
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.student_id)
    }
}
