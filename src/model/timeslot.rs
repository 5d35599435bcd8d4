use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub fn format_instant(instant: NaiveDateTime) -> String {
    instant.format("%-d %b %Y, %H:%M").to_string()
}

pub fn format_range(start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!("{} - {}", format_instant(start), format_instant(end))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeslotError {
    #[error("Timeslot end must be strictly after its start.")]
    InvalidRange,
    #[error("The requested period conflicts with an existing booking: {0}")]
    Conflict(Timeslot),
    #[error("This consultation has already been booked.")]
    Duplicate,
    #[error("No booked timeslot overlaps the requested period.")]
    NotFound,
}

/// An immutable half-open interval `[start, end)`. A student tag marks a
/// consultation; without one it is a plain blocked period. Equality is
/// start + end + tag, exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeslot {
    start: NaiveDateTime,
    end: NaiveDateTime,
    student: Option<String>,
}

impl Timeslot {
    pub fn block(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, TimeslotError> {
        Self::build(start, end, None)
    }

    pub fn consultation(
        start: NaiveDateTime,
        end: NaiveDateTime,
        student: String,
    ) -> Result<Self, TimeslotError> {
        Self::build(start, end, Some(student))
    }

    fn build(
        start: NaiveDateTime,
        end: NaiveDateTime,
        student: Option<String>,
    ) -> Result<Self, TimeslotError> {
        // Zero-length and inverted intervals never exist.
        if end <= start {
            return Err(TimeslotError::InvalidRange);
        }
        Ok(Self {
            start,
            end,
            student,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn student(&self) -> Option<&str> {
        self.student.as_deref()
    }

    pub fn is_consultation(&self) -> bool {
        self.student.is_some()
    }

    /// Strict intersection: touching endpoints do not overlap. This is the
    /// insert/unblock predicate; report merging uses a looser adjacency rule.
    pub fn overlaps(&self, other: &Timeslot) -> bool {
        self.end > other.start && self.start < other.end
    }

    fn overlaps_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.end > start && self.start < end
    }
}

impl fmt::Display for Timeslot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_range(self.start, self.end))?;
        if let Some(student) = &self.student {
            write!(f, " (consultation with {student})")?;
        }
        Ok(())
    }
}

/// The booked intervals. Invariant: no two stored intervals strictly overlap;
/// insertion order is preserved for display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeslotCollection {
    slots: Vec<Timeslot>,
}

impl TimeslotCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timeslot> {
        self.slots.iter()
    }

    /// Adds `slot` unless it strictly overlaps a stored interval; the error
    /// names the conflicting booking.
    pub fn insert(&mut self, slot: Timeslot) -> Result<(), TimeslotError> {
        if let Some(conflict) = self.slots.iter().find(|stored| stored.overlaps(&slot)) {
            return Err(TimeslotError::Conflict(conflict.clone()));
        }
        self.slots.push(slot);
        Ok(())
    }

    /// Consultation insertion distinguishes an exact duplicate (same interval,
    /// same student) from every other clash, which reads as a plain conflict.
    pub fn insert_consultation(&mut self, slot: Timeslot) -> Result<(), TimeslotError> {
        debug_assert!(slot.is_consultation(), "consultation must carry a student");
        if self.slots.contains(&slot) {
            return Err(TimeslotError::Duplicate);
        }
        self.insert(slot)
    }

    /// Exact-match removal, full equality including the student tag.
    pub fn remove(&mut self, slot: &Timeslot) -> Result<(), TimeslotError> {
        match self.slots.iter().position(|stored| stored == slot) {
            Some(pos) => {
                self.slots.remove(pos);
                Ok(())
            }
            None => Err(TimeslotError::NotFound),
        }
    }

    pub fn clear(&mut self) -> usize {
        let cleared = self.slots.len();
        self.slots.clear();
        cleared
    }

    /// Consultations sorted by start time.
    pub fn consultations(&self) -> Vec<&Timeslot> {
        let mut found: Vec<&Timeslot> = self
            .slots
            .iter()
            .filter(|slot| slot.is_consultation())
            .collect();
        found.sort_by_key(|slot| slot.start);
        found
    }

    /// Minimal set of maximal merged ranges over all stored intervals.
    /// Touching endpoints merge here (unlike the insert predicate): two
    /// back-to-back bookings display as one busy range.
    pub fn merged_ranges(&self) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        let mut ranges: Vec<(NaiveDateTime, NaiveDateTime)> =
            self.slots.iter().map(|slot| (slot.start, slot.end)).collect();
        ranges.sort();
        let mut merged: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
        for (start, end) in ranges {
            match merged.last_mut() {
                Some((_, current_end)) if start <= *current_end => {
                    if end > *current_end {
                        *current_end = end;
                    }
                }
                _ => merged.push((start, end)),
            }
        }
        merged
    }

    /// Removes `[start, end)` from every stored interval it strictly overlaps,
    /// splitting or trimming as needed: full cover drops the stored interval,
    /// an edge overlap leaves one remainder, a strictly internal removal
    /// leaves two. Touching intervals are untouched. Returns how many stored
    /// intervals were affected; NotFound when none overlapped at all.
    pub fn unblock(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<usize, TimeslotError> {
        debug_assert!(end > start, "unblock range must be non-empty");
        let mut remainders: Vec<Timeslot> = Vec::new();
        let mut affected = 0;
        self.slots.retain(|stored| {
            if !stored.overlaps_range(start, end) {
                return true;
            }
            affected += 1;
            if stored.start < start {
                remainders.push(Timeslot {
                    start: stored.start,
                    end: start,
                    student: stored.student.clone(),
                });
            }
            if end < stored.end {
                remainders.push(Timeslot {
                    start: end,
                    end: stored.end,
                    student: stored.student.clone(),
                });
            }
            false
        });
        if affected == 0 {
            return Err(TimeslotError::NotFound);
        }
        // Remainders are strict sub-intervals of removed slots, so they cannot
        // conflict with anything still stored.
        self.slots.extend(remainders);
        Ok(affected)
    }
}
