pub mod person;
pub mod timeslot;

use std::cmp::Ordering;

use person::Person;
use timeslot::TimeslotCollection;

pub const LAST_WEEK: u8 = 13;

/// The current teaching week, passed explicitly to every derivation that
/// needs it (overdue exercises, attendance percentages). `set-week` swaps in
/// a new value for all subsequent commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SemesterContext {
    week: u8,
}

impl SemesterContext {
    pub fn new(week: u8) -> Self {
        assert!(week <= LAST_WEEK, "week out of range");
        Self { week }
    }

    pub fn week(self) -> u8 {
        self.week
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    persons: Vec<Person>,
    timeslots: TimeslotCollection,
    context: SemesterContext,
}

/// Domain state: the roster, the filtered view over it, the booked timeslots,
/// the semester context, and the undo history. Single-threaded by design;
/// every check-then-act sequence assumes exclusive access.
#[derive(Debug, Default)]
pub struct Model {
    persons: Vec<Person>,
    /// Indices into `persons` currently displayed, in display order.
    visible: Vec<usize>,
    pub timeslots: TimeslotCollection,
    context: SemesterContext,
    history: Vec<Snapshot>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(persons: Vec<Person>, timeslots: TimeslotCollection) -> Self {
        let visible = (0..persons.len()).collect();
        Self {
            persons,
            visible,
            timeslots,
            context: SemesterContext::default(),
            history: Vec::new(),
        }
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn context(&self) -> SemesterContext {
        self.context
    }

    pub fn set_context(&mut self, context: SemesterContext) {
        self.context = context;
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn visible_persons(&self) -> Vec<&Person> {
        self.visible.iter().map(|&i| &self.persons[i]).collect()
    }

    /// The person at a displayed position. Callers bounds-check first.
    pub fn person_at(&self, index: crate::index::Index) -> &Person {
        &self.persons[self.visible[index.zero_based()]]
    }

    pub fn has_student_id(&self, student_id: &str, except: Option<&Person>) -> bool {
        self.persons
            .iter()
            .filter(|stored| except != Some(*stored))
            .any(|stored| stored.student_id == student_id)
    }

    pub fn push_person(&mut self, person: Person) {
        self.persons.push(person);
        self.show_all();
    }

    /// Removes the stored person equal to `target`. Returns false when no
    /// stored person matches.
    pub fn remove_person(&mut self, target: &Person) -> bool {
        match self.persons.iter().position(|stored| stored == target) {
            Some(pos) => {
                self.persons.remove(pos);
                self.show_all();
                true
            }
            None => false,
        }
    }

    /// Replaces the stored person equal to `target` with `updated`.
    pub fn replace_person(&mut self, target: &Person, updated: Person) -> bool {
        match self.persons.iter().position(|stored| stored == target) {
            Some(pos) => {
                self.persons[pos] = updated;
                true
            }
            None => false,
        }
    }

    pub fn show_all(&mut self) {
        self.visible = (0..self.persons.len()).collect();
    }

    pub fn apply_filter(&mut self, predicate: impl Fn(&Person) -> bool) {
        self.visible = self
            .persons
            .iter()
            .enumerate()
            .filter(|(_, person)| predicate(person))
            .map(|(i, _)| i)
            .collect();
    }

    pub fn sort_persons_by(&mut self, compare: impl FnMut(&Person, &Person) -> Ordering) {
        self.persons.sort_by(compare);
        self.show_all();
    }

    /// Snapshots the whole aggregate, once per mutating command.
    pub fn checkpoint(&mut self) {
        self.history.push(Snapshot {
            persons: self.persons.clone(),
            timeslots: self.timeslots.clone(),
            context: self.context,
        });
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Restores the most recent checkpoint. Returns false with no history.
    pub fn undo(&mut self) -> bool {
        self.restore_last()
    }

    /// Discards a checkpoint taken by a command that then failed mid-flight,
    /// restoring the pre-command state.
    pub fn rollback_last_checkpoint(&mut self) {
        let restored = self.restore_last();
        assert!(restored, "rollback without a checkpoint");
    }

    fn restore_last(&mut self) -> bool {
        match self.history.pop() {
            Some(snapshot) => {
                self.persons = snapshot.persons;
                self.timeslots = snapshot.timeslots;
                self.context = snapshot.context;
                self.show_all();
                true
            }
            None => false,
        }
    }
}
