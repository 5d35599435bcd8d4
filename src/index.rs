use std::fmt;

/// A position in a displayed list. Stored zero-based, shown one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Index(usize);

impl Index {
    /// Builds from a one-based position. Panics on zero — callers must have
    /// validated the raw value already (the index field parser does).
    pub fn from_one_based(value: usize) -> Self {
        assert!(value >= 1, "one-based index must be >= 1");
        Self(value - 1)
    }

    pub fn from_zero_based(value: usize) -> Self {
        Self(value)
    }

    pub fn zero_based(self) -> usize {
        self.0
    }

    pub fn one_based(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.one_based())
    }
}

/// A single position or an inclusive range of positions (`lower <= upper`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiIndex {
    lower: Index,
    upper: Index,
}

impl MultiIndex {
    /// Panics if `lower > upper` — the range field parser rejects inverted
    /// ranges before construction.
    pub fn new(lower: Index, upper: Index) -> Self {
        assert!(lower <= upper, "inverted multi-index range");
        Self { lower, upper }
    }

    pub fn single(index: Index) -> Self {
        Self {
            lower: index,
            upper: index,
        }
    }

    pub fn lower(&self) -> Index {
        self.lower
    }

    pub fn upper(&self) -> Index {
        self.upper
    }

    pub fn len(&self) -> usize {
        self.upper.zero_based() - self.lower.zero_based() + 1
    }

    pub fn is_single(&self) -> bool {
        self.lower == self.upper
    }

    /// Ascending sequence of covered indices.
    pub fn iter(&self) -> impl Iterator<Item = Index> {
        (self.lower.zero_based()..=self.upper.zero_based()).map(Index::from_zero_based)
    }
}

impl fmt::Display for MultiIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.lower)
        } else {
            write!(f, "{}:{}", self.lower, self.upper)
        }
    }
}
