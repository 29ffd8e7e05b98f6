use std::{cmp::Ordering, fmt};

use crate::{gates::Tag, math::R};

/// Per-variant gate counts, one slot per [`Tag`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Debug)]
pub struct Counter {
    counts: [u32; Tag::COUNT],
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&mut self, tag: Tag) {
        self.counts[tag.index()] += 1;
    }

    pub fn get(&self, tag: Tag) -> u32 {
        self.counts[tag.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    fn le(&self, other: &Self) -> bool {
        self.counts
            .iter()
            .zip(&other.counts)
            .all(|(a, b)| a <= b)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Quantizes an error so that near-equal fitnesses become exactly equal;
/// deviations of roughly 10⁻⁵ are ignored. Pareto pruning relies on this.
pub fn trim_error(error: R) -> R {
    if !error.is_finite() {
        return error;
    }
    (error * (1u64 << 16) as R) as u64 as R / (1u64 << 16) as R
}

/// The dominance-comparable fitness of a candidate: the problem's primary
/// components (most important first, all minimized) followed by the
/// per-variant gate counts.
#[derive(Clone, PartialEq, Debug)]
pub struct Fitness {
    main: Vec<R>,
    counter: Counter,
}

impl Fitness {
    pub fn new(main: Vec<R>, counter: Counter) -> Self {
        Self { main, counter }
    }

    /// The leading (most important) component.
    pub fn error(&self) -> R {
        self.main[0]
    }

    pub fn main(&self) -> &[R] {
        &self.main
    }

    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    /// Strict Pareto dominance: componentwise ≤ with at least one strict.
    pub fn dominates(&self, other: &Self) -> bool {
        debug_assert_eq!(self.main.len(), other.main.len());
        self.main
            .iter()
            .zip(&other.main)
            .all(|(a, b)| a <= b)
            && self.counter.le(&other.counter)
            && self != other
    }

    /// The strict total (lexicographic) order used for ranking at equal
    /// error.
    pub fn lex_cmp(&self, other: &Self) -> Ordering {
        debug_assert_eq!(self.main.len(), other.main.len());
        for (a, b) in self.main.iter().zip(&other.main) {
            match a.total_cmp(b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.counter.cmp(&other.counter)
    }
}

impl fmt::Display for Fitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, c) in self.main.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ",[{}]}}", self.counter)
    }
}
