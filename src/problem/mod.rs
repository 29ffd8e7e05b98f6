//! Problem definitions: each one picks a gate variant set and scores a
//! genotype with a tuple of primary fitness components (most important
//! first, all minimized).

use crate::{
    candidate::Candidate,
    config::Config,
    fitness::Fitness,
    gates::GateSet,
    math::R,
};

mod fourier;
mod search;
mod simple;

pub use fourier::Fourier;
pub use search::Search;
pub use simple::StatePrep;

/// A pluggable scorer. `Sync` because fitness evaluation of a generation
/// is batched across threads.
pub trait Problem: Sync {
    /// The closed variant set this problem evolves over.
    fn gate_set(&self) -> &GateSet;

    /// The primary fitness components of a genotype. Oversize genotypes
    /// score `+∞` on every component, losing all selection pressure while
    /// remaining comparable.
    fn fitness_main(&self, cand: &Candidate, cfg: &Config) -> Vec<R>;

    /// The full fitness: primary components plus the per-variant counter.
    fn score(&self, cand: &Candidate, cfg: &Config) -> Fitness {
        Fitness::new(self.fitness_main(cand, cfg), cand.gate_counts())
    }
}
