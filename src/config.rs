use crate::math::{N, R};

/// Fixed-at-start configuration of an evolution run.
///
/// All knobs are read-only once an [`Evolution`](crate::evolution::Evolution)
/// has been constructed from the bag.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of qubits (circuit width).
    pub n_bit: N,
    /// Carry-over population size.
    pub pop_size: N,
    /// Expanded per-generation population size.
    pub pop_size2: N,
    /// Generations to run.
    pub n_gen: N,
    /// NSGA rank bias: selection weight is `select_bias ^ -rank`.
    pub select_bias: R,
    /// Operator-weight update rate; the weight sum is kept at
    /// `heur_factor⁻¹ · |operators| · pop_size`.
    pub heur_factor: R,
    /// Mean length of initial genotypes (geometric).
    pub exp_length_ini: R,
    /// Mean length of mutated, inserted and deleted runs (geometric).
    pub exp_mutation_count: R,
    /// Per-bit probability of a control qubit in control-set sampling.
    pub p_control: R,
    /// Gaussian σ for continuous angle mutation.
    pub d_alpha: R,
    /// Genotypes longer than this score `+∞` on every component.
    pub max_length: N,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            n_bit: 3,
            pop_size: 10,
            pop_size2: 100,
            n_gen: 100,
            select_bias: 2.0,
            heur_factor: 0.9,
            exp_length_ini: 30.0,
            exp_mutation_count: 4.0,
            p_control: 0.25,
            d_alpha: 0.1,
            max_length: 1000,
        }
    }
}

impl Config {
    /// Checks the internal consistency of the bag. Violations are logic
    /// errors and only assert in debug builds.
    pub(crate) fn check(&self) {
        debug_assert!(self.n_bit >= 1, "circuit width must be at least 1");
        debug_assert!(self.n_bit <= 9, "the text format addresses qubits 1-9");
        debug_assert!(self.pop_size >= 1 && self.pop_size2 >= self.pop_size);
        debug_assert!(self.select_bias > 0.);
        debug_assert!(self.heur_factor > 0.);
        debug_assert!(self.exp_length_ini >= 1.);
        debug_assert!(self.exp_mutation_count >= 1.);
        debug_assert!((0. ..1.).contains(&self.p_control));
        debug_assert!(self.d_alpha > 0.);
    }
}
