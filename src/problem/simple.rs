use crate::{
    backend::{Gate as Matrix, State},
    candidate::Candidate,
    config::Config,
    fitness::trim_error,
    gates::{Context, ControlPolicy, FixedDef, GateSet, VariantSpec},
    math::{Mask, R},
    problem::Problem,
};

/// The fixed set the preparation problem searches over: Hadamard and the
/// π/8 pair, with controls of any arity.
const REDUCED_SET: [FixedDef; 4] = [
    FixedDef { name: "I", mat: Matrix::I, inv: 0, sq: 0 },
    FixedDef { name: "H", mat: Matrix::H, inv: 0, sq: -1 },
    FixedDef { name: "T", mat: Matrix::T, inv: 1, sq: 0 },
    FixedDef { name: "Ti", mat: Matrix::T_DGR, inv: -1, sq: 0 },
];

/// Target-state preparation: drive `|0…0⟩` onto a chosen basis state.
/// Components: (error, total number of control qubits).
pub struct StatePrep {
    set: GateSet,
    target: Mask,
}

impl StatePrep {
    pub fn new(cfg: &Config, target: Mask) -> Self {
        debug_assert!(target < 1 << cfg.n_bit);
        Self {
            set: GateSet::new(vec![VariantSpec::Fixed {
                table: &REDUCED_SET,
                policy: ControlPolicy::Any,
            }]),
            target,
        }
    }

    pub fn target(&self) -> Mask {
        self.target
    }
}

impl Problem for StatePrep {
    fn gate_set(&self) -> &GateSet {
        &self.set
    }

    fn fitness_main(&self, cand: &Candidate, cfg: &Config) -> Vec<R> {
        if cand.len() > cfg.max_length {
            return vec![R::INFINITY, R::INFINITY];
        }
        let out = State::basis(cfg.n_bit, self.target);
        let psi = cand.simulate(State::basis(cfg.n_bit, 0), &Context::default());
        vec![
            trim_error(1. - State::overlap(&out, &psi).norm()),
            cand.controls() as R,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_one_minus_target_overlap() {
        let cfg = Config::default();
        let empty = Candidate::new(vec![]);
        let main = StatePrep::new(&cfg, 0).fitness_main(&empty, &cfg);
        assert_eq!(main[0], 0.);
        let main = StatePrep::new(&cfg, 0b001).fitness_main(&empty, &cfg);
        assert!(main[0] > 0.9);
    }

    #[test]
    fn flip_chain_prepares_the_flipped_state() {
        // H·(T⁴)·H = H Z H = X on qubit 1, written with the squares the
        // reduced table does not collapse.
        let cfg = Config::default();
        let problem = StatePrep::new(&cfg, 0b001);
        let cand =
            Candidate::parse("H1 T1 T1 T1 T1 H1", problem.gate_set(), 3).unwrap();
        let main = problem.fitness_main(&cand, &cfg);
        assert_eq!(main[0], 0.);
    }

    #[test]
    fn controls_are_the_second_component() {
        let cfg = Config::default();
        let problem = StatePrep::new(&cfg, 0b011);
        let cand = Candidate::parse("H1[2] H2", problem.gate_set(), 3).unwrap();
        let main = problem.fitness_main(&cand, &cfg);
        assert_eq!(main[1], 1.);
    }

    #[test]
    fn oversize_scores_infinite() {
        let cfg = Config {
            max_length: 2,
            ..Config::default()
        };
        let problem = StatePrep::new(&cfg, 0b011);
        let cand = Candidate::parse("H1 H2 H3", problem.gate_set(), 3).unwrap();
        let main = problem.fitness_main(&cand, &cfg);
        assert!(main.iter().all(|c| c.is_infinite()));
    }
}
