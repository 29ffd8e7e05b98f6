use crate::{
    backend::State,
    candidate::Candidate,
    config::Config,
    fitness::trim_error,
    gates::{Context, ControlPolicy, GateSet, VariantSpec, ROT_X},
    math::{N, R},
    problem::Problem,
};

/// Grover-style oracle search over {Oracle, X-rot, CPhase}: the circuit
/// must map `|0…0⟩` onto the marked basis state for every possible mark.
/// Components: (average error, maximum error) across all marks.
pub struct Search {
    set: GateSet,
}

impl Search {
    pub fn new() -> Self {
        Self {
            set: GateSet::new(vec![
                VariantSpec::Oracle,
                VariantSpec::Rot {
                    families: &ROT_X,
                    policy: ControlPolicy::None,
                },
                VariantSpec::CPhase {
                    policy: ControlPolicy::Any,
                },
            ]),
        }
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Problem for Search {
    fn gate_set(&self) -> &GateSet {
        &self.set
    }

    fn fitness_main(&self, cand: &Candidate, cfg: &Config) -> Vec<R> {
        if cand.len() > cfg.max_length {
            return vec![R::INFINITY, R::INFINITY];
        }
        let dim: N = 1 << cfg.n_bit;
        let mut err_total = 0.;
        let mut err_max: R = 0.;
        for mark in 0..dim {
            let out = State::basis(cfg.n_bit, mark);
            let psi = cand.simulate(State::basis(cfg.n_bit, 0), &Context { mark });
            let error = (1. - State::overlap(&out, &psi).norm().powi(2)).max(0.);
            err_total += error;
            err_max = err_max.max(error);
        }
        vec![trim_error(err_total / dim as R), trim_error(err_max)]
    }
}
