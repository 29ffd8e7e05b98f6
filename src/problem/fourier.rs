use crate::{
    backend::State,
    candidate::Candidate,
    config::Config,
    fitness::trim_error,
    gates::{Context, ControlPolicy, GateSet, VariantSpec, ROT_Y},
    math::{C_ZERO, N, R},
    problem::Problem,
};

/// Quantum Fourier transform synthesis over {Y-rot, CPhase, SWAP}.
/// Components: (phase-sensitive average overlap error, genotype length).
pub struct Fourier {
    set: GateSet,
}

impl Fourier {
    pub fn new() -> Self {
        Self {
            set: GateSet::new(vec![
                VariantSpec::Rot {
                    families: &ROT_Y,
                    policy: ControlPolicy::None,
                },
                VariantSpec::CPhase {
                    policy: ControlPolicy::Any,
                },
                VariantSpec::Swap,
            ]),
        }
    }
}

impl Default for Fourier {
    fn default() -> Self {
        Self::new()
    }
}

impl Problem for Fourier {
    fn gate_set(&self) -> &GateSet {
        &self.set
    }

    fn fitness_main(&self, cand: &Candidate, cfg: &Config) -> Vec<R> {
        if cand.len() > cfg.max_length {
            return vec![R::INFINITY, R::INFINITY];
        }
        let dim: N = 1 << cfg.n_bit;
        let ctx = Context::default();
        let mut overlap_total = C_ZERO;
        for i in 0..dim {
            let psi = State::basis(cfg.n_bit, i);
            let out = psi.fourier();
            overlap_total += State::overlap(&out, &cand.simulate(psi, &ctx));
        }
        let error_avg = (1. - (overlap_total / dim as R).norm()).max(0.);
        vec![trim_error(error_avg), cand.len() as R]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_circuit_misses_the_transform() {
        let cfg = Config::default();
        let problem = Fourier::new();
        let main = problem.fitness_main(&Candidate::new(vec![]), &cfg);
        assert!(main[0] > 0.5);
        assert_eq!(main[1], 0.);
    }

    #[test]
    fn length_is_the_second_component() {
        let cfg = Config::default();
        let problem = Fourier::new();
        let cand = Candidate::parse("Y1(0.5π) SWAP13 P12(0.5π)", problem.gate_set(), 3).unwrap();
        let main = problem.fitness_main(&cand, &cfg);
        assert_eq!(main[1], 3.);
    }

    #[test]
    fn oversize_scores_infinite() {
        let cfg = Config {
            max_length: 1,
            ..Config::default()
        };
        let problem = Fourier::new();
        let cand = Candidate::parse("Y1(0.5π) SWAP13", problem.gate_set(), 3).unwrap();
        assert!(problem
            .fitness_main(&cand, &cfg)
            .iter()
            .all(|c| c.is_infinite()));
    }
}
