//! The generational loop driving the search.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use rand::RngCore;

use crate::{
    config::Config,
    factory::{CandidateFactory, OpTracker},
    population::Population,
    problem::Problem,
};

/// One evolution run: the configuration, the problem, the adaptive
/// operator tracker and the candidate counter, bundled so several
/// evolutions can run in one process without sharing state.
pub struct Evolution<P: Problem> {
    cfg: Config,
    problem: P,
    tracker: OpTracker,
    evaluated: AtomicU64,
    cancel: Arc<AtomicBool>,
}

impl<P: Problem> Evolution<P> {
    pub fn new(problem: P, cfg: Config) -> Self {
        cfg.check();
        let tracker = OpTracker::new(&cfg);
        Self {
            cfg,
            problem,
            tracker,
            evaluated: AtomicU64::new(0),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn tracker(&self) -> &OpTracker {
        &self.tracker
    }

    /// Total number of fitness evaluations so far.
    pub fn total_evaluated(&self) -> u64 {
        self.evaluated.load(Ordering::Relaxed)
    }

    /// A handle that stops the run between generations when set; the run
    /// then returns the current population gracefully.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs the full generational loop and returns the final population,
    /// evaluated and ranked.
    pub fn run(&mut self, rng: &mut dyn RngCore) -> Population {
        let mut pop = Population::with_capacity(self.cfg.pop_size);
        for _ in 0..self.cfg.pop_size {
            pop.add(CandidateFactory::initial(
                self.problem.gate_set(),
                &self.cfg,
                rng,
            ));
        }
        pop.evaluate(&self.problem, &self.cfg, &self.evaluated);
        pop.update_ranks();

        for gen in 0..self.cfg.n_gen {
            if self.cancel.load(Ordering::Relaxed) {
                tracing::info!(gen, "evolution cancelled");
                break;
            }
            pop = self.step(pop, gen as u64, rng);
        }
        pop
    }

    /// One generation: breed children from the NSGA-selected parents,
    /// carry the previous front over, evaluate, credit the operators that
    /// produced front members, prune Pareto-equivalent duplicates and
    /// refresh the operator weights.
    pub fn step(&mut self, pop: Population, gen: u64, rng: &mut dyn RngCore) -> Population {
        let nondom: Vec<_> = pop.front().into_iter().cloned().collect();
        let mut next = Population::with_capacity(self.cfg.pop_size2);
        {
            let factory = CandidateFactory::new(&pop, self.problem.gate_set(), &self.cfg);
            for _ in 0..self.cfg.pop_size2.saturating_sub(nondom.len()) {
                let mut child = factory.get_new(&self.tracker, rng);
                child.set_generation(gen);
                next.add(child);
            }
        }
        for member in nondom {
            next.add_member(member);
        }
        next.evaluate(&self.problem, &self.cfg, &self.evaluated);
        next.update_ranks();

        for origin in next
            .front_sample(self.cfg.pop_size, rng)
            .iter()
            .map(|m| m.candidate().origin())
            .collect::<Vec<_>>()
        {
            self.tracker.hit(origin);
        }
        next.prune_duplicates();
        next.update_ranks();
        // Older generations matter less in the choice of operator.
        self.tracker.normalize(&self.cfg);

        if let Some(best) = next.best() {
            tracing::debug!(
                gen,
                front = next.front().len(),
                size = next.len(),
                best = %best.fitness(),
                "generation complete"
            );
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::problem::StatePrep;

    fn small_cfg() -> Config {
        Config {
            n_gen: 5,
            pop_size: 6,
            pop_size2: 20,
            exp_length_ini: 8.,
            ..Config::default()
        }
    }

    #[test]
    fn run_returns_an_evaluated_ranked_population() {
        let cfg = small_cfg();
        let mut evo = Evolution::new(StatePrep::new(&cfg, 0b011), cfg);
        let mut rng = StdRng::seed_from_u64(1);
        let pop = evo.run(&mut rng);
        assert!(!pop.is_empty());
        assert!(!pop.front().is_empty());
        assert!(evo.total_evaluated() > 0);
    }

    #[test]
    fn duplicate_fitnesses_do_not_survive_a_generation() {
        let cfg = small_cfg();
        let mut evo = Evolution::new(StatePrep::new(&cfg, 0b011), cfg);
        let mut rng = StdRng::seed_from_u64(2);
        let pop = evo.run(&mut rng);
        for (i, a) in pop.members().iter().enumerate() {
            for b in &pop.members()[i + 1..] {
                assert!(a.fitness() != b.fitness());
            }
        }
    }

    #[test]
    fn cancellation_stops_between_generations() {
        let cfg = Config {
            n_gen: 100_000,
            ..small_cfg()
        };
        let mut evo = Evolution::new(StatePrep::new(&cfg, 0b011), cfg);
        evo.cancel_flag().store(true, Ordering::Relaxed);
        let mut rng = StdRng::seed_from_u64(3);
        let pop = evo.run(&mut rng);
        // The initial population comes back untouched.
        assert_eq!(pop.len(), evo.config().pop_size);
    }

    #[test]
    fn children_are_stamped_with_their_generation() {
        let cfg = small_cfg();
        let mut evo = Evolution::new(StatePrep::new(&cfg, 0b011), cfg);
        let mut rng = StdRng::seed_from_u64(4);
        let pop = evo.run(&mut rng);
        assert!(pop
            .members()
            .iter()
            .any(|m| m.candidate().generation().is_some()));
    }
}
