//! The NSGA-style population container.
//!
//! Members pair a candidate with a write-once memoized fitness, so a
//! candidate is scored exactly once no matter how many generations it
//! survives. The container provides non-dominated front extraction,
//! rank-biased selection, duplicate pruning and rayon-parallel batch
//! evaluation; the evolution driver consumes nothing else.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    OnceLock,
};

use rand::prelude::*;
use rayon::prelude::*;

use crate::{
    candidate::Candidate,
    config::Config,
    fitness::Fitness,
    math::{N, R},
    problem::Problem,
};

#[derive(Clone, Debug)]
pub struct Member {
    cand: Candidate,
    fitness: OnceLock<Fitness>,
}

impl Member {
    fn new(cand: Candidate) -> Self {
        Self {
            cand,
            fitness: OnceLock::new(),
        }
    }

    #[inline]
    pub fn candidate(&self) -> &Candidate {
        &self.cand
    }

    /// The memoized fitness. Reading it before the population has been
    /// evaluated is a logic error.
    #[inline]
    pub fn fitness(&self) -> &Fitness {
        self.fitness.get().expect("member not scored yet")
    }
}

#[derive(Clone, Default, Debug)]
pub struct Population {
    members: Vec<Member>,
    ranks: Vec<u32>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: N) -> Self {
        Self {
            members: Vec::with_capacity(cap),
            ranks: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> N {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn add(&mut self, cand: Candidate) {
        self.members.push(Member::new(cand));
        self.ranks.clear();
    }

    /// Re-inserts a member, keeping its memoized fitness.
    pub fn add_member(&mut self, member: Member) {
        self.members.push(member);
        self.ranks.clear();
    }

    /// Scores every not-yet-scored member, in parallel. Each fresh scoring
    /// bumps the process-wide candidate counter.
    pub fn evaluate<P: Problem>(&self, problem: &P, cfg: &Config, evaluated: &AtomicU64) {
        self.members.par_iter().for_each(|m| {
            if m.fitness.get().is_none() {
                let fit = problem.score(&m.cand, cfg);
                if m.fitness.set(fit).is_ok() {
                    evaluated.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    }

    /// Non-dominated sorting: assigns each member the index of its front.
    /// Requires the population to be evaluated.
    pub fn update_ranks(&mut self) {
        let n = self.members.len();
        let fits: Vec<&Fitness> = self.members.iter().map(Member::fitness).collect();
        let mut ranks = vec![u32::MAX; n];
        let mut assigned = 0;
        let mut level = 0;
        while assigned < n {
            let front: Vec<N> = (0..n)
                .filter(|&i| ranks[i] == u32::MAX)
                .filter(|&i| {
                    !(0..n)
                        .any(|j| j != i && ranks[j] == u32::MAX && fits[j].dominates(fits[i]))
                })
                .collect();
            for &i in &front {
                ranks[i] = level;
            }
            assigned += front.len();
            level += 1;
        }
        self.ranks = ranks;
    }

    fn ranked(&self) -> &[u32] {
        debug_assert_eq!(
            self.ranks.len(),
            self.members.len(),
            "ranks are stale; call update_ranks first"
        );
        &self.ranks
    }

    /// The current non-dominated front.
    pub fn front(&self) -> Vec<&Member> {
        let ranks = self.ranked();
        self.members
            .iter()
            .enumerate()
            .filter(|(i, _)| ranks[*i] == 0)
            .map(|(_, m)| m)
            .collect()
    }

    /// Rank-biased parent selection: a member of front `r` is drawn with
    /// weight `bias⁻ʳ`.
    pub fn nsga_select(&self, bias: R, rng: &mut dyn RngCore) -> &Member {
        let ranks = self.ranked();
        debug_assert!(!self.members.is_empty(), "selection from an empty population");
        let weights = ranks.iter().map(|&r| bias.powi(-(r as i32)));
        let dist = rand::distributions::WeightedIndex::new(weights)
            .expect("rank weights are positive");
        &self.members[dist.sample(rng)]
    }

    /// Up to `n` distinct members sampled uniformly from the front.
    pub fn front_sample(&self, n: N, rng: &mut dyn RngCore) -> Vec<&Member> {
        let front = self.front();
        if front.len() <= n {
            return front;
        }
        rand::seq::index::sample(rng, front.len(), n)
            .into_iter()
            .map(|i| front[i])
            .collect()
    }

    /// Removes Pareto-equivalent duplicates: of each group with exactly
    /// equal fitness only the first member survives.
    pub fn prune_duplicates(&mut self) {
        let mut kept: Vec<Fitness> = Vec::with_capacity(self.members.len());
        self.members.retain(|m| {
            let fit = m.fitness();
            if kept.iter().any(|k| k == fit) {
                false
            } else {
                kept.push(fit.clone());
                true
            }
        });
        self.ranks.clear();
    }

    /// The member minimizing the strict total order.
    pub fn best(&self) -> Option<&Member> {
        self.members
            .iter()
            .min_by(|a, b| a.fitness().lex_cmp(b.fitness()))
    }
}
