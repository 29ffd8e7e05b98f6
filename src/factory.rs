//! Candidate variation: the genetic operators and their adaptive weighting.
//!
//! Every operator draws its parent(s) from the population by rank-biased
//! NSGA selection and returns a freshly canonicalized candidate, stamped
//! with the operator index that produced it. An operator that would return
//! an identical genotype hands back the parent verbatim instead.

use rand::prelude::*;
use rand_distr::Geometric;

use crate::{
    candidate::Candidate,
    config::Config,
    gates::GateSet,
    gene::Gene,
    math::{N, R},
    population::Population,
};

/// The roster of variation operators.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenOp {
    AlterDiscrete,
    AlterContinuous,
    SwapQubits,
    AddSlice,
    AddPairs,
    MutateAddPair,
    DeleteSlice,
    DeleteUniform,
    ReplaceSlice,
    SplitSwap,
    ReverseSlice,
    PermuteSlice,
    SwapTwo,
    RepeatSlice,
    CrossoverUniform,
    Concat3,
    Simplify,
}

impl GenOp {
    pub const ALL: [GenOp; 17] = [
        GenOp::AlterDiscrete,
        GenOp::AlterContinuous,
        GenOp::SwapQubits,
        GenOp::AddSlice,
        GenOp::AddPairs,
        GenOp::MutateAddPair,
        GenOp::DeleteSlice,
        GenOp::DeleteUniform,
        GenOp::ReplaceSlice,
        GenOp::SplitSwap,
        GenOp::ReverseSlice,
        GenOp::PermuteSlice,
        GenOp::SwapTwo,
        GenOp::RepeatSlice,
        GenOp::CrossoverUniform,
        GenOp::Concat3,
        GenOp::Simplify,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GenOp::AlterDiscrete => "MDiscrete",
            GenOp::AlterContinuous => "MutSingle",
            GenOp::SwapQubits => "SwapQubits",
            GenOp::AddSlice => "AddSlice",
            GenOp::AddPairs => "AddPairs",
            GenOp::MutateAddPair => "MutAddPair",
            GenOp::DeleteSlice => "DelShort",
            GenOp::DeleteUniform => "DelUnif",
            GenOp::ReplaceSlice => "ReplSlice",
            GenOp::SplitSwap => "SpltSwp",
            GenOp::ReverseSlice => "InvSlice",
            GenOp::PermuteSlice => "PermSlice",
            GenOp::SwapTwo => "SwapTwo",
            GenOp::RepeatSlice => "ReptSlice",
            GenOp::CrossoverUniform => "C/Over",
            GenOp::Concat3 => "Concat3",
            GenOp::Simplify => "Simplify",
        }
    }
}

/// Tracks the adaptive weight of every operator and samples them
/// weight-proportionally. A front hit bumps the producer's weight by one;
/// the per-generation normalization keeps the weight sum at
/// `heur_factor⁻¹ · |operators| · pop_size`, so older generations matter
/// less and less in the choice of operator.
#[derive(Clone, Debug)]
pub struct OpTracker {
    weights: Vec<R>,
    dist: rand::distributions::WeightedIndex<R>,
}

impl OpTracker {
    pub fn new(cfg: &Config) -> Self {
        let mut tracker = Self {
            weights: vec![1.; GenOp::ALL.len()],
            dist: rand::distributions::WeightedIndex::new(vec![1.; GenOp::ALL.len()])
                .expect("initial weights are positive"),
        };
        tracker.normalize(cfg);
        tracker
    }

    /// Samples an operator according to the weight snapshot taken at the
    /// last normalization.
    pub fn select(&self, rng: &mut dyn RngCore) -> (GenOp, N) {
        let ix = self.dist.sample(rng);
        (GenOp::ALL[ix], ix)
    }

    /// Credits the operator that produced a front member.
    pub fn hit(&mut self, origin: Option<N>) {
        if let Some(ix) = origin {
            self.weights[ix] += 1.;
        }
    }

    /// Rescales the weight sum and refreshes the sampling snapshot.
    pub fn normalize(&mut self, cfg: &Config) {
        let total: R = self.weights.iter().sum();
        let factor = 1. / cfg.heur_factor * (GenOp::ALL.len() * cfg.pop_size) as R / total;
        for w in &mut self.weights {
            *w *= factor;
        }
        self.dist = rand::distributions::WeightedIndex::new(self.weights.iter().copied())
            .expect("normalized weights are positive");
    }

    pub fn weights(&self) -> &[R] {
        &self.weights
    }

    /// Name-aligned relative weight table for end-of-run reporting.
    pub fn dump(&self) -> String {
        let total: R = self.weights.iter().sum();
        let width = GenOp::ALL
            .iter()
            .map(|op| op.name().len())
            .max()
            .unwrap_or(0);
        GenOp::ALL
            .iter()
            .zip(&self.weights)
            .map(|(op, w)| {
                format!(
                    "{:<width$} {:.4}\n",
                    format!("{}:", op.name()),
                    w / total,
                    width = width + 3
                )
            })
            .collect()
    }
}

/// Produces new candidates from a population snapshot.
pub struct CandidateFactory<'a> {
    pop: &'a Population,
    set: &'a GateSet,
    cfg: &'a Config,
}

impl<'a> CandidateFactory<'a> {
    pub fn new(pop: &'a Population, set: &'a GateSet, cfg: &'a Config) -> Self {
        Self { pop, set, cfg }
    }

    /// A random initial candidate of geometric mean length
    /// `exp_length_ini`.
    pub fn initial(set: &GateSet, cfg: &Config, rng: &mut dyn RngCore) -> Candidate {
        let prob_term = 1. / cfg.exp_length_ini;
        let mut gt = Vec::with_capacity(cfg.exp_length_ini as N);
        loop {
            gt.push(Gene::random(set, cfg, rng));
            if rng.gen::<R>() <= prob_term {
                break;
            }
        }
        Candidate::new(gt)
    }

    /// Samples an operator from the tracker, applies it, and stamps the
    /// child with the operator index.
    pub fn get_new(&self, tracker: &OpTracker, rng: &mut dyn RngCore) -> Candidate {
        let (op, ix) = tracker.select(rng);
        let mut child = self.apply_op(op, rng);
        child.set_origin(ix);
        child
    }

    pub fn apply_op(&self, op: GenOp, rng: &mut dyn RngCore) -> Candidate {
        match op {
            GenOp::AlterDiscrete => self.alter_discrete(rng),
            GenOp::AlterContinuous => self.alter_continuous(rng),
            GenOp::SwapQubits => self.swap_qubits(rng),
            GenOp::AddSlice => self.add_slice(rng),
            GenOp::AddPairs => self.add_pairs(rng),
            GenOp::MutateAddPair => self.mutate_add_pair(rng),
            GenOp::DeleteSlice => self.delete_slice(rng),
            GenOp::DeleteUniform => self.delete_uniform(rng),
            GenOp::ReplaceSlice => self.replace_slice(rng),
            GenOp::SplitSwap => self.split_swap(rng),
            GenOp::ReverseSlice => self.reverse_slice(rng),
            GenOp::PermuteSlice => self.permute_slice(rng),
            GenOp::SwapTwo => self.swap_two(rng),
            GenOp::RepeatSlice => self.repeat_slice(rng),
            GenOp::CrossoverUniform => self.crossover_uniform(rng),
            GenOp::Concat3 => self.concat3(rng),
            GenOp::Simplify => self.simplify(rng),
        }
    }

    fn parent(&self, rng: &mut dyn RngCore) -> &'a Candidate {
        self.pop.nsga_select(self.cfg.select_bias, rng).candidate()
    }

    /// Geometric run length with mean `exp_mutation_count`, at least
    /// `floor` long.
    fn geom_len(&self, floor: N, rng: &mut dyn RngCore) -> N {
        let p = (1. / self.cfg.exp_mutation_count).min(1.);
        let geom = Geometric::new(p).expect("geometric parameter in (0, 1]");
        floor + geom.sample(rng) as N
    }

    /// A fresh random run, geometric with mean `exp_mutation_count`.
    fn random_run(&self, rng: &mut dyn RngCore) -> Vec<Gene> {
        let prob_term = 1. / self.cfg.exp_mutation_count;
        let mut ins = Vec::with_capacity(2 * self.cfg.exp_mutation_count as N);
        loop {
            ins.push(Gene::random(self.set, self.cfg, rng));
            if rng.gen::<R>() <= prob_term {
                break;
            }
        }
        ins
    }

    fn inverted_reversed(run: &[Gene]) -> Vec<Gene> {
        let mut inv: Vec<Gene> = run.to_vec();
        for g in &mut inv {
            g.invert();
        }
        inv.reverse();
        inv
    }

    /// Replaces randomly chosen genes by fresh random ones; the number of
    /// touched positions is geometric with mean `exp_mutation_count`.
    fn alter_discrete(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        if gt.is_empty() {
            return parent.clone();
        }
        let mut new_gt = gt.to_vec();
        let prob_term = 1. / self.cfg.exp_mutation_count;
        loop {
            let pos = rng.gen_range(0..gt.len());
            new_gt[pos] = Gene::random(self.set, self.cfg, rng);
            if rng.gen::<R>() <= prob_term {
                break;
            }
        }
        Candidate::new(new_gt)
    }

    /// Calls `mutate()` on one or more randomly chosen genes.
    fn alter_continuous(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        if gt.is_empty() {
            return parent.clone();
        }
        let mut new_gt = gt.to_vec();
        let prob_term = 1. / self.cfg.exp_mutation_count;
        loop {
            let pos = rng.gen_range(0..gt.len());
            new_gt[pos].mutate(self.cfg, rng);
            if rng.gen::<R>() <= prob_term {
                break;
            }
        }
        if new_gt.iter().zip(gt).any(|(a, b)| a != b) {
            Candidate::new(new_gt)
        } else {
            parent.clone()
        }
    }

    /// Relabels two random qubits within a contiguous slice.
    fn swap_qubits(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz == 0 || self.cfg.n_bit < 2 {
            return parent.clone();
        }
        let pos1 = rng.gen_range(0..sz);
        let pos2 = (pos1 + self.geom_len(1, rng)).min(sz);
        let s1 = rng.gen_range(0..self.cfg.n_bit - 1);
        let s2 = rng.gen_range(0..self.cfg.n_bit - 1);
        let s2 = s2 + (s2 >= s1) as N;
        let mut new_gt = gt.to_vec();
        for g in &mut new_gt[pos1..pos2] {
            g.swap_qubits(s1, s2);
        }
        Candidate::new(new_gt)
    }

    /// Inserts a fresh random run at a uniform position.
    fn add_slice(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let pos = rng.gen_range(0..=gt.len());
        let ins = self.random_run(rng);
        let mut new_gt = Vec::with_capacity(gt.len() + ins.len());
        new_gt.extend_from_slice(&gt[..pos]);
        new_gt.extend(ins);
        new_gt.extend_from_slice(&gt[pos..]);
        Candidate::new(new_gt)
    }

    /// Inserts a random run and its inverted-reversed image around a
    /// section of the parent; the pair is algebraically identity around
    /// whatever sits between the insertion points.
    fn add_pairs(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let mut pos1 = rng.gen_range(0..=gt.len());
        let mut pos2 = rng.gen_range(0..=gt.len());
        if pos2 < pos1 {
            std::mem::swap(&mut pos1, &mut pos2);
        }
        let ins = self.random_run(rng);
        let mut new_gt = Vec::with_capacity(gt.len() + 2 * ins.len());
        new_gt.extend_from_slice(&gt[..pos1]);
        new_gt.extend_from_slice(&ins);
        new_gt.extend_from_slice(&gt[pos1..pos2]);
        new_gt.extend(Self::inverted_reversed(&ins));
        new_gt.extend_from_slice(&gt[pos2..]);
        Candidate::new(new_gt)
    }

    /// Replaces one gene by `[fresh, mutated old, fresh⁻¹]`: a shift with a
    /// guard.
    fn mutate_add_pair(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        if gt.is_empty() {
            return parent.clone();
        }
        let pos = rng.gen_range(0..gt.len());
        let mut old = gt[pos].clone();
        old.mutate(self.cfg, rng);
        let fresh = Gene::random(self.set, self.cfg, rng);
        let mut guard = fresh.clone();
        guard.invert();
        let mut new_gt = Vec::with_capacity(gt.len() + 2);
        new_gt.extend_from_slice(&gt[..pos]);
        new_gt.push(fresh);
        new_gt.push(old);
        new_gt.push(guard);
        new_gt.extend_from_slice(&gt[pos + 1..]);
        Candidate::new(new_gt)
    }

    /// Deletes a geometric-length contiguous slice.
    fn delete_slice(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz == 0 {
            return parent.clone();
        }
        let pos1 = rng.gen_range(0..sz);
        let pos2 = (pos1 + self.geom_len(1, rng)).min(sz);
        let mut new_gt = Vec::with_capacity(sz - (pos2 - pos1));
        new_gt.extend_from_slice(&gt[..pos1]);
        new_gt.extend_from_slice(&gt[pos2..]);
        Candidate::new(new_gt)
    }

    /// Deletes each gene independently with probability
    /// `exp_mutation_count / |genotype|`.
    fn delete_uniform(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz == 0 {
            return parent.clone();
        }
        let prob = self.cfg.exp_mutation_count / sz as R;
        let mut new_gt = Vec::with_capacity(sz);
        let mut deleted = 0;
        for g in gt {
            if rng.gen::<R>() >= prob {
                new_gt.push(g.clone());
            } else {
                deleted += 1;
            }
        }
        if deleted > 0 {
            Candidate::new(new_gt)
        } else {
            parent.clone()
        }
    }

    /// Deletes a slice and inserts a fresh run in its place.
    fn replace_slice(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz == 0 {
            return parent.clone();
        }
        let pos1 = rng.gen_range(0..sz);
        let pos2 = (pos1 + self.geom_len(1, rng)).min(sz);
        let ins = self.random_run(rng);
        let mut new_gt = Vec::with_capacity(sz - (pos2 - pos1) + ins.len());
        new_gt.extend_from_slice(&gt[..pos1]);
        new_gt.extend(ins);
        new_gt.extend_from_slice(&gt[pos2..]);
        Candidate::new(new_gt)
    }

    /// Length-preserving 4-way permutation around four strictly separated
    /// split points.
    fn split_swap(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz < 2 {
            return parent.clone();
        }
        let mut pos = [0; 4];
        for p in &mut pos {
            *p = rng.gen_range(0..=sz - 2);
        }
        pos.sort_unstable();
        pos[1] += 1;
        pos[2] += 1;
        pos[3] += 2;
        let mut new_gt = Vec::with_capacity(sz);
        new_gt.extend_from_slice(&gt[..pos[0]]);
        new_gt.extend_from_slice(&gt[pos[2]..pos[3]]);
        new_gt.extend_from_slice(&gt[pos[1]..pos[2]]);
        new_gt.extend_from_slice(&gt[pos[0]..pos[1]]);
        new_gt.extend_from_slice(&gt[pos[3]..]);
        Candidate::new(new_gt)
    }

    /// Reverses a slice of length ≥ 2 and inverts every gene in it, so the
    /// reversed sub-circuit computes the inverse of the original.
    fn reverse_slice(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz < 2 {
            return parent.clone();
        }
        let mut pos1 = rng.gen_range(0..=sz - 2);
        let mut pos2 = rng.gen_range(0..=sz - 2);
        if pos2 < pos1 {
            std::mem::swap(&mut pos1, &mut pos2);
        }
        pos2 += 2;
        let mut new_gt = Vec::with_capacity(sz);
        new_gt.extend_from_slice(&gt[..pos1]);
        new_gt.extend(Self::inverted_reversed(&gt[pos1..pos2]));
        new_gt.extend_from_slice(&gt[pos2..]);
        Candidate::new(new_gt)
    }

    /// Shuffles a geometric-length slice in place.
    fn permute_slice(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz < 2 {
            return parent.clone();
        }
        let pos1 = rng.gen_range(0..=sz - 2);
        let pos2 = (pos1 + self.geom_len(2, rng)).min(sz);
        let mut new_gt = gt.to_vec();
        new_gt[pos1..pos2].shuffle(rng);
        Candidate::new(new_gt)
    }

    /// Swaps two genes a geometric distance apart.
    fn swap_two(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz < 2 {
            return parent.clone();
        }
        let pos1 = rng.gen_range(0..=sz - 2);
        let pos2 = (pos1 + self.geom_len(1, rng)).min(sz - 1);
        let mut new_gt = gt.to_vec();
        new_gt.swap(pos1, pos2);
        Candidate::new(new_gt)
    }

    /// Duplicates a contiguous slice in place.
    fn repeat_slice(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        let sz = gt.len();
        if sz < 2 {
            return parent.clone();
        }
        let mut pos1 = rng.gen_range(0..sz);
        let mut pos2 = rng.gen_range(0..sz);
        if pos2 < pos1 {
            std::mem::swap(&mut pos1, &mut pos2);
        }
        pos2 += 1;
        let mut new_gt = Vec::with_capacity(sz + pos2 - pos1);
        new_gt.extend_from_slice(&gt[..pos2]);
        new_gt.extend_from_slice(&gt[pos1..pos2]);
        new_gt.extend_from_slice(&gt[pos2..]);
        Candidate::new(new_gt)
    }

    /// Takes alternating geometric-length runs from two parents;
    /// `exp_mutation_count` controls both the take and the skip lengths.
    fn crossover_uniform(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent1 = self.parent(rng);
        let parent2 = self.parent(rng);
        let mut gt_take = parent1.genotype();
        let mut gt_skip = parent2.genotype();
        let mut pos_take = 0;
        let mut pos_skip = 0;
        let p_take = (self.cfg.exp_mutation_count / gt_take.len().max(1) as R).min(1.);
        let p_skip = (self.cfg.exp_mutation_count / gt_skip.len().max(1) as R).min(1.);
        let mut geo_take = Geometric::new(p_take).expect("geometric parameter in (0, 1]");
        let mut geo_skip = Geometric::new(p_skip).expect("geometric parameter in (0, 1]");
        let mut new_gt = Vec::with_capacity(gt_take.len().max(gt_skip.len()));
        loop {
            let upto = pos_take + geo_take.sample(rng) as N + 1;
            if upto >= gt_take.len() {
                break;
            }
            pos_skip += geo_skip.sample(rng) as N + 1;
            if pos_skip >= gt_skip.len() {
                break;
            }
            new_gt.extend_from_slice(&gt_take[pos_take..upto]);
            pos_take = upto;
            std::mem::swap(&mut gt_take, &mut gt_skip);
            std::mem::swap(&mut pos_take, &mut pos_skip);
            std::mem::swap(&mut geo_take, &mut geo_skip);
        }
        // Ran out of one parent: flush whatever is left of the current one.
        new_gt.extend_from_slice(&gt_take[pos_take..]);
        Candidate::new(new_gt)
    }

    /// `parent1 ++ reversed-inverted(parent2) ++ parent3`.
    fn concat3(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent1 = self.parent(rng);
        let parent2 = self.parent(rng);
        let parent3 = self.parent(rng);
        let (gt1, gt2, gt3) = (
            parent1.genotype(),
            parent2.genotype(),
            parent3.genotype(),
        );
        let mut new_gt = Vec::with_capacity(gt1.len() + gt2.len() + gt3.len());
        new_gt.extend_from_slice(gt1);
        new_gt.extend(Self::inverted_reversed(gt2));
        new_gt.extend_from_slice(gt3);
        Candidate::new(new_gt)
    }

    /// Snaps every continuous parameter to a rational multiple of π.
    fn simplify(&self, rng: &mut dyn RngCore) -> Candidate {
        let parent = self.parent(rng);
        let gt = parent.genotype();
        if gt.is_empty() {
            return parent.clone();
        }
        let mut new_gt = gt.to_vec();
        for g in &mut new_gt {
            g.simplify(rng);
        }
        if new_gt.iter().zip(gt).any(|(a, b)| a != b) {
            Candidate::new(new_gt)
        } else {
            parent.clone()
        }
    }
}
