use std::{fmt, sync::Arc};

use rand::RngCore;

use crate::{
    config::Config,
    fitness::Counter,
    gates::{Context, Gate, GateOp, GateSet},
    math::N,
};

/// A shared, immutable handle to a gate value.
///
/// Cloning a gene shares the underlying gate; the in-place operations below
/// swap the handle for a freshly allocated gate only when the operation
/// actually changes the value. Equality is therefore *pointer identity*: it
/// is the "unchanged" test the candidate factory uses to detect no-op
/// mutations, and structurally distinct instances compare as distinct even
/// when parameter-equal.
#[derive(Clone, Debug)]
pub struct Gene(Arc<Gate>);

impl Gene {
    pub fn new(gate: Gate) -> Self {
        Self(Arc::new(gate))
    }

    /// Uniformly picks a variant from the problem's enabled set and
    /// delegates to that variant's random constructor.
    pub fn random(set: &GateSet, cfg: &Config, rng: &mut dyn RngCore) -> Self {
        Self::new(set.random_gate(cfg, rng))
    }

    #[inline]
    pub fn gate(&self) -> &Gate {
        &self.0
    }

    pub fn is_trivial(&self) -> bool {
        self.0.is_trivial()
    }

    pub fn controls(&self) -> N {
        self.0.controls()
    }

    pub fn same_type(&self, other: &Gene) -> bool {
        self.0.same_type(&other.0)
    }

    pub fn invert(&mut self) {
        if let Some(gate) = self.0.inverted() {
            *self = Self::new(gate);
        }
    }

    pub fn mutate(&mut self, cfg: &Config, rng: &mut dyn RngCore) {
        if let Some(gate) = self.0.mutated(cfg, rng) {
            *self = Self::new(gate);
        }
    }

    pub fn simplify(&mut self, rng: &mut dyn RngCore) {
        if let Some(gate) = self.0.simplified(rng) {
            *self = Self::new(gate);
        }
    }

    pub fn swap_qubits(&mut self, s1: N, s2: N) {
        if let Some(gate) = self.0.qubits_swapped(s1, s2) {
            *self = Self::new(gate);
        }
    }

    /// Attempts to absorb `other` (the later gate) into `self`. Returns
    /// `true` when a merge or a trivial-gate elision happened; on merge,
    /// `self` becomes the combined gate.
    pub fn merge(&mut self, other: &Gene) -> bool {
        if self.0.is_trivial() {
            // self = identity: consume it and take the other
            *self = other.clone();
            return true;
        }
        if other.0.is_trivial() {
            // other = identity: consumed as-is
            return true;
        }
        match self.0.merge(&other.0) {
            Some(gate) => {
                *self = Self::new(gate);
                true
            }
            None => false,
        }
    }

    pub fn apply(&self, psi: &crate::backend::State, ctx: &Context) -> crate::backend::State {
        self.0.apply(psi, ctx)
    }

    /// Bumps the per-variant counter.
    pub fn hit(&self, counter: &mut Counter) {
        counter.hit(self.0.tag());
    }
}

/// Pointer identity, not structural equality.
impl PartialEq for Gene {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.gate(), f)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::gates::{ControlPolicy, VariantSpec, GATES_FIXED, ROT_XYZ};

    fn full_set() -> GateSet {
        GateSet::new(vec![
            VariantSpec::Fixed {
                table: &GATES_FIXED,
                policy: ControlPolicy::Any,
            },
            VariantSpec::Rot {
                families: &ROT_XYZ,
                policy: ControlPolicy::None,
            },
            VariantSpec::CPhase {
                policy: ControlPolicy::Any,
            },
            VariantSpec::Su2 {
                policy: ControlPolicy::None,
            },
            VariantSpec::Swap,
            VariantSpec::CNot {
                policy: ControlPolicy::One,
            },
        ])
    }

    #[test]
    fn clones_share_identity() {
        let mut rng = StdRng::seed_from_u64(5);
        let cfg = Config::default();
        let g = Gene::random(&full_set(), &cfg, &mut rng);
        let h = g.clone();
        assert_eq!(g, h);
    }

    #[test]
    fn mutation_rewrites_the_handle() {
        let mut rng = StdRng::seed_from_u64(5);
        let cfg = Config::default();
        let set = full_set();
        for _ in 0..20 {
            let g = Gene::random(&set, &cfg, &mut rng);
            let mut m = g.clone();
            m.mutate(&cfg, &mut rng);
            assert_ne!(g, m, "mutation of {} kept the handle", g);
        }
    }

    #[test]
    fn trivial_partner_is_consumed() {
        let mut rng = StdRng::seed_from_u64(5);
        let cfg = Config::default();
        let set = full_set();
        let id = Gene::new(crate::gates::Swap::identity().into());
        let g = Gene::random(&set, &cfg, &mut rng);
        let mut lhs = g.clone();
        assert!(lhs.merge(&id));
        assert_eq!(lhs, g);
        let mut lhs = id.clone();
        assert!(lhs.merge(&g));
        assert_eq!(lhs, g);
    }
}
