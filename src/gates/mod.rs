//! The closed set of gate variants and their algebra.
//!
//! Each variant lives in its own module and implements [`GateOp`]; the
//! [`Gate`] enum dispatches over them. Binary operations (`merge`,
//! `same_type`) are a match on the pair of tags with a no-op default, so
//! variant-specific rules never apply across variants.
//!
//! A problem chooses which variants the evolution may draw, and with which
//! per-variant configuration, through a [`GateSet`].

use std::fmt;

use rand::prelude::*;

use crate::{
    backend::{Controls, State},
    config::Config,
    math::{Mask, N, R},
};

mod cnot;
mod cphase;
mod fixed;
mod oracle;
mod rot;
mod su2;
mod swap;

pub type Fixed = fixed::Op;
pub type Rot = rot::Op;
pub type CPhase = cphase::Op;
pub type Su2 = su2::Op;
pub type Swap = swap::Op;
pub type CNot = cnot::Op;
pub type Oracle = oracle::Op;

pub use fixed::{FixedDef, GATES_FIXED};
pub use rot::{RotFamily, ROT_X, ROT_XYZ, ROT_Y, ROT_Z};

/// Problem-supplied payload consumed by [`GateOp::apply`]: the index whose
/// phase the oracle flips.
#[derive(Clone, Copy, Default, Debug)]
pub struct Context {
    pub mark: Mask,
}

/// Variant discriminator, used as the index into the per-type gate counter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tag {
    Fixed,
    Rot,
    CPhase,
    Su2,
    Swap,
    CNot,
    Oracle,
}

impl Tag {
    pub const COUNT: N = 7;

    #[inline]
    pub fn index(self) -> N {
        self as N
    }
}

/// Operations every gate variant provides. All of them are pure with
/// respect to the gate; the `Option` returns use `None` for "unchanged" so
/// the gene handle can keep sharing the original value.
#[enum_dispatch::enum_dispatch(Gate)]
pub trait GateOp {
    /// Applies the gate as a (possibly controlled) unitary.
    fn apply(&self, psi: &State, ctx: &Context) -> State;

    /// Number of active control qubits.
    fn controls(&self) -> N {
        0
    }

    /// Whether the gate acts as the identity on every state.
    fn is_trivial(&self) -> bool {
        false
    }

    /// The conjugate-transpose gate; `None` where no inversion is defined.
    fn inverted(&self) -> Option<Gate> {
        None
    }

    /// A neighbouring gate: a fresh random draw of the same variant or a
    /// Gaussian perturbation of the continuous parameters.
    fn mutated(&self, cfg: &Config, rng: &mut dyn RngCore) -> Option<Gate>;

    /// Replaces continuous parameters by rational approximants of angle/π.
    fn simplified(&self, rng: &mut dyn RngCore) -> Option<Gate> {
        let _ = rng;
        None
    }

    /// Relabels qubits `s1 ↔ s2` in the support.
    fn qubits_swapped(&self, s1: N, s2: N) -> Option<Gate>;

    fn tag(&self) -> Tag;

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

#[enum_dispatch::enum_dispatch]
#[derive(Clone, PartialEq)]
pub enum Gate {
    Fixed,
    Rot,
    CPhase,
    Su2,
    Swap,
    CNot,
    Oracle,
}

impl Gate {
    /// Algebraic composition of `self` (applied first) with `later`, when
    /// both are of the same variant and support. `None` means the pair is
    /// not mergeable; trivial partners are consumed at the gene level.
    pub fn merge(&self, later: &Gate) -> Option<Gate> {
        match (self, later) {
            (Gate::Fixed(a), Gate::Fixed(b)) => a.combine(b),
            (Gate::Rot(a), Gate::Rot(b)) => a.combine(b),
            (Gate::CPhase(a), Gate::CPhase(b)) => a.combine(b),
            (Gate::Su2(a), Gate::Su2(b)) => a.combine(b),
            (Gate::Swap(a), Gate::Swap(b)) => a.combine(b),
            (Gate::CNot(a), Gate::CNot(b)) => a.combine(b),
            (Gate::Oracle(a), Gate::Oracle(b)) => a.combine(b),
            _ => None,
        }
    }

    /// Same variant acting on the same support.
    pub fn same_type(&self, other: &Gate) -> bool {
        match (self, other) {
            (Gate::Fixed(a), Gate::Fixed(b)) => a.same_support(b),
            (Gate::Rot(a), Gate::Rot(b)) => a.same_support(b),
            (Gate::CPhase(a), Gate::CPhase(b)) => a.same_support(b),
            (Gate::Su2(a), Gate::Su2(b)) => a.same_support(b),
            (Gate::Swap(a), Gate::Swap(b)) => a.same_support(b),
            (Gate::CNot(a), Gate::CNot(b)) => a.same_support(b),
            (Gate::Oracle(_), Gate::Oracle(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("repr", &format!("{}", self))
            .finish()
    }
}

/// Policy governing how control sets are sampled at gate creation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ControlPolicy {
    /// Always empty.
    None,
    /// Exactly one uniformly chosen control.
    One,
    /// [`Any`](ControlPolicy::Any) plus a guaranteed uniformly chosen bit.
    Least1,
    /// Each non-target qubit with probability `p_control`.
    Any,
}

/// Draws a control bitmap of length `n_bit`, leaving bit `skip` off.
pub fn draw_controls(
    policy: ControlPolicy,
    n_bit: N,
    skip: N,
    p_control: R,
    rng: &mut dyn RngCore,
) -> Controls {
    debug_assert!(
        !(matches!(policy, ControlPolicy::One | ControlPolicy::Least1) && n_bit < 2),
        "n_bit < 2 with an at-least-one control distribution"
    );
    let mut mask: Mask = 0;
    if matches!(policy, ControlPolicy::Any | ControlPolicy::Least1) {
        for i in (0..n_bit).filter(|&i| i != skip) {
            if rng.gen_bool(p_control) {
                mask |= 1 << i;
            }
        }
    }
    if matches!(policy, ControlPolicy::One | ControlPolicy::Least1) {
        let r = rng.gen_range(0..n_bit - 1);
        mask |= 1 << (r + (r >= skip) as N);
    }
    Controls::from_mask(mask)
}

/// Initial angle of a parametric gate, uniform over (−π, π).
pub(crate) fn random_angle(rng: &mut dyn RngCore) -> R {
    rng.gen_range(-crate::math::PI..crate::math::PI)
}

/// Angle deviation for continuous mutation, Gaussian with σ = `d_alpha`.
pub(crate) fn angle_jitter(d_alpha: R, rng: &mut dyn RngCore) -> R {
    rand_distr::Normal::new(0., d_alpha)
        .expect("σ must be positive and finite")
        .sample(rng)
}

/// Writes `NAME<tgt>[<ctrls>]` with 1-based indices.
pub(crate) fn write_support(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    tgt: N,
    ctrls: Controls,
) -> fmt::Result {
    write!(f, "{}{}", name, tgt + 1)?;
    if !ctrls.is_empty() {
        write!(f, "[")?;
        for c in ctrls.iter() {
            write!(f, "{}", c + 1)?;
        }
        write!(f, "]")?;
    }
    Ok(())
}

/// Decodes a 1-based control digit string, silently dropping indices out of
/// range or equal to the target.
pub(crate) fn parse_controls(digits: &str, n_bit: N, tgt: N) -> Controls {
    let mut mask: Mask = 0;
    for c in digits.chars() {
        if let Some(pos) = (c as usize).checked_sub('1' as usize) {
            if pos < n_bit && pos != tgt {
                mask |= 1 << pos;
            }
        }
    }
    Controls::from_mask(mask)
}

/// The variant roster of one problem: which gate kinds the evolution may
/// draw, and the per-variant tables and control policies.
#[derive(Clone, Copy, Debug)]
pub enum VariantSpec {
    Fixed {
        table: &'static [FixedDef],
        policy: ControlPolicy,
    },
    Rot {
        families: &'static [RotFamily],
        policy: ControlPolicy,
    },
    CPhase {
        policy: ControlPolicy,
    },
    Su2 {
        policy: ControlPolicy,
    },
    Swap,
    CNot {
        policy: ControlPolicy,
    },
    Oracle,
}

/// A closed, problem-selected collection of gate variants.
#[derive(Clone, Debug)]
pub struct GateSet {
    specs: Vec<VariantSpec>,
}

impl GateSet {
    pub fn new(specs: Vec<VariantSpec>) -> Self {
        debug_assert!(!specs.is_empty(), "a gate set needs at least one variant");
        Self { specs }
    }

    /// Uniformly picks an enabled variant and delegates to its random
    /// constructor.
    pub fn random_gate(&self, cfg: &Config, rng: &mut dyn RngCore) -> Gate {
        let spec = self.specs[rng.gen_range(0..self.specs.len())];
        match spec {
            VariantSpec::Fixed { table, policy } => Fixed::random(table, policy, cfg, rng).into(),
            VariantSpec::Rot { families, policy } => Rot::random(families, policy, cfg, rng).into(),
            VariantSpec::CPhase { policy } => CPhase::random(policy, cfg, rng).into(),
            VariantSpec::Su2 { policy } => Su2::random(policy, cfg, rng).into(),
            VariantSpec::Swap => Swap::random(cfg, rng).into(),
            VariantSpec::CNot { policy } => CNot::random(policy, cfg, rng).into(),
            VariantSpec::Oracle => Oracle::random().into(),
        }
    }

    /// Tries each enabled variant's parser in roster order; first match
    /// wins. `None` on an unknown token.
    pub fn parse_token(&self, token: &str, n_bit: N) -> Option<Gate> {
        self.specs.iter().find_map(|spec| match *spec {
            VariantSpec::Fixed { table, policy } => {
                Fixed::parse(token, table, policy, n_bit).map(Gate::from)
            }
            VariantSpec::Rot { families, policy } => {
                Rot::parse(token, families, policy, n_bit).map(Gate::from)
            }
            VariantSpec::CPhase { policy } => CPhase::parse(token, policy, n_bit).map(Gate::from),
            VariantSpec::Su2 { policy } => Su2::parse(token, policy, n_bit).map(Gate::from),
            VariantSpec::Swap => Swap::parse(token, n_bit).map(Gate::from),
            VariantSpec::CNot { policy } => CNot::parse(token, policy, n_bit).map(Gate::from),
            VariantSpec::Oracle => Oracle::parse(token).map(Gate::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn none_policy_is_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            assert!(draw_controls(ControlPolicy::None, 5, 2, 0.9, &mut rng).is_empty());
        }
    }

    #[test]
    fn one_policy_has_one_bit_off_target() {
        let mut rng = StdRng::seed_from_u64(3);
        for skip in 0..5 {
            for _ in 0..40 {
                let c = draw_controls(ControlPolicy::One, 5, skip, 0.5, &mut rng);
                assert_eq!(c.len(), 1);
                assert_eq!(c.mask() & (1 << skip), 0);
            }
        }
    }

    #[test]
    fn least1_policy_is_never_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let c = draw_controls(ControlPolicy::Least1, 4, 1, 0.1, &mut rng);
            assert!(!c.is_empty());
            assert_eq!(c.mask() & 0b0010, 0);
        }
    }

    #[test]
    fn any_policy_skips_target() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let c = draw_controls(ControlPolicy::Any, 4, 0, 0.9, &mut rng);
            assert_eq!(c.mask() & 0b0001, 0);
        }
    }

    #[test]
    fn merge_never_crosses_variants() {
        let mut rng = StdRng::seed_from_u64(3);
        let cfg = Config::default();
        let swap: Gate = Swap::random(&cfg, &mut rng).into();
        let not: Gate = CNot::random(ControlPolicy::One, &cfg, &mut rng).into();
        assert!(swap.merge(&not).is_none());
        assert!(!swap.same_type(&not));
    }
}
