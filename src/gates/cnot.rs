use std::fmt;

use lazy_static::lazy_static;
use rand::prelude::*;
use regex::Regex;

use super::{
    draw_controls, fixed::relabel, parse_controls, write_support, ControlPolicy, Context, Gate,
    GateOp, Tag,
};
use crate::{
    backend::{Controls, Gate as Matrix, State},
    config::Config,
    math::N,
};

/// A (multi-)controlled NOT, carrying the parity of its power.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Op {
    tgt: N,
    ctrls: Controls,
    odd: bool,
    policy: ControlPolicy,
}

impl Op {
    pub fn new(tgt: N, ctrls: Controls, policy: ControlPolicy) -> Self {
        debug_assert!(ctrls.mask() & (1 << tgt) == 0);
        Self {
            tgt,
            ctrls,
            odd: true,
            policy,
        }
    }

    /// The even-parity (identity) element, `[Id]` in text form.
    pub fn identity(policy: ControlPolicy) -> Self {
        Self {
            tgt: 0,
            ctrls: Controls::NONE,
            odd: false,
            policy,
        }
    }

    pub fn random(policy: ControlPolicy, cfg: &Config, rng: &mut dyn RngCore) -> Self {
        let tgt = rng.gen_range(0..cfg.n_bit);
        let ctrls = draw_controls(policy, cfg.n_bit, tgt, cfg.p_control, rng);
        Self::new(tgt, ctrls, policy)
    }

    pub(super) fn same_support(&self, other: &Self) -> bool {
        self.tgt == other.tgt && self.ctrls == other.ctrls
    }

    pub(super) fn combine(&self, later: &Self) -> Option<Gate> {
        self.same_support(later).then(|| {
            Self {
                odd: self.odd ^ later.odd,
                ..self.clone()
            }
            .into()
        })
    }

    pub fn parse(token: &str, policy: ControlPolicy, n_bit: N) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"^(?:(\[Id\])|NOT([1-9])(?:\[([0-9]+)\])?)$").unwrap();
        }
        let caps = RE.captures(token)?;
        if caps.get(1).is_some() {
            return Some(Self::identity(policy));
        }
        let tgt = caps[2].chars().next()? as usize - '1' as usize;
        if tgt >= n_bit {
            return None;
        }
        let ctrls = caps
            .get(3)
            .map(|m| parse_controls(m.as_str(), n_bit, tgt))
            .unwrap_or(Controls::NONE);
        Some(Self::new(tgt, ctrls, policy))
    }
}

impl GateOp for Op {
    fn apply(&self, psi: &State, _ctx: &Context) -> State {
        if self.odd {
            psi.apply_ctrl(&Matrix::X, self.ctrls, self.tgt)
        } else {
            psi.clone()
        }
    }

    fn controls(&self) -> N {
        self.ctrls.len()
    }

    fn is_trivial(&self) -> bool {
        // NOT^(2k) = NOT^0 = identity
        !self.odd
    }

    fn mutated(&self, cfg: &Config, rng: &mut dyn RngCore) -> Option<Gate> {
        Some(Self::random(self.policy, cfg, rng).into())
    }

    fn qubits_swapped(&self, s1: N, s2: N) -> Option<Gate> {
        if !self.odd {
            return None;
        }
        Some(
            Self::new(
                relabel(self.tgt, s1, s2),
                self.ctrls.swap_qubits(s1, s2),
                self.policy,
            )
            .into(),
        )
    }

    fn tag(&self) -> Tag {
        Tag::CNot
    }

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.odd {
            write_support(f, "NOT", self.tgt, self.ctrls)
        } else {
            write!(f, "[Id]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_xors_on_merge() {
        let a = Op::new(1, Controls::from_mask(0b001), ControlPolicy::One);
        let merged = a.combine(&a).unwrap();
        assert!(merged.is_trivial());
        let b = Op::new(1, Controls::from_mask(0b100), ControlPolicy::One);
        assert!(a.combine(&b).is_none());
    }

    #[test]
    fn serializes_with_controls() {
        let g = Op::new(1, Controls::from_mask(0b101), ControlPolicy::One);
        assert_eq!(format!("{}", Gate::from(g)), "NOT2[13]");
        assert_eq!(
            format!("{}", Gate::from(Op::identity(ControlPolicy::One))),
            "[Id]"
        );
    }

    #[test]
    fn parses_round_trip() {
        let g = Op::parse("NOT2[13]", ControlPolicy::One, 3).unwrap();
        assert_eq!(format!("{}", Gate::from(g)), "NOT2[13]");
        assert!(Op::parse("NOT4", ControlPolicy::One, 3).is_none());
        assert!(Op::parse("[Id]", ControlPolicy::One, 3).unwrap().is_trivial());
    }
}
