use std::fmt;

use lazy_static::lazy_static;
use rand::prelude::*;
use regex::Regex;

use super::{
    angle_jitter, draw_controls, random_angle, ControlPolicy, Context, Gate, GateOp, Tag,
};
use crate::{
    backend::{Controls, Gate as Matrix, State},
    config::Config,
    math::{Mask, N, PI, R},
};

/// A controlled phase gate, symmetric in its whole support. The stored
/// target is always the lowest-indexed support bit, so two gates over the
/// same support compare (and merge) as equal structure.
#[derive(Clone, PartialEq, Debug)]
pub struct Op {
    tgt: N,
    angle: R,
    ctrls: Controls,
    policy: ControlPolicy,
}

impl Op {
    pub fn from_support(support: Mask, angle: R, policy: ControlPolicy) -> Self {
        debug_assert!(support != 0, "a phase gate needs a nonempty support");
        let tgt = support.trailing_zeros() as N;
        Self {
            tgt,
            angle,
            ctrls: Controls::from_mask(support & !(1 << tgt)),
            policy,
        }
    }

    pub fn random(policy: ControlPolicy, cfg: &Config, rng: &mut dyn RngCore) -> Self {
        let tgt = rng.gen_range(0..cfg.n_bit);
        let angle = random_angle(rng);
        let ctrls = draw_controls(policy, cfg.n_bit, tgt, cfg.p_control, rng);
        Self::from_support(ctrls.mask() | 1 << tgt, angle, policy)
    }

    pub fn support(&self) -> Mask {
        self.ctrls.mask() | 1 << self.tgt
    }

    pub(super) fn same_support(&self, other: &Self) -> bool {
        self.tgt == other.tgt && self.ctrls == other.ctrls
    }

    pub(super) fn combine(&self, later: &Self) -> Option<Gate> {
        self.same_support(later).then(|| {
            Self {
                angle: self.angle + later.angle,
                ..self.clone()
            }
            .into()
        })
    }

    pub fn parse(token: &str, policy: ControlPolicy, n_bit: N) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^P([0-9]+)\((-?[0-9.]+)π?\)$").unwrap();
        }
        let caps = RE.captures(token)?;
        let mut support: Mask = 0;
        for c in caps[1].chars() {
            if let Some(pos) = (c as usize).checked_sub('1' as usize) {
                if pos < n_bit {
                    support |= 1 << pos;
                }
            }
        }
        if support == 0 {
            return None;
        }
        let angle: R = caps[2].parse().ok()?;
        Some(Self::from_support(support, angle * PI, policy))
    }
}

impl GateOp for Op {
    fn apply(&self, psi: &State, _ctx: &Context) -> State {
        psi.apply_ctrl(&Matrix::phase(self.angle), self.ctrls, self.tgt)
    }

    fn controls(&self) -> N {
        self.ctrls.len()
    }

    fn is_trivial(&self) -> bool {
        self.angle == 0.
    }

    fn inverted(&self) -> Option<Gate> {
        Some(Self { angle: -self.angle, ..self.clone() }.into())
    }

    fn mutated(&self, cfg: &Config, rng: &mut dyn RngCore) -> Option<Gate> {
        let next = if rng.gen_bool(0.5) {
            Self {
                angle: self.angle + angle_jitter(cfg.d_alpha, rng),
                ..self.clone()
            }
        } else {
            Self::random(self.policy, cfg, rng)
        };
        Some(next.into())
    }

    fn simplified(&self, rng: &mut dyn RngCore) -> Option<Gate> {
        let angle = crate::math::rational::rationalize_angle(self.angle, rng);
        Some(Self { angle, ..self.clone() }.into())
    }

    fn qubits_swapped(&self, s1: N, s2: N) -> Option<Gate> {
        let support = self.support();
        let (b1, b2) = (support >> s1 & 1, support >> s2 & 1);
        if b1 == b2 {
            // Swapping inside or outside the support has no effect.
            return None;
        }
        let support = support ^ (1 << s1) ^ (1 << s2);
        Some(Self::from_support(support, self.angle, self.policy).into())
    }

    fn tag(&self) -> Tag {
        Tag::CPhase
    }

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P")?;
        for b in Controls::from_mask(self.support()).iter() {
            write!(f, "{}", b + 1)?;
        }
        write!(f, "({}π)", self.angle / PI)
    }
}
