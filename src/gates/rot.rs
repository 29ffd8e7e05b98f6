use std::fmt;

use lazy_static::lazy_static;
use rand::prelude::*;
use regex::Regex;

use super::{
    angle_jitter, draw_controls, fixed::relabel, parse_controls, random_angle, write_support,
    ControlPolicy, Context, Gate, GateOp, Tag,
};
use crate::{
    backend::{Controls, Gate as Matrix, State},
    config::Config,
    math::{N, PI, R},
};

/// One-parametric rotation family.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RotFamily {
    X,
    Y,
    Z,
}

pub const ROT_XYZ: [RotFamily; 3] = [RotFamily::X, RotFamily::Y, RotFamily::Z];
pub const ROT_X: [RotFamily; 1] = [RotFamily::X];
pub const ROT_Y: [RotFamily; 1] = [RotFamily::Y];
pub const ROT_Z: [RotFamily; 1] = [RotFamily::Z];

impl RotFamily {
    pub fn name(self) -> &'static str {
        match self {
            RotFamily::X => "X",
            RotFamily::Y => "Y",
            RotFamily::Z => "Z",
        }
    }

    pub fn matrix(self, angle: R) -> Matrix {
        match self {
            RotFamily::X => Matrix::xrot(angle),
            RotFamily::Y => Matrix::yrot(angle),
            RotFamily::Z => Matrix::zrot(angle),
        }
    }
}

/// A parametric rotation gate.
#[derive(Clone, PartialEq, Debug)]
pub struct Op {
    families: &'static [RotFamily],
    family: RotFamily,
    tgt: N,
    angle: R,
    ctrls: Controls,
    policy: ControlPolicy,
}

impl Op {
    pub fn new(
        families: &'static [RotFamily],
        family: RotFamily,
        tgt: N,
        angle: R,
        ctrls: Controls,
        policy: ControlPolicy,
    ) -> Self {
        debug_assert!(ctrls.mask() & (1 << tgt) == 0);
        Self {
            families,
            family,
            tgt,
            angle,
            ctrls,
            policy,
        }
    }

    pub fn random(
        families: &'static [RotFamily],
        policy: ControlPolicy,
        cfg: &Config,
        rng: &mut dyn RngCore,
    ) -> Self {
        let family = families[rng.gen_range(0..families.len())];
        let tgt = rng.gen_range(0..cfg.n_bit);
        let angle = random_angle(rng);
        let ctrls = draw_controls(policy, cfg.n_bit, tgt, cfg.p_control, rng);
        Self::new(families, family, tgt, angle, ctrls, policy)
    }

    pub(super) fn same_support(&self, other: &Self) -> bool {
        self.family == other.family && self.tgt == other.tgt && self.ctrls == other.ctrls
    }

    /// Same family rotations compose by summing angles.
    pub(super) fn combine(&self, later: &Self) -> Option<Gate> {
        self.same_support(later).then(|| {
            Self::new(
                self.families,
                self.family,
                self.tgt,
                self.angle + later.angle,
                self.ctrls,
                self.policy,
            )
            .into()
        })
    }

    pub fn parse(
        token: &str,
        families: &'static [RotFamily],
        policy: ControlPolicy,
        n_bit: N,
    ) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"^([A-Za-z])([1-9])(?:\[([0-9]+)\])?\((-?[0-9.]+)π?\)$").unwrap();
        }
        let caps = RE.captures(token)?;
        let family = *families.iter().find(|fam| fam.name() == &caps[1])?;
        let tgt = caps[2].chars().next()? as usize - '1' as usize;
        if tgt >= n_bit {
            return None;
        }
        let ctrls = caps
            .get(3)
            .map(|m| parse_controls(m.as_str(), n_bit, tgt))
            .unwrap_or(Controls::NONE);
        let angle: R = caps[4].parse().ok()?;
        Some(Self::new(families, family, tgt, angle * PI, ctrls, policy))
    }
}

impl GateOp for Op {
    fn apply(&self, psi: &State, _ctx: &Context) -> State {
        psi.apply_ctrl(&self.family.matrix(self.angle), self.ctrls, self.tgt)
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
            Self::random(self.families, self.policy, cfg, rng)
        };
        Some(next.into())
    }

    fn simplified(&self, rng: &mut dyn RngCore) -> Option<Gate> {
        let angle = crate::math::rational::rationalize_angle(self.angle, rng);
        Some(Self { angle, ..self.clone() }.into())
    }

    fn qubits_swapped(&self, s1: N, s2: N) -> Option<Gate> {
        Some(
            Self {
                tgt: relabel(self.tgt, s1, s2),
                ctrls: self.ctrls.swap_qubits(s1, s2),
                ..self.clone()
            }
            .into(),
        )
    }

    fn tag(&self) -> Tag {
        Tag::Rot
    }

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_support(f, self.family.name(), self.tgt, self.ctrls)?;
        write!(f, "({}π)", self.angle / PI)
    }
}
