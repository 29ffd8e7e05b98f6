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

/// A generic single-qubit unitary in ZYZ parameterization. The product
/// matrix `zrot(γ)·yrot(β)·zrot(α)` is cached alongside the angles.
#[derive(Clone, PartialEq, Debug)]
pub struct Op {
    tgt: N,
    alpha: R,
    beta: R,
    gamma: R,
    ctrls: Controls,
    policy: ControlPolicy,
    mat: Matrix,
}

impl Op {
    pub fn new(
        tgt: N,
        alpha: R,
        beta: R,
        gamma: R,
        ctrls: Controls,
        policy: ControlPolicy,
    ) -> Self {
        debug_assert!(ctrls.mask() & (1 << tgt) == 0);
        Self {
            tgt,
            alpha,
            beta,
            gamma,
            ctrls,
            policy,
            mat: Matrix::zrot(gamma) * Matrix::yrot(beta) * Matrix::zrot(alpha),
        }
    }

    /// Recovers the ZYZ angles of a determinant-1 unitary and rebuilds the
    /// cache from them, keeping the angle/matrix invariant exact.
    pub fn from_matrix(tgt: N, ctrls: Controls, policy: ControlPolicy, mat: Matrix) -> Self {
        let beta = 2. * mat.at(1, 0).norm().atan2(mat.at(0, 0).norm());
        let sum = mat.at(0, 0).arg();
        let diff = mat.at(1, 0).arg();
        Self::new(tgt, sum + diff, beta, sum - diff, ctrls, policy)
    }

    pub fn random(policy: ControlPolicy, cfg: &Config, rng: &mut dyn RngCore) -> Self {
        let tgt = rng.gen_range(0..cfg.n_bit);
        let (alpha, beta, gamma) = (random_angle(rng), random_angle(rng), random_angle(rng));
        let ctrls = draw_controls(policy, cfg.n_bit, tgt, cfg.p_control, rng);
        Self::new(tgt, alpha, beta, gamma, ctrls, policy)
    }

    pub fn matrix(&self) -> &Matrix {
        &self.mat
    }

    pub(super) fn same_support(&self, other: &Self) -> bool {
        self.tgt == other.tgt && self.ctrls == other.ctrls
    }

    /// Unitaries over the same support compose by matrix product.
    pub(super) fn combine(&self, later: &Self) -> Option<Gate> {
        self.same_support(later).then(|| {
            Self::from_matrix(self.tgt, self.ctrls, self.policy, later.mat * self.mat).into()
        })
    }

    pub fn parse(token: &str, policy: ControlPolicy, n_bit: N) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex = Regex::new(
                r"^U([1-9])(?:\[([0-9]+)\])?\((-?[0-9.]+)π?,(-?[0-9.]+)π?,(-?[0-9.]+)π?\)$"
            )
            .unwrap();
        }
        let caps = RE.captures(token)?;
        let tgt = caps[1].chars().next()? as usize - '1' as usize;
        if tgt >= n_bit {
            return None;
        }
        let ctrls = caps
            .get(2)
            .map(|m| parse_controls(m.as_str(), n_bit, tgt))
            .unwrap_or(Controls::NONE);
        let alpha: R = caps[3].parse().ok()?;
        let beta: R = caps[4].parse().ok()?;
        let gamma: R = caps[5].parse().ok()?;
        Some(Self::new(tgt, alpha * PI, beta * PI, gamma * PI, ctrls, policy))
    }
}

impl GateOp for Op {
    fn apply(&self, psi: &State, _ctx: &Context) -> State {
        psi.apply_ctrl(&self.mat, self.ctrls, self.tgt)
    }

    fn controls(&self) -> N {
        self.ctrls.len()
    }

    fn is_trivial(&self) -> bool {
        self.beta == 0. && self.alpha + self.gamma == 0.
    }

    fn inverted(&self) -> Option<Gate> {
        Some(
            Self::new(
                self.tgt,
                -self.gamma,
                -self.beta,
                -self.alpha,
                self.ctrls,
                self.policy,
            )
            .into(),
        )
    }

    fn mutated(&self, cfg: &Config, rng: &mut dyn RngCore) -> Option<Gate> {
        let next = if rng.gen_bool(0.5) {
            Self::new(
                self.tgt,
                self.alpha + angle_jitter(cfg.d_alpha, rng),
                self.beta + angle_jitter(cfg.d_alpha, rng),
                self.gamma + angle_jitter(cfg.d_alpha, rng),
                self.ctrls,
                self.policy,
            )
        } else {
            Self::random(self.policy, cfg, rng)
        };
        Some(next.into())
    }

    fn simplified(&self, rng: &mut dyn RngCore) -> Option<Gate> {
        use crate::math::rational::rationalize_angle;
        Some(
            Self::new(
                self.tgt,
                rationalize_angle(self.alpha, rng),
                rationalize_angle(self.beta, rng),
                rationalize_angle(self.gamma, rng),
                self.ctrls,
                self.policy,
            )
            .into(),
        )
    }

    fn qubits_swapped(&self, s1: N, s2: N) -> Option<Gate> {
        Some(
            Self::new(
                relabel(self.tgt, s1, s2),
                self.alpha,
                self.beta,
                self.gamma,
                self.ctrls.swap_qubits(s1, s2),
                self.policy,
            )
            .into(),
        )
    }

    fn tag(&self) -> Tag {
        Tag::Su2
    }

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_support(f, "U", self.tgt, self.ctrls)?;
        write!(
            f,
            "({}π,{}π,{}π)",
            self.alpha / PI,
            self.beta / PI,
            self.gamma / PI
        )
    }
}
