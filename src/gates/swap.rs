use std::fmt;

use lazy_static::lazy_static;
use rand::prelude::*;
use regex::Regex;

use super::{Context, Gate, GateOp, Tag};
use crate::{backend::State, config::Config, math::N};

/// A qubit-pair swap, carrying the parity of its power: an even power is
/// the identity.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Op {
    s1: N,
    s2: N,
    odd: bool,
}

impl Op {
    pub fn new(s1: N, s2: N) -> Self {
        debug_assert!(s1 != s2);
        Self {
            s1: s1.min(s2),
            s2: s1.max(s2),
            odd: true,
        }
    }

    /// The even-parity (identity) element, `[Id]` in text form.
    pub fn identity() -> Self {
        Self {
            s1: 0,
            s2: 0,
            odd: false,
        }
    }

    pub fn random(cfg: &Config, rng: &mut dyn RngCore) -> Self {
        debug_assert!(cfg.n_bit >= 2, "a swap gate needs at least two qubits");
        let s1 = rng.gen_range(0..cfg.n_bit - 1);
        let s2 = rng.gen_range(0..cfg.n_bit - 1);
        let (s1, s2) = (s1.min(s2), s1.max(s2));
        Self::new(s1, s2 + 1)
    }

    pub(super) fn same_support(&self, other: &Self) -> bool {
        self.s1 == other.s1 && self.s2 == other.s2
    }

    pub(super) fn combine(&self, later: &Self) -> Option<Gate> {
        self.same_support(later).then(|| {
            Self {
                odd: self.odd ^ later.odd,
                ..*self
            }
            .into()
        })
    }

    pub fn parse(token: &str, n_bit: N) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(?:(\[Id\])|SWAP([1-9])([1-9]))$").unwrap();
        }
        let caps = RE.captures(token)?;
        if caps.get(1).is_some() {
            return Some(Self::identity());
        }
        let s1 = caps[2].chars().next()? as usize - '1' as usize;
        let s2 = caps[3].chars().next()? as usize - '1' as usize;
        if s1 >= n_bit || s2 >= n_bit || s1 == s2 {
            return None;
        }
        Some(Self::new(s1, s2))
    }
}

impl GateOp for Op {
    fn apply(&self, psi: &State, _ctx: &Context) -> State {
        if self.odd {
            psi.swap_qubits(self.s1, self.s2)
        } else {
            psi.clone()
        }
    }

    fn is_trivial(&self) -> bool {
        // SWAP^(2k) = SWAP^0 = identity
        !self.odd
    }

    fn mutated(&self, cfg: &Config, rng: &mut dyn RngCore) -> Option<Gate> {
        Some(Self::random(cfg, rng).into())
    }

    fn qubits_swapped(&self, s1: N, s2: N) -> Option<Gate> {
        if (s1 == self.s1 && s2 == self.s2) || (s1 == self.s2 && s2 == self.s1) || !self.odd {
            return None;
        }
        let relabel = |s: N| {
            if s == s1 {
                s2
            } else if s == s2 {
                s1
            } else {
                s
            }
        };
        Some(Self::new(relabel(self.s1), relabel(self.s2)).into())
    }

    fn tag(&self) -> Tag {
        Tag::Swap
    }

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.odd {
            write!(f, "SWAP{}{}", self.s1 + 1, self.s2 + 1)
        } else {
            write!(f, "[Id]")
        }
    }
}
