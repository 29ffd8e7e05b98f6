use std::fmt;

use lazy_static::lazy_static;
use rand::prelude::*;
use regex::Regex;

use super::{Context, Gate, GateOp, Tag};
use crate::{backend::State, config::Config, math::N};

/// The problem oracle: flips the phase of the amplitude at the marked
/// index supplied through the [`Context`]. Parity-carrying like
/// [`Swap`](super::Swap).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Op {
    odd: bool,
}

impl Op {
    pub fn random() -> Self {
        Self { odd: true }
    }

    /// The even-parity (identity) element, `[Id]` in text form.
    pub fn identity() -> Self {
        Self { odd: false }
    }

    pub(super) fn combine(&self, later: &Self) -> Option<Gate> {
        // oracle · oracle = oracle² → odd parities cancel
        Some(
            Self {
                odd: self.odd ^ later.odd,
            }
            .into(),
        )
    }

    pub fn parse(token: &str) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(?:(\[Id\])|Oracle)$").unwrap();
        }
        let caps = RE.captures(token)?;
        Some(if caps.get(1).is_some() {
            Self::identity()
        } else {
            Self::random()
        })
    }
}

impl GateOp for Op {
    fn apply(&self, psi: &State, ctx: &Context) -> State {
        let mut out = psi.clone();
        if self.odd {
            out[ctx.mark] = -out[ctx.mark];
        }
        out
    }

    fn is_trivial(&self) -> bool {
        // oracle^(2k) = oracle^0 = identity
        !self.odd
    }

    fn mutated(&self, _cfg: &Config, _rng: &mut dyn RngCore) -> Option<Gate> {
        None
    }

    fn qubits_swapped(&self, _s1: N, _s2: N) -> Option<Gate> {
        None
    }

    fn tag(&self) -> Tag {
        Tag::Oracle
    }

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.odd {
            write!(f, "Oracle")
        } else {
            write!(f, "[Id]")
        }
    }
}
