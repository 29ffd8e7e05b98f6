use std::fmt;

use lazy_static::lazy_static;
use rand::prelude::*;
use regex::Regex;

use super::{draw_controls, parse_controls, write_support, ControlPolicy, Context, Gate, GateOp, Tag};
use crate::{
    backend::{Controls, Gate as Matrix, State},
    config::Config,
    math::N,
};

/// One row of a fixed-gate table: the operator plus its inversion and
/// squaring relations, expressed as index offsets within the table (0 =
/// self-inverse / square not in table).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FixedDef {
    pub name: &'static str,
    pub mat: Matrix,
    pub inv: i8,
    pub sq: i8,
}

/// The full fixed set. Index 0 is the identity and is never drawn randomly.
pub const GATES_FIXED: [FixedDef; 9] = [
    FixedDef { name: "I", mat: Matrix::I, inv: 0, sq: 0 },
    FixedDef { name: "H", mat: Matrix::H, inv: 0, sq: -1 },
    FixedDef { name: "X", mat: Matrix::X, inv: 0, sq: -2 },
    FixedDef { name: "Y", mat: Matrix::Y, inv: 0, sq: -3 },
    FixedDef { name: "Z", mat: Matrix::Z, inv: 0, sq: -4 },
    FixedDef { name: "T", mat: Matrix::T, inv: 1, sq: 2 },
    FixedDef { name: "Ti", mat: Matrix::T_DGR, inv: -1, sq: 2 },
    FixedDef { name: "S", mat: Matrix::S, inv: 1, sq: -3 },
    FixedDef { name: "Si", mat: Matrix::S_DGR, inv: -1, sq: -4 },
];

/// A table-driven discrete gate.
#[derive(Clone, PartialEq, Debug)]
pub struct Op {
    table: &'static [FixedDef],
    op: N,
    tgt: N,
    ctrls: Controls,
    policy: ControlPolicy,
}

impl Op {
    pub fn new(
        table: &'static [FixedDef],
        op: N,
        tgt: N,
        ctrls: Controls,
        policy: ControlPolicy,
    ) -> Self {
        debug_assert!(op < table.len());
        debug_assert!(ctrls.mask() & (1 << tgt) == 0);
        Self {
            table,
            op,
            tgt,
            ctrls,
            policy,
        }
    }

    pub fn random(
        table: &'static [FixedDef],
        policy: ControlPolicy,
        cfg: &Config,
        rng: &mut dyn RngCore,
    ) -> Self {
        let op = rng.gen_range(1..table.len());
        let tgt = rng.gen_range(0..cfg.n_bit);
        let ctrls = draw_controls(policy, cfg.n_bit, tgt, cfg.p_control, rng);
        Self::new(table, op, tgt, ctrls, policy)
    }

    pub(super) fn same_support(&self, other: &Self) -> bool {
        self.op == other.op && self.tgt == other.tgt && self.ctrls == other.ctrls
    }

    /// G·G = square(G) if the square is also in the table.
    pub(super) fn combine(&self, later: &Self) -> Option<Gate> {
        if !self.same_support(later) {
            return None;
        }
        let sq = self.table[self.op].sq;
        if sq == 0 {
            return None;
        }
        let op = (self.op as isize + sq as isize) as N;
        Some(Self::new(self.table, op, self.tgt, self.ctrls, self.policy).into())
    }

    pub fn parse(
        token: &str,
        table: &'static [FixedDef],
        policy: ControlPolicy,
        n_bit: N,
    ) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"^([A-Za-z]+)([1-9])(?:\[([0-9]+)\])?$").unwrap();
        }
        let caps = RE.captures(token)?;
        let op = table.iter().position(|def| def.name == &caps[1])?;
        let tgt = caps[2].chars().next()? as usize - '1' as usize;
        if tgt >= n_bit {
            return None;
        }
        let ctrls = caps
            .get(3)
            .map(|m| parse_controls(m.as_str(), n_bit, tgt))
            .unwrap_or(Controls::NONE);
        Some(Self::new(table, op, tgt, ctrls, policy))
    }
}

impl GateOp for Op {
    fn apply(&self, psi: &State, _ctx: &Context) -> State {
        psi.apply_ctrl(&self.table[self.op].mat, self.ctrls, self.tgt)
    }

    fn controls(&self) -> N {
        self.ctrls.len()
    }

    fn is_trivial(&self) -> bool {
        self.op == 0
    }

    fn inverted(&self) -> Option<Gate> {
        let inv = self.table[self.op].inv;
        if inv == 0 {
            return None;
        }
        let op = (self.op as isize + inv as isize) as N;
        Some(Self::new(self.table, op, self.tgt, self.ctrls, self.policy).into())
    }

    fn mutated(&self, cfg: &Config, rng: &mut dyn RngCore) -> Option<Gate> {
        Some(Self::random(self.table, self.policy, cfg, rng).into())
    }

    fn qubits_swapped(&self, s1: N, s2: N) -> Option<Gate> {
        let tgt = relabel(self.tgt, s1, s2);
        Some(Self::new(self.table, self.op, tgt, self.ctrls.swap_qubits(s1, s2), self.policy).into())
    }

    fn tag(&self) -> Tag {
        Tag::Fixed
    }

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_support(f, self.table[self.op].name, self.tgt, self.ctrls)
    }
}

pub(super) fn relabel(tgt: N, s1: N, s2: N) -> N {
    if tgt == s1 {
        s2
    } else if tgt == s2 {
        s1
    } else {
        tgt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h3(ctrls: Controls) -> Op {
        Op::new(&GATES_FIXED, 1, 2, ctrls, ControlPolicy::None)
    }

    #[test]
    fn squaring_follows_the_table() {
        let t = Op::new(&GATES_FIXED, 5, 0, Controls::NONE, ControlPolicy::None);
        let merged = t.combine(&t).unwrap();
        assert_eq!(format!("{}", merged), "S1");
        let h = h3(Controls::NONE);
        let merged = h.combine(&h).unwrap();
        assert!(merged.is_trivial());
    }

    #[test]
    fn inversion_follows_the_table() {
        let t = Op::new(&GATES_FIXED, 5, 1, Controls::NONE, ControlPolicy::None);
        let ti = t.inverted().unwrap();
        assert_eq!(format!("{}", ti), "Ti2");
        let h = h3(Controls::NONE);
        assert!(h.inverted().is_none());
    }

    #[test]
    fn distinct_support_does_not_merge() {
        let a = h3(Controls::NONE);
        let b = h3(Controls::from_mask(0b01));
        assert!(a.combine(&b).is_none());
    }

    #[test]
    fn serializes_with_controls() {
        let g = h3(Controls::from_mask(0b011));
        assert_eq!(format!("{}", Gate::from(g)), "H3[12]");
    }

    #[test]
    fn parses_round_trip() {
        let g = Op::parse("H3[12]", &GATES_FIXED, ControlPolicy::Any, 3).unwrap();
        assert_eq!(format!("{}", Gate::from(g)), "H3[12]");
        assert!(Op::parse("Q3", &GATES_FIXED, ControlPolicy::Any, 3).is_none());
        assert!(Op::parse("H4", &GATES_FIXED, ControlPolicy::Any, 3).is_none());
        let ti = Op::parse("Ti1", &GATES_FIXED, ControlPolicy::Any, 3).unwrap();
        assert_eq!(format!("{}", Gate::from(ti)), "Ti1");
    }
}
