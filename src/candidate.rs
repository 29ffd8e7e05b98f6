use std::fmt;

use thiserror::Error;

use crate::{
    backend::State,
    fitness::Counter,
    gates::{Context, GateSet},
    gene::Gene,
    math::N,
};

/// Failure of a whole-circuit deserialization; no partial genotype is ever
/// accepted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized gene token `{0}`")]
    UnknownToken(String),
}

/// A circuit candidate: an ordered genotype of genes plus two optional
/// audit stamps recording which operator produced it and when.
///
/// Construction canonicalizes the genotype: adjacent mergeable genes are
/// combined and trivial genes elided, repeating the left-to-right sweep
/// until a pass changes nothing. A stored genotype therefore never
/// contains a trivial gene or an adjacent mergeable pair, and
/// reconstruction from a stored genotype is the identity.
#[derive(Clone, Debug)]
pub struct Candidate {
    gt: Vec<Gene>,
    origin: Option<N>,
    generation: Option<u64>,
}

impl Candidate {
    pub fn new(genotype: Vec<Gene>) -> Self {
        Self {
            gt: canonicalize(genotype),
            origin: None,
            generation: None,
        }
    }

    #[inline]
    pub fn genotype(&self) -> &[Gene] {
        &self.gt
    }

    #[inline]
    pub fn len(&self) -> N {
        self.gt.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gt.is_empty()
    }

    /// Total number of control qubits across the genotype.
    pub fn controls(&self) -> N {
        self.gt.iter().map(Gene::controls).sum()
    }

    /// Per-variant gate counts.
    pub fn gate_counts(&self) -> Counter {
        let mut counter = Counter::new();
        for g in &self.gt {
            g.hit(&mut counter);
        }
        counter
    }

    /// Runs the circuit on `psi` under the given context.
    pub fn simulate(&self, psi: State, ctx: &Context) -> State {
        self.gt.iter().fold(psi, |psi, g| g.apply(&psi, ctx))
    }

    /// Stamps the producing operator; the first stamp wins.
    pub fn set_origin(&mut self, origin: N) {
        self.origin.get_or_insert(origin);
    }

    pub fn origin(&self) -> Option<N> {
        self.origin
    }

    /// Stamps the producing generation; the first stamp wins.
    pub fn set_generation(&mut self, generation: u64) {
        self.generation.get_or_insert(generation);
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// Structural equality: same length and pairwise same variant/support.
    pub fn same_circ(&self, other: &Candidate) -> bool {
        self.gt.len() == other.gt.len()
            && self.gt.iter().zip(&other.gt).all(|(a, b)| a.same_type(b))
    }

    /// Parses the whitespace-separated text form, trying each enabled
    /// variant per token; an unknown token fails the whole parse.
    pub fn parse(text: &str, set: &GateSet, n_bit: N) -> Result<Self, ParseError> {
        text.split_whitespace()
            .map(|token| {
                set.parse_token(token, n_bit)
                    .map(Gene::new)
                    .ok_or_else(|| ParseError::UnknownToken(token.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, g) in self.gt.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", g)?;
        }
        Ok(())
    }
}

/// The canonicalizing merge sweep. One pass walks left-to-right keeping a
/// write cursor: each incoming gene either merges into the cursor gene,
/// disappears (trivial), or advances the cursor. Merge residue that itself
/// became trivial is dropped, re-exposing the previous gene. Passes repeat
/// until a fixpoint.
fn canonicalize(mut gt: Vec<Gene>) -> Vec<Gene> {
    loop {
        let mut out: Vec<Gene> = Vec::with_capacity(gt.len());
        let mut changed = false;
        for g in gt {
            if g.is_trivial() {
                changed = true;
                continue;
            }
            match out.last_mut() {
                Some(last) => {
                    if last.merge(&g) {
                        changed = true;
                        if last.is_trivial() {
                            out.pop();
                        }
                    } else {
                        out.push(g);
                    }
                }
                None => out.push(g),
            }
        }
        if !changed {
            return out;
        }
        gt = out;
    }
}
