#![warn(clippy::cargo)]
#![doc = include_str!("../README.md")]

pub mod math;

pub mod backend;
pub mod config;
pub mod gates;

pub mod candidate;
pub mod evolution;
pub mod factory;
pub mod fitness;
pub mod gene;
pub mod population;
pub mod problem;

#[cfg(test)]
mod tests;

#[doc(hidden)]
pub mod prelude {
    pub use crate::{
        backend::{Controls, Gate as BackendGate, State},
        candidate::{Candidate, ParseError},
        config::Config,
        evolution::Evolution,
        factory::{CandidateFactory, GenOp, OpTracker},
        fitness::{trim_error, Counter, Fitness},
        gates::{Context, ControlPolicy, Gate, GateOp, GateSet, Tag, VariantSpec},
        gene::Gene,
        population::{Member, Population},
        problem::{Fourier, Problem, Search, StatePrep},
    };
}
