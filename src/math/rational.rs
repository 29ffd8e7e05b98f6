//! Rational approximation of floating-point values and angles.
//!
//! [`rationalize`] finds a continued-fraction expansion of its argument,
//! truncates it at a random position with probability proportional to the
//! magnitude of the partial quotient there (large quotients mark strong
//! rational candidates), and converts the prefix back. Near-infinite
//! quotients are capped so an almost-rational input can still be trimmed to
//! an even shorter rational with a small probability.

use rand::{distributions::WeightedIndex, prelude::*};

use super::{N, PI, R};

/// Expansion depth limit.
const DEPTH: N = 8;
/// Cap applied to any single partial quotient.
const QUOT_CAP: R = 100.;

pub fn rationalize(x: R, rng: &mut dyn RngCore) -> R {
    let mut a = x.abs();
    let mut coeffs = [0.; DEPTH];
    let mut t = 0;
    while t < DEPTH {
        coeffs[t] = a.floor();
        if coeffs[t] > QUOT_CAP {
            coeffs[t] = QUOT_CAP;
            t += 1;
            break;
        }
        a = 1. / (a - coeffs[t]);
        t += 1;
    }
    if t < 2 {
        return x;
    }
    let d_stop = match WeightedIndex::new(coeffs[1..t].iter().copied()) {
        Ok(d) => d,
        Err(_) => return x,
    };
    // Truncate just before the sampled quotient.
    let mut cut = d_stop.sample(rng);
    let mut a = coeffs[cut];
    while cut > 0 {
        cut -= 1;
        a = coeffs[cut] + 1. / a;
    }
    if x < 0. {
        -a
    } else {
        a
    }
}

/// [`rationalize`] for 2π-periodical variables: the angle is mapped into
/// (−π, π] and replaced by a rational multiple of π.
pub fn rationalize_angle(a: R, rng: &mut dyn RngCore) -> R {
    let b = a / PI / 2. + 0.5;
    let mut b = rationalize(b - b.floor(), rng);
    if b == 0. {
        b = 1.;
    }
    (b - 0.5) * PI * 2.
}
