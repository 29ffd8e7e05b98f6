//! Linear-algebra kernel behind the circuit evolution.
//!
//! The rest of the crate only consumes the narrow interface defined here:
//! a [`Gate`] is a 2×2 complex matrix, a [`Controls`] value is a qubit
//! bitmap, and a [`State`] is a dense amplitude vector over `2^n_bit` basis
//! states with controlled single-qubit application, qubit relabelling, a
//! reference Fourier transform and overlaps. Qubit `i` corresponds to bit
//! `1 << i` of the amplitude index.

use std::{fmt, ops};

use crate::math::{count_bits, phase_from_rad, Mask, C, C_ONE, C_ZERO, FRAC_1_SQRT_2, N, R, TAU};

/// A single-qubit operator in matrix form, row-major.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Gate {
    m: [C; 4],
}

const V12: C = C {
    re: FRAC_1_SQRT_2,
    im: 0.,
};

impl Gate {
    pub const I: Gate = Gate::new(C_ONE, C_ZERO, C_ZERO, C_ONE);
    pub const H: Gate = Gate::new(
        V12,
        V12,
        V12,
        C {
            re: -FRAC_1_SQRT_2,
            im: 0.,
        },
    );
    pub const X: Gate = Gate::new(C_ZERO, C_ONE, C_ONE, C_ZERO);
    pub const Y: Gate = Gate::new(
        C_ZERO,
        C { re: 0., im: -1. },
        C { re: 0., im: 1. },
        C_ZERO,
    );
    pub const Z: Gate = Gate::new(C_ONE, C_ZERO, C_ZERO, C { re: -1., im: 0. });
    pub const T: Gate = Gate::new(
        C_ONE,
        C_ZERO,
        C_ZERO,
        C {
            re: FRAC_1_SQRT_2,
            im: FRAC_1_SQRT_2,
        },
    );
    pub const T_DGR: Gate = Gate::new(
        C_ONE,
        C_ZERO,
        C_ZERO,
        C {
            re: FRAC_1_SQRT_2,
            im: -FRAC_1_SQRT_2,
        },
    );
    pub const S: Gate = Gate::new(C_ONE, C_ZERO, C_ZERO, C { re: 0., im: 1. });
    pub const S_DGR: Gate = Gate::new(C_ONE, C_ZERO, C_ZERO, C { re: 0., im: -1. });

    pub const fn new(u11: C, u12: C, u21: C, u22: C) -> Self {
        Self {
            m: [u11, u12, u21, u22],
        }
    }

    /// Rotation by `a` radians around the X axis of the Bloch sphere.
    pub fn xrot(a: R) -> Self {
        let (sin, cos) = (a / 2.).sin_cos();
        Self::new(
            C { re: cos, im: 0. },
            C { re: 0., im: sin },
            C { re: 0., im: sin },
            C { re: cos, im: 0. },
        )
    }

    /// Rotation by `a` radians around the Y axis.
    pub fn yrot(a: R) -> Self {
        let (sin, cos) = (a / 2.).sin_cos();
        Self::new(
            C { re: cos, im: 0. },
            C { re: -sin, im: 0. },
            C { re: sin, im: 0. },
            C { re: cos, im: 0. },
        )
    }

    /// Rotation by `a` radians around the Z axis.
    pub fn zrot(a: R) -> Self {
        Self::new(
            phase_from_rad(a / 2.),
            C_ZERO,
            C_ZERO,
            phase_from_rad(-a / 2.),
        )
    }

    /// The asymmetric variant of [`zrot`](Self::zrot): |1⟩ picks up the
    /// whole phase.
    pub fn phase(a: R) -> Self {
        Self::new(C_ONE, C_ZERO, C_ZERO, phase_from_rad(a))
    }

    #[inline]
    pub fn at(&self, row: N, col: N) -> C {
        self.m[2 * row + col]
    }
}

impl ops::Mul for Gate {
    type Output = Gate;

    fn mul(self, rhs: Gate) -> Gate {
        let (a, b) = (&self.m, &rhs.m);
        Gate::new(
            a[0] * b[0] + a[1] * b[2],
            a[0] * b[1] + a[1] * b[3],
            a[2] * b[0] + a[3] * b[2],
            a[2] * b[1] + a[3] * b[3],
        )
    }
}

/// A set of control qubits, stored as a bitmap.
///
/// The bitmap never contains the target bit of the gate it belongs to, so
/// equality of two values is equality of the control multisets.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Controls(Mask);

impl Controls {
    pub const NONE: Controls = Controls(0);

    #[inline]
    pub fn from_mask(mask: Mask) -> Self {
        Self(mask)
    }

    #[inline]
    pub fn mask(self) -> Mask {
        self.0
    }

    #[inline]
    pub fn len(self) -> N {
        count_bits(self.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Relabels qubits `s1 ↔ s2`.
    pub fn swap_qubits(self, s1: N, s2: N) -> Self {
        let (b1, b2) = (self.0 >> s1 & 1, self.0 >> s2 & 1);
        if b1 == b2 {
            self
        } else {
            Self(self.0 ^ (1 << s1) ^ (1 << s2))
        }
    }

    /// Set bits, ascending.
    pub fn iter(self) -> impl Iterator<Item = N> {
        let mask = self.0;
        (0..Mask::BITS as N).filter(move |i| mask >> i & 1 == 1)
    }
}

/// A pure state of `n_bit` qubits.
#[derive(Clone, PartialEq, Debug)]
pub struct State {
    psi: Vec<C>,
    n_bit: N,
}

impl State {
    /// The computational basis state `|index⟩`.
    pub fn basis(n_bit: N, index: Mask) -> Self {
        let mut psi = vec![C_ZERO; 1 << n_bit];
        psi[index] = C_ONE;
        Self { psi, n_bit }
    }

    /// Resets into the basis state `|index⟩` in place.
    pub fn reset(&mut self, index: Mask) {
        self.psi.fill(C_ZERO);
        self.psi[index] = C_ONE;
    }

    #[inline]
    pub fn n_bit(&self) -> N {
        self.n_bit
    }

    #[inline]
    pub fn dim(&self) -> N {
        self.psi.len()
    }

    /// Applies `gate` to qubit `tgt`, conditioned on all of `ctrls`.
    pub fn apply_ctrl(&self, gate: &Gate, ctrls: Controls, tgt: N) -> State {
        debug_assert!(ctrls.mask() & (1 << tgt) == 0, "target among controls");
        let t = 1 << tgt;
        let cm = ctrls.mask();
        let mut out = self.psi.clone();
        for idx in 0..self.psi.len() {
            if idx & t == 0 && idx & cm == cm {
                let (a, b) = (self.psi[idx], self.psi[idx | t]);
                out[idx] = gate.at(0, 0) * a + gate.at(0, 1) * b;
                out[idx | t] = gate.at(1, 0) * a + gate.at(1, 1) * b;
            }
        }
        State {
            psi: out,
            n_bit: self.n_bit,
        }
    }

    /// Relabels qubits `s1 ↔ s2` (the SWAP permutation).
    pub fn swap_qubits(&self, s1: N, s2: N) -> State {
        let (m1, m2) = (1 << s1, 1 << s2);
        let mut out = self.psi.clone();
        for (idx, amp) in out.iter_mut().enumerate() {
            let (b1, b2) = (idx & m1 != 0, idx & m2 != 0);
            if b1 != b2 {
                *amp = self.psi[idx ^ m1 ^ m2];
            }
        }
        State {
            psi: out,
            n_bit: self.n_bit,
        }
    }

    /// The discrete Fourier transform of the amplitudes, with the 1/√N
    /// factor that makes it unitary. Reference implementation, O(N²).
    pub fn fourier(&self) -> State {
        let dim = self.psi.len();
        let norm = 1. / (dim as R).sqrt();
        let psi = (0..dim)
            .map(|k| {
                let mut acc = C_ZERO;
                for (j, amp) in self.psi.iter().enumerate() {
                    acc += amp * phase_from_rad(TAU * (j * k % dim) as R / dim as R);
                }
                acc * norm
            })
            .collect();
        State {
            psi,
            n_bit: self.n_bit,
        }
    }

    /// ⟨rhs|lhs⟩.
    pub fn overlap(lhs: &State, rhs: &State) -> C {
        lhs.psi
            .iter()
            .zip(&rhs.psi)
            .map(|(a, b)| b.conj() * a)
            .sum()
    }
}

impl ops::Index<Mask> for State {
    type Output = C;

    fn index(&self, index: Mask) -> &C {
        &self.psi[index]
    }
}

impl ops::IndexMut<Mask> for State {
    fn index_mut(&mut self, index: Mask) -> &mut C {
        &mut self.psi[index]
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, amp) in self.psi.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:.4}{:+.4}i", amp.re, amp.im)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;
    use crate::math::PI;

    fn close(a: C, b: C) -> bool {
        approx_eq!(R, a.re, b.re, epsilon = 1e-12) && approx_eq!(R, a.im, b.im, epsilon = 1e-12)
    }

    #[test]
    fn x_flips_basis() {
        let psi = State::basis(2, 0b00).apply_ctrl(&Gate::X, Controls::NONE, 1);
        assert!(close(psi[0b10], C_ONE));
        assert!(close(psi[0b00], C_ZERO));
    }

    #[test]
    fn controlled_x_respects_controls() {
        let off = State::basis(2, 0b00).apply_ctrl(&Gate::X, Controls::from_mask(0b01), 1);
        assert!(close(off[0b00], C_ONE));
        let on = State::basis(2, 0b01).apply_ctrl(&Gate::X, Controls::from_mask(0b01), 1);
        assert!(close(on[0b11], C_ONE));
    }

    #[test]
    fn fixed_squares() {
        assert_eq!(Gate::T * Gate::T, Gate::S);
        let hh = Gate::H * Gate::H;
        for r in 0..2 {
            for c in 0..2 {
                assert!(close(hh.at(r, c), Gate::I.at(r, c)));
            }
        }
    }

    #[test]
    fn zrot_pi_is_z_up_to_phase() {
        let rz = Gate::zrot(PI);
        // RZ(π) = -i·Z
        let factor = rz.at(0, 0) / Gate::Z.at(0, 0);
        for r in 0..2 {
            for c in 0..2 {
                assert!(close(rz.at(r, c), factor * Gate::Z.at(r, c)));
            }
        }
    }

    #[test]
    fn swap_permutes_amplitudes() {
        let psi = State::basis(3, 0b001).swap_qubits(0, 2);
        assert!(close(psi[0b100], C_ONE));
        assert!(close(psi[0b001], C_ZERO));
    }

    #[test]
    fn fourier_of_ground_state_is_flat() {
        let psi = State::basis(3, 0).fourier();
        for idx in 0..8 {
            assert!(close(psi[idx], C { re: 1. / 8f64.sqrt(), im: 0. }));
        }
    }

    #[test]
    fn fourier_preserves_norm() {
        let mut psi = State::basis(3, 5).apply_ctrl(&Gate::H, Controls::NONE, 0);
        psi = psi.fourier();
        let norm: R = (0..8).map(|i| psi[i].norm_sqr()).sum();
        assert!(approx_eq!(R, norm, 1.0, epsilon = 1e-12));
    }

    #[test]
    fn overlap_of_identical_states_is_one() {
        let psi = State::basis(3, 2).apply_ctrl(&Gate::H, Controls::NONE, 1);
        assert!(close(State::overlap(&psi, &psi), C_ONE));
    }

    #[test]
    fn controls_swap_qubits_toggles_half_set_pairs() {
        let c = Controls::from_mask(0b011);
        assert_eq!(c.swap_qubits(1, 2).mask(), 0b101);
        assert_eq!(c.swap_qubits(0, 1).mask(), 0b011);
        assert_eq!(c.swap_qubits(0, 1).swap_qubits(0, 1).mask(), c.mask());
    }
}
