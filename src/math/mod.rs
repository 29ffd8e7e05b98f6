pub use self::{consts::*, types::*};

pub mod rational;

mod consts {
    use super::types::*;

    pub const C_ONE: C = C { re: 1., im: 0. };
    pub const C_ZERO: C = C { re: 0., im: 0. };
    pub const C_IMAG: C = C { re: 0., im: 1. };

    pub const PI: R = std::f64::consts::PI;
    pub const TAU: R = std::f64::consts::TAU;
    pub const FRAC_1_SQRT_2: R = std::f64::consts::FRAC_1_SQRT_2;
}

mod types {
    pub type N = usize;

    pub type R = f64;
    pub type C = num_complex::Complex<R>;

    /// A set of qubits encoded bitwise: qubit `i` is bit `1 << i`.
    pub type Mask = usize;
}

#[inline]
pub fn count_bits(n: Mask) -> N {
    n.count_ones() as N
}

#[inline]
pub fn phase_from_rad(rad: R) -> C {
    C::from_polar(1.0, rad)
}
