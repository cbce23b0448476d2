//! Residue classes g(x) mod f(x) over GF(p).
//!
//! Products are formed by convolution of the coefficient vectors and
//! reduced with a table of x^n ... x^(2n-2) mod f precomputed when the
//! residue is constructed, so repeated squaring never re-divides by f.

use std::fmt;
use std::ops::Mul;

use crate::bigint::BigInt;
use crate::error::{Error, Result};
use crate::modular::{add_mod, multiply_mod};
use crate::poly::Polynomial;

/// Coefficient k of s(x) * t(x), summing s_i * t_{k-i} for i in
/// [lower, upper], in GF(p).
pub fn convolve(s: &Polynomial, t: &Polynomial, k: usize, lower: usize, upper: usize) -> u64 {
    let p = s.modulus();
    let mut acc = 0u64;
    for i in lower..=upper {
        if i > k {
            break;
        }
        acc = add_mod(acc, multiply_mod(s.coeff(i), t.coeff(k - i), p), p);
    }
    acc
}

/// Coefficient k of t(x)^2 restricted to indices in [lower, upper].
pub fn auto_convolve(t: &Polynomial, k: usize, lower: usize, upper: usize) -> u64 {
    convolve(t, t, k, lower, upper)
}

/// Coefficient k of s(x) * t(x) where both have degree below n.
pub fn coeff_of_product(s: &Polynomial, t: &Polynomial, k: usize, n: usize) -> u64 {
    let lower = k.saturating_sub(n - 1);
    let upper = k.min(n - 1);
    convolve(s, t, k, lower, upper)
}

/// Coefficient k of g(x)^2 where g has degree below n, using the symmetry
/// sum 2 g_i g_{k-i} (i < k/2) plus the middle square when k is even.
pub fn coeff_of_square(g: &Polynomial, k: usize, n: usize) -> u64 {
    let p = g.modulus();
    let lower = k.saturating_sub(n - 1);
    let mut acc = 0u64;
    if k % 2 == 0 {
        if k / 2 >= 1 {
            acc = auto_convolve(g, k, lower, k / 2 - 1);
        }
        acc = times_two(acc, p);
        let mid = g.coeff(k / 2);
        acc = add_mod(acc, multiply_mod(mid, mid, p), p);
    } else {
        acc = times_two(auto_convolve(g, k, lower, (k - 1) / 2), p);
    }
    acc
}

fn times_two(a: u64, p: u64) -> u64 {
    add_mod(a, a, p)
}

/// The residue class of g(x) modulo a monic polynomial f(x) over GF(p).
///
/// The residue is reduced below deg f at construction and stays reduced
/// after every operation.
///
/// # Example
///
/// ```
/// use gfprim::{PolyMod, Polynomial};
///
/// let f: Polynomial = "x^4 + x + 1, 2".parse().unwrap();
/// let g: Polynomial = "x^4 + x^2 + 1, 2".parse().unwrap();
/// let r = PolyMod::new(&g, &f).unwrap();
/// assert_eq!(r.to_string(), "x ^ 2 + x, 2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PolyMod {
    residue: Polynomial,
    f: Polynomial,
    /// Row j holds the coefficients of x^(n+j) mod f, for j = 0 ... n-2.
    x_powers: Vec<Vec<u64>>,
}

impl PolyMod {
    /// Reduce g modulo f by long division and precompute the reduction
    /// table.
    ///
    /// # Errors
    ///
    /// `Error::Domain` when the moduli differ, f is not monic, or
    /// deg f < 1.
    pub fn new(g: &Polynomial, f: &Polynomial) -> Result<Self> {
        if g.modulus() != f.modulus() {
            return Err(Error::Domain(format!(
                "residue modulus {} does not match f's modulus {}",
                g.modulus(),
                f.modulus()
            )));
        }
        let n = f.degree();
        if n < 1 {
            return Err(Error::Domain(
                "modulus polynomial must have positive degree".to_string(),
            ));
        }
        if f.coeff(n) != 1 {
            return Err(Error::Domain(format!(
                "modulus polynomial {} is not monic",
                f
            )));
        }

        let (_, residue) = g.div_rem(f)?;
        Ok(PolyMod {
            residue,
            x_powers: x_power_table(f),
            f: f.clone(),
        })
    }

    /// Parse g from its text form and reduce it modulo f.
    pub fn parse(s: &str, f: &Polynomial) -> Result<Self> {
        Self::new(&s.parse()?, f)
    }

    /// The residue x mod f.
    pub fn x(f: &Polynomial) -> Result<Self> {
        Self::new(&Polynomial::new(vec![0, 1], f.modulus())?, f)
    }

    pub fn modulus(&self) -> u64 {
        self.f.modulus()
    }

    /// The modulus polynomial f.
    pub fn f(&self) -> &Polynomial {
        &self.f
    }

    /// The reduced residue, with degree below deg f.
    pub fn residue(&self) -> &Polynomial {
        &self.residue
    }

    /// True when the residue is a constant, i.e. an element of GF(p).
    pub fn is_integer(&self) -> bool {
        self.residue.is_integer()
    }

    /// Multiply by x in place: shift the coefficients up and cancel any
    /// degree-n overflow with the top coefficient times f.
    ///
    /// # Example
    ///
    /// ```
    /// use gfprim::{PolyMod, Polynomial};
    ///
    /// let f: Polynomial = "x^4 + x^2 + 2x + 3, 5".parse().unwrap();
    /// let mut r = PolyMod::parse("2x^3 + 4x^2 + 3x, 5", &f).unwrap();
    /// r.times_x();
    /// assert_eq!(r.to_string(), "4 x ^ 3 + x ^ 2 + x + 4, 5");
    /// ```
    pub fn times_x(&mut self) {
        let p = self.modulus();
        let n = self.f.degree();
        let mut shifted = vec![0u64; n + 1];
        for i in 0..=self.residue.degree() {
            shifted[i + 1] = self.residue.coeff(i);
        }
        let overflow = shifted[n];
        if overflow != 0 {
            for i in 0..n {
                let sub = multiply_mod(overflow, self.f.coeff(i), p);
                shifted[i] = add_mod(shifted[i], p - sub, p);
            }
        }
        shifted.truncate(n);
        self.residue = Polynomial::new(shifted, p).expect("modulus already validated");
    }

    /// Square in place by autoconvolution and table reduction.
    pub fn square(&mut self) {
        let n = self.f.degree();
        let product: Vec<u64> = (0..=2 * n - 2)
            .map(|k| coeff_of_square(&self.residue, k, n))
            .collect();
        self.residue = self.reduce(&product);
    }

    /// Multiply by another residue in place.
    ///
    /// # Panics
    ///
    /// Panics when the modulus polynomials differ.
    pub fn multiply(&mut self, other: &PolyMod) {
        assert_eq!(self.f, other.f, "PolyMod multiply across moduli");
        let n = self.f.degree();
        let product: Vec<u64> = (0..=2 * n - 2)
            .map(|k| coeff_of_product(&self.residue, &other.residue, k, n))
            .collect();
        self.residue = self.reduce(&product);
    }

    /// x^e mod f for a BigInt exponent, by left-to-right binary
    /// exponentiation over `square` and `multiply`.
    ///
    /// # Example
    ///
    /// ```
    /// use gfprim::{BigInt, PolyMod, Polynomial};
    ///
    /// let f: Polynomial = "x^4 + x^2 + 2x + 3, 5".parse().unwrap();
    /// let x = PolyMod::x(&f).unwrap();
    /// let r = x.pow(&BigInt::from(156u64));
    /// assert_eq!(r.to_string(), "3, 5");
    /// assert!(r.is_integer());
    /// ```
    pub fn pow(&self, e: &BigInt) -> PolyMod {
        let one = Polynomial::new(vec![1], self.modulus()).expect("modulus already validated");
        let mut acc = PolyMod {
            residue: one,
            f: self.f.clone(),
            x_powers: self.x_powers.clone(),
        };
        for i in (0..e.ceil_lg()).rev() {
            acc.square();
            if e.test_bit(i) {
                acc.multiply(self);
            }
        }
        acc
    }

    /// Fold a length 2n-1 product coefficient vector back below degree n
    /// using the precomputed x^(n+j) rows.
    fn reduce(&self, product: &[u64]) -> Polynomial {
        let p = self.modulus();
        let n = self.f.degree();
        let mut coeffs: Vec<u64> = product[..n].to_vec();
        for j in 0..n - 1 {
            let c = product[n + j];
            if c == 0 {
                continue;
            }
            for i in 0..n {
                coeffs[i] = add_mod(coeffs[i], multiply_mod(c, self.x_powers[j][i], p), p);
            }
        }
        Polynomial::new(coeffs, p).expect("modulus already validated")
    }
}

/// Rows x^n ... x^(2n-2) mod f, each of length n; f is monic.
fn x_power_table(f: &Polynomial) -> Vec<Vec<u64>> {
    let p = f.modulus();
    let n = f.degree();
    if n < 2 {
        return Vec::new();
    }

    // x^n = -(c_0 + c_1 x + ... + c_{n-1} x^{n-1})  (mod f)
    let first: Vec<u64> = (0..n).map(|i| (p - f.coeff(i)) % p).collect();
    let mut rows = vec![first];

    for _ in 1..n - 1 {
        let prev = rows.last().unwrap();
        let overflow = prev[n - 1];
        let mut next = vec![0u64; n];
        for i in 1..n {
            next[i] = prev[i - 1];
        }
        if overflow != 0 {
            for i in 0..n {
                next[i] = add_mod(next[i], multiply_mod(overflow, rows[0][i], p), p);
            }
        }
        rows.push(next);
    }
    rows
}

impl Mul for &PolyMod {
    type Output = PolyMod;

    /// # Panics
    ///
    /// Panics when the modulus polynomials differ.
    fn mul(self, rhs: &PolyMod) -> PolyMod {
        let mut out = self.clone();
        out.multiply(rhs);
        out
    }
}

impl Mul for PolyMod {
    type Output = PolyMod;

    fn mul(self, rhs: PolyMod) -> PolyMod {
        &self * &rhs
    }
}

impl fmt::Display for PolyMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.residue, f)
    }
}

impl fmt::Debug for PolyMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mod {})", self.residue, self.f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(s: &str) -> Polynomial {
        s.parse().unwrap()
    }

    #[test]
    fn construction_reduces() {
        let f = poly("x^4 + x + 1, 2");
        let g = poly("x^4 + x^2 + 1, 2");
        let r = PolyMod::new(&g, &f).unwrap();
        assert_eq!(r.to_string(), "x ^ 2 + x, 2");
        assert_eq!(r.f().to_string(), "x ^ 4 + x + 1, 2");
        assert_eq!(r.modulus(), 2);
    }

    #[test]
    fn construction_from_string() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let r = PolyMod::parse("x^6 + 2x^2 + 3x + 2, 5", &f).unwrap();
        assert_eq!(r.to_string(), "3 x ^ 3, 5");
        assert_eq!(r.f().to_string(), "x ^ 4 + x ^ 2 + 2 x + 3, 5");
        assert_eq!(r.modulus(), 5);
    }

    #[test]
    fn construction_rejects_mismatched_moduli() {
        let f = poly("x^4 + x + 1, 2");
        let g = poly("x^2 + 1, 3");
        assert!(PolyMod::new(&g, &f).is_err());
    }

    #[test]
    fn construction_rejects_non_monic_f() {
        let f = poly("2x^4 + x + 1, 5");
        let g = poly("x^2 + 1, 5");
        assert!(PolyMod::new(&g, &f).is_err());
    }

    #[test]
    fn construction_rejects_constant_f() {
        let f = poly("3, 5");
        let g = poly("x^2 + 1, 5");
        assert!(PolyMod::new(&g, &f).is_err());
    }

    #[test]
    fn times_x_with_overflow() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let mut r = PolyMod::parse("2x^3 + 4x^2 + 3x, 5", &f).unwrap();
        r.times_x();
        assert_eq!(r.to_string(), "4 x ^ 3 + x ^ 2 + x + 4, 5");
        assert!(r.residue().degree() < f.degree());
    }

    #[test]
    fn times_x_without_overflow() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let mut r = PolyMod::parse("x + 1, 5", &f).unwrap();
        r.times_x();
        assert_eq!(r.to_string(), "x ^ 2 + x, 5");
    }

    #[test]
    fn auto_convolve_fixture() {
        let t = poly("4x^3 + x^2 + 3x + 3, 5");
        assert_eq!(auto_convolve(&t, 3, 1, 3), 3);
    }

    #[test]
    fn convolve_fixture() {
        let s = poly("4x^3 + x^2 + 3x + 3, 5");
        let t = poly("4x^3 + x^2 + 3x + 3, 5");
        assert_eq!(convolve(&s, &t, 3, 1, 3), 3);
    }

    #[test]
    fn coeff_of_square_fixture() {
        let g = poly("4x^3 + x^2 + 3x + 3, 5");
        let expected = [4, 3, 0, 0, 0, 3, 1];
        for (k, &want) in expected.iter().enumerate() {
            assert_eq!(coeff_of_square(&g, k, 4), want, "coefficient {}", k);
        }
    }

    #[test]
    fn coeff_of_product_fixture() {
        let s = poly("4x^3 + x^2 + 4, 5");
        let t = poly("3x^2 + x + 2, 5");
        let expected = [3, 4, 4, 4, 2, 2, 0];
        for (k, &want) in expected.iter().enumerate() {
            assert_eq!(coeff_of_product(&s, &t, k, 4), want, "coefficient {}", k);
        }
    }

    #[test]
    fn square_fixture() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let mut r = PolyMod::parse("4x^3 + x^2 + 4, 5", &f).unwrap();
        r.square();
        assert_eq!(r.to_string(), "2 x ^ 3 + 4 x ^ 2 + x + 1, 5");
    }

    #[test]
    fn multiply_fixture() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let s = PolyMod::parse("4x^3 + x^2 + 4, 5", &f).unwrap();
        let t = PolyMod::parse("3x^2 + x + 2, 5", &f).unwrap();
        let product = &s * &t;
        assert_eq!(product.to_string(), "2 x ^ 3 + 3 x ^ 2 + 4 x + 2, 5");
    }

    #[test]
    fn multiply_matches_square() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let g = PolyMod::parse("4x^3 + x^2 + 4, 5", &f).unwrap();
        let mut squared = g.clone();
        squared.square();
        assert_eq!(&g * &g, squared);
    }

    #[test]
    fn multiply_agrees_with_reduce_after_product() {
        // (g mod f) * (h mod f) == (g * h) mod f
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let g = poly("3x^3 + x + 1, 5");
        let h = poly("2x^3 + 4x^2 + 2, 5");

        let via_polymod = &PolyMod::new(&g, &f).unwrap() * &PolyMod::new(&h, &f).unwrap();

        // Full product of g and h by convolution, then one reduction.
        let deg = g.degree() + h.degree();
        let wide = deg + 1;
        let coeffs: Vec<u64> = (0..=deg)
            .map(|k| coeff_of_product(&g, &h, k, wide))
            .collect();
        let product = Polynomial::new(coeffs, 5).unwrap();
        let reduced = PolyMod::new(&product, &f).unwrap();

        assert_eq!(via_polymod, reduced);
    }

    #[test]
    fn pow_x_to_156() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let x = PolyMod::x(&f).unwrap();
        let r = x.pow(&BigInt::from(156u64));
        assert_eq!(r.to_string(), "3, 5");
        assert!(r.is_integer());
    }

    #[test]
    fn pow_edge_exponents() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let x = PolyMod::x(&f).unwrap();
        assert_eq!(x.pow(&BigInt::zero()).to_string(), "1, 5");
        assert_eq!(x.pow(&BigInt::one()), x);

        // x^4 wraps around the modulus polynomial.
        let r = x.pow(&BigInt::from(4u64));
        assert_eq!(r.to_string(), "4 x ^ 2 + 3 x + 2, 5");
    }

    #[test]
    fn pow_degree_stays_reduced() {
        let f = poly("x^4 + x^2 + 2x + 3, 5");
        let x = PolyMod::x(&f).unwrap();
        for e in [1u64, 2, 5, 24, 156, 624] {
            let r = x.pow(&BigInt::from(e));
            assert!(r.residue().degree() < f.degree());
        }
    }

    #[test]
    fn degree_one_modulus() {
        // x = -2 = 3 (mod x + 2, 5)
        let f = poly("x + 2, 5");
        let mut r = PolyMod::parse("1, 5", &f).unwrap();
        r.times_x();
        assert_eq!(r.to_string(), "3, 5");
    }
}
