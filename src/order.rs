//! The primitivity engine: irreducibility by the nullity of Q - I, then
//! the order-of-x conditions derived from the factorization of
//! r = (p^n - 1)/(p - 1).

use tracing::debug;

use crate::bigint::BigInt;
use crate::error::{Error, Result};
use crate::factor::{is_almost_surely_prime, Factorization, FactoringAlgorithm, PrimeFactor};
use crate::modular::{add_mod, inverse_mod_p, multiply_mod, PrimitiveRoot};
use crate::poly::Polynomial;
use crate::polymod::PolyMod;

/// The reduced Q - I matrix and what its reduction found.
struct Reduction {
    matrix: Vec<Vec<u64>>,
    nullity: usize,
    /// False when the reduction stopped early at nullity 2.
    exact: bool,
}

/// Decides whether a monic polynomial f of degree n over GF(p) is
/// primitive.
///
/// Construction factors p^n - 1 (the dominant cost; the packaged factor
/// tables are consulted first) and derives the factorization of
/// r = (p^n - 1)/(p - 1). The Q - I reduction is computed lazily and
/// cached until [`PolyOrder::reset_polynomial`].
///
/// # Example
///
/// ```no_run
/// use gfprim::{PolyOrder, Polynomial};
///
/// let f: Polynomial = "x^4 + x^2 + 2x + 3, 5".parse().unwrap();
/// let mut order = PolyOrder::new(&f).unwrap();
/// assert!(order.is_primitive().unwrap());
/// ```
pub struct PolyOrder {
    f: Polynomial,
    p: u64,
    n: usize,
    max_num_poly: BigInt,
    factors_of_p_to_n_minus_1: Factorization<BigInt>,
    r: BigInt,
    factors_of_r: Factorization<BigInt>,
    num_prim_poly: BigInt,
    reduction: Option<Reduction>,
}

impl PolyOrder {
    /// Set up the order tests for f: validates f, factors p^n - 1, and
    /// precomputes r, its factorization, and the primitive-polynomial
    /// count phi(p^n - 1)/n.
    ///
    /// # Errors
    ///
    /// `Error::Domain` when f is non-monic, constant, or has a composite
    /// modulus; factoring errors from the table ladder pass through.
    pub fn new(f: &Polynomial) -> Result<Self> {
        let p = f.modulus();
        let n = f.degree();
        if n < 1 {
            return Err(Error::Domain(
                "order tests need a polynomial of degree at least 1".to_string(),
            ));
        }
        if f.coeff(n) != 1 {
            return Err(Error::Domain(format!("{} is not monic", f)));
        }
        if !is_almost_surely_prime(&p) {
            return Err(Error::Domain(format!("modulus {} is not prime", p)));
        }

        debug!(%f, p, n, "factoring p^n - 1");
        let factors_of_p_to_n_minus_1 =
            Factorization::<BigInt>::for_power(p, n as u32, FactoringAlgorithm::Automatic)?;

        let max_num_poly = BigInt::power(p, n as u64);
        let p_to_n_minus_1 = &max_num_poly - &BigInt::one();
        let r = &p_to_n_minus_1 / &BigInt::from(p - 1);

        let factors_of_p_minus_1 =
            Factorization::<u64>::new(p - 1, FactoringAlgorithm::Automatic)?;
        let factors_of_r = derive_factors_of_r(
            r.clone(),
            &factors_of_p_to_n_minus_1,
            &factors_of_p_minus_1,
        );

        let num_prim_poly = &factors_of_p_to_n_minus_1.euler_phi() / &BigInt::from(n as u64);
        debug!(%r, factors = %factors_of_r, "order test constants ready");

        Ok(PolyOrder {
            f: f.clone(),
            p,
            n,
            max_num_poly,
            factors_of_p_to_n_minus_1,
            r,
            factors_of_r,
            num_prim_poly,
            reduction: None,
        })
    }

    /// Swap in a new polynomial, discarding the cached Q - I reduction.
    /// The factorization work is kept when the new f has the same
    /// modulus and degree.
    pub fn reset_polynomial(&mut self, f: &Polynomial) -> Result<()> {
        if f.modulus() != self.p || f.degree() != self.n {
            *self = PolyOrder::new(f)?;
            return Ok(());
        }
        if f.coeff(self.n) != 1 {
            return Err(Error::Domain(format!("{} is not monic", f)));
        }
        self.f = f.clone();
        self.reduction = None;
        Ok(())
    }

    pub fn polynomial(&self) -> &Polynomial {
        &self.f
    }

    pub fn modulus(&self) -> u64 {
        self.p
    }

    /// p^n: the number of polynomials of degree n over GF(p) with a
    /// fixed leading coefficient.
    pub fn max_num_poly(&self) -> &BigInt {
        &self.max_num_poly
    }

    /// r = (p^n - 1)/(p - 1).
    pub fn r(&self) -> &BigInt {
        &self.r
    }

    /// The factorization of r.
    pub fn factors_of_r(&self) -> &Factorization<BigInt> {
        &self.factors_of_r
    }

    /// The factorization of p^n - 1.
    pub fn factors_of_p_to_n_minus_1(&self) -> &Factorization<BigInt> {
        &self.factors_of_p_to_n_minus_1
    }

    /// phi(p^n - 1)/n: how many primitive polynomials of degree n exist
    /// over GF(p).
    pub fn num_primitive_polynomials(&self) -> &BigInt {
        &self.num_prim_poly
    }

    /// Nullity of Q - I from the most recent reduction.
    pub fn nullity(&self) -> Option<usize> {
        self.reduction.as_ref().map(|r| r.nullity)
    }

    /// The reduced Q - I matrix from the most recent reduction.
    pub fn reduced_q_matrix(&self) -> Option<&[Vec<u64>]> {
        self.reduction.as_ref().map(|r| r.matrix.as_slice())
    }

    /// True when f has two or more distinct irreducible factors, i.e.
    /// nullity(Q - I) >= 2. With `early_out` the reduction stops as soon
    /// as a second null dimension appears.
    pub fn has_multiple_distinct_factors(&mut self, early_out: bool) -> Result<bool> {
        let need_exact = !early_out;
        let usable = match &self.reduction {
            Some(r) => r.exact || !need_exact,
            None => false,
        };
        if !usable {
            let reduction = self.find_nullity(early_out)?;
            self.reduction = Some(reduction);
        }
        Ok(self.reduction.as_ref().unwrap().nullity >= 2)
    }

    /// f is irreducible exactly when Q - I has nullity 1.
    pub fn is_irreducible(&mut self) -> Result<bool> {
        Ok(!self.has_multiple_distinct_factors(true)?)
    }

    /// The element a = (-1)^n a_0 of GF(p) that x^r must land on.
    fn order_test_constant(&self) -> u64 {
        let a0 = self.f.coeff(0);
        if self.n % 2 == 0 {
            a0
        } else {
            (self.p - a0) % self.p
        }
    }

    /// The order-of-x conditions: x^r mod f must be the constant
    /// (-1)^n a_0, and for every distinct prime q of r with q not
    /// dividing p - 1, x^(r/q) mod f must not collapse into GF(p).
    ///
    /// Returns the constant when the conditions hold.
    pub fn order_r(&self) -> Result<Option<u64>> {
        let x = PolyMod::x(&self.f)?;
        let a = self.order_test_constant();

        let xr = x.pow(&self.r);
        if !(xr.is_integer() && xr.residue().coeff(0) == a) {
            debug!(%xr, expected = a, "x^r missed the required constant");
            return Ok(None);
        }

        for q in self.factors_of_r.distinct_prime_factors() {
            if let Ok(q_small) = q.to_u64() {
                if (self.p - 1) % q_small == 0 {
                    continue;
                }
            }
            let e = &self.r / q;
            if x.pow(&e).is_integer() {
                debug!(%q, "x^(r/q) collapsed into GF(p)");
                return Ok(None);
            }
        }
        Ok(Some(a))
    }

    /// The full primitivity test.
    ///
    /// A monic f of degree n over GF(p) is primitive when it has no
    /// linear factor, is irreducible (nullity 1), its constant
    /// a = (-1)^n a_0 is a primitive root of p, and the order-of-x
    /// conditions of [`PolyOrder::order_r`] hold.
    pub fn is_primitive(&mut self) -> Result<bool> {
        if self.n >= 2 && self.f.has_linear_factor() {
            return Ok(false);
        }
        if self.has_multiple_distinct_factors(true)? {
            return Ok(false);
        }

        let a = self.order_test_constant();
        if !PrimitiveRoot::new(self.p)?.is_root(a) {
            return Ok(false);
        }

        Ok(self.order_r()?.is_some())
    }

    /// Build Q - I: row i holds the coefficients of x^(p*i) mod f, with
    /// the identity subtracted.
    fn generate_q_minus_i(&self) -> Result<Vec<Vec<u64>>> {
        let x = PolyMod::x(&self.f)?;
        let x_to_p = x.pow(&BigInt::from(self.p));

        let mut rows = Vec::with_capacity(self.n);
        let mut acc = x.pow(&BigInt::zero());
        for i in 0..self.n {
            let row: Vec<u64> = (0..self.n).map(|j| acc.residue().coeff(j)).collect();
            rows.push(row);
            if i + 1 < self.n {
                acc.multiply(&x_to_p);
            }
        }

        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = add_mod(row[i], self.p - 1, self.p);
        }
        Ok(rows)
    }

    /// Null-space reduction of Q - I over GF(p) by column operations
    /// (Knuth TAOCP vol. 2, 4.6.2 Algorithm N): each pivot column is
    /// scaled so the pivot becomes -1, then cleared out of its row.
    fn find_nullity(&self, early_out: bool) -> Result<Reduction> {
        let p = self.p;
        let n = self.n;
        let mut m = self.generate_q_minus_i()?;
        let mut tagged = vec![false; n];
        let mut nullity = 0;

        for k in 0..n {
            let pivot = (0..n).find(|&j| !tagged[j] && m[k][j] != 0);
            match pivot {
                Some(j) => {
                    let inv = inverse_mod_p(m[k][j], p)?;
                    let scale = multiply_mod(p - 1, inv, p);
                    for row in m.iter_mut() {
                        row[j] = multiply_mod(row[j], scale, p);
                    }
                    for i in 0..n {
                        if i == j {
                            continue;
                        }
                        let c = m[k][i];
                        if c == 0 {
                            continue;
                        }
                        for row in m.iter_mut() {
                            let add = multiply_mod(c, row[j], p);
                            row[i] = add_mod(row[i], add, p);
                        }
                    }
                    tagged[j] = true;
                }
                None => {
                    nullity += 1;
                    if early_out && nullity >= 2 {
                        return Ok(Reduction {
                            matrix: m,
                            nullity,
                            exact: false,
                        });
                    }
                }
            }
        }

        Ok(Reduction {
            matrix: m,
            nullity,
            exact: true,
        })
    }
}

/// The factorization of r = (p^n - 1)/(p - 1), obtained from the
/// factorizations of p^n - 1 and p - 1 by subtracting multiplicities.
fn derive_factors_of_r(
    r: BigInt,
    factors_of_p_to_n_minus_1: &Factorization<BigInt>,
    factors_of_p_minus_1: &Factorization<u64>,
) -> Factorization<BigInt> {
    let mut parts = Vec::new();
    for pf in factors_of_p_to_n_minus_1.factors() {
        let in_p_minus_1 = factors_of_p_minus_1
            .factors()
            .iter()
            .find(|small| BigInt::from(small.prime) == pf.prime)
            .map(|small| small.multiplicity)
            .unwrap_or(0);
        let multiplicity = pf.multiplicity.saturating_sub(in_p_minus_1);
        if multiplicity > 0 {
            parts.push(PrimeFactor::new(pf.prime.clone(), multiplicity));
        }
    }
    Factorization::from_parts(r, parts)
}
