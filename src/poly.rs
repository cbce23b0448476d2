//! Dense polynomials over GF(p) with a runtime prime modulus.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::modular::{add_mod, inverse_mod_p, multiply_mod};

/// Degrees above this are rejected by the parser.
const MAX_PARSED_DEGREE: usize = 1 << 20;

/// A polynomial over GF(p).
///
/// Coefficients are stored in ascending order of degree, each reduced into
/// `[0, p)`; the vector is trimmed so the top coefficient is non-zero, and
/// the zero polynomial is the single coefficient 0 with degree 0.
///
/// The canonical text form is `a_n x ^ n + ... + a_1 x + a_0, p`; a missing
/// `, p` defaults the modulus to 2, and negative coefficients are rejected.
///
/// # Example
///
/// ```
/// use gfprim::Polynomial;
///
/// let f: Polynomial = "2x^2 + 1, 3".parse().unwrap();
/// assert_eq!(f.degree(), 2);
/// assert_eq!(f.modulus(), 3);
/// assert_eq!((f.coeff(0), f.coeff(1), f.coeff(2)), (1, 0, 2));
/// assert_eq!(f.to_string(), "2 x ^ 2 + 1, 3");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Polynomial {
    modulus: u64,
    coeffs: Vec<u64>,
}

impl Polynomial {
    /// Build from ascending coefficients, reducing each modulo p.
    ///
    /// # Errors
    ///
    /// `Error::Domain` when `p < 2`.
    pub fn new(coeffs: Vec<u64>, p: u64) -> Result<Self> {
        if p < 2 {
            return Err(Error::Domain(format!("polynomial modulus {} below 2", p)));
        }
        let mut poly = Polynomial {
            modulus: p,
            coeffs: coeffs.into_iter().map(|c| c % p).collect(),
        };
        poly.normalize();
        Ok(poly)
    }

    /// The zero polynomial over GF(p).
    pub fn zero(p: u64) -> Result<Self> {
        Self::new(vec![0], p)
    }

    /// The monomial x^n over GF(p): the first element of the trial
    /// enumeration of monic polynomials of degree n.
    pub fn initial_trial_poly(n: usize, p: u64) -> Result<Self> {
        let mut coeffs = vec![0; n + 1];
        coeffs[n] = 1;
        Self::new(coeffs, p)
    }

    /// Advance to the next monic polynomial of the same degree.
    ///
    /// The lower coefficients (c_0 ... c_{n-1}) count up as a little-endian
    /// radix-p integer while c_n stays 1, so every monic polynomial of
    /// degree n is visited exactly once. Returns `false` when the counter
    /// wraps back around to x^n.
    ///
    /// # Example
    ///
    /// ```
    /// use gfprim::Polynomial;
    ///
    /// let mut f = Polynomial::initial_trial_poly(4, 5).unwrap();
    /// for _ in 0..3 {
    ///     f.next_trial_poly();
    /// }
    /// assert_eq!(f.to_string(), "x ^ 4 + 3, 5");
    /// ```
    pub fn next_trial_poly(&mut self) -> bool {
        let n = self.degree();
        if n == 0 {
            return false;
        }
        // The coefficient vector always holds n + 1 entries here because
        // the leading coefficient stays fixed at 1.
        for i in 0..n {
            self.coeffs[i] += 1;
            if self.coeffs[i] == self.modulus {
                self.coeffs[i] = 0;
            } else {
                return true;
            }
        }
        false
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Highest index with a non-zero coefficient; 0 for the zero polynomial.
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs == [0]
    }

    /// True when the polynomial is a constant, i.e. an element of GF(p).
    pub fn is_integer(&self) -> bool {
        self.degree() == 0
    }

    /// Coefficient of x^i; 0 beyond the degree.
    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs.get(i).copied().unwrap_or(0)
    }

    /// All coefficients, ascending, trimmed.
    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    /// Evaluate at x in GF(p) by Horner's rule, reducing after every
    /// multiply-add.
    ///
    /// # Example
    ///
    /// ```
    /// use gfprim::Polynomial;
    ///
    /// let f: Polynomial = "x^4 + 3x + 3, 5".parse().unwrap();
    /// assert_eq!(f.eval(2), 0);
    /// assert_eq!(f.eval(3), 3);
    /// assert_eq!(f.eval(0), 3);
    /// ```
    pub fn eval(&self, x: u64) -> u64 {
        let p = self.modulus;
        let x = x % p;
        let mut acc = 0u64;
        for &c in self.coeffs.iter().rev() {
            acc = add_mod(multiply_mod(acc, x, p), c, p);
        }
        acc
    }

    /// True when f(a) = 0 for some a in GF(p); a = 0 covers the factor x.
    ///
    /// Exhaustive over the field, so only sensible for small p.
    pub fn has_linear_factor(&self) -> bool {
        (0..self.modulus).any(|a| self.eval(a) == 0)
    }

    /// Quotient and remainder of division in GF(p)[x].
    ///
    /// # Errors
    ///
    /// `Error::Domain` on a zero divisor or mismatched moduli.
    pub fn div_rem(&self, divisor: &Polynomial) -> Result<(Polynomial, Polynomial)> {
        if self.modulus != divisor.modulus {
            return Err(Error::Domain(format!(
                "polynomial division across moduli {} and {}",
                self.modulus, divisor.modulus
            )));
        }
        if divisor.is_zero() {
            return Err(Error::Domain("polynomial division by zero".to_string()));
        }

        let p = self.modulus;
        let dv = divisor.degree();
        if self.degree() < dv || self.is_zero() {
            return Ok((Polynomial::zero(p)?, self.clone()));
        }

        let lead_inv = inverse_mod_p(divisor.coeff(dv), p)?;
        let mut rem = self.coeffs.clone();
        let mut quot = vec![0u64; self.degree() - dv + 1];

        for k in (0..quot.len()).rev() {
            let q = multiply_mod(rem[k + dv], lead_inv, p);
            quot[k] = q;
            if q == 0 {
                continue;
            }
            for i in 0..=dv {
                // rem[k + i] -= q * divisor[i]  (mod p)
                let sub = multiply_mod(q, divisor.coeff(i), p);
                rem[k + i] = add_mod(rem[k + i], p - sub, p);
            }
        }

        Ok((Polynomial::new(quot, p)?, Polynomial::new(rem, p)?))
    }

    fn normalize(&mut self) {
        while self.coeffs.len() > 1 && self.coeffs.last() == Some(&0) {
            self.coeffs.pop();
        }
        if self.coeffs.is_empty() {
            self.coeffs.push(0);
        }
    }
}

/// # Panics
///
/// Panics when the moduli differ.
impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        assert_eq!(
            self.modulus, rhs.modulus,
            "polynomial addition across moduli"
        );
        let p = self.modulus;
        let len = self.coeffs.len().max(rhs.coeffs.len());
        let coeffs = (0..len)
            .map(|i| add_mod(self.coeff(i), rhs.coeff(i), p))
            .collect();
        Polynomial::new(coeffs, p).expect("modulus already validated")
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Polynomial) -> Polynomial {
        &self + &rhs
    }
}

/// Scalar multiplication in GF(p).
impl std::ops::Mul<u64> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: u64) -> Polynomial {
        let p = self.modulus;
        let coeffs = self
            .coeffs
            .iter()
            .map(|&c| multiply_mod(c, rhs, p))
            .collect();
        Polynomial::new(coeffs, p).expect("modulus already validated")
    }
}

impl std::ops::Mul<u64> for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: u64) -> Polynomial {
        &self * rhs
    }
}

impl FromStr for Polynomial {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.contains('-') {
            return Err(Error::Parse(format!(
                "negative coefficient in polynomial {:?}; coefficients must be >= 0",
                s
            )));
        }

        let mut parts = s.split(',');
        let body = parts.next().unwrap_or("");
        let modulus = match parts.next() {
            None => 2,
            Some(m) => m
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::Parse(format!("invalid modulus {:?}", m.trim())))?,
        };
        if parts.next().is_some() {
            return Err(Error::Parse(format!("more than one ',' in {:?}", s)));
        }
        if modulus < 2 {
            return Err(Error::Domain(format!(
                "polynomial modulus {} below 2",
                modulus
            )));
        }

        let mut terms = Vec::new();
        for term in body.split('+') {
            terms.push(parse_term(term)?);
        }

        let max_exp = terms.iter().map(|&(e, _)| e).max().unwrap_or(0);
        if max_exp > MAX_PARSED_DEGREE {
            return Err(Error::Parse(format!("degree {} too large", max_exp)));
        }
        let mut coeffs = vec![0u64; max_exp + 1];
        for (e, c) in terms {
            coeffs[e] = add_mod(coeffs[e], c % modulus, modulus);
        }
        Polynomial::new(coeffs, modulus)
    }
}

/// Parse one `a`, `a x`, `x ^ k` or `a * x ^ k` term into (exponent, coefficient).
fn parse_term(term: &str) -> Result<(usize, u64)> {
    let bad = || Error::Parse(format!("expected a x ^ k, a x, x, or a in term {:?}", term));

    let mut rest = term.trim();
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let coeff = if digits_end > 0 {
        let c = rest[..digits_end].parse::<u64>().map_err(|_| bad())?;
        rest = rest[digits_end..].trim_start();
        Some(c)
    } else {
        None
    };

    rest = rest.strip_prefix('*').map(str::trim_start).unwrap_or(rest);

    if let Some(after_x) = rest.strip_prefix('x') {
        let mut rest = after_x.trim_start();
        let exp = if let Some(after_caret) = rest.strip_prefix('^') {
            rest = after_caret.trim_start();
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if end == 0 {
                return Err(bad());
            }
            let e = rest[..end].parse::<usize>().map_err(|_| bad())?;
            rest = rest[end..].trim_start();
            e
        } else {
            1
        };
        if !rest.is_empty() {
            return Err(bad());
        }
        Ok((exp, coeff.unwrap_or(1)))
    } else if rest.is_empty() {
        // Bare constant.
        coeff.map(|c| (0, c)).ok_or_else(bad)
    } else {
        Err(bad())
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0, {}", self.modulus);
        }
        let mut first = true;
        for k in (0..=self.degree()).rev() {
            let c = self.coeff(k);
            if c == 0 {
                continue;
            }
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            match k {
                0 => write!(f, "{}", c)?,
                1 if c == 1 => write!(f, "x")?,
                1 => write!(f, "{} x", c)?,
                _ if c == 1 => write!(f, "x ^ {}", k)?,
                _ => write!(f, "{} x ^ {}", c, k)?,
            }
        }
        write!(f, ", {}", self.modulus)
    }
}

impl fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/* ---- optional serde: canonical string on the wire ---- */

#[cfg(feature = "serde")]
impl serde::Serialize for Polynomial {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Polynomial {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(s: &str) -> Polynomial {
        s.parse().unwrap()
    }

    #[test]
    fn parse_with_modulus() {
        let f = poly("2x^2 + 1, 3");
        assert_eq!(f.degree(), 2);
        assert_eq!(f.modulus(), 3);
        assert_eq!(f.coeff(0), 1);
        assert_eq!(f.coeff(1), 0);
        assert_eq!(f.coeff(2), 2);
    }

    #[test]
    fn parse_loose_whitespace_and_star() {
        let f = poly("2 x ^ 3 + 3 x + 4, 5");
        assert_eq!(f.degree(), 3);
        assert_eq!(
            (f.coeff(0), f.coeff(1), f.coeff(2), f.coeff(3)),
            (4, 3, 0, 2)
        );
        assert_eq!(poly("2*x^3 + 3*x + 4, 5"), f);
    }

    #[test]
    fn parse_defaults_modulus_to_two() {
        let f = poly("x^4 + x + 1");
        assert_eq!(f.modulus(), 2);
        assert_eq!(f.degree(), 4);
    }

    #[test]
    fn parse_constant_zero() {
        let f = poly("0, 5");
        assert!(f.is_zero());
        assert!(f.is_integer());
        assert_eq!(f.degree(), 0);
    }

    #[test]
    fn parse_rejects_negative_coefficient() {
        assert!(matches!(
            "x^4-1, 5".parse::<Polynomial>(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_syntax() {
        assert!("x 1".parse::<Polynomial>().is_err());
        assert!("^3, 5".parse::<Polynomial>().is_err());
        assert!("x ^, 5".parse::<Polynomial>().is_err());
        assert!("".parse::<Polynomial>().is_err());
    }

    #[test]
    fn parse_rejects_modulus_below_two() {
        assert!("x + 1, 1".parse::<Polynomial>().is_err());
        assert!("x + 1, 0".parse::<Polynomial>().is_err());
    }

    #[test]
    fn coefficients_reduce_modulo_p() {
        // 2x over GF(2) collapses to zero.
        let f = poly("2x");
        assert!(f.is_zero());

        let g = poly("7x^2 + 9, 5");
        assert_eq!(g.coeff(2), 2);
        assert_eq!(g.coeff(0), 4);
    }

    #[test]
    fn display_canonical_form() {
        assert_eq!(poly("x^4+3, 5").to_string(), "x ^ 4 + 3, 5");
        assert_eq!(poly("3x^3, 5").to_string(), "3 x ^ 3, 5");
        assert_eq!(
            poly("x^4 + x^2 + 2x + 3, 5").to_string(),
            "x ^ 4 + x ^ 2 + 2 x + 3, 5"
        );
        assert_eq!(poly("0, 7").to_string(), "0, 7");
        assert_eq!(poly("x").to_string(), "x, 2");
    }

    #[test]
    fn display_parse_round_trip() {
        for s in ["x ^ 4 + x ^ 2 + 2 x + 3, 5", "3 x ^ 3, 5", "x + 1, 2"] {
            assert_eq!(poly(s).to_string(), s);
        }
    }

    #[test]
    fn equality_requires_same_modulus() {
        assert_ne!(poly("x + 1, 2"), poly("x + 1, 3"));
        assert_eq!(poly("x + 1, 3"), poly("x + 1, 3"));
    }

    #[test]
    fn eval_mod_5() {
        let f = poly("x^4 + 3x + 3, 5");
        assert_eq!(f.eval(2), 0);
        assert_eq!(f.eval(3), 3);
        assert_eq!(f.eval(0), 3);
    }

    #[test]
    fn eval_mod_2() {
        let f = poly("x^4 + x + 1, 2");
        assert_eq!(f.eval(0), 1);
        assert_eq!(f.eval(1), 1);
    }

    #[test]
    fn linear_factor_detection() {
        assert!(poly("x^4 + 3x + 3, 5").has_linear_factor());
        assert!(!poly("x^4 + 3x^2 + x + 1, 5").has_linear_factor());
        // Constant term zero means the factor x.
        assert!(poly("x^3 + x, 5").has_linear_factor());
    }

    #[test]
    fn is_integer() {
        assert!(!poly("x^4 + 3x + 3, 5").is_integer());
        assert!(poly("3, 5").is_integer());
    }

    #[test]
    fn addition_reduces_and_renormalizes() {
        let f = poly("x^2 + 2x + 1, 3");
        let g = poly("2x^2 + x + 1, 3");
        let sum = &f + &g;
        // x^2 terms cancel: 3 = 0 (mod 3).
        assert_eq!(sum, poly("2, 3"));
    }

    #[test]
    fn scalar_multiplication() {
        let f = poly("x^2 + 2x + 3, 5");
        assert_eq!(&f * 3, poly("3x^2 + x + 4, 5"));
        assert!((&f * 0).is_zero());
    }

    #[test]
    fn trial_poly_enumeration() {
        let mut f = Polynomial::initial_trial_poly(4, 5).unwrap();
        assert_eq!(f.to_string(), "x ^ 4, 5");
        for _ in 0..3 {
            assert!(f.next_trial_poly());
        }
        assert_eq!(f.to_string(), "x ^ 4 + 3, 5");
    }

    #[test]
    fn trial_poly_carries_between_digits() {
        let mut f = Polynomial::initial_trial_poly(2, 2).unwrap();
        let mut seen = vec![f.clone()];
        while f.next_trial_poly() {
            seen.push(f.clone());
        }
        // All four monic quadratics over GF(2), each exactly once.
        assert_eq!(seen.len(), 4);
        seen.dedup();
        assert_eq!(seen.len(), 4);
        // Wrapped back to the start.
        assert_eq!(f, Polynomial::initial_trial_poly(2, 2).unwrap());
    }

    #[test]
    fn div_rem_exact_and_with_remainder() {
        let f = poly("x^4 + x^2 + 1, 2");
        let g = poly("x^2 + x + 1, 2");
        let (q, r) = f.div_rem(&g).unwrap();
        assert!(r.is_zero());
        assert_eq!(q, poly("x^2 + x + 1, 2"));

        let f = poly("x^3 + 2x + 1, 5");
        let g = poly("x^2 + 1, 5");
        let (q, r) = f.div_rem(&g).unwrap();
        assert_eq!(q, poly("x, 5"));
        assert_eq!(r, poly("x + 1, 5"));
        assert!(r.degree() < g.degree());
    }

    #[test]
    fn div_rem_smaller_dividend() {
        let f = poly("x + 1, 5");
        let g = poly("x^2 + 1, 5");
        let (q, r) = f.div_rem(&g).unwrap();
        assert!(q.is_zero());
        assert_eq!(r, f);
    }

    #[test]
    fn div_rem_rejects_zero_divisor() {
        let f = poly("x + 1, 5");
        let z = Polynomial::zero(5).unwrap();
        assert!(f.div_rem(&z).is_err());
    }

    #[test]
    fn div_rem_non_monic_divisor() {
        let f = poly("2x^3 + 3x^2 + x + 4, 5");
        let g = poly("3x + 1, 5");
        let (q, r) = f.div_rem(&g).unwrap();
        assert_eq!(q, poly("4x^2 + 3x + 1, 5"));
        assert_eq!(r, poly("3, 5"));
    }
}
