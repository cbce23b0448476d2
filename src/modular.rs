//! Modular arithmetic over machine words, safe against overflow near the
//! word maximum.

use rand::Rng;

use crate::error::{Error, Result};
use crate::factor::Factorization;
use crate::factor::FactoringAlgorithm;

/// Reduce a signed value into `[0, p)`: `((v mod p) + p) mod p`.
///
/// The one place in the crate where a negative number may appear.
///
/// # Errors
///
/// `Error::Domain` when `p < 1`.
///
/// # Example
///
/// ```
/// use gfprim::modular::mod_p;
///
/// assert_eq!(mod_p(10, 7).unwrap(), 3);
/// assert_eq!(mod_p(-10, 7).unwrap(), 4);
/// ```
pub fn mod_p(v: i64, p: u64) -> Result<u64> {
    if p < 1 {
        return Err(Error::Domain("modulus below 1".to_string()));
    }
    let p = p as i128;
    Ok((((v as i128 % p) + p) % p) as u64)
}

/// Greatest common divisor by Euclid's algorithm.
pub fn gcd(mut u: u64, mut v: u64) -> u64 {
    while v != 0 {
        let r = u % v;
        u = v;
        v = r;
    }
    u
}

/// `(a + b) mod n` without overflow, valid even when a, b, n approach the
/// word maximum. Operands are reduced mod n first.
pub fn add_mod(a: u64, b: u64, n: u64) -> u64 {
    debug_assert!(n > 0);
    let a = a % n;
    let b = b % n;
    if a >= n - b && b > 0 {
        a - (n - b)
    } else {
        a + b
    }
}

/// `2a mod n` without overflow.
pub fn times_two_mod(a: u64, n: u64) -> u64 {
    add_mod(a, a, n)
}

/// `a * b mod n` by Russian-peasant doubling, so the product never leaves
/// the word: ceil(lg b) doublings, each a conditional `add_mod`.
///
/// # Example
///
/// ```
/// use gfprim::modular::multiply_mod;
///
/// let n = u64::MAX - 58;
/// let a = n - 1;
/// // (n-1)^2 = 1 (mod n)
/// assert_eq!(multiply_mod(a, a, n), 1);
/// ```
pub fn multiply_mod(a: u64, b: u64, n: u64) -> u64 {
    debug_assert!(n > 0);
    let mut a = a % n;
    let mut b = b % n;
    let mut acc = 0u64;
    while b > 0 {
        if b & 1 == 1 {
            acc = add_mod(acc, a, n);
        }
        a = times_two_mod(a, n);
        b >>= 1;
    }
    acc
}

/// `a^e mod n` by left-to-right binary exponentiation over `multiply_mod`.
///
/// # Errors
///
/// `Error::Domain` for `0^0` or a zero modulus.
///
/// # Example
///
/// ```
/// use gfprim::modular::power_mod;
///
/// assert_eq!(power_mod(3, 10, 7).unwrap(), 4);
/// assert!(power_mod(0, 0, 7).is_err());
/// ```
pub fn power_mod(a: u64, e: u64, n: u64) -> Result<u64> {
    if n == 0 {
        return Err(Error::Domain("zero modulus in power_mod".to_string()));
    }
    if a == 0 && e == 0 {
        return Err(Error::Domain("0^0 is undefined".to_string()));
    }
    if e == 0 {
        return Ok(1 % n);
    }
    let a = a % n;
    let bits = 64 - e.leading_zeros();
    let mut acc = 1 % n;
    for i in (0..bits).rev() {
        acc = multiply_mod(acc, acc, n);
        if (e >> i) & 1 == 1 {
            acc = multiply_mod(acc, a, n);
        }
    }
    Ok(acc)
}

/// Multiplicative inverse of a mod p by exhaustive search: a reference
/// implementation, correctness over speed.
///
/// # Errors
///
/// `Error::Domain` when `p < 1` or no inverse exists.
///
/// # Example
///
/// ```
/// use gfprim::modular::inverse_mod_p;
///
/// assert_eq!(inverse_mod_p(3, 7).unwrap(), 5);
/// ```
pub fn inverse_mod_p(a: u64, p: u64) -> Result<u64> {
    if p < 1 {
        return Err(Error::Domain("modulus below 1 in inverse_mod_p".to_string()));
    }
    let a = a % p;
    for i in 1..p {
        if multiply_mod(i, a, p) == 1 {
            return Ok(i);
        }
    }
    Err(Error::Domain(format!("{} has no inverse mod {}", a, p)))
}

/// Uniform random integer in `[0, n)`.
///
/// # Panics
///
/// Panics when `n == 0`.
pub fn random_below(n: u64) -> u64 {
    rand::thread_rng().gen_range(0..n)
}

/// Tests whether elements generate the whole multiplicative group of
/// GF(p). Factors p - 1 once at construction so repeated queries are cheap.
///
/// The caller supplies a prime p.
///
/// # Example
///
/// ```
/// use gfprim::modular::PrimitiveRoot;
///
/// let root7 = PrimitiveRoot::new(7).unwrap();
/// assert!(root7.is_root(3));
/// assert!(!root7.is_root(2));
/// ```
pub struct PrimitiveRoot {
    p: u64,
    distinct: Vec<u64>,
}

impl PrimitiveRoot {
    pub fn new(p: u64) -> Result<Self> {
        if p < 2 {
            return Err(Error::Domain(format!(
                "{} cannot have primitive roots",
                p
            )));
        }
        let factors = Factorization::<u64>::new(p - 1, FactoringAlgorithm::Automatic)?;
        Ok(PrimitiveRoot {
            p,
            distinct: factors.distinct_prime_factors().to_vec(),
        })
    }

    pub fn modulus(&self) -> u64 {
        self.p
    }

    /// True when the multiplicative order of a mod p is p - 1, i.e.
    /// a^((p-1)/q) != 1 for every distinct prime q dividing p - 1.
    pub fn is_root(&self, a: u64) -> bool {
        let a = a % self.p;
        if a == 0 {
            return false;
        }
        for &q in &self.distinct {
            let e = (self.p - 1) / q;
            // a != 0 and e >= 1, so power_mod cannot fail here.
            if power_mod(a, e, self.p).unwrap_or(0) == 1 {
                return false;
            }
        }
        true
    }
}
