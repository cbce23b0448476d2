//! The integer-type seam shared by machine words and `BigInt`.
//!
//! Primality testing and factoring run over both `u64` and [`BigInt`];
//! `Natural` is the trait bound that lets one implementation serve both.

use std::fmt;
use std::ops::{Add, Div, Mul, Rem, Sub};

use num_traits::{One, Zero};
use rand::Rng;

use crate::bigint::{radix, BigInt};
use crate::error::{Error, Result};
use crate::modular;

/// A non-negative integer type with the operations factoring needs.
///
/// Implemented for `u64` (with overflow-safe modular multiplication) and
/// for [`BigInt`] (where the double-width product exists anyway).
pub trait Natural:
    Clone
    + Eq
    + Ord
    + Zero
    + One
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Rem<Output = Self>
{
    fn from_u64(v: u64) -> Self;

    /// The value as a machine word, when it fits.
    fn to_u64(&self) -> Option<u64>;

    /// Parse a decimal string of digits '0'-'9'.
    fn parse_decimal(s: &str) -> Result<Self>;

    fn is_even(&self) -> bool;

    /// `(self + rhs) mod n`, safe near the representation maximum.
    fn add_mod(&self, rhs: &Self, n: &Self) -> Self;

    /// `(self * rhs) mod n`, safe near the representation maximum.
    fn mul_mod(&self, rhs: &Self, n: &Self) -> Self;

    /// `self^exp mod n` by left-to-right binary exponentiation.
    /// `0^0` is taken as 1 here; the checked entry point lives in
    /// [`crate::modular::power_mod`].
    fn pow_mod(&self, exp: &Self, n: &Self) -> Self;

    fn gcd(&self, other: &Self) -> Self;

    /// Uniform random value in `[0, self)`; `self` must be positive.
    fn random_below(&self) -> Self;

    /// `base^exp` built by repeated multiplication.
    fn small_power(base: u64, exp: u32) -> Self {
        let b = Self::from_u64(base);
        let mut acc = Self::one();
        for _ in 0..exp {
            acc = acc * b.clone();
        }
        acc
    }
}

impl Natural for u64 {
    fn from_u64(v: u64) -> Self {
        v
    }

    fn to_u64(&self) -> Option<u64> {
        Some(*self)
    }

    fn parse_decimal(s: &str) -> Result<Self> {
        s.parse::<u64>()
            .map_err(|_| Error::Parse(format!("invalid decimal integer {:?}", s)))
    }

    fn is_even(&self) -> bool {
        self % 2 == 0
    }

    fn add_mod(&self, rhs: &Self, n: &Self) -> Self {
        modular::add_mod(*self, *rhs, *n)
    }

    fn mul_mod(&self, rhs: &Self, n: &Self) -> Self {
        modular::multiply_mod(*self, *rhs, *n)
    }

    fn pow_mod(&self, exp: &Self, n: &Self) -> Self {
        if *exp == 0 {
            return 1 % n;
        }
        let base = self % n;
        let bits = 64 - exp.leading_zeros();
        let mut acc = 1 % n;
        for i in (0..bits).rev() {
            acc = modular::multiply_mod(acc, acc, *n);
            if (exp >> i) & 1 == 1 {
                acc = modular::multiply_mod(acc, base, *n);
            }
        }
        acc
    }

    fn gcd(&self, other: &Self) -> Self {
        modular::gcd(*self, *other)
    }

    fn random_below(&self) -> Self {
        modular::random_below(*self)
    }
}

impl Natural for BigInt {
    fn from_u64(v: u64) -> Self {
        BigInt::from(v)
    }

    fn to_u64(&self) -> Option<u64> {
        BigInt::to_u64(self).ok()
    }

    fn parse_decimal(s: &str) -> Result<Self> {
        s.parse()
    }

    fn is_even(&self) -> bool {
        !self.test_bit(0)
    }

    fn add_mod(&self, rhs: &Self, n: &Self) -> Self {
        &(self + rhs) % n
    }

    fn mul_mod(&self, rhs: &Self, n: &Self) -> Self {
        &(self * rhs) % n
    }

    fn pow_mod(&self, exp: &Self, n: &Self) -> Self {
        // Peel the exponent bits once up front; testing bit i in place
        // costs i halvings each.
        let mut bits = Vec::new();
        let mut e = exp.clone();
        while !e.is_zero() {
            bits.push(e.halve() == 1);
        }
        if bits.is_empty() {
            return &BigInt::one() % n;
        }
        let base = self % n;
        let mut acc = &BigInt::one() % n;
        for &bit in bits.iter().rev() {
            acc = &(&acc * &acc) % n;
            if bit {
                acc = &(&acc * &base) % n;
            }
        }
        acc
    }

    fn gcd(&self, other: &Self) -> Self {
        BigInt::gcd(self, other)
    }

    fn random_below(&self) -> Self {
        assert!(!self.is_zero(), "random_below of zero");
        let b = radix();
        let mut rng = rand::thread_rng();
        // One extra digit, then reduce; the bias is far below anything the
        // primality trials could observe.
        let mut acc = BigInt::zero();
        let base = BigInt::from(b);
        for _ in 0..self.num_digits() + 1 {
            acc = &(&acc * &base) + rng.gen_range(0..b);
        }
        &acc % self
    }
}

impl Zero for BigInt {
    fn zero() -> Self {
        BigInt::zero()
    }

    fn is_zero(&self) -> bool {
        BigInt::is_zero(self)
    }
}

impl One for BigInt {
    fn one() -> Self {
        BigInt::one()
    }
}
