//! Primitive polynomials over GF(p).
//!
//! A monic polynomial f(x) of degree n over GF(p) is primitive when it is
//! irreducible and x generates the multiplicative group of
//! GF(p)[x]/(f(x)), i.e. the order of x is p^n - 1. Primitive polynomials
//! produce maximal-length LFSR sequences and show up throughout coding
//! theory and pseudorandom generation.
//!
//! The crate provides the full pipeline:
//!
//! - [`BigInt`]: arbitrary-precision non-negative integers in a
//!   process-wide radix (see [`set_radix`]).
//! - [`modular`]: overflow-safe modular arithmetic on machine words.
//! - [`Factorization`]: Miller-Rabin primality plus a factoring ladder of
//!   packaged factor tables, Pollard rho (Brent), and trial division.
//! - [`Polynomial`] and [`PolyMod`]: dense polynomials over GF(p) and
//!   residue arithmetic modulo f(x).
//! - [`PolyOrder`]: the primitivity decision via the nullity of the
//!   Q - I matrix and the order-of-x tests.
//!
//! # Example
//!
//! ```no_run
//! use gfprim::{PolyOrder, Polynomial};
//!
//! // Test a single polynomial.
//! let f: Polynomial = "x^4 + x^2 + 2x + 3, 5".parse().unwrap();
//! let mut order = PolyOrder::new(&f).unwrap();
//! assert!(order.is_primitive().unwrap());
//!
//! // Or search: enumerate monic polynomials of degree n until one is
//! // primitive.
//! let mut f = Polynomial::initial_trial_poly(4, 5).unwrap();
//! let mut order = PolyOrder::new(&f).unwrap();
//! loop {
//!     order.reset_polynomial(&f).unwrap();
//!     if order.is_primitive().unwrap() {
//!         break;
//!     }
//!     assert!(f.next_trial_poly(), "enumeration exhausted");
//! }
//! println!("{} is primitive", f);
//! ```

pub mod bigint;
pub mod error;
pub mod factor;
pub mod modular;
pub mod natural;
pub mod order;
pub mod poly;
pub mod polymod;

pub use bigint::{radix, set_radix, BigInt, DEFAULT_RADIX, MAX_RADIX};
pub use error::{Error, Result};
pub use factor::{
    is_almost_surely_prime, is_probably_prime, FactoringAlgorithm, Factorization, OperationCount,
    Primality, PrimeFactor,
};
pub use modular::PrimitiveRoot;
pub use natural::Natural;
pub use order::PolyOrder;
pub use poly::Polynomial;
pub use polymod::PolyMod;
