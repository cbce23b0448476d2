//! Primality testing and integer factorization.
//!
//! Factoring runs a ladder: packaged factor-table lookup, then Pollard rho
//! (Brent's variant) with c = 1 and c = 5, then trial division, which
//! always succeeds. Primality is Miller-Rabin with random witnesses.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::natural::Natural;

/// Outcome of a single Miller-Rabin trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primality {
    /// Definitely prime (small-case lookup).
    Prime,
    /// Definitely composite.
    Composite,
    /// Passed this witness; wrong for a composite with probability < 1/4.
    ProbablyPrime,
}

/// One Miller-Rabin trial of n with witness x.
///
/// Write n - 1 = 2^k q with q odd and follow the squaring chain
/// y = x^q, x^2q, ... looking for the tell-tale 1 and n-1 values
/// (Knuth, TAOCP vol. 2, 4.5.4).
///
/// # Example
///
/// ```
/// use gfprim::{is_probably_prime, Primality};
///
/// assert_eq!(is_probably_prime(&97u64, &10), Primality::ProbablyPrime);
/// assert_eq!(is_probably_prime(&49u64, &10), Primality::Composite);
/// ```
pub fn is_probably_prime<T: Natural>(n: &T, x: &T) -> Primality {
    let one = T::one();
    let two = T::from_u64(2);
    let three = T::from_u64(3);
    let five = T::from_u64(5);

    if n.is_zero() || *n == one || *n == T::from_u64(4) {
        return Primality::Composite;
    }
    if *n == two || *n == three || *n == five {
        return Primality::Prime;
    }
    if (n.clone() % two.clone()).is_zero()
        || (n.clone() % three).is_zero()
        || (n.clone() % five).is_zero()
    {
        return Primality::Composite;
    }

    // n - 1 = 2^k q, q odd.
    let n_minus_1 = n.clone() - one.clone();
    let mut q = n_minus_1.clone();
    let mut k = 0u32;
    while q.is_even() {
        q = q / two.clone();
        k += 1;
    }

    let mut y = x.pow_mod(&q, n);
    for j in 0..k {
        if j == 0 && y == one {
            return Primality::ProbablyPrime;
        }
        if y == n_minus_1 {
            return Primality::ProbablyPrime;
        }
        if j > 0 && y == one {
            // A 1 with no n-1 before it: a nontrivial square root of unity.
            return Primality::Composite;
        }
        y = y.mul_mod(&y, n);
    }
    Primality::Composite
}

/// Number of independent Miller-Rabin witnesses tried by
/// [`is_almost_surely_prime`]; the failure probability is below (1/4)^14.
const NUM_PRIME_TEST_TRIALS: u32 = 14;

/// Probabilistic primality test. Composite answers are always right; a
/// prime answer is wrong with probability below (1/4)^14.
///
/// # Example
///
/// ```
/// use gfprim::is_almost_surely_prime;
///
/// assert!(is_almost_surely_prime(&65003u64));
/// assert!(is_almost_surely_prime(&104729u64)); // the 10,000th prime
/// assert!(!is_almost_surely_prime(&49u64));
/// ```
pub fn is_almost_surely_prime<T: Natural>(n: &T) -> bool {
    if *n <= T::one() {
        return false;
    }
    for _ in 0..NUM_PRIME_TEST_TRIALS {
        let mut x = n.random_below();
        if x <= T::one() {
            x = T::from_u64(3);
        }
        match is_probably_prime(n, &x) {
            Primality::Prime => return true,
            Primality::Composite => return false,
            Primality::ProbablyPrime => {}
        }
    }
    true
}

/// A prime together with its multiplicity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimeFactor<T> {
    pub prime: T,
    pub multiplicity: u32,
}

impl<T> PrimeFactor<T> {
    pub fn new(prime: T, multiplicity: u32) -> Self {
        PrimeFactor {
            prime,
            multiplicity,
        }
    }
}

/// Which factoring method to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactoringAlgorithm {
    /// Packaged factor-table lookup only.
    FactorTable,
    /// Trial division only; always succeeds.
    TrialDivision,
    /// Pollard rho only, one attempt with c = 1.
    PollardRho,
    /// Table, then rho with c = 1 and c = 5, then trial division.
    Automatic,
}

/// Default constant in the rho iteration x <- x^2 + c. The values
/// 0, 1 and -2 degenerate the cycle structure and are avoided; the
/// retry after a failed attempt uses c = 5.
const POLLARD_RHO_DEFAULT_C: u64 = 2;

/// Work counters for the factoring ladder; informational only.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationCount {
    pub trial_divides: u64,
    pub gcds: u64,
    pub squarings: u64,
    pub primality_tests: u64,
}

impl fmt::Display for OperationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} trial divisions, {} gcds, {} squarings, {} primality tests",
            self.trial_divides, self.gcds, self.squarings, self.primality_tests
        )
    }
}

/// The factorization of a non-negative integer: a sequence of prime-power
/// factors, sorted by prime ascending, with distinct primes.
///
/// Zero and one factor into the empty sequence.
///
/// # Example
///
/// ```
/// use gfprim::{Factorization, FactoringAlgorithm};
///
/// let f = Factorization::<u64>::new(337_500, FactoringAlgorithm::TrialDivision).unwrap();
/// assert_eq!(f.to_string(), "2^2.3^3.5^5");
/// assert_eq!(f.num_distinct_factors(), 3);
/// assert_eq!(f.euler_phi(), 90_000);
/// ```
#[derive(Clone, Debug)]
pub struct Factorization<T> {
    n: T,
    factors: Vec<PrimeFactor<T>>,
    distinct: Vec<T>,
    stats: OperationCount,
}

impl<T: Natural> Factorization<T> {
    /// Factor n with the chosen algorithm. No factor-table key is
    /// available through this entry point; `Automatic` goes straight to
    /// Pollard rho. See [`Factorization::for_power`] for table lookups.
    pub fn new(n: T, algorithm: FactoringAlgorithm) -> Result<Self> {
        Self::build(n, algorithm, None)
    }

    /// Factor p^m - 1, consulting the packaged factor table for base p
    /// first when the algorithm allows it.
    pub fn for_power(p: u64, m: u32, algorithm: FactoringAlgorithm) -> Result<Self> {
        let n = T::small_power(p, m) - T::one();
        Self::build(n, algorithm, Some((p, m)))
    }

    /// Assemble a factorization from already-verified parts, sorted
    /// ascending with distinct primes.
    pub(crate) fn from_parts(n: T, factors: Vec<PrimeFactor<T>>) -> Self {
        debug_assert!(factors.windows(2).all(|w| w[0].prime < w[1].prime));
        let distinct = factors.iter().map(|f| f.prime.clone()).collect();
        Factorization {
            n,
            factors,
            distinct,
            stats: OperationCount::default(),
        }
    }

    fn build(n: T, algorithm: FactoringAlgorithm, table_key: Option<(u64, u32)>) -> Result<Self> {
        let mut fact = Factorization {
            n: n.clone(),
            factors: Vec::new(),
            distinct: Vec::new(),
            stats: OperationCount::default(),
        };

        let mut remaining = n;
        if remaining > T::one() {
            match algorithm {
                FactoringAlgorithm::FactorTable => {
                    let (p, m) = table_key.ok_or_else(|| {
                        Error::Domain("factor table lookup needs the base and exponent".to_string())
                    })?;
                    if !fact.factor_table(p, m)? {
                        debug!(p, m, "factor table had no entry");
                    }
                }
                FactoringAlgorithm::PollardRho => {
                    if !fact.pollard_rho(&mut remaining, &T::from_u64(POLLARD_RHO_DEFAULT_C)) {
                        debug!("pollard rho with the default constant failed");
                    }
                }
                FactoringAlgorithm::TrialDivision => fact.trial_division(&mut remaining),
                FactoringAlgorithm::Automatic => {
                    let table_hit = match table_key {
                        Some((p, m)) => fact.factor_table(p, m)?,
                        None => false,
                    };
                    if !table_hit {
                        if !fact.pollard_rho(&mut remaining, &T::from_u64(POLLARD_RHO_DEFAULT_C)) {
                            debug!("pollard rho failed, retrying with c = 5");
                            if !fact.pollard_rho(&mut remaining, &T::from_u64(5)) {
                                debug!("pollard rho failed twice, falling back to trial division");
                                fact.trial_division(&mut remaining);
                            }
                        }
                    }
                }
            }
        }

        fact.finalize();
        Ok(fact)
    }

    /// Sort ascending, merge duplicate primes, and strip units.
    fn finalize(&mut self) {
        self.factors.sort_by(|a, b| a.prime.cmp(&b.prime));
        for i in 1..self.factors.len() {
            if self.factors[i].prime == self.factors[i - 1].prime {
                let carried = self.factors[i - 1].multiplicity;
                self.factors[i].multiplicity += carried;
                self.factors[i - 1].multiplicity = 0;
            }
        }
        let one = T::one();
        self.factors
            .retain(|f| f.multiplicity > 0 && f.prime != one);
        self.distinct = self.factors.iter().map(|f| f.prime.clone()).collect();
    }

    /// Knuth's trial-division Algorithm A (TAOCP vol. 2, 4.5.4): divide
    /// out 2s and 3s, then run d = 5, 7, 11, 13, ... (d += 2, 4
    /// alternately), stopping as soon as the remainder is 1 or provably
    /// prime (`r != 0 && q < d`).
    fn trial_division(&mut self, n: &mut T) {
        for small in [2u64, 3] {
            let d = T::from_u64(small);
            let mut count = 0u32;
            while !n.is_zero() && (n.clone() % d.clone()).is_zero() {
                *n = n.clone() / d.clone();
                count += 1;
                self.stats.trial_divides += 1;
            }
            if count > 0 {
                self.factors.push(PrimeFactor::new(d, count));
            }
        }

        let mut d = T::from_u64(5);
        let mut new_divisor = true;
        let mut gap_of_two = true;
        loop {
            let q = n.clone() / d.clone();
            let r = n.clone() % d.clone();
            self.stats.trial_divides += 1;

            let n_is_prime = !r.is_zero() && q < d;

            if r.is_zero() {
                *n = q;
                if new_divisor {
                    self.factors.push(PrimeFactor::new(d.clone(), 1));
                    new_divisor = false;
                } else {
                    self.factors.last_mut().unwrap().multiplicity += 1;
                }
            } else {
                d = d + T::from_u64(if gap_of_two { 2 } else { 4 });
                gap_of_two = !gap_of_two;
                new_divisor = true;
            }

            if n_is_prime || n.is_one() {
                break;
            }
        }

        if !n.is_one() {
            // What is left is itself prime.
            self.factors.push(PrimeFactor::new(n.clone(), 1));
        }
    }

    /// Pollard rho, Brent's variant (Knuth TAOCP vol. 2, 4.5.4): iterate
    /// x <- x^2 + c mod n, taking gcd(|x - x'|, n) with x' refreshed on a
    /// doubling schedule. Returns false when a gcd lands on a composite
    /// (the caller retries with another c or falls back).
    fn pollard_rho(&mut self, n: &mut T, c: &T) -> bool {
        let one = T::one();
        let mut x = T::from_u64(5);
        let mut x_prev = T::from_u64(2);
        let mut k = 1u64;
        let mut l = 1u64;

        // Seed a unit factor; stripped during finalize.
        self.factors.push(PrimeFactor::new(one.clone(), 1));
        if n.is_one() {
            return true;
        }

        loop {
            self.stats.primality_tests += 1;
            if is_almost_surely_prime(n) {
                self.factors.push(PrimeFactor::new(n.clone(), 1));
                return true;
            }

            loop {
                let diff = if x_prev > x {
                    x_prev.clone() - x.clone()
                } else {
                    x.clone() - x_prev.clone()
                };
                let g = diff.gcd(n);
                self.stats.gcds += 1;

                if g == one {
                    k -= 1;
                    if k == 0 {
                        x_prev = x.clone();
                        l *= 2;
                        k = l;
                    }
                    x = x.mul_mod(&x, n).add_mod(c, n);
                    self.stats.squarings += 1;
                    continue;
                }
                if g == *n {
                    debug!("pollard rho: gcd hit the unfactored composite");
                    return false;
                }

                self.stats.primality_tests += 1;
                if is_almost_surely_prime(&g) {
                    self.factors.push(PrimeFactor::new(g.clone(), 1));
                } else {
                    debug!("pollard rho: composite gcd");
                    return false;
                }

                *n = n.clone() / g;
                x = x % n.clone();
                x_prev = x_prev.clone() % n.clone();
                break;
            }
        }
    }

    /// Look up the factorization of p^m - 1 in the packaged table for
    /// base p, searching the working directory recursively.
    ///
    /// Returns Ok(false) when no table exists for p or the table has no
    /// entry for m. A known table that is missing from disk, or an entry
    /// that fails verification, is an error.
    fn factor_table(&mut self, p: u64, m: u32) -> Result<bool> {
        self.factors.clear();

        let name = match table_file_name(p) {
            Some(name) => name,
            None => return Ok(false),
        };
        let path = match find_file(Path::new("."), name)? {
            Some(path) => path,
            None => {
                return Err(Error::FactorTable(format!(
                    "missing the factor table {} for p = {}; copy it into the working directory",
                    name, p
                )))
            }
        };
        debug!(table = %path.display(), p, m, "reading factor table");

        let content = fs::read_to_string(&path)?;
        for line in logical_lines(&content) {
            // Entries with a '+' are incomplete factorizations.
            if line.contains('+') {
                continue;
            }
            let (entry_n, factors) = parse_table_entry::<T>(&line)?;
            if entry_n != m as u64 {
                continue;
            }

            let mut product = T::one();
            for (prime, multiplicity) in &factors {
                if !is_almost_surely_prime(prime) {
                    return Err(Error::FactorTable(format!(
                        "table factor {} of {}^{} - 1 fails the primality test",
                        prime, p, m
                    )));
                }
                for _ in 0..*multiplicity {
                    product = product * prime.clone();
                }
            }
            if product != T::small_power(p, m) - T::one() {
                return Err(Error::FactorTable(format!(
                    "product of table factors does not equal {}^{} - 1",
                    p, m
                )));
            }

            self.factors = factors
                .into_iter()
                .map(|(prime, multiplicity)| PrimeFactor::new(prime, multiplicity))
                .collect();
            return Ok(true);
        }

        Ok(false)
    }

    /// The integer that was factored.
    pub fn number(&self) -> &T {
        &self.n
    }

    /// Number of distinct prime factors; always the length of the
    /// deduplicated factor sequence.
    pub fn num_distinct_factors(&self) -> usize {
        self.factors.len()
    }

    /// The i-th distinct prime, ascending.
    ///
    /// # Panics
    ///
    /// Panics when `i >= num_distinct_factors()`.
    pub fn prime_factor(&self, i: usize) -> &T {
        &self.factors[i].prime
    }

    /// Multiplicity of the i-th distinct prime.
    ///
    /// # Panics
    ///
    /// Panics when `i >= num_distinct_factors()`.
    pub fn multiplicity(&self, i: usize) -> u32 {
        self.factors[i].multiplicity
    }

    pub fn factors(&self) -> &[PrimeFactor<T>] {
        &self.factors
    }

    /// Projection to the distinct primes only.
    pub fn distinct_prime_factors(&self) -> &[T] {
        &self.distinct
    }

    /// Euler's totient of the factored integer:
    /// phi(n) = prod (p - 1) * p^(m-1).
    pub fn euler_phi(&self) -> T {
        let mut phi = T::one();
        for f in &self.factors {
            phi = phi * (f.prime.clone() - T::one());
            for _ in 1..f.multiplicity {
                phi = phi * f.prime.clone();
            }
        }
        phi
    }

    /// Work counters accumulated while factoring.
    pub fn statistics(&self) -> OperationCount {
        self.stats
    }
}

impl<T: Natural> fmt::Display for Factorization<T> {
    /// Dotted prime-power form, e.g. `2^2.3^3.5^5`; the empty
    /// factorization prints as `1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "1");
        }
        for (i, factor) in self.factors.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            if factor.multiplicity == 1 {
                write!(f, "{}", factor.prime)?;
            } else {
                write!(f, "{}^{}", factor.prime, factor.multiplicity)?;
            }
        }
        Ok(())
    }
}

/// Table file name for a base, for the bases whose Cunningham-style
/// tables are packaged.
fn table_file_name(p: u64) -> Option<&'static str> {
    match p {
        2 => Some("c02minus.txt"),
        3 => Some("c03minus.txt"),
        5 => Some("c05minus.txt"),
        6 => Some("c06minus.txt"),
        7 => Some("c07minus.txt"),
        10 => Some("c10minus.txt"),
        11 => Some("c11minus.txt"),
        12 => Some("c12minus.txt"),
        _ => None,
    }
}

/// Depth-first search for a .txt file with the given name.
fn find_file(dir: &Path, name: &str) -> Result<Option<PathBuf>> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if let Some(found) = find_file(&path, name)? {
                return Ok(Some(found));
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some("txt")
            && path.file_name().and_then(|f| f.to_str()) == Some(name)
        {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// The `n  #Fac  Factorisation` header that ends the comment preamble.
fn is_table_header(line: &str) -> bool {
    let rest = line.trim_start();
    let rest = match rest.strip_prefix('n') {
        Some(rest) => rest.trim_start(),
        None => return false,
    };
    let rest = match rest.strip_prefix("#Fac") {
        Some(rest) => rest,
        None => return false,
    };
    rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with("Factorisation")
}

/// Join the physical lines after the header into logical entries: a line
/// ending in `\` or `.` continues on the next line (the backslash is
/// dropped, the dot is a real separator and stays).
fn logical_lines(content: &str) -> Vec<String> {
    let mut found_header = false;
    let mut continuing = false;
    let mut lines: Vec<String> = Vec::new();

    for raw in content.lines() {
        let line = raw.trim_end();
        if is_table_header(line) {
            found_header = true;
            continue;
        }
        if !found_header {
            continue;
        }

        let continues = line.ends_with('\\') || line.ends_with('.');
        if !continuing {
            if !line.trim().is_empty() {
                lines.push(line.to_string());
                continuing = continues;
            }
        } else {
            let last = lines.last_mut().unwrap();
            if last.ends_with('\\') {
                last.pop();
            }
            last.push_str(line);
            continuing = continues;
        }
    }
    lines
}

/// Parse `<n> <#factors> <p1^e1.p2.p3^e3...>` into n and the factor list.
fn parse_table_entry<T: Natural>(line: &str) -> Result<(u64, Vec<(T, u32)>)> {
    let corrupt = |what: &str| Error::FactorTable(format!("{} in table line {:?}", what, line));

    let mut tokens = line.split_whitespace();
    let n: u64 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| corrupt("missing entry number"))?;
    let _count: u64 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| corrupt("missing factor count"))?;

    // Whitespace inside the list comes from joined continuation lines.
    let list: String = tokens.collect();
    if list.is_empty() {
        return Err(corrupt("missing factor list"));
    }

    let mut factors = Vec::new();
    for token in list.split('.') {
        if token.is_empty() {
            return Err(corrupt("empty factor"));
        }
        let (prime, multiplicity) = match token.split_once('^') {
            Some((p, e)) => (
                T::parse_decimal(p).map_err(|_| corrupt("bad prime"))?,
                e.parse::<u32>().map_err(|_| corrupt("bad exponent"))?,
            ),
            None => (T::parse_decimal(token).map_err(|_| corrupt("bad prime"))?, 1),
        };
        factors.push((prime, multiplicity));
    }
    Ok((n, factors))
}
