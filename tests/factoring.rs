//! End-to-end factoring scenarios, including the packaged factor-table
//! fixtures under tests/data/.

use gfprim::{is_almost_surely_prime, BigInt, Error, FactoringAlgorithm, Factorization, Natural};

fn pairs<T: Natural>(f: &Factorization<T>) -> Vec<(T, u32)> {
    f.factors()
        .iter()
        .map(|pf| (pf.prime.clone(), pf.multiplicity))
        .collect()
}

fn big_pairs(small: &[(u64, u32)]) -> Vec<(BigInt, u32)> {
    small.iter().map(|&(p, m)| (BigInt::from(p), m)).collect()
}

#[test]
fn table_lookup_3_pow_20() {
    // 3^20 - 1 = 3486784400 = 2^4 . 5^2 . 11^2 . 61 . 1181, spread over a
    // backslash continuation in the fixture table.
    let expected = [(2u64, 4u32), (5, 2), (11, 2), (61, 1), (1181, 1)];

    let f = Factorization::<u64>::for_power(3, 20, FactoringAlgorithm::FactorTable).unwrap();
    assert_eq!(pairs(&f), expected);
    assert_eq!(f.num_distinct_factors(), 5);

    let f = Factorization::<BigInt>::for_power(3, 20, FactoringAlgorithm::FactorTable).unwrap();
    assert_eq!(pairs(&f), big_pairs(&expected));
}

#[test]
fn table_lookup_with_dot_continuation() {
    // The n = 6 entry of the base-3 fixture continues after a trailing dot.
    let f = Factorization::<u64>::for_power(3, 6, FactoringAlgorithm::FactorTable).unwrap();
    assert_eq!(pairs(&f), vec![(2, 3), (7, 1), (13, 1)]);
}

#[test]
fn table_misses_leave_nothing() {
    // No entry for n = 19 in the base-3 fixture.
    let f = Factorization::<u64>::for_power(3, 19, FactoringAlgorithm::FactorTable).unwrap();
    assert_eq!(f.num_distinct_factors(), 0);

    // The incomplete (+) entry for n = 33 is skipped, not parsed.
    let f = Factorization::<u64>::for_power(3, 33, FactoringAlgorithm::FactorTable).unwrap();
    assert_eq!(f.num_distinct_factors(), 0);

    // No table exists for base 13 at all.
    let f = Factorization::<u64>::for_power(13, 2, FactoringAlgorithm::FactorTable).unwrap();
    assert_eq!(f.num_distinct_factors(), 0);
}

#[test]
fn missing_table_for_known_base_is_reported() {
    // Base 11 has a known table name but no file ships with the tests.
    let err = Factorization::<u64>::for_power(11, 2, FactoringAlgorithm::FactorTable).unwrap_err();
    assert!(matches!(err, Error::FactorTable(_)));
}

#[test]
fn automatic_falls_past_the_table() {
    // Base 13 has no table; Automatic continues with rho and finishes.
    // 13^4 - 1 = 28560 = 2^4 . 3 . 5 . 7 . 17
    let f = Factorization::<u64>::for_power(13, 4, FactoringAlgorithm::Automatic).unwrap();
    assert_eq!(pairs(&f), vec![(2, 4), (3, 1), (5, 1), (7, 1), (17, 1)]);
}

#[test]
fn trial_division_337500() {
    let f = Factorization::<u64>::new(337_500, FactoringAlgorithm::TrialDivision).unwrap();
    assert_eq!(pairs(&f), vec![(2, 2), (3, 3), (5, 5)]);

    let f = Factorization::<BigInt>::new(
        "337500".parse().unwrap(),
        FactoringAlgorithm::TrialDivision,
    )
    .unwrap();
    assert_eq!(pairs(&f), big_pairs(&[(2, 2), (3, 3), (5, 5)]));
}

#[test]
fn pollard_rho_25852() {
    let f = Factorization::<u64>::new(25_852, FactoringAlgorithm::PollardRho).unwrap();
    assert_eq!(pairs(&f), vec![(2, 2), (23, 1), (281, 1)]);

    let f = Factorization::<BigInt>::new(
        BigInt::from(25_852u64),
        FactoringAlgorithm::PollardRho,
    )
    .unwrap();
    assert_eq!(pairs(&f), big_pairs(&[(2, 2), (23, 1), (281, 1)]));
}

#[test]
fn two_pow_1198_minus_1() {
    // The six prime factors of 2^1198 - 1.
    let primes = [
        "3",
        "366994123",
        "16659379034607403556537",
        "148296291984475077955727317447564721950969097",
        "8398047009001231954734680924979017504225305878286200635075545151446835102504\
         90874819119570309824866293030799718783",
        "1884460498967805432001612672369307101507474835976431925948333387748670120353\
         6294532613478431402128085705057673867712904230872161565975882161864459584792\
         69565424431335013281",
    ];

    let mut product = BigInt::one();
    for s in primes {
        let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let p: BigInt = s.parse().unwrap();
        assert!(is_almost_surely_prime(&p), "{} should test prime", s);
        product = &product * &p;
    }

    let expected = &BigInt::power(2, 1198) - &BigInt::one();
    assert_eq!(product, expected);
}

#[test]
fn primality_matches_a_sieve_up_to_10000() {
    let limit = 10_000usize;
    let mut composite = vec![false; limit + 1];
    for i in 2..=limit {
        if !composite[i] {
            let mut j = i * i;
            while j <= limit {
                composite[j] = true;
                j += i;
            }
        }
    }

    for n in 0..=limit {
        let expected = n >= 2 && !composite[n];
        assert_eq!(
            is_almost_surely_prime(&(n as u64)),
            expected,
            "primality of {}",
            n
        );
    }
}

#[test]
fn primality_spot_checks() {
    assert!(is_almost_surely_prime(&97u64));
    assert!(is_almost_surely_prime(&65_003u64));
    assert!(is_almost_surely_prime(&104_729u64));
    assert!(is_almost_surely_prime(&999_983u64));
    assert!(!is_almost_surely_prime(&999_999u64));
}

#[test]
fn factorization_invariants_hold() {
    for n in [360u64, 1001, 65_002, 104_729, 337_500, 1_048_575] {
        let f = Factorization::<u64>::new(n, FactoringAlgorithm::Automatic).unwrap();

        let mut product = 1u64;
        for pf in f.factors() {
            assert!(is_almost_surely_prime(&pf.prime));
            assert!(pf.multiplicity >= 1);
            for _ in 0..pf.multiplicity {
                product *= pf.prime;
            }
        }
        assert_eq!(product, n, "factors of {} multiply back", n);
        assert!(f.factors().windows(2).all(|w| w[0].prime < w[1].prime));
        assert_eq!(f.num_distinct_factors(), f.distinct_prime_factors().len());
    }
}

#[test]
fn primitive_root_fixtures() {
    use gfprim::PrimitiveRoot;

    assert!(PrimitiveRoot::new(7).unwrap().is_root(3));
    assert!(PrimitiveRoot::new(11).unwrap().is_root(2));
    assert!(!PrimitiveRoot::new(11).unwrap().is_root(3));

    let root = PrimitiveRoot::new(65_003).unwrap();
    assert!(root.is_root(5));
    assert!(!root.is_root(8));
}
