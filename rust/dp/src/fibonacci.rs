//! Warm-up for dynamic programming: the same recurrence solved naively and with a memo.
//! Terms past F(93) do not fit a `u64` and come back as `None`.

use std::collections::HashMap;

/// F(0) = 0, F(1) = 1, F(n) = F(n - 1) + F(n - 2).
pub fn fibonacci(n: u64) -> Option<u64> {
    match n {
        0 => Some(0),
        1 => Some(1),
        _ => fibonacci(n - 1)?.checked_add(fibonacci(n - 2)?),
    }
}

/// Like [`fibonacci`], but every intermediate term is computed once.
pub fn fibonacci_memo(n: u64) -> Option<u64> {
    fibo(n, &mut HashMap::new())
}

fn fibo(n: u64, memo: &mut HashMap<u64, u64>) -> Option<u64> {
    if let Some(&f) = memo.get(&n) {
        return Some(f);
    }

    let f = match n {
        0 => 0,
        1 => 1,
        _ => fibo(n - 2, memo)?.checked_add(fibo(n - 1, memo)?)?,
    };
    memo.insert(n, f);
    Some(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 1)]
    #[case(10, 55)]
    #[case(20, 6765)]
    fn known_terms(#[case] n: u64, #[case] expected: u64) {
        assert_eq!(fibonacci(n), Some(expected));
        assert_eq!(fibonacci_memo(n), Some(expected));
    }

    #[test]
    fn both_satisfy_the_recurrence() {
        let sum = |a: Option<u64>, b: Option<u64>| a.zip(b).map(|(a, b)| a + b);
        for n in 2..25 {
            assert_eq!(fibonacci(n), fibonacci_memo(n));
            assert_eq!(fibonacci(n), sum(fibonacci(n - 1), fibonacci(n - 2)));
            assert_eq!(
                fibonacci_memo(n),
                sum(fibonacci_memo(n - 1), fibonacci_memo(n - 2))
            );
        }
    }

    #[test]
    fn memo_reaches_the_largest_u64_term() {
        assert_eq!(fibonacci_memo(93), Some(12_200_160_415_121_876_738));
    }

    #[rstest]
    #[case(94)]
    #[case(200)]
    fn memo_reports_terms_past_u64(#[case] n: u64) {
        assert_eq!(fibonacci_memo(n), None);
    }
}
