//! Workload Functions
//!
//! Two kinds of toy work, deliberately unoptimized:
//! - CPU-bound: [`count_primes`] and [`sum_squares`] burn cycles with no
//!   I/O and no suspension points.
//! - I/O-bound: [`simulate_io`] blocks without computing, standing in for
//!   any operation where the worker waits rather than works.
//!
//! All three are pure in the sense that matters here: deterministic for a
//! given input and safe to run in an isolated process with nothing shared
//! but the input itself.

use std::time::Duration;

/// Count the primes below `limit` by trial division.
///
/// O(n·√n) on purpose; the point is to occupy a core, not to be clever.
pub fn count_primes(limit: u64) -> u64 {
    let mut count = 0;
    let mut candidate = 2u64;
    while candidate < limit {
        let mut divisor = 2u64;
        let mut is_prime = true;
        while divisor * divisor <= candidate {
            if candidate % divisor == 0 {
                is_prime = false;
                break;
            }
            divisor += 1;
        }
        if is_prime {
            count += 1;
        }
        candidate += 1;
    }
    count
}

/// Sum of k² for k in `1..=limit`, wrapping on overflow so the result stays
/// defined (and still deterministic) for large limits.
pub fn sum_squares(limit: u64) -> u64 {
    let mut sum = 0u64;
    for k in 1..=limit {
        sum = sum.wrapping_add(k.wrapping_mul(k));
    }
    sum
}

/// Block for `wait` and return it, simulating an I/O operation that holds
/// the worker without consuming CPU.
pub fn simulate_io(wait: Duration) -> Duration {
    std::thread::sleep(wait);
    wait
}
