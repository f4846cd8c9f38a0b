//! Ordered fallback over candidates.

use std::fmt;
use std::future::Future;

/// A failed attempt against one candidate.
#[derive(Debug, Clone)]
pub struct Attempt<K, E> {
    /// The candidate tried.
    pub candidate: K,
    /// Why it failed.
    pub error: E,
}

/// Every candidate failed. Attempts are kept in the order they were made.
#[derive(Debug, Clone)]
pub struct Exhausted<K, E> {
    /// Failed attempts, oldest first.
    pub attempts: Vec<Attempt<K, E>>,
}

impl<K, E> Exhausted<K, E> {
    /// The most recent failure, `None` if there were no candidates at all.
    pub fn last(&self) -> Option<&Attempt<K, E>> {
        self.attempts.last()
    }
}

impl<K: fmt::Display, E: fmt::Display> fmt::Display for Exhausted<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last() {
            Some(last) => write!(
                f,
                "all {} candidates failed, last {}: {}",
                self.attempts.len(),
                last.candidate,
                last.error
            ),
            None => f.write_str("no candidates to try"),
        }
    }
}

/// Run `op` against each candidate in order and return the first success
/// together with the candidate that produced it.
///
/// Each candidate is tried exactly once. Later candidates are not touched
/// after a success.
pub async fn try_in_order<K, T, E, I, F, Fut>(
    candidates: I,
    mut op: F,
) -> Result<(K, T), Exhausted<K, E>>
where
    I: IntoIterator<Item = K>,
    K: Clone,
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = Vec::new();

    for candidate in candidates {
        match op(candidate.clone()).await {
            Ok(value) => return Ok((candidate, value)),
            Err(error) => attempts.push(Attempt { candidate, error }),
        }
    }

    Err(Exhausted { attempts })
}
