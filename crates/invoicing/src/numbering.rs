//! Invoice number issuance.

use core::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use billforge_core::DomainError;

/// Numbers wrap modulo this value (8 decimal digits).
pub const NUMBER_MODULUS: u64 = 100_000_000;

/// Permanent invoice number assigned at finalize time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InvoiceNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::validation("invoice number must not be empty"));
        }
        Ok(Self(s.to_string()))
    }
}

/// Source of unique invoice numbers.
///
/// Implementations must be safe to call from many threads at once and must
/// never hand out the same value twice (until a documented wraparound).
pub trait InvoiceNumberIssuer: Send + Sync {
    fn next(&self) -> InvoiceNumber;
}

/// Process-local issuer backed by an atomic counter.
///
/// Produces `"00000001"`, `"00000002"`, ... and wraps modulo 100,000,000. The
/// counter lives only as long as the process; seed it with
/// [`starting_at`](Self::starting_at) to resume after a restart.
#[derive(Debug)]
pub struct AtomicInvoiceNumberIssuer {
    counter: AtomicU64,
}

impl AtomicInvoiceNumberIssuer {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// The first call to `next` will use `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }

    /// Counter value the next call will consume.
    pub fn peek(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for AtomicInvoiceNumberIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceNumberIssuer for AtomicInvoiceNumberIssuer {
    fn next(&self) -> InvoiceNumber {
        // Uniqueness only needs the RMW to be atomic; no other memory is published.
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        InvoiceNumber(format!("{:08}", n % NUMBER_MODULUS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn starts_at_one_and_zero_pads() {
        let issuer = AtomicInvoiceNumberIssuer::new();
        assert_eq!(issuer.next().as_str(), "00000001");
        assert_eq!(issuer.next().as_str(), "00000002");
        assert_eq!(issuer.peek(), 3);
    }

    #[test]
    fn wraps_after_one_hundred_million_issuances() {
        // Counter value of the 99,999,999th call; the 100,000,000th yields
        // "00000000" and the one after restarts at "00000001".
        let issuer = AtomicInvoiceNumberIssuer::starting_at(NUMBER_MODULUS - 1);
        assert_eq!(issuer.next().as_str(), "99999999");
        assert_eq!(issuer.next().as_str(), "00000000");
        assert_eq!(issuer.next().as_str(), "00000001");
    }

    #[test]
    fn concurrent_issuance_is_unique_and_gapless() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 1_000;

        let issuer = AtomicInvoiceNumberIssuer::new();
        let issued: Vec<InvoiceNumber> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| s.spawn(|| (0..PER_THREAD).map(|_| issuer.next()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let values: HashSet<u64> = issued.iter().map(|n| n.as_str().parse().unwrap()).collect();
        let n = (THREADS * PER_THREAD) as u64;
        assert_eq!(values.len() as u64, n);
        assert_eq!(values, (1..=n).collect::<HashSet<_>>());
    }

    #[test]
    fn usable_as_trait_object() {
        let issuer: Box<dyn InvoiceNumberIssuer> = Box::new(AtomicInvoiceNumberIssuer::starting_at(42));
        assert_eq!(issuer.next().to_string(), "00000042");
    }

    #[test]
    fn empty_number_is_rejected() {
        assert!("  ".parse::<InvoiceNumber>().is_err());
        assert_eq!("INV-7".parse::<InvoiceNumber>().unwrap().as_str(), "INV-7");
    }
}
