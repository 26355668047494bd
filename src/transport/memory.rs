//! Scoped memory budget for buffered response bodies.
//!
//! A budget is created for one batch and shared by every request of that
//! batch. Bodies reserve bytes as they stream in; a request whose body does
//! not fit is rejected on its own while the rest of the batch continues.

use std::sync::atomic::{AtomicU64, Ordering};

/// Byte budget shared by all requests of one batch.
#[derive(Debug)]
pub struct MemoryBudget {
    limit: u64,
    used: AtomicU64,
}

impl MemoryBudget {
    /// Creates a budget of `limit` bytes.
    #[must_use]
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: AtomicU64::new(0),
        }
    }

    /// Returns the budget size in bytes.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns the number of bytes currently reserved.
    #[must_use]
    pub fn used(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }

    /// Reserves `bytes`, returning false if that would exceed the limit.
    pub fn try_reserve(&self, bytes: u64) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(bytes).filter(|total| *total <= self.limit)
            })
            .is_ok()
    }

    /// Returns `bytes` to the budget.
    pub fn release(&self, bytes: u64) {
        let _ = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_sub(bytes))
            });
    }

    /// Starts an empty reservation against this budget.
    #[must_use]
    pub fn reservation(&self) -> Reservation<'_> {
        Reservation {
            budget: self,
            bytes: 0,
        }
    }
}

/// Bytes held for one body while it streams in.
///
/// Dropping the reservation returns its bytes to the budget; [`keep`]
/// leaves them reserved for the rest of the batch.
///
/// [`keep`]: Reservation::keep
#[derive(Debug)]
pub struct Reservation<'a> {
    budget: &'a MemoryBudget,
    bytes: u64,
}

impl Reservation<'_> {
    /// Reserves `bytes` more, returning false if the budget is exhausted.
    pub fn grow(&mut self, bytes: u64) -> bool {
        if !self.budget.try_reserve(bytes) {
            return false;
        }
        self.bytes += bytes;
        true
    }

    /// Returns the budget size in bytes.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.budget.limit()
    }

    /// Keeps the reserved bytes for as long as the budget lives.
    pub fn keep(mut self) {
        self.bytes = 0;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.budget.release(self.bytes);
    }
}

/// Parses a memory size such as `"2G"`, `"512M"`, `"64K"` or `"1048576"`.
///
/// Suffixes are case-insensitive and binary (`K` = 1024). Returns `None`
/// for empty, negative, zero or malformed values.
#[must_use]
pub fn parse_memory_limit(text: &str) -> Option<u64> {
    let text = text.trim();
    let (digits, multiplier) = match text.chars().last()? {
        'k' | 'K' => (&text[..text.len() - 1], 1024_u64),
        'm' | 'M' => (&text[..text.len() - 1], 1024 * 1024),
        'g' | 'G' => (&text[..text.len() - 1], 1024 * 1024 * 1024),
        _ => (text, 1),
    };
    let value: u64 = digits.trim().parse().ok()?;
    value.checked_mul(multiplier).filter(|bytes| *bytes > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_limit_suffixes() {
        assert_eq!(parse_memory_limit("2G"), Some(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_memory_limit("512m"), Some(512 * 1024 * 1024));
        assert_eq!(parse_memory_limit("64K"), Some(64 * 1024));
        assert_eq!(parse_memory_limit("4096"), Some(4096));
        assert_eq!(parse_memory_limit(" 1G "), Some(1024 * 1024 * 1024));
    }

    #[test]
    fn test_parse_memory_limit_rejects_invalid() {
        for value in ["", "G", "-1", "0", "1.5G", "2T", "abc"] {
            assert_eq!(parse_memory_limit(value), None, "value {value:?}");
        }
    }

    #[test]
    fn test_budget_reserve_within_limit() {
        let budget = MemoryBudget::new(10);
        assert!(budget.try_reserve(4));
        assert!(budget.try_reserve(6));
        assert_eq!(budget.used(), 10);
        assert!(!budget.try_reserve(1));
        assert_eq!(budget.used(), 10, "failed reservation must not change usage");
    }

    #[test]
    fn test_budget_release() {
        let budget = MemoryBudget::new(10);
        assert!(budget.try_reserve(8));
        budget.release(5);
        assert_eq!(budget.used(), 3);
        budget.release(100);
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn test_dropped_reservation_is_returned() {
        let budget = MemoryBudget::new(10);
        {
            let mut reservation = budget.reservation();
            assert!(reservation.grow(6));
            assert!(!reservation.grow(5));
            assert_eq!(budget.used(), 6);
        }
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn test_kept_reservation_stays_reserved() {
        let budget = MemoryBudget::new(10);
        let mut reservation = budget.reservation();
        assert!(reservation.grow(4));
        reservation.keep();
        assert_eq!(budget.used(), 4);
    }
}
