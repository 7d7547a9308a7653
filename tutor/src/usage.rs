//! Process-wide LLM usage counters
//!
//! Shared across concurrent requests via `Arc`; atomic increments so no
//! update is lost under load. Reset only on restart.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Thread-safe usage counters
#[derive(Debug, Default)]
pub struct UsageCounters {
    calls: AtomicU64,
    estimated_tokens: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time snapshot for the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct UsageStats {
    pub call_count: u64,
    pub estimated_tokens: u64,
    pub error_count: u64,
    /// Percentage of calls that completed successfully
    pub success_rate: f64,
}

impl UsageCounters {
    /// Record a completed call and its estimated token consumption
    pub fn record_success(&self, tokens: u64) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.estimated_tokens.fetch_add(tokens, Ordering::Relaxed);
    }

    /// Record a failed call
    pub fn record_error(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Read a consistent-enough snapshot of the counters
    pub fn snapshot(&self) -> UsageStats {
        let calls = self.calls.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        UsageStats {
            call_count: calls,
            estimated_tokens: self.estimated_tokens.load(Ordering::Relaxed),
            error_count: errors,
            success_rate: (calls.saturating_sub(errors)) as f64 / calls.max(1) as f64 * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_zero_calls() {
        let counters = UsageCounters::default();
        let stats = counters.snapshot();
        assert_eq!(stats.call_count, 0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_success_rate() {
        let counters = UsageCounters::default();
        counters.record_success(100);
        counters.record_success(50);
        counters.record_success(50);
        counters.record_error();
        let stats = counters.snapshot();
        assert_eq!(stats.call_count, 4);
        assert_eq!(stats.estimated_tokens, 200);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.success_rate, 75.0);
    }
}
