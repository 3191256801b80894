// rate_limit.rs — leaky-bucket throttling for out-of-band commands
//
// Modeled as a plain synchronous value struct rather than an atomic/async
// primitive: the core is single-threaded and cooperative, so there is
// never contention to protect against. Bucket state holds no clock of its
// own — callers supply `now` from the server's own timebase so refill stays
// deterministic across frames.

use std::collections::HashMap;

#[derive(Clone, Copy)]
pub struct LeakyBucket {
    last_refill: i32,
    tokens: f32,
    capacity: f32,
    /// Tokens regenerated per millisecond.
    refill_per_ms: f32,
}

impl LeakyBucket {
    pub fn new(capacity: u32, period_ms: i32, now: i32) -> Self {
        Self {
            last_refill: now,
            tokens: capacity as f32,
            capacity: capacity as f32,
            refill_per_ms: capacity as f32 / period_ms.max(1) as f32,
        }
    }

    /// Attempt to consume one token. Returns true if allowed.
    pub fn take(&mut self, now: i32) -> bool {
        let elapsed = (now - self.last_refill).max(0) as f32;
        self.tokens = (self.tokens + elapsed * self.refill_per_ms).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// A bounded, LRU-evicted map of per-key leaky buckets (one per remote
/// address) backing the challenge table's rate limiting.
pub struct BucketMap {
    buckets: HashMap<String, (LeakyBucket, i32)>, // value, last_used
    capacity: usize,
    default_burst: u32,
    default_period_ms: i32,
}

impl BucketMap {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            capacity: 4096,
            default_burst: 10,
            default_period_ms: 1000,
        }
    }

    pub fn with_policy(capacity: usize, burst: u32, period_ms: i32) -> Self {
        Self {
            buckets: HashMap::new(),
            capacity,
            default_burst: burst,
            default_period_ms: period_ms,
        }
    }

    /// Attempt to consume one token for `key`, creating the bucket on first use.
    pub fn take(&mut self, key: &str, now: i32) -> bool {
        if !self.buckets.contains_key(key) {
            if self.buckets.len() >= self.capacity {
                self.evict_oldest();
            }
            let bucket = LeakyBucket::new(self.default_burst, self.default_period_ms, now);
            self.buckets.insert(key.to_string(), (bucket, now));
        }
        let entry = self.buckets.get_mut(key).unwrap();
        entry.1 = now;
        entry.0.take(now)
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest_key) = self
            .buckets
            .iter()
            .min_by_key(|(_, (_, last_used))| *last_used)
            .map(|(k, _)| k.clone())
        {
            self.buckets.remove(&oldest_key);
        }
    }
}

impl Default for BucketMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_allows_burst_then_throttles() {
        let mut b = LeakyBucket::new(10, 1000, 0);
        for _ in 0..10 {
            assert!(b.take(0));
        }
        assert!(!b.take(0));
    }

    #[test]
    fn bucket_refills_over_time() {
        let mut b = LeakyBucket::new(10, 1000, 0);
        for _ in 0..10 {
            assert!(b.take(0));
        }
        assert!(!b.take(0));
        assert!(b.take(500));
    }
}
