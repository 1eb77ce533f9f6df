//! Per-phone-number throttle for verification sends.
//!
//! SMS sends are the expensive resource (each one costs money and can be
//! abused for pumping), so the bucket is keyed by the target phone number
//! rather than the caller's IP.  A background task evicts idle buckets.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self, rate: f64, capacity: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;

        self.tokens = (self.tokens + elapsed * rate).min(capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Clone)]
pub struct SmsThrottle {
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
    rate: f64,
    capacity: f64,
}

impl SmsThrottle {
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            rate,
            capacity,
        }
    }

    /// Whether another code may be sent to `phone_number` right now.
    pub async fn check(&self, phone_number: &str) -> bool {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry(phone_number.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity));
        bucket.try_consume(self.rate, self.capacity)
    }

    pub async fn purge_stale(&self, max_idle_secs: f64) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| {
            now.duration_since(bucket.last_refill).as_secs_f64() < max_idle_secs
        });
    }
}

impl Default for SmsThrottle {
    /// A burst of 3 codes, refilling one every 20 seconds.
    fn default() -> Self {
        Self::new(1.0 / 20.0, 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_burst_then_blocks() {
        let throttle = SmsThrottle::new(1.0 / 20.0, 3.0);

        for _ in 0..3 {
            assert!(throttle.check("+15551234567").await);
        }
        assert!(!throttle.check("+15551234567").await);
    }

    #[tokio::test]
    async fn test_numbers_are_independent() {
        let throttle = SmsThrottle::new(1.0 / 20.0, 1.0);

        assert!(throttle.check("+15551234567").await);
        assert!(!throttle.check("+15551234567").await);

        assert!(throttle.check("+15557654321").await);
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let throttle = SmsThrottle::default();
        assert!(throttle.check("+15551234567").await);

        throttle.purge_stale(0.0).await;

        let buckets = throttle.buckets.lock().await;
        assert!(buckets.is_empty());
    }
}
