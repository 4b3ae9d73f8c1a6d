//! Per-IP request throttling for the inference route.
//!
//! Inference calls are expensive upstream, so each client IP gets a small
//! token bucket: a burst allowance that refills at a steady rate. Requests
//! with no resolvable client IP are let through.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct Throttle {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    refill_per_sec: f64,
    burst: f64,
}

impl Throttle {
    pub fn new(refill_per_sec: f64, burst: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            refill_per_sec,
            burst,
        }
    }

    /// Consume one token for `ip`, refilling for the time elapsed since the
    /// last request. Returns false when the bucket is dry.
    pub async fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(ip).or_insert(Bucket {
            tokens: self.burst,
            last_seen: now,
        });

        let elapsed = now.duration_since(bucket.last_seen).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.burst);
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Evict buckets idle longer than `max_idle_secs`. Run periodically so
    /// the map does not grow with every IP ever seen.
    pub async fn purge_idle(&self, max_idle_secs: f64) {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        buckets.retain(|_, bucket| {
            now.duration_since(bucket.last_seen).as_secs_f64() < max_idle_secs
        });
    }

    #[cfg(test)]
    async fn tracked_ips(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

impl Default for Throttle {
    fn default() -> Self {
        // 2 req/s sustained with a burst of 10: generous for a human typing
        // into a chat box, tight for a scraper.
        Self::new(2.0, 10.0)
    }
}

pub async fn throttle_middleware(
    State(throttle): State<Throttle>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(ip) = client_ip(&req) {
        if !throttle.allow(ip).await {
            warn!(ip = %ip, "Request throttled");
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

/// Try ConnectInfo first, then X-Forwarded-For, then X-Real-IP.
fn client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(connect_info) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return Some(connect_info.0.ip());
    }

    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());
    if forwarded.is_some() {
        return forwarded;
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_dry() {
        let throttle = Throttle::new(1.0, 3.0);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(throttle.allow(ip).await);
        }
        assert!(!throttle.allow(ip).await);
    }

    #[tokio::test]
    async fn test_ips_do_not_share_buckets() {
        let throttle = Throttle::new(1.0, 1.0);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(throttle.allow(a).await);
        assert!(!throttle.allow(a).await);
        assert!(throttle.allow(b).await);
    }

    #[tokio::test]
    async fn test_purge_idle_empties_map() {
        let throttle = Throttle::new(1.0, 2.0);
        let ip: IpAddr = "192.168.1.7".parse().unwrap();
        throttle.allow(ip).await;

        throttle.purge_idle(0.0).await;
        assert_eq!(throttle.tracked_ips().await, 0);
    }
}
