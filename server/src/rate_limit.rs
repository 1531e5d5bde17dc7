use std::{
    net::{IpAddr, Ipv4Addr},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use rocket::request::{self, FromRequest, Request};
use tracing::{debug, instrument, warn};

const REFILL_WINDOW: Duration = Duration::from_secs(60);

/// Start budget of one client; refills to `capacity` once per window.
#[derive(Debug)]
struct TokenBucket {
    window_started: Instant,
    tokens: u32,
    capacity: u32,
}

impl TokenBucket {
    fn new(capacity: u32) -> Self {
        debug!("Creating new token bucket: capacity={}", capacity);
        Self {
            window_started: Instant::now(),
            tokens: capacity,
            capacity,
        }
    }

    fn try_consume(&mut self) -> bool {
        if self.window_started.elapsed() >= REFILL_WINDOW {
            self.tokens = self.capacity;
            self.window_started = Instant::now();
        }

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// Per-client budget for starting new games, refilled to full each minute.
pub struct RateLimiter {
    buckets: DashMap<IpAddr, TokenBucket>,
    games_per_minute: u32,
}

impl RateLimiter {
    pub fn new(games_per_minute: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            games_per_minute,
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn check(&self, client_ip: IpAddr) -> bool {
        let mut bucket = self
            .buckets
            .entry(client_ip)
            .or_insert_with(|| TokenBucket::new(self.games_per_minute));

        let allowed = bucket.try_consume();
        if !allowed {
            warn!("Rate limit exceeded for client {}", client_ip);
        }
        allowed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let ip = req
            .headers()
            .get_one("X-Forwarded-For")
            .and_then(|header| header.split(',').next())
            .and_then(|ip| ip.trim().parse().ok())
            .or_else(|| {
                req.headers()
                    .get_one("X-Real-IP")
                    .and_then(|ip| ip.trim().parse().ok())
            })
            .or_else(|| req.client_ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        request::Outcome::Success(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_runs_dry_then_refuses() {
        let limiter = RateLimiter::new(2);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(limiter.check(ip));
        assert!(limiter.check(ip));
        assert!(!limiter.check(ip));
    }

    #[test]
    fn clients_have_separate_buckets() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check("10.0.0.1".parse().unwrap()));
        assert!(limiter.check("10.0.0.2".parse().unwrap()));
        assert!(!limiter.check("10.0.0.1".parse().unwrap()));
    }
}
