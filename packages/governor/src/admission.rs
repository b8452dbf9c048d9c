// ABOUTME: Per-identity admission checks across second/minute/hour/day windows
// ABOUTME: Denial is a first-class result with a retry hint, never an error

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

/// Ceilings per time window. Conservative defaults guard model-call cost.
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    pub per_second: u32,
    pub per_minute: u32,
    pub per_hour: u32,
    pub per_day: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            per_second: 2,
            per_minute: 10,
            per_hour: 100,
            per_day: 1000,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Result of an admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied {
        retry_after: Duration,
        window: &'static str,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Snapshot of governor state for the availability endpoint
#[derive(Debug, Clone, Serialize)]
pub struct GovernorStats {
    pub limit_per_minute: u32,
    pub limit_per_hour: u32,
    pub limit_per_day: u32,
    pub active_cooldowns: usize,
}

struct WindowLimiter {
    name: &'static str,
    limiter: DefaultKeyedRateLimiter<String>,
}

/// Keyed rate limiter over the four configured windows plus a failure
/// cooldown with exponential backoff.
pub struct RateGovernor {
    config: GovernorConfig,
    windows: Vec<WindowLimiter>,
    clock: DefaultClock,
    cooldowns: Mutex<HashMap<String, Cooldown>>,
}

struct Cooldown {
    consecutive_failures: u32,
    until: Instant,
}

fn nonzero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value.max(1)).expect("max(1) is non-zero")
}

impl RateGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        // A day quota has no Quota constructor; express it as one cell per
        // day/N with a burst of the full ceiling.
        let day_period = Duration::from_secs(86_400) / config.per_day.max(1);
        let day_quota = Quota::with_period(day_period)
            .expect("day period is non-zero")
            .allow_burst(nonzero(config.per_day));

        let windows = vec![
            WindowLimiter {
                name: "second",
                limiter: RateLimiter::keyed(Quota::per_second(nonzero(config.per_second))),
            },
            WindowLimiter {
                name: "minute",
                limiter: RateLimiter::keyed(Quota::per_minute(nonzero(config.per_minute))),
            },
            WindowLimiter {
                name: "hour",
                limiter: RateLimiter::keyed(Quota::per_hour(nonzero(config.per_hour))),
            },
            WindowLimiter {
                name: "day",
                limiter: RateLimiter::keyed(day_quota),
            },
        ];

        Self {
            config,
            windows,
            clock: DefaultClock::default(),
            cooldowns: Mutex::new(HashMap::new()),
        }
    }

    /// Checks every window for the identity. The first exceeded window
    /// denies the request with the wait until its next free slot.
    pub fn admit(&self, identity: &str) -> Admission {
        if let Some(retry_after) = self.cooldown_remaining(identity) {
            warn!(identity, "Admission denied: failure cooldown active");
            return Admission::Denied {
                retry_after,
                window: "cooldown",
            };
        }

        let key = identity.to_string();
        for window in &self.windows {
            if let Err(not_until) = window.limiter.check_key(&key) {
                let retry_after = not_until.wait_time_from(self.clock.now());
                warn!(
                    identity,
                    window = window.name,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Admission denied: rate ceiling exceeded"
                );
                return Admission::Denied {
                    retry_after,
                    window: window.name,
                };
            }
        }

        debug!(identity, "Admission granted");
        Admission::Allowed
    }

    /// Records a pipeline failure and extends the identity's cooldown with
    /// exponential backoff (jittered to avoid synchronized retries).
    pub fn record_failure(&self, identity: &str) {
        let mut cooldowns = self.cooldowns.lock().expect("cooldown lock poisoned");
        let entry = cooldowns
            .entry(identity.to_string())
            .or_insert_with(|| Cooldown {
                consecutive_failures: 0,
                until: Instant::now(),
            });

        entry.consecutive_failures += 1;
        let exponent = entry.consecutive_failures.saturating_sub(1);
        let mut backoff = self.config.initial_backoff.as_secs_f64()
            * self.config.backoff_multiplier.powi(exponent as i32);
        backoff = backoff.min(self.config.max_backoff.as_secs_f64());

        if self.config.jitter {
            backoff *= 0.5 + rand::thread_rng().gen::<f64>() * 0.5;
        }

        entry.until = Instant::now() + Duration::from_secs_f64(backoff);
        warn!(
            identity,
            failures = entry.consecutive_failures,
            backoff_secs = backoff,
            "Recorded pipeline failure, cooldown extended"
        );
    }

    /// Clears the failure streak after a success.
    pub fn record_success(&self, identity: &str) {
        let mut cooldowns = self.cooldowns.lock().expect("cooldown lock poisoned");
        cooldowns.remove(identity);
    }

    pub fn stats(&self) -> GovernorStats {
        let now = Instant::now();
        let cooldowns = self.cooldowns.lock().expect("cooldown lock poisoned");
        GovernorStats {
            limit_per_minute: self.config.per_minute,
            limit_per_hour: self.config.per_hour,
            limit_per_day: self.config.per_day,
            active_cooldowns: cooldowns.values().filter(|c| c.until > now).count(),
        }
    }

    fn cooldown_remaining(&self, identity: &str) -> Option<Duration> {
        let cooldowns = self.cooldowns.lock().expect("cooldown lock poisoned");
        cooldowns.get(identity).and_then(|cooldown| {
            let now = Instant::now();
            (cooldown.until > now).then(|| cooldown.until - now)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_config() -> GovernorConfig {
        GovernorConfig {
            per_second: 2,
            per_minute: 100,
            per_hour: 1000,
            per_day: 10_000,
            jitter: false,
            ..GovernorConfig::default()
        }
    }

    #[test]
    fn admits_up_to_ceiling_then_denies() {
        let governor = RateGovernor::new(tight_config());

        assert!(governor.admit("user_a").is_allowed());
        assert!(governor.admit("user_a").is_allowed());

        match governor.admit("user_a") {
            Admission::Denied {
                retry_after,
                window,
            } => {
                assert_eq!(window, "second");
                assert!(retry_after <= Duration::from_secs(1));
            }
            Admission::Allowed => panic!("third request within a second must be denied"),
        }
    }

    #[test]
    fn identities_do_not_share_windows() {
        let governor = RateGovernor::new(tight_config());

        assert!(governor.admit("user_a").is_allowed());
        assert!(governor.admit("user_a").is_allowed());
        assert!(governor.admit("user_b").is_allowed());
    }

    #[test]
    fn admission_recovers_after_window_elapses() {
        let governor = RateGovernor::new(tight_config());

        assert!(governor.admit("user_a").is_allowed());
        assert!(governor.admit("user_a").is_allowed());
        assert!(!governor.admit("user_a").is_allowed());

        std::thread::sleep(Duration::from_millis(1100));
        assert!(governor.admit("user_a").is_allowed());
    }

    #[test]
    fn failure_cooldown_blocks_and_success_clears() {
        let governor = RateGovernor::new(GovernorConfig {
            jitter: false,
            ..tight_config()
        });

        governor.record_failure("user_a");
        match governor.admit("user_a") {
            Admission::Denied { window, .. } => assert_eq!(window, "cooldown"),
            Admission::Allowed => panic!("cooldown must deny"),
        }
        assert_eq!(governor.stats().active_cooldowns, 1);

        governor.record_success("user_a");
        assert!(governor.admit("user_a").is_allowed());
        assert_eq!(governor.stats().active_cooldowns, 0);
    }

    #[test]
    fn backoff_grows_with_consecutive_failures() {
        let governor = RateGovernor::new(GovernorConfig {
            jitter: false,
            ..tight_config()
        });

        governor.record_failure("user_a");
        let first = match governor.admit("user_a") {
            Admission::Denied { retry_after, .. } => retry_after,
            Admission::Allowed => panic!("cooldown must deny"),
        };

        governor.record_failure("user_a");
        let second = match governor.admit("user_a") {
            Admission::Denied { retry_after, .. } => retry_after,
            Admission::Allowed => panic!("cooldown must deny"),
        };

        assert!(second > first);
    }
}
