//! Rate limiting configuration for API endpoints.
//!
//! Limits are per peer IP and use the governor token bucket: tokens refill
//! every `per_second` seconds and at most `burst_size` can accumulate.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_ENABLED`: turn limiting off entirely (default: true)
//! - `RATE_LIMIT_GENERAL_PER_SECOND` / `RATE_LIMIT_GENERAL_BURST_SIZE` (default: 1 / 60)
//! - `RATE_LIMIT_AUTH_PER_SECOND` / `RATE_LIMIT_AUTH_BURST_SIZE` (default: 4 / 10)

use governor::middleware::NoOpMiddleware;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;

use crate::{env_bool, env_parse};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Seconds between token refills.
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    pub const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }

    /// Builds a peer-IP keyed governor config, or `None` when the rule has a
    /// zero period or burst.
    pub fn governor_config(&self) -> Option<GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>> {
        GovernorConfigBuilder::default()
            .per_second(self.per_second)
            .burst_size(self.burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
    }
}

/// Auth endpoints get a stricter budget than the rest of the API to slow
/// down credential stuffing against login and password reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub general: RateLimitRule,
    pub auth: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general: RateLimitRule::new(1, 60),
            auth: RateLimitRule::new(4, 10),
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_bool("RATE_LIMIT_ENABLED", defaults.enabled),
            general: RateLimitRule::new(
                env_parse("RATE_LIMIT_GENERAL_PER_SECOND", defaults.general.per_second),
                env_parse("RATE_LIMIT_GENERAL_BURST_SIZE", defaults.general.burst_size),
            ),
            auth: RateLimitRule::new(
                env_parse("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth.per_second),
                env_parse("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth.burst_size),
            ),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
