// src/retry/policy.rs

//! Retry budget and backoff between attempts.
//!
//! A policy is a plain value handed to a client at construction. Nothing is
//! registered globally, so two clients can retry differently side by side.

use std::time::Duration;

use rand::Rng;

use crate::models::RetryConfig;

/// Delay function between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Retry immediately
    None,
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial * multiplier^(n-1)`, capped at `max`, then spread uniformly by
    /// `±randomization_factor`
    ExponentialRandom {
        initial: Duration,
        multiplier: f64,
        randomization_factor: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the `attempt`-th attempt (1-based) failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::ExponentialRandom {
                initial,
                multiplier,
                randomization_factor,
                max,
            } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let base = initial.as_secs_f64() * multiplier.powi(exponent);
                let capped = base.min(max.as_secs_f64());
                let spread = capped * randomization_factor.clamp(0.0, 1.0);
                let jittered = if spread > 0.0 {
                    rand::thread_rng().gen_range((capped - spread)..=(capped + spread))
                } else {
                    capped
                };
                // Jitter can push a near-maximal delay past what Duration holds
                Duration::try_from_secs_f64(jittered.max(0.0)).unwrap_or(*max)
            }
        }
    }
}

/// Maximum attempts per call and the delay between them.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// A budget below one attempt is raised to one.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(1, Backoff::None)
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Backoff::ExponentialRandom {
                initial: Duration::from_millis(config.initial_delay_ms),
                multiplier: config.multiplier,
                randomization_factor: config.randomization_factor,
                max: Duration::from_millis(config.max_delay_ms),
            },
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Whether the budget allows another attempt after `attempt` attempts.
    pub fn has_budget_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
