//! Three-state circuit breaker
//!
//! CLOSED passes calls through and counts consecutive failures. Crossing the
//! failure threshold opens the circuit; while OPEN, calls are rejected until
//! the cool-down elapses. The first call after the cool-down probes in
//! HALF_OPEN: enough consecutive successes close the circuit again, any
//! failure re-opens it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{OracleError, OracleResult, PriceOracle, TickerSnapshot};

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing.
    pub cooldown: Duration,
    /// Consecutive half-open successes required to close.
    pub success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

/// Reusable circuit breaker guarding an external dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            }),
        }
    }

    /// Whether a call may proceed. Moves OPEN to HALF_OPEN once the
    /// cool-down has elapsed.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let cooled = inner
                    .opened_at
                    .map(|t| t.elapsed() >= self.config.cooldown)
                    .unwrap_or(true);
                if cooled {
                    inner.state = BreakerState::HalfOpen;
                    inner.successes = 0;
                    info!("circuit half-open, probing");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.failures = 0;
            }
            BreakerState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.config.success_threshold {
                    inner.state = BreakerState::Closed;
                    inner.failures = 0;
                    inner.successes = 0;
                    inner.opened_at = None;
                    info!("circuit closed");
                }
            }
            BreakerState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                inner.successes = 0;
                warn!("probe failed, circuit re-opened");
            }
            BreakerState::Closed => {
                inner.failures += 1;
                inner.successes = 0;
                if inner.failures >= self.config.failure_threshold {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(failures = inner.failures, "circuit opened");
                }
            }
            BreakerState::Open => {}
        }
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }
}

/// A price oracle wrapped in a circuit breaker.
pub struct Guarded<O> {
    oracle: O,
    breaker: CircuitBreaker,
}

impl<O> Guarded<O> {
    pub fn new(oracle: O, config: BreakerConfig) -> Self {
        Self {
            oracle,
            breaker: CircuitBreaker::new(config),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl<O: PriceOracle> PriceOracle for Guarded<O> {
    async fn ticker(&self, pair: &str) -> OracleResult<TickerSnapshot> {
        if !self.breaker.try_acquire() {
            return Err(OracleError::CircuitOpen);
        }
        match self.oracle.ticker(pair).await {
            Ok(snapshot) => {
                self.breaker.record_success();
                Ok(snapshot)
            }
            Err(e) => {
                self.breaker.record_failure();
                Err(e)
            }
        }
    }
}
