// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded, cancellable polling

use crate::constants::poll::{INTERVAL_MS, TIMEOUT_SECS};
use crate::error::{RegistrarError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

/// How the delay between two attempts evolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Always wait `interval`
    Fixed,
    /// Double the delay after each attempt, capped at `max`
    Exponential { max: Duration },
}

impl Backoff {
    fn next(&self, current: Duration) -> Duration {
        match self {
            Backoff::Fixed => current,
            Backoff::Exponential { max } => current.saturating_mul(2).min(*max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            backoff: Backoff::Fixed,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(
            Duration::from_millis(INTERVAL_MS),
            Duration::from_secs(TIMEOUT_SECS),
        )
    }
}

/// Cancellation signal observed by every polling loop.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: Option<watch::Receiver<bool>>,
}

/// Fires the paired [`Shutdown`] signals
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx: Some(rx) })
    }

    /// Resolves once the trigger fired. A dropped trigger never fires.
    pub async fn cancelled(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            if rx.wait_for(|triggered| *triggered).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::never()
    }
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // Receivers may already be gone once registration finished
        let _ = self.tx.send(true);
    }
}

/// Run `condition` until it yields a value.
///
/// The first attempt runs immediately, later ones after the policy's interval.
/// An error from `condition` ends the loop right away. The whole loop is bounded
/// by the policy's timeout and aborted when `shutdown` fires.
pub async fn poll_until<T, F, Fut>(
    policy: &RetryPolicy,
    shutdown: &Shutdown,
    mut condition: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let attempts = async {
        let mut interval = policy.interval;
        loop {
            match condition().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) => return Err(e),
            }
            sleep(interval).await;
            interval = policy.backoff.next(interval);
        }
    };

    let mut shutdown = shutdown.clone();
    tokio::select! {
        res = timeout(policy.timeout, attempts) => match res {
            Ok(result) => result,
            Err(_) => Err(RegistrarError::Timeout(policy.timeout)),
        },
        _ = shutdown.cancelled() => Err(RegistrarError::Cancelled),
    }
}
