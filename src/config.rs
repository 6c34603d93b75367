// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::poll;
use crate::kubernetes::wait::{Backoff, RetryPolicy};
use crate::types::SchemaVersions;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Where security identities are allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityAllocationMode {
    /// Identities are stored as custom resources, so their definition is registered
    Crd,
    /// Identities live in an external key-value store
    KvStore,
}

impl FromStr for IdentityAllocationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crd" => Ok(Self::Crd),
            "kvstore" => Ok(Self::KvStore),
            other => Err(anyhow!(
                "unknown identity allocation mode '{}', expected 'crd' or 'kvstore'",
                other
            )),
        }
    }
}

impl fmt::Display for IdentityAllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crd => f.write_str("crd"),
            Self::KvStore => f.write_str("kvstore"),
        }
    }
}

/// Registrar configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub identity_allocation_mode: IdentityAllocationMode,
    /// Delay between attempts of the update retry and the establishment wait
    pub poll_interval: Duration,
    /// Deadline of each of those loops
    pub wait_timeout: Duration,
    /// When set, the delay doubles after each attempt up to this cap
    pub poll_max_interval: Option<Duration>,
    /// Current schema revision per kind
    pub schema_versions: SchemaVersions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity_allocation_mode: IdentityAllocationMode::KvStore,
            poll_interval: Duration::from_millis(poll::INTERVAL_MS),
            wait_timeout: Duration::from_secs(poll::TIMEOUT_SECS),
            poll_max_interval: None,
            schema_versions: SchemaVersions::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let identity_allocation_mode = match lookup("IDENTITY_ALLOCATION_MODE") {
            Some(mode) => mode
                .parse::<IdentityAllocationMode>()
                .context("Invalid IDENTITY_ALLOCATION_MODE environment variable")?,
            None => defaults.identity_allocation_mode,
        };

        let poll_interval = match lookup("CRD_POLL_INTERVAL_MS") {
            Some(ms) => Duration::from_millis(
                ms.trim()
                    .parse::<u64>()
                    .context("Invalid CRD_POLL_INTERVAL_MS environment variable")?,
            ),
            None => defaults.poll_interval,
        };

        let wait_timeout = match lookup("CRD_WAIT_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse::<u64>()
                    .context("Invalid CRD_WAIT_TIMEOUT_SECS environment variable")?,
            ),
            None => defaults.wait_timeout,
        };

        let poll_max_interval = match lookup("CRD_POLL_MAX_INTERVAL_MS") {
            Some(ms) => Some(Duration::from_millis(
                ms.trim()
                    .parse::<u64>()
                    .context("Invalid CRD_POLL_MAX_INTERVAL_MS environment variable")?,
            )),
            None => defaults.poll_max_interval,
        };

        Ok(Config {
            identity_allocation_mode,
            poll_interval,
            wait_timeout,
            poll_max_interval,
            schema_versions: defaults.schema_versions,
        })
    }

    /// Policy shared by the update retry and the establishment wait
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::fixed(self.poll_interval, self.wait_timeout);
        match self.poll_max_interval {
            Some(max) => policy.with_backoff(Backoff::Exponential { max }),
            None => policy,
        }
    }
}
