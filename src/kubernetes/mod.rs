// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for reconciling CustomResourceDefinitions.

pub mod crd;
pub mod wait;

pub use crd::{needs_update, CrdReconciler, EnsureOutcome};
pub use wait::{poll_until, Backoff, RetryPolicy, Shutdown, ShutdownTrigger};
