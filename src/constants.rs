// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API coordinates shared by every registered definition
pub mod crd {
    /// API group all custom resource kinds are registered under
    pub const GROUP: &str = "cilium.io";
    /// Served and stored API version of every kind
    pub const VERSION: &str = "v2";
    /// Semver-conformant revision of the compiled-in schemas
    pub const SCHEMA_VERSION: &str = "1.18";
    /// Label holding the schema revision that produced a live definition
    pub const SCHEMA_VERSION_LABEL: &str = "io.cilium.k8s.crd.schema.version";
}

/// Status condition types and values reported by the apiextensions server
pub mod conditions {
    pub const ESTABLISHED: &str = "Established";
    pub const NAMES_ACCEPTED: &str = "NamesAccepted";
    pub const TRUE: &str = "True";
    pub const FALSE: &str = "False";
}

/// Polling bounds for the update retry and the establishment wait
pub mod poll {
    /// Delay between two attempts in milliseconds
    pub const INTERVAL_MS: u64 = 500;
    /// Deadline of a single polling loop in seconds
    pub const TIMEOUT_SECS: u64 = 60;
}
