// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Schema revisions stamped on live definitions and the per-kind table of current revisions.

use crate::constants::crd::SCHEMA_VERSION;
use crate::error::{RegistrarError, Result};
use crate::types::kind::ResourceKind;
use semver::Version;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A semantic version as written in the schema-version label.
///
/// Short forms such as `1.18` or `v1.18` are accepted and compare as `1.18.0`;
/// the text as written is kept so it can be stamped back unchanged.
#[derive(Debug, Clone)]
pub struct SchemaVersion {
    raw: String,
    version: Version,
}

impl SchemaVersion {
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let version: Version = lenient_semver::parse(trimmed).map_err(|e| {
            RegistrarError::InvalidSchemaVersion {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            raw: trimmed.to_string(),
            version,
        })
    }

    /// The compiled-in schema revision
    pub fn current() -> Self {
        Self::parse(SCHEMA_VERSION).expect("compiled-in schema version is valid semver")
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for SchemaVersion {
    type Err = RegistrarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for SchemaVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for SchemaVersion {}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

/// Current schema revision for each resource kind.
#[derive(Debug, Clone)]
pub struct SchemaVersions {
    default: SchemaVersion,
    overrides: HashMap<ResourceKind, SchemaVersion>,
}

impl SchemaVersions {
    /// Every kind at the same revision
    pub fn uniform(version: SchemaVersion) -> Self {
        Self {
            default: version,
            overrides: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: ResourceKind, version: SchemaVersion) -> Self {
        self.overrides.insert(kind, version);
        self
    }

    pub fn get(&self, kind: ResourceKind) -> &SchemaVersion {
        self.overrides.get(&kind).unwrap_or(&self.default)
    }
}

impl Default for SchemaVersions {
    fn default() -> Self {
        Self::uniform(SchemaVersion::current())
    }
}
