// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Registers every enabled resource kind, in order, stopping at the first failure.

use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::crd::CrdReconciler;
use crate::kubernetes::wait::Shutdown;
use crate::types::{ResourceKind, ResourceKindDescriptor, SchemaVersions};
use kube::Client;
use tracing::{info, instrument};

pub struct CrdRegistrar {
    reconciler: CrdReconciler,
    descriptors: Vec<ResourceKindDescriptor>,
}

impl CrdRegistrar {
    /// Decode the descriptors of all enabled kinds.
    /// Fails if any embedded document does not decode.
    pub fn new(client: Client, config: &Config) -> Result<Self> {
        let policy = config.retry_policy();
        let reconciler = CrdReconciler::new(client, config.schema_versions.clone())
            .with_update_policy(policy)
            .with_wait_policy(policy);

        let kinds = ResourceKind::enabled(config.identity_allocation_mode);
        let descriptors = load_descriptors(&kinds, &config.schema_versions)?;

        Ok(Self {
            reconciler,
            descriptors,
        })
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.reconciler = self.reconciler.with_shutdown(shutdown);
        self
    }

    /// Kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.descriptors.iter().map(|d| d.kind())
    }

    /// Ensure every definition exists, is up to date and established
    #[instrument(skip(self))]
    pub async fn register_all(&self) -> Result<()> {
        for descriptor in &self.descriptors {
            self.reconciler.ensure(descriptor).await?;
        }

        info!("Registered {} CRDs", self.descriptors.len());
        Ok(())
    }
}

fn load_descriptors(
    kinds: &[ResourceKind],
    versions: &SchemaVersions,
) -> Result<Vec<ResourceKindDescriptor>> {
    kinds
        .iter()
        .map(|kind| ResourceKindDescriptor::load(*kind, versions.get(*kind)))
        .collect()
}
