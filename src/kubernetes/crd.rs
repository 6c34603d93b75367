// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create-or-update of a single CustomResourceDefinition and the wait for it to be established

use crate::constants::conditions::{ESTABLISHED, FALSE, NAMES_ACCEPTED, TRUE};
use crate::constants::crd::SCHEMA_VERSION_LABEL;
use crate::error::{RegistrarError, Result};
use crate::kubernetes::wait::{poll_until, RetryPolicy, Shutdown};
use crate::types::descriptor::{has_validation, ResourceKindDescriptor};
use crate::types::schema_version::{SchemaVersion, SchemaVersions};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{DeleteParams, PostParams},
    core::ErrorResponse,
    Api, Client,
};
use tracing::{debug, error, info, instrument, warn};

/// What a call to [`CrdReconciler::ensure`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// A concurrent caller created the definition first and owns its update
    CreatedByOther,
    /// The definition is established and up to date
    Installed { created: bool, updated: bool },
}

/// Ensures resource definitions exist, carry the current schema and are established.
///
/// Holds no state across calls; every phase re-reads the live object before
/// writing, and concurrent writers are resolved by the API server.
pub struct CrdReconciler {
    api: Api<CustomResourceDefinition>,
    versions: SchemaVersions,
    update_policy: RetryPolicy,
    wait_policy: RetryPolicy,
    shutdown: Shutdown,
}

impl CrdReconciler {
    pub fn new(client: Client, versions: SchemaVersions) -> Self {
        Self {
            api: Api::all(client),
            versions,
            update_policy: RetryPolicy::default(),
            wait_policy: RetryPolicy::default(),
            shutdown: Shutdown::never(),
        }
    }

    pub fn with_update_policy(mut self, policy: RetryPolicy) -> Self {
        self.update_policy = policy;
        self
    }

    pub fn with_wait_policy(mut self, policy: RetryPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Make sure the cluster holds an established definition matching `descriptor`.
    #[instrument(skip(self, descriptor), fields(name = %descriptor.kind(), crd = descriptor.name()))]
    pub async fn ensure(&self, descriptor: &ResourceKindDescriptor) -> Result<EnsureOutcome> {
        let name = descriptor.name();

        let (live, created) = match self.api.get(name).await {
            Ok(crd) => (crd, false),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                info!("Creating CRD (CustomResourceDefinition)...");
                match self.api.create(&PostParams::default(), &descriptor.to_crd()).await {
                    Ok(crd) => (crd, true),
                    // Another agent won the race; it also takes care of updating
                    Err(kube::Error::Api(err)) if is_already_exists(&err) => {
                        info!("CRD (CustomResourceDefinition) was created concurrently");
                        return Ok(EnsureOutcome::CreatedByOther);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Checking if CRD (CustomResourceDefinition) needs update...");

        let current = self.versions.get(descriptor.kind());
        let (live, updated) = if descriptor.has_validation()
            && schema_version_label(&live).is_some_and(|v| !v.is_empty())
            && needs_update(&live, current)
        {
            info!("Updating CRD (CustomResourceDefinition)...");
            self.update(descriptor, current).await.inspect_err(|e| {
                error!("Unable to update CRD: {}", e);
            })?
        } else {
            (live, false)
        };

        debug!("Waiting for CRD (CustomResourceDefinition) to be available...");
        if let Err(err) = self.wait_established(name, live).await {
            error!("CRD (CustomResourceDefinition) was not established: {}", err);
            return Err(self.delete_after_failure(name, err).await);
        }

        info!("CRD (CustomResourceDefinition) is installed and up-to-date");
        Ok(EnsureOutcome::Installed { created, updated })
    }

    /// Replace the live spec and labels with the descriptor's until the update
    /// lands or someone else already brought the definition up to date.
    async fn update(
        &self,
        descriptor: &ResourceKindDescriptor,
        current: &SchemaVersion,
    ) -> Result<(CustomResourceDefinition, bool)> {
        let api = &self.api;
        let name = descriptor.name();

        poll_until(&self.update_policy, &self.shutdown, move || async move {
            let mut live = api.get(name).await?;

            if !needs_update(&live, current) {
                debug!("CRD already updated by another caller");
                return Ok(Some((live, false)));
            }

            debug!("CRD validation is different, updating it...");
            live.metadata.labels = Some(descriptor.labels());
            live.spec = descriptor.spec().clone();

            match api.replace(name, &PostParams::default(), &live).await {
                Ok(crd) => Ok(Some((crd, true))),
                Err(kube::Error::Api(err)) if err.code == 409 => {
                    debug!("Unable to update CRD validation, retrying: {}", err.message);
                    Ok(None)
                }
                Err(e) => Err(RegistrarError::from(e)),
            }
        })
        .await
    }

    /// Poll until the definition reports `Established=True`
    async fn wait_established(&self, name: &str, live: CustomResourceDefinition) -> Result<()> {
        if is_established(&live) {
            return Ok(());
        }

        let api = &self.api;
        poll_until(&self.wait_policy, &self.shutdown, move || async move {
            let live = api.get(name).await?;
            Ok::<_, RegistrarError>(is_established(&live).then_some(()))
        })
        .await
    }

    /// Remove a definition that never became usable so it cannot block later
    /// schema changes, and fold a failed delete into the returned error.
    async fn delete_after_failure(&self, name: &str, err: RegistrarError) -> RegistrarError {
        if matches!(err, RegistrarError::Cancelled) {
            return err;
        }

        warn!("Deleting CRD (CustomResourceDefinition) that was not established");
        let delete_error = match self.api.delete(name, &DeleteParams::default()).await {
            Ok(_) => None,
            Err(e) => {
                error!("Unable to delete CRD: {}", e);
                Some(e.to_string())
            }
        };

        RegistrarError::NotEstablished {
            name: name.to_string(),
            source: Box::new(err),
            delete_error,
        }
    }
}

fn is_already_exists(err: &ErrorResponse) -> bool {
    err.code == 409 && err.reason == "AlreadyExists"
}

fn schema_version_label(crd: &CustomResourceDefinition) -> Option<&str> {
    crd.metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(SCHEMA_VERSION_LABEL))
        .map(String::as_str)
}

/// Whether the live definition has to be replaced by the compiled-in one.
///
/// True when it has no validation schema, no schema-version label, a label
/// that does not parse, or a label older than `current`.
pub fn needs_update(live: &CustomResourceDefinition, current: &SchemaVersion) -> bool {
    if !has_validation(live) {
        return true;
    }

    let Some(label) = schema_version_label(live) else {
        return true;
    };

    match SchemaVersion::parse(label) {
        Ok(version) => version < *current,
        Err(_) => true,
    }
}

/// Inspect the status conditions. A name conflict is only logged: the
/// condition can still flip once the conflicting definition goes away.
fn is_established(crd: &CustomResourceDefinition) -> bool {
    let conditions = crd
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    for condition in conditions {
        match condition.type_.as_str() {
            ESTABLISHED if condition.status == TRUE => return true,
            NAMES_ACCEPTED if condition.status == FALSE => {
                error!(
                    reason = condition.reason.as_deref().unwrap_or_default(),
                    "Name conflict for CRD"
                );
            }
            _ => {}
        }
    }

    false
}
