// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Canonical resource definitions built from the embedded CRD documents.

use crate::constants::crd::{GROUP, SCHEMA_VERSION_LABEL, VERSION};
use crate::error::{RegistrarError, Result};
use crate::types::kind::ResourceKind;
use crate::types::schema_version::SchemaVersion;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionNames, CustomResourceDefinitionSpec,
    CustomResourceDefinitionVersion,
};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// The definition a kind should have in the cluster, labelled with the schema
/// revision that produced it.
#[derive(Debug, Clone)]
pub struct ResourceKindDescriptor {
    kind: ResourceKind,
    crd: CustomResourceDefinition,
}

impl ResourceKindDescriptor {
    /// Build the descriptor for `kind` from its compiled-in document
    pub fn load(kind: ResourceKind, schema_version: &SchemaVersion) -> Result<Self> {
        Self::from_document(kind, kind.document(), schema_version)
    }

    /// Build a descriptor from a CRD document.
    ///
    /// Group and version always come from the compiled-in constants; names,
    /// scope, schema, subresources and printer columns come from the first
    /// version of the document.
    pub fn from_document(
        kind: ResourceKind,
        document: &[u8],
        schema_version: &SchemaVersion,
    ) -> Result<Self> {
        let source: CustomResourceDefinition =
            serde_yaml::from_slice(document).map_err(|source| RegistrarError::SchemaDecode {
                kind: kind.display_name(),
                source,
            })?;

        let names = source.spec.names;
        if names.plural.is_empty() {
            return Err(RegistrarError::InvalidDocument {
                kind: kind.display_name(),
                reason: "spec.names.plural is empty".to_string(),
            });
        }

        let Some(source_version) = source.spec.versions.into_iter().next() else {
            return Err(RegistrarError::InvalidDocument {
                kind: kind.display_name(),
                reason: "spec.versions is empty".to_string(),
            });
        };

        let additional_printer_columns = if kind.keeps_printer_columns() {
            source_version.additional_printer_columns
        } else {
            None
        };

        let crd = CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some(format!("{}.{}", names.plural, GROUP)),
                labels: Some(BTreeMap::from([(
                    SCHEMA_VERSION_LABEL.to_string(),
                    schema_version.to_string(),
                )])),
                ..Default::default()
            },
            spec: CustomResourceDefinitionSpec {
                group: GROUP.to_string(),
                names: CustomResourceDefinitionNames {
                    plural: names.plural,
                    singular: names.singular,
                    short_names: names.short_names,
                    kind: names.kind,
                    ..Default::default()
                },
                scope: source.spec.scope,
                versions: vec![CustomResourceDefinitionVersion {
                    name: VERSION.to_string(),
                    served: true,
                    storage: true,
                    schema: source_version.schema,
                    subresources: source_version.subresources,
                    additional_printer_columns,
                    ..Default::default()
                }],
                ..Default::default()
            },
            status: None,
        };

        Ok(Self { kind, crd })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Cluster-wide unique name: `<plural>.<group>`
    pub fn name(&self) -> &str {
        self.crd.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn has_validation(&self) -> bool {
        has_validation(&self.crd)
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.crd.metadata.labels.clone().unwrap_or_default()
    }

    pub fn spec(&self) -> &CustomResourceDefinitionSpec {
        &self.crd.spec
    }

    /// The object submitted on create
    pub fn to_crd(&self) -> CustomResourceDefinition {
        self.crd.clone()
    }
}

/// Whether any served version of the definition carries a validation schema
pub fn has_validation(crd: &CustomResourceDefinition) -> bool {
    crd.spec.versions.iter().any(|v| v.schema.is_some())
}
