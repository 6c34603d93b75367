// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The custom resource kinds this binary registers, in registration order.

use crate::config::IdentityAllocationMode;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    NetworkPolicy,
    ClusterwideNetworkPolicy,
    Endpoint,
    Node,
    Identity,
}

impl ResourceKind {
    /// All kinds in the order they are registered
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::NetworkPolicy,
        ResourceKind::ClusterwideNetworkPolicy,
        ResourceKind::Endpoint,
        ResourceKind::Node,
        ResourceKind::Identity,
    ];

    /// Kinds to register for the given identity allocation mode.
    /// Identities only need a definition when they are stored as custom resources.
    pub fn enabled(mode: IdentityAllocationMode) -> Vec<ResourceKind> {
        Self::ALL
            .into_iter()
            .filter(|kind| *kind != ResourceKind::Identity || mode == IdentityAllocationMode::Crd)
            .collect()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ResourceKind::NetworkPolicy => "CiliumNetworkPolicy",
            ResourceKind::ClusterwideNetworkPolicy => "CiliumClusterwideNetworkPolicy",
            ResourceKind::Endpoint => "CiliumEndpoint",
            ResourceKind::Node => "CiliumNode",
            ResourceKind::Identity => "CiliumIdentity",
        }
    }

    /// Name used to tag log lines of this kind's reconciliation
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::NetworkPolicy => "CiliumNetworkPolicy/v2",
            ResourceKind::ClusterwideNetworkPolicy => "CiliumClusterwideNetworkPolicy/v2",
            ResourceKind::Endpoint => "v2.CiliumEndpoint",
            ResourceKind::Node => "v2.CiliumNode",
            ResourceKind::Identity => "v2.CiliumIdentity",
        }
    }

    /// The compiled-in CRD document for this kind
    pub fn document(&self) -> &'static [u8] {
        match self {
            ResourceKind::NetworkPolicy => {
                include_bytes!("../../crds/ciliumnetworkpolicies.yaml")
            }
            ResourceKind::ClusterwideNetworkPolicy => {
                include_bytes!("../../crds/ciliumclusterwidenetworkpolicies.yaml")
            }
            ResourceKind::Endpoint => include_bytes!("../../crds/ciliumendpoints.yaml"),
            ResourceKind::Node => include_bytes!("../../crds/ciliumnodes.yaml"),
            ResourceKind::Identity => include_bytes!("../../crds/ciliumidentities.yaml"),
        }
    }

    /// Whether the document's additional printer columns are registered
    pub(crate) fn keeps_printer_columns(&self) -> bool {
        matches!(self, ResourceKind::NetworkPolicy | ResourceKind::Endpoint)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
