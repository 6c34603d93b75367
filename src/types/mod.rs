// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource kinds, their canonical definitions and schema revisions.

pub mod descriptor;
pub mod kind;
pub mod schema_version;

pub use descriptor::ResourceKindDescriptor;
pub use kind::ResourceKind;
pub use schema_version::{SchemaVersion, SchemaVersions};
