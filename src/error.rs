// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to decode embedded CRD document for {kind}: {source}")]
    SchemaDecode {
        kind: &'static str,
        source: serde_yaml::Error,
    },

    #[error("Invalid embedded CRD document for {kind}: {reason}")]
    InvalidDocument { kind: &'static str, reason: String },

    #[error("Invalid schema version '{value}': {reason}")]
    InvalidSchemaVersion { value: String, reason: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled before completion")]
    Cancelled,

    #[error("CRD {name} did not become established: {source}{}", .delete_error.as_ref().map(|e| format!(" (deleting it also failed: {e})")).unwrap_or_default())]
    NotEstablished {
        name: String,
        source: Box<RegistrarError>,
        delete_error: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, RegistrarError>;
