// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crd_registrar::config::Config;
use crd_registrar::kubernetes::Shutdown;
use crd_registrar::registrar::CrdRegistrar;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting CRD registration");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: identity_allocation_mode={}, poll_interval={:?}, wait_timeout={:?}",
        config.identity_allocation_mode, config.poll_interval, config.wait_timeout
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let (trigger, shutdown) = Shutdown::channel();
    let registrar = CrdRegistrar::new(client, &config)?.with_shutdown(shutdown);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, aborting registration");
            trigger.trigger();
        }
    });

    registrar.register_all().await?;

    info!("All CRDs are installed and up-to-date");
    Ok(())
}
