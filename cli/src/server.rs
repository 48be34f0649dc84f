// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP server bootstrap
//!
//! Loads `turcrm-config.yaml`, builds the storage, gateway and services, and
//! serves the API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, warn};

use turcrm_core::application::repository_factory::create_repositories;
use turcrm_core::application::{StandardDocumentService, StandardSmsConfirmationService};
use turcrm_core::domain::crm_config::CrmConfigManifest;
use turcrm_core::domain::repository::StorageBackend;
use turcrm_core::domain::sms::SmsGateway;
use turcrm_core::infrastructure::db::Database;
use turcrm_core::infrastructure::event_bus::EventBusError;
use turcrm_core::infrastructure::pdf::PrintPdfRenderer;
use turcrm_core::infrastructure::sms::gateway_from_config;
use turcrm_core::infrastructure::{metrics, EventBus};
use turcrm_core::presentation::api;

use crate::commands::migrate::run_migrations;

pub async fn start_server(config_path: Option<PathBuf>) -> Result<()> {
    let config = CrmConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    let spec = &config.spec;

    info!("TurCRM starting (config: {})", config.metadata.name);

    if let Some(port) = spec.observability.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        metrics::describe_metrics();
        info!("Prometheus metrics exposed on {}", addr);
    }

    let backend = config.storage_backend()?;
    let database = match &backend {
        StorageBackend::PostgreSQL(pg) => {
            let database = Database::new(pg).await?;
            if spec.database.run_migrations {
                run_migrations(database.get_pool()).await?;
            }
            info!("Connected to PostgreSQL");
            Some(database)
        }
        StorageBackend::InMemory => {
            warn!("Using in-memory storage; data is lost on restart");
            None
        }
    };
    let repositories = create_repositories(&backend, database.as_ref())?;

    let document_root = spec.storage.document_root.clone();
    tokio::fs::create_dir_all(&document_root)
        .await
        .with_context(|| format!("Failed to create document root {:?}", document_root))?;

    let gateway = gateway_from_config(&spec.sms).context("Failed to configure SMS gateway")?;
    info!("SMS provider: {}", gateway.provider());

    let event_bus = Arc::new(EventBus::with_default_capacity());
    spawn_event_logger(&event_bus);

    let sms = Arc::new(StandardSmsConfirmationService::new(
        repositories.confirmations.clone(),
        gateway,
        event_bus.clone(),
        spec.sms.message_template.clone(),
    ));
    let documents = Arc::new(StandardDocumentService::new(
        &repositories,
        Arc::new(PrintPdfRenderer::new()),
        sms.clone(),
        event_bus,
        document_root,
    ));

    let app = api::app(documents, sms);

    let addr = format!("{}:{}", spec.server.bind_address, spec.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("TurCRM stopped");
    Ok(())
}

/// Mirrors domain events into the debug log
fn spawn_event_logger(event_bus: &EventBus) {
    let mut receiver = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => debug!(document_id = ?event.document_id(), ?event, "Domain event"),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
