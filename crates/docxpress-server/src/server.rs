// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP server lifecycle.
//
// `start` binds the listener and serves the router from a spawned task;
// `stop` signals graceful shutdown and waits until in-flight requests have
// completed.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use docxpress_core::error::{DocxpressError, Result};
use docxpress_core::types::ServerStatus;
use docxpress_core::AppConfig;

use crate::routes::build_router;
use crate::state::AppState;

/// The docxpress HTTP server.
pub struct DocxServer {
    config: AppConfig,
    /// Current lifecycle state of the server.
    status: ServerStatus,
    /// Address actually bound (known once started).
    local_addr: Option<SocketAddr>,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the task running `axum::serve`.
    task_handle: Option<JoinHandle<()>>,
}

impl DocxServer {
    /// Create a server in `Stopped` state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            status: ServerStatus::Stopped,
            local_addr: None,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
        }
    }

    /// Bound port while running, configured port otherwise.
    pub fn port(&self) -> u16 {
        self.local_addr
            .map(|addr| addr.port())
            .unwrap_or(self.config.server.port)
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind `host:port` and start serving.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be bound; the status is then `Error`.
    pub async fn start(&mut self) -> Result<()> {
        if self.status == ServerStatus::Running {
            debug!(port = self.port(), "server already running");
            return Ok(());
        }

        self.status = ServerStatus::Starting;

        let bind_addr = self.config.bind_address();
        let listener = match TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.status = ServerStatus::Error;
                return Err(DocxpressError::Server(format!("bind {bind_addr}: {e}")));
            }
        };
        let local_addr = listener.local_addr()?;

        let app = build_router(AppState::new(self.config.clone()));
        let shutdown = Arc::clone(&self.shutdown_signal);

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "HTTP server terminated");
            }
        });

        self.local_addr = Some(local_addr);
        self.task_handle = Some(handle);
        self.status = ServerStatus::Running;
        info!(
            addr = %local_addr,
            max_body_bytes = self.config.server.max_body_bytes,
            "docxpress listening"
        );
        Ok(())
    }

    /// Gracefully stop the server and wait for the serve task to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(port = self.port(), "stopping docxpress");
        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| DocxpressError::Server(format!("task join: {e}")))?;
        }

        self.local_addr = None;
        self.status = ServerStatus::Stopped;
        info!("docxpress stopped");
        Ok(())
    }
}
