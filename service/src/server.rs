//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! TCP listener
//!
//! The BbsServer accepts connections and spawns one [`Session`] task per client.
//! Admission control happens inside the session, after terminal detection, so a
//! turned-away client still receives a readable notice.

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::handler::SessionHandler;
use crate::session::Session;
use crate::types::ServerSnapshot;
use metrics::counter;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use switchboard_terminal::BoxTransport;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Multi-user terminal server
///
/// # Example
///
/// ```no_run
/// use switchboard_service::{BbsServer, ServiceConfig, ServiceContext, SessionHandler};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct MyHandler;
///
/// #[async_trait]
/// impl SessionHandler for MyHandler {}
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let context = ServiceContext::open(ServiceConfig::default(), "users.dat").await?;
///     let server = BbsServer::new(context).await?;
///     server.start(Arc::new(MyHandler))?;
///
///     tokio::signal::ctrl_c().await?;
///     server.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct BbsServer {
    context: Arc<ServiceContext>,
    /// Taken by the accept loop on start
    listener: Mutex<Option<TcpListener>>,
    bind_address: SocketAddr,
    running: AtomicBool,
    sessions: TaskTracker,
    accept_handle: Mutex<Option<JoinHandle<()>>>,
}

impl BbsServer {
    /// Bind the configured address without accepting yet
    pub async fn new(context: Arc<ServiceContext>) -> ServiceResult<Self> {
        let listener = TcpListener::bind(context.config().bind_address).await?;
        let bind_address = listener.local_addr()?;
        info!(%bind_address, "BBS server bound");

        Ok(Self {
            context,
            listener: Mutex::new(Some(listener)),
            bind_address,
            running: AtomicBool::new(false),
            sessions: TaskTracker::new(),
            accept_handle: Mutex::new(None),
        })
    }

    /// Begin accepting connections
    ///
    /// A server runs once; after [`shutdown`](Self::shutdown) it cannot be started
    /// again.
    pub fn start(&self, handler: Arc<dyn SessionHandler>) -> ServiceResult<()> {
        let Some(listener) = self.listener.lock().take() else {
            return Err(ServiceError::AlreadyRunning);
        };
        self.running.store(true, Ordering::SeqCst);
        info!(bind_address = %self.bind_address, "Starting BBS server");

        let handle = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.context),
            handler,
            self.sessions.clone(),
        ));
        *self.accept_handle.lock() = Some(handle);
        Ok(())
    }

    /// Stop accepting, cancel every session and wait for their teardown
    ///
    /// Waits at most the configured shutdown timeout.
    pub async fn shutdown(&self) -> ServiceResult<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::NotRunning);
        }
        info!("Shutting down BBS server");
        self.context.shutdown();

        let accept_handle = self.accept_handle.lock().take();
        if let Some(handle) = accept_handle {
            if let Err(err) = handle.await {
                error!(error = %err, "Accept loop failed");
            }
        }

        self.sessions.close();
        let timeout = self.context.config().shutdown_timeout;
        if tokio::time::timeout(timeout, self.sessions.wait()).await.is_err() {
            warn!(
                remaining = self.sessions.len(),
                ?timeout,
                "Sessions still tearing down at shutdown timeout"
            );
        }

        info!("BBS server shutdown complete");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address actually bound, useful with port 0
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    pub fn context(&self) -> &Arc<ServiceContext> {
        &self.context
    }

    /// Get a snapshot of the server state
    pub fn snapshot(&self) -> ServerSnapshot {
        let registry = self.context.registry();
        ServerSnapshot {
            active_sessions: registry.current_count(),
            lifetime_sessions: registry.lifetime_count(),
            capacity: registry.capacity(),
            bind_address: self.bind_address,
            uptime: self.context.uptime(),
            started_at: self.context.started_at(),
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    context: Arc<ServiceContext>,
    handler: Arc<dyn SessionHandler>,
    sessions: TaskTracker,
) {
    let shutdown = context.shutdown_token().clone();
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((socket, peer_addr)) => {
                debug!(%peer_addr, "Accepted connection");
                counter!("switchboard.connections.accepted").increment(1);
                if let Err(err) = socket.set_nodelay(true) {
                    debug!(%peer_addr, error = %err, "Could not disable Nagle");
                }
                let session = Session::new(
                    Arc::clone(&context),
                    Arc::clone(&handler),
                    Some(peer_addr),
                );
                let transport: BoxTransport = Box::new(socket);
                sessions.spawn(session.run(transport));
            }
            Err(err) => {
                error!(error = %err, "Failed to accept connection");
                counter!("switchboard.connections.errors").increment(1);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
    info!("Accept loop terminated");
}

impl std::fmt::Debug for BbsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BbsServer")
            .field("bind_address", &self.bind_address)
            .field("running", &self.is_running())
            .field("sessions", &self.context.registry().current_count())
            .field("uptime", &self.context.uptime())
            .finish()
    }
}

impl Drop for BbsServer {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            warn!("BbsServer dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.context.shutdown();
        }
    }
}
