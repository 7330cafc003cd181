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

//! Process-scoped service state

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::registry::SessionRegistry;
use crate::types::SessionId;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use switchboard_userstore::{StoreVersion, UserStore};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything sessions share
///
/// Built once at startup and handed to the listener and every session. Shutting it
/// down cancels every session created from it, admitted or not.
pub struct ServiceContext {
    config: ServiceConfig,
    registry: SessionRegistry,
    store: UserStore,
    started_at: Instant,
    shutdown: CancellationToken,
    next_session_id: AtomicU64,
}

impl ServiceContext {
    /// Validate `config` and assemble the context around an open store
    pub fn init(config: ServiceConfig, store: UserStore) -> ServiceResult<Arc<Self>> {
        config.validate().map_err(ServiceError::Config)?;
        info!(
            max_connections = config.max_connections,
            login_tries = config.login_tries,
            store = %store.path().display(),
            "Service context initialized"
        );
        Ok(Arc::new(Self {
            registry: SessionRegistry::new(config.max_connections),
            config,
            store,
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
            next_session_id: AtomicU64::new(1),
        }))
    }

    /// Open the store at `store_path`, check its version, then [`init`](Self::init)
    ///
    /// A missing or mismatched store is fatal here, before any client connects.
    pub async fn open(
        config: ServiceConfig,
        store_path: impl AsRef<Path>,
    ) -> ServiceResult<Arc<Self>> {
        let store = UserStore::open(store_path).await?;
        store.check_version(StoreVersion::CURRENT).await?;
        Self::init(config, store)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Cancel every session created from this context
    ///
    /// Sessions observe the cancellation at their next suspension point and run
    /// their normal teardown. Returns the number of sessions admitted at the time.
    pub fn shutdown(&self) -> usize {
        let admitted = self.registry.current_count();
        self.shutdown.cancel();
        info!(admitted, "Service context shutting down");
        admitted
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub(crate) fn next_session_id(&self) -> SessionId {
        SessionId::new(self.next_session_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("store", &self.store)
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::create(dir.path().join("users.dat"))
            .await
            .unwrap();
        let config = ServiceConfig::default().with_max_connections(0);

        let err = ServiceContext::init(config, store).unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[tokio::test]
    async fn test_open_requires_existing_store() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceContext::open(ServiceConfig::default(), dir.path().join("absent.dat"))
            .await
            .unwrap_err();
        assert!(err.is_store_error());
    }

    #[tokio::test]
    async fn test_session_ids_are_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.dat");
        drop(UserStore::create(&path).await.unwrap());

        let context = ServiceContext::open(ServiceConfig::default(), &path)
            .await
            .unwrap();
        assert_eq!(context.next_session_id(), SessionId::new(1));
        assert_eq!(context.next_session_id(), SessionId::new(2));
        assert_eq!(context.registry().capacity(), 4);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_children() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::create(dir.path().join("users.dat"))
            .await
            .unwrap();
        let context = ServiceContext::init(ServiceConfig::default(), store).unwrap();
        let child = context.shutdown_token().child_token();

        assert!(!context.is_shutting_down());
        assert_eq!(context.shutdown(), 0);
        assert!(context.is_shutting_down());
        assert!(child.is_cancelled());
    }
}
