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

//! Switchboard session service
//!
//! Accepts clients, negotiates their terminal, enforces the connection limit,
//! authenticates against the user store and hands logged in users to a
//! [`SessionHandler`].
//!
//! # Architecture
//!
//! ```text
//! BbsServer ──accept──▶ Session ──▶ TerminalDetector
//!     │                    │ admit/remove
//!     ▼                    ▼
//! ServiceContext ──▶ SessionRegistry, UserStore, ServiceConfig
//! ```
//!
//! There is no global state: everything shared lives in one [`ServiceContext`],
//! created at startup and shut down explicitly.
//!
//! # Example
//!
//! ```no_run
//! use switchboard_service::{
//!     ActiveSession, BbsServer, ServiceConfig, ServiceContext, SessionHandler,
//! };
//! use switchboard_terminal::{TerminalCapability, TerminalColor, TerminalResult};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Welcome;
//!
//! #[async_trait]
//! impl SessionHandler for Welcome {
//!     async fn on_active(&self, session: &mut ActiveSession<'_>) -> TerminalResult<()> {
//!         session.terminal().set_fore_color(TerminalColor::BrightYellow).await?;
//!         session.terminal().send_line("Welcome aboard.").await?;
//!         session.pause().await
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::new("0.0.0.0:2323".parse()?);
//!     let context = ServiceContext::open(config, "users.dat").await?;
//!     let server = BbsServer::new(context).await?;
//!     server.start(Arc::new(Welcome))?;
//!     tokio::signal::ctrl_c().await?;
//!     server.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod context;
mod error;
mod handler;
mod registry;
mod server;
mod session;
mod types;

pub use config::ServiceConfig;
pub use context::ServiceContext;
pub use error::{ServiceError, ServiceResult};
pub use handler::{ActiveSession, SessionHandler};
pub use registry::SessionRegistry;
pub use server::BbsServer;
pub use session::{Session, SessionHandle, SessionOutcome};
pub use types::{ServerSnapshot, SessionId, SessionInfo, SessionState, format_uptime};
