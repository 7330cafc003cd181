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

//! Minimal BBS Example
//!
//! This example runs a small bulletin board front door that:
//! - Accepts connections on port 2323
//! - Detects ANSI terminals and falls back to plain text otherwise
//! - Logs users in against `users.dat`, created on first run
//! - Shows who is online and how long the board has been up
//!
//! The first run creates a store holding only the superuser `root` with an
//! empty password.
//!
//! ## Usage
//!
//! Run the server:
//! ```bash
//! RUST_LOG=info cargo run --example bbs_server
//! ```
//!
//! Connect with a telnet client:
//! ```bash
//! telnet localhost 2323
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use switchboard_service::{
    ActiveSession, BbsServer, ServiceConfig, ServiceContext, SessionHandler, SessionInfo,
    format_uptime,
};
use switchboard_terminal::{TerminalCapability, TerminalColor, TerminalResult};
use switchboard_userstore::UserStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::new("127.0.0.1:2323".parse()?)
        .with_bbs_name("Switchboard Demo BBS")
        .with_idle_timeout(Some(std::time::Duration::from_secs(600)));

    let store = UserStore::open_or_create("users.dat").await?;
    let context = ServiceContext::init(config, store)?;
    let server = BbsServer::new(context).await?;
    server.start(Arc::new(FrontDoor))?;

    println!("Switchboard listening on {}", server.bind_address());
    println!("Connect with: telnet localhost {}", server.bind_address().port());
    println!("Press Ctrl+C to stop the server\n");

    tokio::signal::ctrl_c().await?;
    println!("\n{}", server.snapshot());

    server.shutdown().await?;
    println!("Server stopped");
    Ok(())
}

/// Greets the user, lists who is online and offers the uptime report
struct FrontDoor;

#[async_trait]
impl SessionHandler for FrontDoor {
    async fn on_active(&self, session: &mut ActiveSession<'_>) -> TerminalResult<()> {
        let welcome = format!("Welcome, {}!", session.user().real_name());
        let term = session.terminal();
        term.newline().await?;
        term.set_fore_color(TerminalColor::BrightCyan).await?;
        term.send_line(&welcome).await?;
        term.set_fore_color(TerminalColor::White).await?;
        term.newline().await?;

        let online: Vec<String> = session
            .registry()
            .sessions()
            .iter()
            .filter_map(|info| info.user.clone())
            .collect();
        session.terminal().send_line("Users online:").await?;
        for user in online {
            session.terminal().send_line(&format!("  {user}")).await?;
        }
        session.terminal().newline().await?;

        if session.get_yes_no("Show system uptime? ").await? {
            let uptime = format_uptime(session.uptime());
            session.terminal().send_line(&uptime).await?;
        }

        session.pause().await?;
        session.terminal().send_line("Goodbye.").await
    }

    async fn on_disconnect(&self, info: &SessionInfo) {
        tracing::info!(
            session = %info.id,
            user = info.user.as_deref().unwrap_or("-"),
            duration = ?info.duration(),
            "Caller left"
        );
    }
}
