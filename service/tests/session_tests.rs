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

//! End-to-end session tests over in-memory transports

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use switchboard_service::{
    ActiveSession, ServiceConfig, ServiceContext, Session, SessionHandle, SessionHandler,
    SessionId, SessionInfo, SessionOutcome, SessionState,
};
use switchboard_terminal::{BoxTransport, TerminalKind, TerminalResult};
use switchboard_userstore::{UserRecord, UserStore};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

const PATIENCE: Duration = Duration::from_secs(10);

/// Client side of an in-memory connection
struct Client {
    stream: DuplexStream,
    seen: Vec<u8>,
}

impl Client {
    fn new(stream: DuplexStream) -> Self {
        Self {
            stream,
            seen: Vec::new(),
        }
    }

    /// Read until `needle` has been received, consuming everything up to its end
    async fn expect(&mut self, needle: &str) {
        let needle = needle.as_bytes();
        tokio::time::timeout(PATIENCE, async {
            loop {
                if let Some(pos) = self
                    .seen
                    .windows(needle.len())
                    .position(|window| window == needle)
                {
                    self.seen.drain(..pos + needle.len());
                    return;
                }
                let mut buf = [0u8; 512];
                let read = self.stream.read(&mut buf).await.unwrap();
                assert!(
                    read > 0,
                    "connection closed while waiting for {:?}, unread {:?}",
                    String::from_utf8_lossy(needle),
                    String::from_utf8_lossy(&self.seen)
                );
                self.seen.extend_from_slice(&buf[..read]);
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {:?}", String::from_utf8_lossy(needle)));
    }

    /// Read until the server closes its side
    async fn expect_closed(&mut self) {
        tokio::time::timeout(PATIENCE, async {
            let mut buf = [0u8; 512];
            while self.stream.read(&mut buf).await.unwrap_or(0) > 0 {}
        })
        .await
        .unwrap();
    }

    async fn send(&mut self, text: &str) {
        self.stream.write_all(text.as_bytes()).await.unwrap();
    }

    /// Answer the probe like a client without ANSI support
    async fn negotiate_dumb(&mut self) {
        self.expect("Please wait...checking term emulation...").await;
        self.expect("\x1b[R").await;
        self.send("x").await;
    }

    async fn login(&mut self, handle: &str, password: &str) {
        self.expect("username : ").await;
        self.send(&format!("{handle}\r")).await;
        self.expect("password : ").await;
        self.send(&format!("{password}\r")).await;
    }
}

/// Records what the service reported to post-login logic
#[derive(Default)]
struct Recorder {
    activations: AtomicUsize,
    disconnects: Mutex<Vec<SessionInfo>>,
}

#[async_trait]
impl SessionHandler for Recorder {
    async fn on_active(&self, session: &mut ActiveSession<'_>) -> TerminalResult<()> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        let greeting = format!("WELCOME {}", session.user().real_name());
        session.terminal().send_line(&greeting).await
    }

    async fn on_disconnect(&self, info: &SessionInfo) {
        self.disconnects.lock().push(info.clone());
    }
}

/// Holds the session in its post-login phase until the client hangs up
struct Lingerer;

#[async_trait]
impl SessionHandler for Lingerer {
    async fn on_active(&self, session: &mut ActiveSession<'_>) -> TerminalResult<()> {
        session.terminal().send_line("LINGERING").await?;
        loop {
            session.terminal().recv().await?;
        }
    }
}

async fn context(dir: &TempDir, config: ServiceConfig) -> Arc<ServiceContext> {
    let store = UserStore::create(dir.path().join("users.dat"))
        .await
        .unwrap();
    store
        .update(&UserRecord::new(1, "alice", "Alice Liddell", "Rabbit").unwrap())
        .await
        .unwrap();
    ServiceContext::init(config, store).unwrap()
}

fn spawn_session(
    context: &Arc<ServiceContext>,
    handler: Arc<dyn SessionHandler>,
) -> (Client, Arc<SessionHandle>, JoinHandle<SessionOutcome>) {
    let (client, server) = duplex(8192);
    let session = Session::new(Arc::clone(context), handler, None);
    let handle = Arc::clone(session.handle());
    let transport: BoxTransport = Box::new(server);
    let task = tokio::spawn(session.run(transport));
    (Client::new(client), handle, task)
}

// ===== Authentication =====

#[tokio::test]
#[traced_test]
async fn test_failed_logins_disconnect_and_free_slot() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default().with_login_tries(3)).await;
    let recorder = Arc::new(Recorder::default());
    let (mut client, handle, task) = spawn_session(&context, recorder.clone());

    client.negotiate_dumb().await;
    client.expect("Connected with Dumb terminal.").await;
    client.expect("My BBS\r\n  Please Login.\r\n").await;

    for attempt in 0..3 {
        let password = format!("wrong{attempt}");
        client.login("alice", &password).await;
        client.expect("Login incorrect.\r\n\r\n").await;
    }
    client.expect_closed().await;

    let outcome = task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::LoginFailed));
    assert_eq!(recorder.activations.load(Ordering::SeqCst), 0);
    assert_eq!(handle.state(), SessionState::Closed);
    assert_eq!(context.registry().current_count(), 0);
    assert_eq!(context.registry().lifetime_count(), 1);

    let disconnects = recorder.disconnects.lock();
    assert_eq!(disconnects.len(), 1);
    assert_eq!(disconnects[0].user, None);
}

#[tokio::test]
async fn test_successful_login_reaches_active_phase() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default()).await;
    let recorder = Arc::new(Recorder::default());
    let (mut client, _handle, task) = spawn_session(&context, recorder.clone());

    client.negotiate_dumb().await;
    client.login("alice", "rabbit").await;
    client.expect("WELCOME Alice Liddell\r\n").await;
    client.expect_closed().await;

    assert!(matches!(task.await.unwrap(), SessionOutcome::Completed));
    assert_eq!(recorder.activations.load(Ordering::SeqCst), 1);
    assert_eq!(context.registry().current_count(), 0);

    let disconnects = recorder.disconnects.lock();
    assert_eq!(disconnects[0].user.as_deref(), Some("alice"));
    assert_eq!(disconnects[0].terminal, Some(TerminalKind::Dumb));
    assert_eq!(disconnects[0].state, SessionState::Closed);
}

#[tokio::test]
async fn test_second_attempt_can_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default()).await;
    let recorder = Arc::new(Recorder::default());
    let (mut client, _handle, task) = spawn_session(&context, recorder.clone());

    client.negotiate_dumb().await;
    client.login("Alice", "rabbit").await;
    client.expect("Login incorrect.").await;
    client.login("alice", "RABBIT").await;
    client.expect("WELCOME").await;

    assert!(matches!(task.await.unwrap(), SessionOutcome::Completed));
}

#[tokio::test]
async fn test_admitted_session_is_listed_while_active() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default()).await;
    let (mut client, handle, task) = spawn_session(&context, Arc::new(Lingerer));

    client.negotiate_dumb().await;
    client.login("alice", "rabbit").await;
    client.expect("LINGERING").await;

    let sessions = context.registry().sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, handle.id());
    assert_eq!(sessions[0].state, SessionState::Active);
    assert_eq!(sessions[0].user.as_deref(), Some("alice"));

    drop(client);
    assert!(task.await.unwrap().is_connection_lost());
    assert!(context.registry().sessions().is_empty());
}

// ===== Negotiation and admission =====

#[tokio::test]
async fn test_ansi_client_is_initialized_and_greeted() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default()).await;
    let (mut client, handle, task) = spawn_session(&context, Arc::new(Recorder::default()));

    client.expect("\x1b[R").await;
    client.send("\x1b[24;80R").await;
    client.expect("\x1b[0;37m\x1b[40m\x1b[40m\x1b2J").await;
    client.expect("Connected with ANSI terminal.").await;
    client.expect("username : ").await;
    assert_eq!(handle.terminal(), Some(TerminalKind::Ansi));

    drop(client);
    assert!(task.await.unwrap().is_connection_lost());
    assert_eq!(context.registry().current_count(), 0);
}

#[tokio::test]
async fn test_saturated_registry_rejects_without_counting() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default().with_max_connections(1)).await;
    let occupant = Arc::new(SessionHandle::new(
        SessionId::new(999),
        None,
        CancellationToken::new(),
    ));
    assert!(context.registry().admit(&occupant));

    let recorder = Arc::new(Recorder::default());
    let (mut client, _handle, task) = spawn_session(&context, recorder.clone());
    client.negotiate_dumb().await;
    client
        .expect("Sorry, we can't connect you at this time. Try again later. Thanks!\r\n\r\n")
        .await;
    client.expect_closed().await;

    assert!(matches!(task.await.unwrap(), SessionOutcome::Rejected));
    assert_eq!(context.registry().current_count(), 1);
    assert_eq!(context.registry().lifetime_count(), 1);
    assert_eq!(recorder.disconnects.lock().len(), 1);
}

// ===== Faults and cancellation =====

#[tokio::test]
async fn test_lost_carrier_during_login_frees_slot() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default()).await;
    let recorder = Arc::new(Recorder::default());
    let (mut client, _handle, task) = spawn_session(&context, recorder.clone());

    client.negotiate_dumb().await;
    client.expect("username : ").await;
    assert_eq!(context.registry().current_count(), 1);
    drop(client);

    let outcome = task.await.unwrap();
    assert!(outcome.is_connection_lost());
    assert_eq!(context.registry().current_count(), 0);
    assert_eq!(recorder.disconnects.lock().len(), 1);
}

#[tokio::test]
async fn test_lost_carrier_during_detection() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default()).await;
    let (client, _handle, task) = spawn_session(&context, Arc::new(Recorder::default()));
    drop(client);

    assert!(task.await.unwrap().is_connection_lost());
    assert_eq!(context.registry().lifetime_count(), 0);
}

#[tokio::test]
async fn test_context_shutdown_cancels_blocked_session() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default()).await;
    let (mut client, handle, task) = spawn_session(&context, Arc::new(Recorder::default()));

    client.negotiate_dumb().await;
    client.expect("username : ").await;
    assert_eq!(context.shutdown(), 1);

    match task.await.unwrap() {
        SessionOutcome::ConnectionLost(err) => assert_eq!(err.message(), "session cancelled"),
        other => panic!("unexpected outcome {other}"),
    }
    assert!(handle.is_cancelled());
    assert_eq!(context.registry().current_count(), 0);
    client.expect_closed().await;
}

#[tokio::test]
async fn test_registry_shutdown_all_ends_active_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let context = context(&dir, ServiceConfig::default()).await;
    let (mut client, _handle, task) = spawn_session(&context, Arc::new(Lingerer));

    client.negotiate_dumb().await;
    client.login("alice", "rabbit").await;
    client.expect("LINGERING").await;

    assert_eq!(context.registry().shutdown_all(), 1);
    assert!(task.await.unwrap().is_connection_lost());
    assert_eq!(context.registry().current_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_idle_client_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig::default().with_idle_timeout(Some(Duration::from_secs(60)));
    let context = context(&dir, config).await;
    let (mut client, _handle, task) = spawn_session(&context, Arc::new(Recorder::default()));

    client.negotiate_dumb().await;
    client.expect("username : ").await;

    match task.await.unwrap() {
        SessionOutcome::ConnectionLost(err) => assert_eq!(err.message(), "idle timeout"),
        other => panic!("unexpected outcome {other}"),
    }
    assert_eq!(context.registry().current_count(), 0);
}

// ===== Post-login helpers =====

struct Interviewer {
    answer: AtomicBool,
    motd: PathBuf,
}

#[async_trait]
impl SessionHandler for Interviewer {
    async fn on_active(&self, session: &mut ActiveSession<'_>) -> TerminalResult<()> {
        let answer = session.get_yes_no("Continue? ").await?;
        self.answer.store(answer, Ordering::SeqCst);
        session.pause().await?;
        assert!(session.send_file(&self.motd).await?);
        assert!(!session.send_file(self.motd.with_extension("missing")).await?);
        session.terminal().send_line("DONE").await
    }
}

#[tokio::test]
async fn test_yes_no_pause_and_file_helpers() {
    let dir = tempfile::tempdir().unwrap();
    let motd = dir.path().join("motd.txt");
    std::fs::write(&motd, "Message of the day\r\n").unwrap();

    let context = context(&dir, ServiceConfig::default()).await;
    let handler = Arc::new(Interviewer {
        answer: AtomicBool::new(false),
        motd: motd.clone(),
    });
    let (mut client, _handle, task) = spawn_session(&context, handler.clone());

    client.negotiate_dumb().await;
    client.login("alice", "rabbit").await;

    client.expect("Continue? ").await;
    client.send("qY").await;
    client.expect("yes\r\n").await;

    client.expect("\r\nHit a key").await;
    client.send(" ").await;
    let erase = format!("{}{}{}", "\x08".repeat(9), " ".repeat(9), "\x08".repeat(9));
    client.expect(&erase).await;

    client.expect("Message of the day\r\n").await;
    client.expect("Couldn't send '").await;
    client.expect("motd.missing'!\r\n").await;
    client.expect("DONE").await;

    assert!(matches!(task.await.unwrap(), SessionOutcome::Completed));
    assert!(handler.answer.load(Ordering::SeqCst));
}
