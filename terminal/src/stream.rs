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

//! Byte-level transport and the line I/O contract shared by every terminal
//!
//! [`TerminalStream`] wraps any duplex byte stream and gives it the primitives the
//! rest of the crate is written against: send, blocking single-byte receive, a
//! bounded wait for one byte, discarding whatever the client has already queued,
//! and echoing line input with backspace handling.

use crate::consts::{ASCII_BACKSPACE, ASCII_CR, CRLF, ERASE_SEQUENCE};
use crate::result::{TerminalError, TerminalResult};
use futures::FutureExt;
use metrics::counter;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

/// Any duplex byte stream a terminal can run over
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + ?Sized> Transport for T {}

/// Type-erased transport, used where sessions must not care about the socket type
pub type BoxTransport = Box<dyn Transport>;

/// Buffered byte stream with the line-oriented primitives of the server
pub struct TerminalStream<S> {
    inner: BufReader<S>,
    idle_timeout: Option<Duration>,
    bytes_sent: u64,
    bytes_received: u64,
}

impl<S: Transport> TerminalStream<S> {
    /// Wrap a transport
    pub fn new(stream: S) -> Self {
        Self {
            inner: BufReader::new(stream),
            idle_timeout: None,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Fail [`recv`](Self::recv) with a connection-lost error when the client stays
    /// silent for longer than `timeout`
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Configured idle timeout
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Total bytes written to the client
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Total bytes consumed from the client, including discarded ones
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Borrow the underlying transport
    pub fn get_ref(&self) -> &S {
        self.inner.get_ref()
    }

    /// Unwrap the transport. Bytes still buffered are lost.
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }

    /// Send raw bytes and flush them to the client
    pub async fn send(&mut self, bytes: &[u8]) -> TerminalResult<()> {
        const CONTEXT: &str = "TerminalStream::send";
        let stream = self.inner.get_mut();
        stream
            .write_all(bytes)
            .await
            .map_err(|e| TerminalError::from_io(e, CONTEXT))?;
        stream
            .flush()
            .await
            .map_err(|e| TerminalError::from_io(e, CONTEXT))?;
        self.bytes_sent += bytes.len() as u64;
        counter!("switchboard.bytes.sent").increment(bytes.len() as u64);
        Ok(())
    }

    /// Send a single byte
    pub async fn send_byte(&mut self, byte: u8) -> TerminalResult<()> {
        self.send(&[byte]).await
    }

    /// Send text without a line ending
    pub async fn send_str(&mut self, text: &str) -> TerminalResult<()> {
        self.send(text.as_bytes()).await
    }

    /// Send text followed by CR LF
    pub async fn send_line(&mut self, text: &str) -> TerminalResult<()> {
        let mut line = Vec::with_capacity(text.len() + CRLF.len());
        line.extend_from_slice(text.as_bytes());
        line.extend_from_slice(CRLF);
        self.send(&line).await
    }

    /// Send a bare CR LF
    pub async fn newline(&mut self) -> TerminalResult<()> {
        self.send(CRLF).await
    }

    /// Receive one byte, waiting as long as the idle timeout allows
    pub async fn recv(&mut self) -> TerminalResult<u8> {
        match self.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.read_byte()).await {
                Ok(result) => result,
                Err(_) => Err(TerminalError::connection_lost(
                    "idle timeout",
                    "TerminalStream::recv",
                )),
            },
            None => self.read_byte().await,
        }
    }

    /// Wait at most `window` for one byte
    ///
    /// Returns `Ok(None)` if nothing arrived in time. A transport failure during the
    /// wait is still an error.
    pub async fn recv_timeout(&mut self, window: Duration) -> TerminalResult<Option<u8>> {
        match tokio::time::timeout(window, self.read_byte()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    async fn read_byte(&mut self) -> TerminalResult<u8> {
        let byte = self
            .inner
            .read_u8()
            .await
            .map_err(|e| TerminalError::from_io(e, "TerminalStream::recv"))?;
        self.bytes_received += 1;
        counter!("switchboard.bytes.received").increment(1);
        Ok(byte)
    }

    /// Throw away every byte the client has already queued, without waiting
    ///
    /// Returns the number of bytes discarded. End of stream is left for the next
    /// receive to report.
    pub fn clear_buffer(&mut self) -> TerminalResult<usize> {
        let mut discarded = 0;
        loop {
            let available = match self.inner.fill_buf().now_or_never() {
                Some(Ok(buffer)) => buffer.len(),
                Some(Err(error)) => {
                    return Err(TerminalError::from_io(error, "TerminalStream::clear_buffer"));
                }
                None => 0,
            };
            if available == 0 {
                break;
            }
            self.inner.consume(available);
            discarded += available;
        }
        if discarded > 0 {
            self.bytes_received += discarded as u64;
            trace!(discarded, "Discarded queued input");
        }
        Ok(discarded)
    }

    /// Read one line of echoed input
    ///
    /// Backspace removes the last accepted character and echoes an erase sequence.
    /// Carriage return echoes CR LF and ends the line. Any other byte is echoed and
    /// kept while the line is shorter than `max_len`; past that it is consumed and
    /// dropped. Whatever the client queued while the line was being read is
    /// discarded before returning.
    pub async fn read_line(&mut self, max_len: usize) -> TerminalResult<String> {
        let mut line: Vec<u8> = Vec::with_capacity(max_len.min(128));
        loop {
            match self.recv().await? {
                ASCII_BACKSPACE => {
                    if line.pop().is_some() {
                        self.send(&ERASE_SEQUENCE).await?;
                    }
                }
                ASCII_CR => {
                    self.newline().await?;
                    break;
                }
                byte => {
                    if line.len() < max_len {
                        self.send_byte(byte).await?;
                        line.push(byte);
                    }
                }
            }
        }
        self.clear_buffer()?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Flush and close the write half of the transport
    pub async fn shutdown(&mut self) -> TerminalResult<()> {
        self.inner
            .get_mut()
            .shutdown()
            .await
            .map_err(|e| TerminalError::from_io(e, "TerminalStream::shutdown"))
    }
}

impl<S> std::fmt::Debug for TerminalStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalStream")
            .field("idle_timeout", &self.idle_timeout)
            .field("bytes_sent", &self.bytes_sent)
            .field("bytes_received", &self.bytes_received)
            .finish()
    }
}
