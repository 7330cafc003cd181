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

//! Service configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Service configuration
///
/// Values are read-only once the service context is built. Use the builder
/// methods to customize the defaults.
///
/// # Example
///
/// ```
/// use switchboard_service::ServiceConfig;
/// use std::time::Duration;
///
/// let config = ServiceConfig::default()
///     .with_max_connections(16)
///     .with_login_tries(5)
///     .with_bbs_name("The Crypt");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on
    pub bind_address: SocketAddr,

    /// Maximum number of admitted sessions
    pub max_connections: usize,

    /// Close a session after this long without input (None to wait forever)
    pub idle_timeout: Option<Duration>,

    /// Login attempts allowed before the session is dropped
    pub login_tries: u32,

    /// How long a client has to answer the terminal probe
    pub detect_window: Duration,

    /// How long shutdown waits for sessions to tear down
    pub shutdown_timeout: Duration,

    /// Name printed in the login banner
    pub bbs_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 23)),
            max_connections: 4,
            idle_timeout: Some(Duration::from_secs(300)), // 5 minutes
            login_tries: 3,
            detect_window: Duration::from_secs(3),
            shutdown_timeout: Duration::from_secs(10),
            bbs_name: "My BBS".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration with the given bind address
    ///
    /// All other settings will use their default values.
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn with_bind_address(mut self, bind_address: SocketAddr) -> Self {
        self.bind_address = bind_address;
        self
    }

    /// Set the maximum number of admitted sessions
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the number of login attempts
    pub fn with_login_tries(mut self, tries: u32) -> Self {
        self.login_tries = tries;
        self
    }

    /// Set the terminal detection window
    pub fn with_detect_window(mut self, window: Duration) -> Self {
        self.detect_window = window;
        self
    }

    /// Set the shutdown timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the BBS name
    pub fn with_bbs_name(mut self, name: impl Into<String>) -> Self {
        self.bbs_name = name.into();
        self
    }

    /// Validate the configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }

        if self.login_tries == 0 {
            return Err("login_tries must be greater than 0".to_string());
        }

        if self.idle_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err("idle_timeout must be greater than 0".to_string());
        }

        if self.detect_window.is_zero() {
            return Err("detect_window must be greater than 0".to_string());
        }

        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be greater than 0".to_string());
        }

        if self.bbs_name.trim().is_empty() {
            return Err("bbs_name must not be empty".to_string());
        }

        Ok(())
    }
}
