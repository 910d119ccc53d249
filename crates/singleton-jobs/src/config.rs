/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Service configuration.
//!
//! The server fills a [`ServiceConfig`] from the environment; tests build one
//! directly:
//!
//! ```rust,ignore
//! let config = ServiceConfig::builder()
//!     .sparql_endpoint("http://localhost:8890/sparql")
//!     .lock_timeout(Some(Duration::from_secs(600)))
//!     .build();
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::rdf::NamedNode;

pub const DEFAULT_ERROR_GRAPH: &str = "http://lblod.data.gift/errors";
pub const DEFAULT_ERROR_BASE: &str = "http://data.lblod.info/errors/";
pub const DEFAULT_SPARQL_ENDPOINT: &str = "http://database:8890/sparql";

/// Verbosity accepted in `LOGLEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Info,
    #[default]
    Silent,
}

impl LogLevel {
    /// The `tracing` filter directive for this level.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Silent => "off",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "info" => Ok(LogLevel::Info),
            "silent" => Ok(LogLevel::Silent),
            other => Err(format!(
                "invalid log level '{}' (must be one of: error, info, silent)",
                other
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Silent => "silent",
        })
    }
}

/// Runtime settings of the singleton-jobs service.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ServiceConfig {
    log_level: LogLevel,
    write_errors: bool,
    error_graph: NamedNode,
    error_base: String,
    sparql_endpoint: String,
    lock_timeout: Option<Duration>,
    store_timeout: Option<Duration>,
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// The `WRITE_ERRORS` toggle. Error records are written regardless; the
    /// value is carried for operators and reported at start-up.
    pub fn write_errors(&self) -> bool {
        self.write_errors
    }

    /// Graph receiving error records.
    pub fn error_graph(&self) -> &NamedNode {
        &self.error_graph
    }

    /// Base IRI that error record identifiers are appended to.
    pub fn error_base(&self) -> &str {
        &self.error_base
    }

    pub fn sparql_endpoint(&self) -> &str {
        &self.sparql_endpoint
    }

    /// Maximum wait for the batch lock. `None` waits forever.
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    /// Per-request timeout for the graph store. `None` disables it.
    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfigBuilder::default().build()
    }
}

impl fmt::Display for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LOGLEVEL: {}", self.log_level)?;
        writeln!(f, "WRITE_ERRORS: {}", self.write_errors)?;
        writeln!(f, "ERROR_GRAPH: {}", self.error_graph)?;
        writeln!(f, "ERROR_BASE: {}", self.error_base)?;
        writeln!(f, "MU_SPARQL_ENDPOINT: {}", self.sparql_endpoint)?;
        writeln!(f, "LOCK_TIMEOUT: {:?}", self.lock_timeout)?;
        write!(f, "STORE_TIMEOUT: {:?}", self.store_timeout)
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug, Clone)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self {
            config: ServiceConfig {
                log_level: LogLevel::Silent,
                write_errors: false,
                error_graph: NamedNode::trusted(DEFAULT_ERROR_GRAPH),
                error_base: DEFAULT_ERROR_BASE.to_string(),
                sparql_endpoint: DEFAULT_SPARQL_ENDPOINT.to_string(),
                lock_timeout: None,
                store_timeout: None,
            },
        }
    }
}

impl ServiceConfigBuilder {
    pub fn log_level(mut self, value: LogLevel) -> Self {
        self.config.log_level = value;
        self
    }

    pub fn write_errors(mut self, value: bool) -> Self {
        self.config.write_errors = value;
        self
    }

    pub fn error_graph(mut self, value: NamedNode) -> Self {
        self.config.error_graph = value;
        self
    }

    pub fn error_base(mut self, value: impl Into<String>) -> Self {
        self.config.error_base = value.into();
        self
    }

    pub fn sparql_endpoint(mut self, value: impl Into<String>) -> Self {
        self.config.sparql_endpoint = value.into();
        self
    }

    pub fn lock_timeout(mut self, value: Option<Duration>) -> Self {
        self.config.lock_timeout = value;
        self
    }

    pub fn store_timeout(mut self, value: Option<Duration>) -> Self {
        self.config.store_timeout = value;
        self
    }

    pub fn build(self) -> ServiceConfig {
        self.config
    }
}
