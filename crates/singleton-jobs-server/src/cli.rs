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

//! Command-line and environment options.
//!
//! Every option can be given as a long flag or through the environment
//! variable named next to it. `main` loads a `.env` file first, so a local
//! development setup needs nothing else.

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Parser;
use singleton_jobs::config::{DEFAULT_ERROR_BASE, DEFAULT_ERROR_GRAPH, DEFAULT_SPARQL_ENDPOINT};
use singleton_jobs::{LogLevel, NamedNode, ServiceConfig};
use std::time::Duration;
use url::Url;

use crate::logging::LogFormat;

/// Default limit on inbound delta bodies (50 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Harvesting singleton-jobs service
#[derive(Debug, Clone, Parser)]
#[command(name = "singleton-jobs-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log verbosity: error, info or silent (RUST_LOG takes precedence when set)
    #[arg(long, env = "LOGLEVEL", default_value = "silent")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Whether error records are requested by the deployment
    #[arg(
        long,
        env = "WRITE_ERRORS",
        default_value = "false",
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set
    )]
    pub write_errors: bool,

    /// Graph receiving error records
    #[arg(long, env = "ERROR_GRAPH", default_value = DEFAULT_ERROR_GRAPH)]
    pub error_graph: String,

    /// Base IRI for error record subjects
    #[arg(long, env = "ERROR_BASE", default_value = DEFAULT_ERROR_BASE)]
    pub error_base: String,

    /// SPARQL endpoint of the triplestore
    #[arg(long, env = "MU_SPARQL_ENDPOINT", default_value = DEFAULT_SPARQL_ENDPOINT)]
    pub sparql_endpoint: String,

    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "PORT", default_value_t = 80)]
    pub port: u16,

    /// Give up waiting for the batch lock after this many seconds (waits forever when unset)
    #[arg(long, env = "LOCK_TIMEOUT_SECS")]
    pub lock_timeout_secs: Option<u64>,

    /// Per-request timeout for SPARQL calls, in seconds
    #[arg(long, env = "STORE_TIMEOUT_SECS")]
    pub store_timeout_secs: Option<u64>,

    /// Largest accepted delta body, in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl Cli {
    /// Validates the options and builds the library configuration.
    pub fn service_config(&self) -> Result<ServiceConfig> {
        Url::parse(&self.sparql_endpoint).with_context(|| {
            format!(
                "MU_SPARQL_ENDPOINT is not a valid URL: {}",
                self.sparql_endpoint
            )
        })?;
        let error_graph =
            NamedNode::parse(&self.error_graph).context("ERROR_GRAPH is not a valid IRI")?;
        // Subjects are minted by appending a UUID, so the base itself must be an IRI.
        NamedNode::parse(&self.error_base).context("ERROR_BASE is not a valid IRI")?;

        Ok(ServiceConfig::builder()
            .log_level(self.log_level)
            .write_errors(self.write_errors)
            .error_graph(error_graph)
            .error_base(&self.error_base)
            .sparql_endpoint(&self.sparql_endpoint)
            .lock_timeout(self.lock_timeout_secs.map(Duration::from_secs))
            .store_timeout(self.store_timeout_secs.map(Duration::from_secs))
            .build())
    }

    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
