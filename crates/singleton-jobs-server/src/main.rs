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

use anyhow::{Context, Result};
use clap::Parser;
use singleton_jobs::{DeltaProcessor, SparqlClient};
use singleton_jobs_server::{logging, serve, shutdown_signal, AppState, Cli};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is the normal case in a container.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = cli.service_config()?;
    logging::init(config.log_level(), cli.log_format);

    info!("Starting with configuration:\n{}", config);

    let store = SparqlClient::new(config.sparql_endpoint(), config.store_timeout())
        .context("Failed to create SPARQL client")?;
    let processor = Arc::new(DeltaProcessor::new(Arc::new(store), &config));

    let (host, port) = cli.bind_addr();
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("Listening on {}", listener.local_addr()?);

    serve(
        listener,
        AppState::new(processor),
        cli.max_body_bytes,
        shutdown_signal(),
    )
    .await
    .context("Server error")?;

    info!("Stopped");
    Ok(())
}
