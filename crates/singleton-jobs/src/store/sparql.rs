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

//! HTTP SPARQL client speaking the mu-semtech sudo protocol.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::GraphStore;
use crate::error::StoreError;

/// Header granting the request elevated rights in mu-authorization.
const SUDO_HEADER: &str = "mu-auth-sudo";
const SPARQL_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Deserialize)]
struct BooleanResult {
    boolean: Option<bool>,
}

/// Sends queries and updates to a SPARQL endpoint as form-encoded `query=` posts.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SparqlClient {
    /// Creates a client for `endpoint`, applying `timeout` to every request when set.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, sparql: &str) -> Result<reqwest::Response, StoreError> {
        debug!(endpoint = %self.endpoint, "Executing SPARQL:\n{}", sparql);

        let response = self
            .http
            .post(&self.endpoint)
            .header(SUDO_HEADER, "true")
            .header(ACCEPT, SPARQL_JSON)
            .form(&[("query", sparql)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl GraphStore for SparqlClient {
    async fn ask(&self, query: &str) -> Result<bool, StoreError> {
        let body = self.post(query).await?.text().await?;
        let result: BooleanResult = serde_json::from_str(&body)
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;

        result.boolean.ok_or_else(|| {
            StoreError::MalformedResponse("ASK response has no boolean member".to_string())
        })
    }

    async fn update(&self, statement: &str) -> Result<(), StoreError> {
        self.post(statement).await?;
        Ok(())
    }
}
