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

//! `SparqlClient` against a fake SPARQL endpoint served by axum.

use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use serde::Deserialize;
use singleton_jobs::{DeltaProcessor, GraphStore, ServiceConfig, SparqlClient, StoreError, TaskOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::fixtures::{sets_status, singleton_delta};

#[derive(Debug, Deserialize)]
struct QueryForm {
    query: String,
}

#[derive(Debug, Clone)]
struct Received {
    sudo: Option<String>,
    query: String,
}

struct Reply {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

#[derive(Clone)]
struct Endpoint {
    received: Arc<Mutex<Vec<Received>>>,
    reply: Arc<Mutex<Reply>>,
}

impl Endpoint {
    fn replying(status: StatusCode, body: &str) -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(Reply {
                status,
                body: body.to_string(),
                delay: None,
            })),
        }
    }

    fn received(&self) -> Vec<Received> {
        self.received.lock().clone()
    }

    /// Serves the endpoint on an ephemeral port and returns its URL.
    async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/sparql", post(handle))
            .with_state(self.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/sparql", addr)
    }
}

async fn handle(
    State(endpoint): State<Endpoint>,
    headers: HeaderMap,
    Form(form): Form<QueryForm>,
) -> (StatusCode, String) {
    endpoint.received.lock().push(Received {
        sudo: headers
            .get("mu-auth-sudo")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        query: form.query,
    });

    let (status, body, delay) = {
        let reply = endpoint.reply.lock();
        (reply.status, reply.body.clone(), reply.delay)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    (status, body)
}

#[tokio::test]
async fn test_ask_reads_boolean_and_sends_sudo_header() {
    let endpoint = Endpoint::replying(StatusCode::OK, r#"{"head":{},"boolean":true}"#);
    let client = SparqlClient::new(endpoint.spawn().await, None).unwrap();

    assert!(client.ask("ASK { ?s ?p ?o }").await.unwrap());

    let received = endpoint.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].sudo.as_deref(), Some("true"));
    assert_eq!(received[0].query, "ASK { ?s ?p ?o }");
}

#[tokio::test]
async fn test_update_posts_statement_as_query_field() {
    let endpoint = Endpoint::replying(StatusCode::OK, "");
    let client = SparqlClient::new(endpoint.spawn().await, None).unwrap();

    let statement = "INSERT DATA { <http://a> <http://b> \"c & d\" . }";
    client.update(statement).await.unwrap();

    let received = endpoint.received();
    assert_eq!(received[0].query, statement);
    assert_eq!(received[0].sudo.as_deref(), Some("true"));
}

#[tokio::test]
async fn test_endpoint_error_carries_status_and_body() {
    let endpoint = Endpoint::replying(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    let client = SparqlClient::new(endpoint.spawn().await, None).unwrap();

    match client.update("INSERT DATA {}").await {
        Err(StoreError::Endpoint { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_ask_without_boolean_is_malformed() {
    let endpoint = Endpoint::replying(StatusCode::OK, "{}");
    let client = SparqlClient::new(endpoint.spawn().await, None).unwrap();

    let result = client.ask("ASK {}").await;
    assert!(matches!(result, Err(StoreError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_slow_endpoint_hits_request_timeout() {
    let endpoint = Endpoint::replying(StatusCode::OK, r#"{"boolean":false}"#);
    endpoint.reply.lock().delay = Some(Duration::from_millis(500));
    let client =
        SparqlClient::new(endpoint.spawn().await, Some(Duration::from_millis(50))).unwrap();

    let result = client.ask("ASK {}").await;
    assert!(matches!(result, Err(StoreError::Request(_))));
}

#[tokio::test]
async fn test_processor_drives_real_client() {
    let endpoint = Endpoint::replying(StatusCode::OK, r#"{"boolean":false}"#);
    let client = SparqlClient::new(endpoint.spawn().await, None).unwrap();
    let processor = DeltaProcessor::new(Arc::new(client), &ServiceConfig::default());

    let report = processor.process_delta(&singleton_delta(&["1"])).await;
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].1, TaskOutcome::Success);

    let queries: Vec<_> = endpoint.received().into_iter().map(|r| r.query).collect();
    assert_eq!(queries.len(), 3);
    assert!(sets_status(&queries[0], "1", "busy"));
    assert!(queries[1].contains("ASK {"));
    assert!(sets_status(&queries[2], "1", "success"));
}
