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

//! Test utilities: an in-memory [`GraphStore`] that records every statement.
//!
//! `MemoryStore` does not evaluate SPARQL. ASK answers come from a predicate
//! over the query text, and failures are injected for statements containing a
//! marker string. Statements are recorded in the order they were issued,
//! including the ones that were made to fail.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::error::StoreError;
use crate::store::GraphStore;

type AskPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Ask,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedStatement {
    pub kind: StatementKind,
    pub sparql: String,
    pub failed: bool,
}

pub struct MemoryStore {
    statements: Mutex<Vec<RecordedStatement>>,
    ask_predicate: Mutex<AskPredicate>,
    failures: Mutex<Vec<(String, String)>>,
    delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    /// A store that answers every ASK with `false` and accepts every update.
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            ask_predicate: Mutex::new(Box::new(|_| false)),
            failures: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
        }
    }

    /// Answers ASK queries with `predicate(query)`.
    pub fn answer_ask_with(&self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) {
        *self.ask_predicate.lock() = Box::new(predicate);
    }

    /// Makes any statement containing `marker` fail with an endpoint error whose body is `message`.
    pub fn fail_when_contains(&self, marker: impl Into<String>, message: impl Into<String>) {
        self.failures.lock().push((marker.into(), message.into()));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Sleeps for `delay` before answering each statement.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.statements.lock().clone()
    }

    pub fn asks(&self) -> Vec<String> {
        self.of_kind(StatementKind::Ask)
    }

    pub fn updates(&self) -> Vec<String> {
        self.of_kind(StatementKind::Update)
    }

    /// Updates that were accepted.
    pub fn applied_updates(&self) -> Vec<String> {
        self.statements
            .lock()
            .iter()
            .filter(|s| s.kind == StatementKind::Update && !s.failed)
            .map(|s| s.sparql.clone())
            .collect()
    }

    fn of_kind(&self, kind: StatementKind) -> Vec<String> {
        self.statements
            .lock()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.sparql.clone())
            .collect()
    }

    async fn record(&self, kind: StatementKind, sparql: &str) -> Result<(), StoreError> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failures
            .lock()
            .iter()
            .find(|(marker, _)| sparql.contains(marker.as_str()))
            .map(|(_, message)| message.clone());

        self.statements.lock().push(RecordedStatement {
            kind,
            sparql: sparql.to_string(),
            failed: failure.is_some(),
        });

        match failure {
            Some(body) => Err(StoreError::Endpoint { status: 500, body }),
            None => Ok(()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn ask(&self, query: &str) -> Result<bool, StoreError> {
        self.record(StatementKind::Ask, query).await?;
        let predicate = self.ask_predicate.lock();
        Ok((*predicate)(query))
    }

    async fn update(&self, statement: &str) -> Result<(), StoreError> {
        self.record(StatementKind::Update, statement).await
    }
}
