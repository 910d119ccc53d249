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

//! Error types for the singleton-jobs service.
//!
//! Failures are tagged variants so the per-task and batch-level catch sites can
//! match on what went wrong. [`ProcessingError::kind`] exposes a coarse
//! [`ErrorKind`] for logging fields.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the graph store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SPARQL request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SPARQL endpoint responded with {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Malformed SPARQL response: {0}")]
    MalformedResponse(String),
}

/// Errors raised when building RDF terms from untrusted values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TermError {
    #[error("Invalid IRI '{value}': {reason}")]
    InvalidIri { value: String, reason: String },
}

/// Errors raised by the batch serializer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializerError {
    #[error("Timed out after {0:?} waiting for the batch lock")]
    Timeout(Duration),

    #[error("Batch lock has been closed")]
    Closed,
}

/// Any failure that can interrupt processing of a task or a batch.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Term(#[from] TermError),

    #[error(transparent)]
    Serializer(#[from] SerializerError),

    #[error("Invalid delta payload: {0}")]
    InvalidDelta(String),
}

/// Coarse classification of a [`ProcessingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Store,
    Term,
    Lock,
    Delta,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Store => "store",
            ErrorKind::Term => "term",
            ErrorKind::Lock => "lock",
            ErrorKind::Delta => "delta",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProcessingError {
    pub fn invalid_delta(msg: impl Into<String>) -> Self {
        Self::InvalidDelta(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::Store(_) => ErrorKind::Store,
            ProcessingError::Term(_) => ErrorKind::Term,
            ProcessingError::Serializer(_) => ErrorKind::Lock,
            ProcessingError::InvalidDelta(_) => ErrorKind::Delta,
        }
    }
}
