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

//! Persistence of `oslc:Error` records for caught failures.

use std::sync::Arc;
use tracing::debug;

use crate::error::ProcessingError;
use crate::models::ErrorRecord;
use crate::rdf::{write_triples, NamedNode};
use crate::store::GraphStore;

pub struct ErrorRecorder {
    store: Arc<dyn GraphStore>,
    error_graph: NamedNode,
    error_base: String,
}

impl ErrorRecorder {
    pub fn new(store: Arc<dyn GraphStore>, error_graph: NamedNode, error_base: impl Into<String>) -> Self {
        Self {
            store,
            error_graph,
            error_base: error_base.into(),
        }
    }

    /// Stores a record for `failure` and returns its subject.
    ///
    /// The failure's own message becomes `oslc:message`; `context` describes
    /// where it happened and is kept as the record's extra detail.
    pub async fn record(
        &self,
        context: &str,
        failure: &ProcessingError,
    ) -> Result<NamedNode, ProcessingError> {
        let record = ErrorRecord::new(
            &self.error_base,
            failure.to_string(),
            Some(context.to_string()),
        )?;

        self.store
            .update(&insert_error(&self.error_graph, &record))
            .await?;

        debug!(error = %record.subject, kind = %failure.kind(), "Stored error record");
        Ok(record.subject)
    }
}

/// Builds the `INSERT DATA` for `record` into `graph`.
pub fn insert_error(graph: &NamedNode, record: &ErrorRecord) -> String {
    format!(
        "INSERT DATA {{\n  GRAPH {} {{\n{}\n  }}\n}}",
        graph.to_sparql(),
        write_triples(&record.to_triples())
    )
}
