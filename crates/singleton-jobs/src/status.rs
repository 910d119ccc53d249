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

//! Task status transitions.
//!
//! A transition is one conditional delete/insert: the current `adms:status`
//! and `dct:modified` values are matched and replaced, and the task's
//! `task:inputContainer` is re-asserted as its `task:resultsContainer`. This
//! service never produces or removes files, so whatever the next task in the
//! job needs is exactly what this task received.
//!
//! The `WHERE` clause only matches tasks whose current status may move to the
//! requested one (see [`TaskStatus::can_transition_to`]). A task that already
//! reached a terminal state is left untouched and the update is a no-op.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::error::StoreError;
use crate::models::TaskStatus;
use crate::rdf::{write_triples, Literal, NamedNode, Triple};
use crate::store::GraphStore;
use crate::vocabulary::{adms, dct, sparql_prefixes, task as task_ns};

pub struct StatusWriter {
    store: Arc<dyn GraphStore>,
}

impl StatusWriter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Moves `task` to `status`, attaching `error` when the status is a failure.
    pub async fn update_status(
        &self,
        task: &NamedNode,
        status: TaskStatus,
        error: Option<&NamedNode>,
    ) -> Result<(), StoreError> {
        let statement = status_update(task, status, error, Utc::now());
        self.store.update(&statement).await?;

        match error.filter(|_| status == TaskStatus::Failure) {
            Some(error) => info!(task = %task, error = %error, "Task marked {}", status),
            None => info!(task = %task, "Task marked {}", status),
        }
        Ok(())
    }
}

/// Builds the guarded delete/insert for one transition.
pub fn status_update(
    task: &NamedNode,
    status: TaskStatus,
    error: Option<&NamedNode>,
    modified: DateTime<Utc>,
) -> String {
    let mut triples = Vec::with_capacity(3);
    if let Some(error) = error.filter(|_| status == TaskStatus::Failure) {
        triples.push(Triple::new(task.clone(), task_ns("hasError"), error.clone()));
    }
    triples.push(Triple::new(task.clone(), adms("status"), status.iri()));
    triples.push(Triple::new(
        task.clone(),
        dct("modified"),
        Literal::date_time(modified),
    ));

    let allowed_current = TaskStatus::predecessors(status)
        .iter()
        .map(|s| s.iri().to_sparql())
        .collect::<Vec<_>>()
        .join(" ");

    let task = task.to_sparql();
    format!(
        r#"{prefixes}
DELETE {{
  GRAPH ?g {{
    {task}
      adms:status ?oldStatus ;
      dct:modified ?oldModified .
  }}
}}
INSERT {{
  GRAPH ?g {{
    {triples}
    {task}
      task:resultsContainer ?container .
  }}
}}
WHERE {{
  GRAPH ?g {{
    {task}
      adms:status ?oldStatus ;
      dct:modified ?oldModified ;
      task:inputContainer ?container .
  }}
  VALUES ?oldStatus {{ {allowed_current} }}
}}"#,
        prefixes = sparql_prefixes(),
        task = task,
        triples = write_triples(&triples),
        allowed_current = allowed_current,
    )
}
