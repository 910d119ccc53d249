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

//! Singleton conflict detection.
//!
//! A task is busy when its harvesting collection points at a remote data
//! object whose `nie:url` is also reached from another task, in a different
//! job, whose job is still scheduled or busy. The answer is a snapshot of the
//! store at query time; it only stays valid until the subsequent status write
//! because both run under the batch lock.

use std::sync::Arc;
use tracing::debug;

use crate::error::StoreError;
use crate::models::TaskStatus;
use crate::rdf::NamedNode;
use crate::store::GraphStore;
use crate::vocabulary::sparql_prefixes;

pub struct ConflictDetector {
    store: Arc<dyn GraphStore>,
}

impl ConflictDetector {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Returns true when another live task claims one of `task`'s subjects.
    ///
    /// A task without a resolvable subject never conflicts.
    pub async fn is_busy(&self, task: &NamedNode) -> Result<bool, StoreError> {
        let busy = self.store.ask(&busy_query(task)).await?;
        debug!(task = %task, busy, "Evaluated singleton conflict");
        Ok(busy)
    }
}

/// Builds the `ASK` query used by [`ConflictDetector::is_busy`].
pub fn busy_query(task: &NamedNode) -> String {
    let live_statuses = TaskStatus::live()
        .iter()
        .map(|status| status.iri().to_sparql())
        .collect::<Vec<_>>()
        .join("\n        ");

    format!(
        r#"{prefixes}
ASK {{
  BIND ({task} AS ?task)
  ?task
    a task:Task ;
    task:inputContainer ?inputContainer .
  OPTIONAL {{ ?task dct:isPartOf ?job . }}
  ?inputContainer
    a nfo:DataContainer ;
    task:hasHarvestingCollection ?harvestingCollection .
  ?harvestingCollection
    a harv:HarvestingCollection ;
    dct:hasPart ?remoteDataObject .
  ?remoteDataObject
    a nfo:RemoteDataObject ;
    nie:url ?subject .

  VALUES ?status {{
    {live_statuses}
  }}
  ?task2
    a task:Task ;
    dct:isPartOf ?job2 ;
    task:inputContainer ?inputContainer2 .
  FILTER (!SAMETERM(?task, ?task2))
  FILTER (!BOUND(?job) || !SAMETERM(?job, ?job2))
  ?job2
    a cogs:Job ;
    adms:status ?status .
  ?inputContainer2
    a nfo:DataContainer ;
    task:hasHarvestingCollection ?harvestingCollection2 .
  ?harvestingCollection2
    a harv:HarvestingCollection ;
    dct:hasPart ?remoteDataObject2 .
  ?remoteDataObject2
    a nfo:RemoteDataObject ;
    nie:url ?subject .
}}"#,
        prefixes = sparql_prefixes(),
        task = task.to_sparql(),
        live_statuses = live_statuses,
    )
}
