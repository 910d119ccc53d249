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

//! Delta notification payloads and the singleton-job task filter.
//!
//! The delta notifier is not trusted: statements with an unexpected shape and
//! subjects that are not usable IRIs are dropped without raising an error.
//! Only a body that is not a JSON array of change-sets fails the batch.

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::ProcessingError;
use crate::rdf::NamedNode;
use crate::vocabulary::{operation_predicate, singleton_job_operation};

/// One RDF term as serialised by the delta notifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeltaTerm {
    #[serde(rename = "type", default)]
    pub term_type: Option<String>,
    pub value: String,
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeltaStatement {
    pub subject: DeltaTerm,
    pub predicate: DeltaTerm,
    pub object: DeltaTerm,
}

/// Statements inserted and deleted by one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangeSet {
    #[serde(default, deserialize_with = "lenient_statements")]
    pub inserts: Vec<DeltaStatement>,
    #[serde(default, deserialize_with = "lenient_statements")]
    pub deletes: Vec<DeltaStatement>,
}

fn lenient_statements<'de, D>(deserializer: D) -> Result<Vec<DeltaStatement>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Parses a delta body into change-sets, skipping entries that are not objects.
pub fn parse_delta(body: &[u8]) -> Result<Vec<ChangeSet>, ProcessingError> {
    let raw: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| ProcessingError::invalid_delta(e.to_string()))?;

    Ok(raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Extracts the tasks announced as `?task task:operation tasko:singleton-job`.
///
/// Order follows the order of appearance in the batch. Duplicates are kept.
pub fn singleton_job_tasks(changesets: &[ChangeSet]) -> Vec<NamedNode> {
    let predicate = operation_predicate();
    let marker = singleton_job_operation();

    changesets
        .iter()
        .flat_map(|changeset| changeset.inserts.iter())
        .filter(|insert| insert.predicate.value == predicate.as_str())
        .filter(|insert| insert.object.value == marker.as_str())
        .filter_map(|insert| match NamedNode::parse(insert.subject.value.as_str()) {
            Ok(task) => Some(task),
            Err(e) => {
                debug!("Dropping singleton-job insert with unusable subject: {}", e);
                None
            }
        })
        .collect()
}
