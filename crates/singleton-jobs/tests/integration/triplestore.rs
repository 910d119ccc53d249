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

//! Conflict queries and status writes evaluated by a real SPARQL engine.
//!
//! The fixture is one harvesting graph:
//!
//! | task | job | job status | subject |
//! |---|---|---|---|
//! | a, s | job-1 | busy | http://remote/x |
//! | b | job-2 | scheduled | http://remote/x |
//! | p, q | job-5 | busy | http://remote/z |
//! | d | job-3 | success | http://remote/y |
//! | e | job-4 | busy | http://remote/y |
//! | n | job-2 | scheduled | none (no harvesting collection) |

use async_trait::async_trait;
use oxigraph::sparql::{Query, QueryResults};
use oxigraph::store::Store;
use singleton_jobs::conflict::ConflictDetector;
use singleton_jobs::status::StatusWriter;
use singleton_jobs::vocabulary::sparql_prefixes;
use singleton_jobs::{
    DeltaProcessor, GraphStore, NamedNode, ServiceConfig, StoreError, TaskOutcome, TaskStatus,
};
use std::fmt::Display;
use std::sync::Arc;

use crate::fixtures::{singleton_delta, task_iri};

const GRAPH: &str = "http://mu.semte.ch/graphs/harvesting";

/// A `GraphStore` backed by an in-memory oxigraph store.
///
/// Queries see the union of all named graphs as their default graph, the way
/// the production triplestore answers unscoped queries.
struct OxigraphStore {
    store: Store,
}

fn rejected(e: impl Display) -> StoreError {
    StoreError::Endpoint {
        status: 400,
        body: e.to_string(),
    }
}

impl OxigraphStore {
    fn with_fixture() -> Arc<Self> {
        let store = Self {
            store: Store::new().unwrap(),
        };
        store.store.update(fixture().as_str()).unwrap();
        Arc::new(store)
    }

    /// Whether `pattern` matches inside some named graph.
    fn holds(&self, pattern: &str) -> bool {
        let query = format!("{}\nASK {{ GRAPH ?g {{ {} }} }}", sparql_prefixes(), pattern);
        match self.store.query(query.as_str()).unwrap() {
            QueryResults::Boolean(answer) => answer,
            _ => panic!("ASK did not return a boolean"),
        }
    }
}

#[async_trait]
impl GraphStore for OxigraphStore {
    async fn ask(&self, query: &str) -> Result<bool, StoreError> {
        let mut query = Query::parse(query, None).map_err(rejected)?;
        query.dataset_mut().set_default_graph_as_union();
        match self.store.query(query).map_err(rejected)? {
            QueryResults::Boolean(answer) => Ok(answer),
            _ => Err(StoreError::MalformedResponse(
                "expected a boolean result".to_string(),
            )),
        }
    }

    async fn update(&self, statement: &str) -> Result<(), StoreError> {
        self.store.update(statement).map_err(rejected)
    }
}

fn job(id: &str, status: &str) -> String {
    format!(
        "<http://data.lblod.info/id/jobs/{id}> a cogs:Job ; adms:status js:{status} .\n"
    )
}

fn harvesting_task(id: &str, job: &str, subject: Option<&str>) -> String {
    let task = task_iri(id);
    let container = format!("http://data.lblod.info/id/data-containers/{id}");
    let mut triples = format!(
        r#"<{task}> a task:Task ;
    dct:isPartOf <http://data.lblod.info/id/jobs/{job}> ;
    adms:status js:scheduled ;
    dct:modified "2024-01-01T00:00:00.000Z"^^xsd:dateTime ;
    task:inputContainer <{container}> .
<{container}> a nfo:DataContainer .
"#
    );
    if let Some(subject) = subject {
        triples.push_str(&format!(
            r#"<{container}> task:hasHarvestingCollection <http://data.lblod.info/id/harvesting-collections/{id}> .
<http://data.lblod.info/id/harvesting-collections/{id}> a harv:HarvestingCollection ;
    dct:hasPart <http://data.lblod.info/id/remote-data-objects/{id}> .
<http://data.lblod.info/id/remote-data-objects/{id}> a nfo:RemoteDataObject ;
    nie:url <{subject}> .
"#
        ));
    }
    triples
}

fn fixture() -> String {
    let data = [
        job("job-1", "busy"),
        job("job-2", "scheduled"),
        job("job-3", "success"),
        job("job-4", "busy"),
        job("job-5", "busy"),
        harvesting_task("a", "job-1", Some("http://remote/x")),
        harvesting_task("s", "job-1", Some("http://remote/x")),
        harvesting_task("b", "job-2", Some("http://remote/x")),
        harvesting_task("p", "job-5", Some("http://remote/z")),
        harvesting_task("q", "job-5", Some("http://remote/z")),
        harvesting_task("d", "job-3", Some("http://remote/y")),
        harvesting_task("e", "job-4", Some("http://remote/y")),
        harvesting_task("n", "job-2", None),
    ]
    .concat();

    format!(
        "{}\nINSERT DATA {{\n  GRAPH <{}> {{\n{}\n  }}\n}}",
        sparql_prefixes(),
        GRAPH,
        data
    )
}

fn task(id: &str) -> NamedNode {
    NamedNode::parse(task_iri(id)).unwrap()
}

async fn busy(store: &Arc<OxigraphStore>, id: &str) -> bool {
    ConflictDetector::new(store.clone())
        .is_busy(&task(id))
        .await
        .unwrap()
}

fn stored_status(store: &OxigraphStore, id: &str) -> Option<TaskStatus> {
    TaskStatus::ALL.into_iter().find(|status| {
        store.holds(&format!("<{}> adms:status {} .", task_iri(id), status.iri().to_sparql()))
    })
}

fn status_count(store: &OxigraphStore, id: &str) -> usize {
    TaskStatus::ALL
        .into_iter()
        .filter(|status| {
            store.holds(&format!("<{}> adms:status {} .", task_iri(id), status.iri().to_sparql()))
        })
        .count()
}

#[tokio::test]
async fn test_shared_subject_across_jobs_conflicts_both_ways() {
    let store = OxigraphStore::with_fixture();

    assert!(busy(&store, "a").await);
    assert!(busy(&store, "b").await);
}

#[tokio::test]
async fn test_tasks_of_the_same_job_do_not_conflict() {
    let store = OxigraphStore::with_fixture();

    assert!(!busy(&store, "p").await);
    assert!(!busy(&store, "q").await);
}

#[tokio::test]
async fn test_task_without_subject_is_not_busy() {
    let store = OxigraphStore::with_fixture();

    assert!(!busy(&store, "n").await);
}

#[tokio::test]
async fn test_finished_jobs_do_not_claim_subjects() {
    let store = OxigraphStore::with_fixture();

    // d shares e's subject, but d's job already succeeded.
    assert!(!busy(&store, "e").await);
}

#[tokio::test]
async fn test_status_write_forwards_input_container() {
    let store = OxigraphStore::with_fixture();
    let writer = StatusWriter::new(store.clone());

    writer
        .update_status(&task("a"), TaskStatus::Ongoing, None)
        .await
        .unwrap();

    let a = task_iri("a");
    assert_eq!(stored_status(&store, "a"), Some(TaskStatus::Ongoing));
    assert_eq!(status_count(&store, "a"), 1);
    assert!(store.holds(&format!(
        "<{a}> task:resultsContainer ?c ; task:inputContainer ?c ."
    )));
    assert!(!store.holds(&format!(
        "<{a}> task:resultsContainer ?c . FILTER NOT EXISTS {{ <{a}> task:inputContainer ?c }}"
    )));
    assert!(!store.holds(&format!(
        "<{a}> dct:modified ?m1, ?m2 . FILTER (?m1 != ?m2)"
    )));
}

#[tokio::test]
async fn test_terminal_status_is_never_left() {
    let store = OxigraphStore::with_fixture();
    let writer = StatusWriter::new(store.clone());
    let a = task("a");

    writer.update_status(&a, TaskStatus::Ongoing, None).await.unwrap();
    writer.update_status(&a, TaskStatus::Success, None).await.unwrap();
    writer.update_status(&a, TaskStatus::Ongoing, None).await.unwrap();
    writer.update_status(&a, TaskStatus::Failure, None).await.unwrap();

    assert_eq!(stored_status(&store, "a"), Some(TaskStatus::Success));
    assert_eq!(status_count(&store, "a"), 1);
}

#[tokio::test]
async fn test_success_requires_task_to_be_busy_first() {
    let store = OxigraphStore::with_fixture();
    let writer = StatusWriter::new(store.clone());

    writer
        .update_status(&task("p"), TaskStatus::Success, None)
        .await
        .unwrap();

    assert_eq!(stored_status(&store, "p"), Some(TaskStatus::Scheduled));
    assert!(!store.holds(&format!("<{}> task:resultsContainer ?c .", task_iri("p"))));
}

#[tokio::test]
async fn test_failure_attaches_error_reference() {
    let store = OxigraphStore::with_fixture();
    let writer = StatusWriter::new(store.clone());
    let b = task("b");
    let error = NamedNode::parse("http://data.lblod.info/errors/42").unwrap();

    writer.update_status(&b, TaskStatus::Ongoing, None).await.unwrap();
    writer
        .update_status(&b, TaskStatus::Failure, Some(&error))
        .await
        .unwrap();

    assert_eq!(stored_status(&store, "b"), Some(TaskStatus::Failure));
    assert!(store.holds(&format!(
        "<{}> task:hasError {} .",
        task_iri("b"),
        error.to_sparql()
    )));
}

#[tokio::test]
async fn test_batch_against_triplestore() {
    let store = OxigraphStore::with_fixture();
    let processor = DeltaProcessor::new(store.clone(), &ServiceConfig::default());

    let report = processor
        .process_delta(&singleton_delta(&["a", "p", "n", "p"]))
        .await;

    assert!(!report.is_aborted());
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.outcome_for(&task("a")), Some(&TaskOutcome::Conflict));
    assert_eq!(report.outcome_for(&task("n")), Some(&TaskOutcome::Success));

    assert_eq!(stored_status(&store, "a"), Some(TaskStatus::Failure));
    assert_eq!(stored_status(&store, "n"), Some(TaskStatus::Success));
    // p is announced twice; the second pass cannot move it out of success.
    assert_eq!(stored_status(&store, "p"), Some(TaskStatus::Success));
    assert_eq!(status_count(&store, "p"), 1);
    assert!(!store.holds(&format!("<{}> task:hasError ?e .", task_iri("a"))));
    // Nothing failed unexpectedly, so no error records were written.
    assert!(!store.holds("?e a oslc:Error ."));
}
