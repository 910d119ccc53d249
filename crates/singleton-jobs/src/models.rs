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

//! Domain types: task lifecycle states, error records and batch outcomes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TermError;
use crate::rdf::{Literal, NamedNode, Triple};
use crate::vocabulary::{dct, js, mu, oslc, rdf, ERROR_CREATOR};

/// Lifecycle state of a task as stored under `adms:status`.
///
/// The stored vocabulary uses `js:busy` for [`TaskStatus::Ongoing`] and
/// `js:failed` for [`TaskStatus::Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Scheduled,
    Ongoing,
    Success,
    Failure,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Scheduled,
        TaskStatus::Ongoing,
        TaskStatus::Success,
        TaskStatus::Failure,
    ];

    /// Statuses of a job that still claims its tasks' subjects.
    pub fn live() -> [TaskStatus; 2] {
        [TaskStatus::Scheduled, TaskStatus::Ongoing]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Scheduled => "scheduled",
            TaskStatus::Ongoing => "busy",
            TaskStatus::Success => "success",
            TaskStatus::Failure => "failed",
        }
    }

    pub fn iri(&self) -> NamedNode {
        js(self.as_str())
    }

    pub fn from_iri(iri: &NamedNode) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.iri() == *iri)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure)
    }

    /// Whether a task currently in `self` may be moved to `next`.
    ///
    /// Terminal states never change. Re-marking an ongoing task as ongoing is
    /// allowed so a batch interrupted by a crash can be picked up again.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Scheduled => matches!(next, TaskStatus::Ongoing | TaskStatus::Failure),
            TaskStatus::Ongoing => next != TaskStatus::Scheduled,
            TaskStatus::Success | TaskStatus::Failure => false,
        }
    }

    /// Every status a task may currently hold for a move to `next` to apply.
    pub fn predecessors(next: TaskStatus) -> Vec<TaskStatus> {
        Self::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(next))
            .collect()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted description of a failure (`oslc:Error`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub id: Uuid,
    pub subject: NamedNode,
    pub message: String,
    pub creator: String,
    pub created: DateTime<Utc>,
    pub detail: Option<String>,
}

impl ErrorRecord {
    /// Creates a record with a fresh identity under `base`.
    pub fn new(
        base: &str,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Result<Self, TermError> {
        let id = Uuid::new_v4();
        let subject = NamedNode::parse(format!("{}{}", base, id))?;
        Ok(Self {
            id,
            subject,
            message: message.into(),
            creator: ERROR_CREATOR.to_string(),
            created: Utc::now(),
            detail: detail.filter(|d| !d.is_empty()),
        })
    }

    pub fn to_triples(&self) -> Vec<Triple> {
        let s = &self.subject;
        let mut triples = vec![
            Triple::new(s.clone(), rdf("type"), oslc("Error")),
            Triple::new(s.clone(), mu("uuid"), Literal::string(self.id.to_string())),
            Triple::new(s.clone(), dct("creator"), Literal::string(&self.creator)),
            Triple::new(s.clone(), oslc("message"), Literal::string(&self.message)),
            Triple::new(s.clone(), dct("created"), Literal::date_time(self.created)),
        ];
        if let Some(detail) = &self.detail {
            triples.push(Triple::new(
                s.clone(),
                oslc("largePreview"),
                Literal::string(detail),
            ));
        }
        triples
    }
}

/// Terminal result of evaluating one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// No other live task claims the subject.
    Success,
    /// Another live task in a different job claims the subject.
    Conflict,
    /// Processing failed unexpectedly; `error` references the stored record
    /// when it could be written.
    Failed { error: Option<NamedNode> },
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Success => TaskStatus::Success,
            TaskOutcome::Conflict | TaskOutcome::Failed { .. } => TaskStatus::Failure,
        }
    }
}

/// A failure that aborted a batch before or between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub message: String,
    pub error: Option<NamedNode>,
}

/// Summary of one delta batch, in processing order.
///
/// Outcomes record what each evaluation decided, not what the store ended up
/// holding. Status writes only apply from the expected predecessor status, so
/// a task that was already terminal (for instance because it was announced
/// twice in the same batch) keeps its stored status whatever its later
/// evaluations report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub outcomes: Vec<(NamedNode, TaskOutcome)>,
    pub failure: Option<BatchFailure>,
}

impl BatchReport {
    pub fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            outcomes: Vec::new(),
            failure: None,
        }
    }

    /// The outcome of the last evaluation of `task` in this batch.
    pub fn outcome_for(&self, task: &NamedNode) -> Option<&TaskOutcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|(t, _)| t == task)
            .map(|(_, outcome)| outcome)
    }

    pub fn is_aborted(&self) -> bool {
        self.failure.is_some()
    }
}
