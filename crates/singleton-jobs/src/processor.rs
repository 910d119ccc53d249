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

//! Batch orchestration.
//!
//! [`DeltaProcessor::process_delta`] is the only entry point the transport
//! calls. By then the notifier already got its `200`, so nothing may escape:
//! every failure is logged, stored as an error record and folded into the
//! returned [`BatchReport`].
//!
//! Per batch:
//!
//! 1. acquire the [`BatchSerializer`] permit (held until the report is built)
//! 2. parse the delta and extract singleton-job tasks
//! 3. for each task, in order: mark busy, run the conflict query, mark
//!    success or failed
//!
//! Tasks are evaluated one after the other on purpose. The conflict answer is
//! only trustworthy while no other write to task statuses can happen, which
//! the permit guarantees for the whole batch and nothing guarantees within it
//! if tasks ran concurrently.

use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::conflict::ConflictDetector;
use crate::delta::{parse_delta, singleton_job_tasks};
use crate::error::ProcessingError;
use crate::error_recorder::ErrorRecorder;
use crate::models::{BatchFailure, BatchReport, TaskOutcome, TaskStatus};
use crate::rdf::NamedNode;
use crate::serializer::{BatchSerializer, QueuedPermit};
use crate::status::StatusWriter;
use crate::store::GraphStore;

/// Detail stored on error records for failures outside the per-task loop.
pub const BATCH_FAILURE_MESSAGE: &str =
    "The singleton-job task could not even be started or finished due to an unexpected problem.";

pub struct DeltaProcessor {
    serializer: BatchSerializer,
    detector: ConflictDetector,
    writer: StatusWriter,
    recorder: ErrorRecorder,
}

impl DeltaProcessor {
    pub fn new(store: Arc<dyn GraphStore>, config: &ServiceConfig) -> Self {
        Self {
            serializer: BatchSerializer::with_timeout(config.lock_timeout()),
            detector: ConflictDetector::new(store.clone()),
            writer: StatusWriter::new(store.clone()),
            recorder: ErrorRecorder::new(
                store,
                config.error_graph().clone(),
                config.error_base(),
            ),
        }
    }

    pub fn serializer(&self) -> &BatchSerializer {
        &self.serializer
    }

    /// Processes one delta body. Never fails; see the returned report.
    pub async fn process_delta(&self, body: &[u8]) -> BatchReport {
        let ticket = self.serializer.enqueue().await;
        self.process_queued(ticket, body).await
    }

    /// Processes a delta whose place in the batch queue was taken earlier
    /// with [`BatchSerializer::enqueue`].
    pub async fn process_queued(&self, ticket: QueuedPermit, body: &[u8]) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let span = info_span!("delta_batch", batch_id = %batch_id);

        async move {
            let mut report = BatchReport::new(batch_id);

            let _permit = match ticket.wait().await {
                Ok(permit) => permit,
                Err(e) => {
                    self.fail_batch(&mut report, e.into()).await;
                    return report;
                }
            };

            if let Err(e) = self.run_batch(body, &mut report).await {
                self.fail_batch(&mut report, e).await;
            }

            report
        }
        .instrument(span)
        .await
    }

    async fn run_batch(
        &self,
        body: &[u8],
        report: &mut BatchReport,
    ) -> Result<(), ProcessingError> {
        let changesets = parse_delta(body)?;
        let tasks = singleton_job_tasks(&changesets);
        if tasks.is_empty() {
            debug!("Delta contains no singleton-job tasks");
            return Ok(());
        }

        info!("Processing {} singleton-job task(s)", tasks.len());
        for task in tasks {
            let span = info_span!("task", task = %task);
            let outcome = self.process_task(&task).instrument(span).await;
            report.outcomes.push((task, outcome));
        }
        Ok(())
    }

    /// Runs one task to a terminal status. Failures stay within this task.
    async fn process_task(&self, task: &NamedNode) -> TaskOutcome {
        let failure = match self.evaluate(task).await {
            Ok(outcome) => return outcome,
            Err(e) => e,
        };

        error!(kind = %failure.kind(), "Singleton-job task failed: {}", failure);

        let context = format!("Singleton-job task {} could not be processed.", task);
        let error = match self.recorder.record(&context, &failure).await {
            Ok(subject) => Some(subject),
            Err(e) => {
                error!("Could not store error record for task: {}", e);
                None
            }
        };

        if let Err(e) = self
            .writer
            .update_status(task, TaskStatus::Failure, error.as_ref())
            .await
        {
            error!("Could not mark task as failed: {}", e);
        }

        TaskOutcome::Failed { error }
    }

    /// Decides the task's outcome and writes it. A write against a task that
    /// is no longer in the expected status matches nothing, so the returned
    /// outcome can differ from the stored status.
    async fn evaluate(&self, task: &NamedNode) -> Result<TaskOutcome, ProcessingError> {
        self.writer
            .update_status(task, TaskStatus::Ongoing, None)
            .await?;

        if self.detector.is_busy(task).await? {
            warn!("Subject is already being harvested by another live job");
            self.writer
                .update_status(task, TaskStatus::Failure, None)
                .await?;
            Ok(TaskOutcome::Conflict)
        } else {
            self.writer
                .update_status(task, TaskStatus::Success, None)
                .await?;
            Ok(TaskOutcome::Success)
        }
    }

    async fn fail_batch(&self, report: &mut BatchReport, failure: ProcessingError) {
        error!(kind = %failure.kind(), "{}\n{}", BATCH_FAILURE_MESSAGE, failure);

        let error = match self.recorder.record(BATCH_FAILURE_MESSAGE, &failure).await {
            Ok(subject) => Some(subject),
            Err(e) => {
                error!("Could not store error record for batch: {}", e);
                None
            }
        };

        report.failure = Some(BatchFailure {
            message: failure.to_string(),
            error,
        });
    }
}
