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

//! # Singleton Jobs
//!
//! Single-flight execution for harvesting tasks whose operation is
//! `tasko:singleton-job`. Delta notifications announce freshly scheduled
//! tasks; for each one the service checks whether another live task in a
//! different job is already harvesting the same remote subject, and records
//! the outcome as a status transition in the triplestore.
//!
//! The moving parts:
//!
//! - [`delta`]: extracts singleton-job task IRIs from an inbound change-set batch.
//! - [`serializer`]: the process-wide gate that admits one batch at a time.
//! - [`conflict`]: the ASK query deciding whether a task's subject is busy.
//! - [`status`]: the guarded delete/insert that moves a task between states.
//! - [`error_recorder`]: persists `oslc:Error` records for caught failures.
//! - [`processor`]: the batch orchestrator tying all of the above together.
//!
//! The conflict query and the status write that follows it are only correct
//! because both happen while the [`serializer::BatchSerializer`] permit is
//! held. Do not move either outside the critical section.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use singleton_jobs::{DeltaProcessor, ServiceConfig, SparqlClient};
//!
//! let config = ServiceConfig::default();
//! let store = Arc::new(SparqlClient::new(config.sparql_endpoint(), config.store_timeout())?);
//! let processor = DeltaProcessor::new(store, &config);
//! let report = processor.process_delta(&body).await;
//! ```

pub mod config;
pub mod conflict;
pub mod delta;
pub mod error;
pub mod error_recorder;
pub mod models;
pub mod processor;
pub mod rdf;
pub mod serializer;
pub mod status;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod vocabulary;

pub use config::{LogLevel, ServiceConfig, ServiceConfigBuilder};
pub use error::{ErrorKind, ProcessingError, SerializerError, StoreError, TermError};
pub use models::{BatchReport, ErrorRecord, TaskOutcome, TaskStatus};
pub use processor::DeltaProcessor;
pub use rdf::{Literal, NamedNode};
pub use serializer::{BatchPermit, BatchSerializer, QueuedPermit};
pub use store::{GraphStore, SparqlClient};
