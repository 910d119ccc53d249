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

//! Access to the triplestore.
//!
//! Everything the service reads or writes goes through [`GraphStore`], which
//! takes SPARQL text and returns raw results. [`SparqlClient`] is the HTTP
//! implementation used in production; `crate::testing::MemoryStore` records
//! statements for tests.

use async_trait::async_trait;

use crate::error::StoreError;

mod sparql;

pub use sparql::SparqlClient;

/// A SPARQL endpoint reached with elevated (sudo) rights.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Runs an `ASK` query.
    async fn ask(&self, query: &str) -> Result<bool, StoreError>;

    /// Runs an update (`INSERT DATA`, `DELETE ... INSERT ... WHERE`, ...).
    async fn update(&self, statement: &str) -> Result<(), StoreError>;
}
