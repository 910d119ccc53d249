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

//! # Singleton Jobs Server
//!
//! Wires the [`singleton_jobs`] delta processor to an axum HTTP server fed by
//! the mu-semtech delta notifier.

pub mod cli;
pub mod logging;
pub mod server;

pub use cli::Cli;
pub use logging::LogFormat;
pub use server::{router, serve, shutdown_signal, AppState};
