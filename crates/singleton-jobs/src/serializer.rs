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

//! Process-wide mutual exclusion for delta batches.
//!
//! `BatchSerializer` wraps a single-permit semaphore. Tokio semaphores hand
//! out permits in request order, so waiting batches are admitted first come,
//! first served. [`BatchSerializer::enqueue`] takes the place in that queue
//! up front and returns a ticket to wait on later. The permit is an RAII guard: it is returned on every exit path
//! of the holder, including early returns and panics.

use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;
use std::time::{Duration, Instant};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::SerializerError;

/// The gate admitting one batch at a time.
#[derive(Debug, Clone)]
pub struct BatchSerializer {
    semaphore: Arc<Semaphore>,
    acquire_timeout: Option<Duration>,
}

impl BatchSerializer {
    /// Creates a serializer whose acquisitions wait indefinitely.
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// Creates a serializer that gives up on acquisition after `acquire_timeout`.
    pub fn with_timeout(acquire_timeout: Option<Duration>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            acquire_timeout,
        }
    }

    /// Waits for exclusive access.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::Timeout`] when a timeout is configured and
    /// elapses first, or [`SerializerError::Closed`] if the semaphore was closed.
    pub async fn acquire(&self) -> Result<BatchPermit, SerializerError> {
        self.enqueue().await.wait().await
    }

    /// Takes a place in the queue without waiting for the lock.
    ///
    /// Admission order is the order of `enqueue` calls, not the order in
    /// which the returned tickets are later awaited. The transport calls this
    /// before acknowledging a delta so batches run in arrival order.
    pub async fn enqueue(&self) -> QueuedPermit {
        let mut acquire: PendingAcquire = Box::pin(self.semaphore.clone().acquire_owned());
        // One poll registers the waiter in the semaphore queue.
        let first = poll_fn(|cx| Poll::Ready(acquire.as_mut().poll(cx))).await;

        QueuedPermit {
            state: match first {
                Poll::Ready(result) => Queued::Ready(result),
                Poll::Pending => Queued::Waiting(acquire),
            },
            acquire_timeout: self.acquire_timeout,
            queued_at: Instant::now(),
        }
    }

    /// Whether some batch currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout
    }
}

impl Default for BatchSerializer {
    fn default() -> Self {
        Self::new()
    }
}

type PendingAcquire =
    Pin<Box<dyn Future<Output = Result<OwnedSemaphorePermit, AcquireError>> + Send>>;

enum Queued {
    Ready(Result<OwnedSemaphorePermit, AcquireError>),
    Waiting(PendingAcquire),
}

/// A place in the batch queue. Dropping it gives the place up.
pub struct QueuedPermit {
    state: Queued,
    acquire_timeout: Option<Duration>,
    queued_at: Instant,
}

impl QueuedPermit {
    /// Waits until this ticket reaches the front of the queue.
    ///
    /// The acquisition timeout counts from the moment the ticket was queued.
    pub async fn wait(self) -> Result<BatchPermit, SerializerError> {
        let result = match self.state {
            Queued::Ready(result) => result,
            Queued::Waiting(acquire) => match self.acquire_timeout {
                Some(limit) => {
                    let remaining = limit.saturating_sub(self.queued_at.elapsed());
                    tokio::time::timeout(remaining, acquire)
                        .await
                        .map_err(|_| SerializerError::Timeout(limit))?
                }
                None => acquire.await,
            },
        };
        let permit = result.map_err(|_| SerializerError::Closed)?;

        debug!("Batch lock acquired after {:?}", self.queued_at.elapsed());
        Ok(BatchPermit {
            permit: Some(permit),
            acquired_at: Instant::now(),
        })
    }
}

impl std::fmt::Debug for QueuedPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedPermit")
            .field("ready", &matches!(self.state, Queued::Ready(_)))
            .field("queued_at", &self.queued_at)
            .finish()
    }
}

/// Exclusive access to the batch critical section. Dropping it releases the lock.
#[derive(Debug)]
pub struct BatchPermit {
    permit: Option<OwnedSemaphorePermit>,
    acquired_at: Instant,
}

impl BatchPermit {
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl Drop for BatchPermit {
    fn drop(&mut self) {
        if self.permit.take().is_some() {
            debug!("Batch lock released after {:?}", self.acquired_at.elapsed());
        }
    }
}
