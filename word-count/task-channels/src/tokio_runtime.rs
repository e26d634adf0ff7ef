// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::future::Future;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;
use word_count_core::constants::WorkerId;
use word_count_core::worker_runtime::{WorkerResult, WorkerRuntime};

/// Tokio task-based runtime: every worker is a task of the current runtime
pub struct TokioRuntime;

impl WorkerRuntime for TokioRuntime {
    type Handle = JoinHandle<WorkerResult>;
    type Error = JoinError;

    fn spawn<F, Fut>(worker: WorkerId, f: F) -> Self::Handle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = WorkerResult> + Send + 'static,
    {
        debug!(worker, "spawning worker task");
        tokio::spawn(f())
    }

    async fn join(handle: Self::Handle) -> Result<WorkerResult, Self::Error> {
        handle.await
    }
}
