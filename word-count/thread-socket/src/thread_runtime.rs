// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::future::Future;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::debug;
use word_count_core::constants::WorkerId;
use word_count_core::error::JobError;
use word_count_core::worker_runtime::{WorkerResult, WorkerRuntime};

#[derive(Debug, Error)]
pub enum ThreadJoinError {
    #[error("the worker thread panicked")]
    Panicked,

    #[error("waiting for the worker thread failed: {0}")]
    Wait(#[from] JoinError),
}

/// OS thread-based runtime: every worker owns a thread and a single-threaded tokio runtime
pub struct ThreadRuntime;

impl WorkerRuntime for ThreadRuntime {
    type Handle = JoinHandle<WorkerResult>;
    type Error = ThreadJoinError;

    fn spawn<F, Fut>(worker: WorkerId, f: F) -> Self::Handle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = WorkerResult> + Send + 'static,
    {
        thread::spawn(move || {
            debug!(worker, "worker thread started");
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(JobError::Runtime)?;
            runtime.block_on(f())
        })
    }

    async fn join(handle: Self::Handle) -> Result<WorkerResult, Self::Error> {
        tokio::task::spawn_blocking(move || handle.join())
            .await?
            .map_err(|_| ThreadJoinError::Panicked)
    }
}
