// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::constants::WorkerId;
use crate::error::JobError;
use std::future::Future;
use std::time::Duration;

/// What a worker returns: its elapsed counting time, or why it failed
pub type WorkerResult = Result<Duration, JobError>;

/// Trait for abstracting how workers are run (tasks, threads)
pub trait WorkerRuntime: Send + 'static {
    type Handle: Send;
    type Error: std::fmt::Display + Send;

    /// Spawn worker `worker`, driving the future built by `f` to completion
    fn spawn<F, Fut>(worker: WorkerId, f: F) -> Self::Handle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = WorkerResult> + Send + 'static;

    /// Wait for the worker to complete
    fn join(handle: Self::Handle)
        -> impl Future<Output = Result<WorkerResult, Self::Error>> + Send;
}
