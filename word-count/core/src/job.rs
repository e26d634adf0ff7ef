// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::aggregation::{prepare_assignment, run_coordinator, JobOutcome};
use crate::constants::{WorkerId, COORDINATOR_ID};
use crate::error::{ConfigError, JobError, TransportError};
use crate::shutdown_signal::ShutdownSignal;
use crate::transport::Transport;
use crate::worker_runtime::{WorkerResult, WorkerRuntime};
use std::future::Future;
use tracing::{debug, info, warn};

/// Runs a whole job: partitions `files`, spawns workers `1..workers_count`
/// on runtime `R`, then drives the coordinator on the current task.
///
/// `coordinator` yields the coordinator's transport once the workers are
/// spawned; `worker` builds the future run by each worker. Nothing is spawned
/// when partitioning fails.
pub async fn run_job<R, T, S, C, F, Fut>(
    files: &[String],
    workers_count: usize,
    coordinator: C,
    mut worker: F,
    signal: S,
) -> Result<JobOutcome, JobError>
where
    R: WorkerRuntime,
    T: Transport,
    S: ShutdownSignal,
    C: Future<Output = Result<T, TransportError>>,
    F: FnMut(WorkerId) -> Fut,
    Fut: Future<Output = WorkerResult> + Send + 'static,
{
    if workers_count == 0 {
        return Err(ConfigError::NoWorkers.into());
    }

    let assignment = prepare_assignment(files, workers_count)?;

    let handles: Vec<(WorkerId, R::Handle)> = (0..workers_count)
        .filter(|&id| id != COORDINATOR_ID)
        .map(|id| {
            let task = worker(id);
            (id, R::spawn(id, move || task))
        })
        .collect();

    info!(workers = workers_count, "workers started");

    // The transport is dropped before joining so that blocked workers see the disconnection
    let outcome = match coordinator.await {
        Ok(mut transport) => run_coordinator(&mut transport, assignment, &signal).await,
        Err(error) => Err(error.into()),
    };

    let mut worker_errors = Vec::new();
    for (id, handle) in handles {
        match R::join(handle).await {
            Ok(Ok(elapsed)) => debug!(worker = id, elapsed = ?elapsed, "worker joined"),
            Ok(Err(error)) => {
                warn!(worker = id, %error, "worker failed");
                worker_errors.push(error);
            }
            Err(error) => {
                warn!(worker = id, %error, "worker could not be joined");
                worker_errors.push(JobError::WorkerFailed {
                    worker: id,
                    reason: error.to_string(),
                });
            }
        }
    }

    match outcome {
        Ok(outcome) => match worker_errors.into_iter().next() {
            None => Ok(outcome),
            Some(error) => Err(error),
        },
        Err(error) => Err(root_cause(error, worker_errors)),
    }
}

/// A coordinator transport failure is usually the echo of a worker failing;
/// report the worker's own error when there is one.
fn root_cause(coordinator_error: JobError, worker_errors: Vec<JobError>) -> JobError {
    if !matches!(coordinator_error, JobError::Transport(_)) {
        return coordinator_error;
    }

    worker_errors
        .into_iter()
        .find(|error| !matches!(error, JobError::Transport(_)))
        .unwrap_or(coordinator_error)
}
