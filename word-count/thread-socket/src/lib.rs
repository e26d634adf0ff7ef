// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Word count with every worker on its own OS thread, talking to the
//! coordinator over loopback TCP connections.

pub mod socket_shutdown_signal;
pub mod socket_transport;
pub mod thread_runtime;

pub use socket_shutdown_signal::SocketShutdownSignal;
pub use socket_transport::{connect_worker, CoordinatorListener, SocketTransport};
pub use thread_runtime::ThreadRuntime;

use word_count_core::aggregation::{run_worker, JobOutcome};
use word_count_core::config::JobConfig;
use word_count_core::constants::COORDINATOR_ID;
use word_count_core::error::{JobError, TransportError};
use word_count_core::job::run_job;

/// Counts the words of `files` with `config.workers_count` threads
pub async fn run_socket_job(
    files: &[String],
    config: &JobConfig,
    signal: SocketShutdownSignal,
) -> Result<JobOutcome, JobError> {
    config.validate()?;

    let to_transport_error = |source| TransportError::Io {
        peer: COORDINATOR_ID,
        source,
    };
    let listener = CoordinatorListener::bind(config.workers_count)
        .await
        .map_err(to_transport_error)?;
    let addr = listener.local_addr().map_err(to_transport_error)?;

    let workers_count = config.workers_count;
    let worker_signal = signal.clone();

    run_job::<ThreadRuntime, _, _, _, _, _>(
        files,
        workers_count,
        listener.accept_workers(),
        |worker| {
            let signal = worker_signal.clone();
            async move {
                let mut transport = connect_worker(worker, workers_count, addr).await?;
                run_worker(&mut transport, &signal).await
            }
        },
        signal,
    )
    .await
}
