// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Word count with every worker running as a tokio task of one process,
//! exchanging frames over bounded mpsc channels.

pub mod channel_shutdown_signal;
pub mod channel_transport;
pub mod tokio_runtime;

pub use channel_shutdown_signal::ChannelShutdownSignal;
pub use channel_transport::{channel_star, ChannelTransport};
pub use tokio_runtime::TokioRuntime;

use word_count_core::aggregation::{run_worker, JobOutcome};
use word_count_core::config::JobConfig;
use word_count_core::constants::COORDINATOR_ID;
use word_count_core::error::{ConfigError, JobError, TransportError};
use word_count_core::job::run_job;

/// Counts the words of `files` with `config.workers_count` tasks
pub async fn run_channel_job(
    files: &[String],
    config: &JobConfig,
    signal: ChannelShutdownSignal,
) -> Result<JobOutcome, JobError> {
    config.validate()?;

    let mut transports: Vec<Option<ChannelTransport>> =
        channel_star(config.workers_count, config.channel_capacity)
            .into_iter()
            .map(Some)
            .collect();

    let coordinator = transports
        .get_mut(COORDINATOR_ID)
        .and_then(Option::take)
        .ok_or(ConfigError::NoWorkers)?;

    let worker_signal = signal.clone();
    run_job::<TokioRuntime, _, _, _, _, _>(
        files,
        config.workers_count,
        async move { Ok::<_, TransportError>(coordinator) },
        |worker| {
            let transport = transports.get_mut(worker).and_then(Option::take);
            let signal = worker_signal.clone();
            async move {
                let mut transport = transport.ok_or_else(|| JobError::WorkerFailed {
                    worker,
                    reason: "no channel transport for this worker".to_string(),
                })?;
                run_worker(&mut transport, &signal).await
            }
        },
        signal,
    )
    .await
}
