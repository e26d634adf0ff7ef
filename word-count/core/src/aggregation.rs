// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Coordinator and worker sides of a word-count job.
//!
//! 1. The coordinator sends every other worker its sections.
//! 2. Every worker counts its sections into a private map.
//! 3. Bucket by bucket, every worker sends the record count of the bucket and,
//!    when non-empty, the records. The coordinator folds its own bucket then
//!    each worker's in turn, so it only ever holds one incoming bucket.
//! 4. Every worker reports how long steps 2 and 3 took.

use crate::constants::{WorkerId, COORDINATOR_ID};
use crate::error::{CounterError, JobError, TransportError, WireError};
use crate::file_section::FileSection;
use crate::section_counter::count_section;
use crate::section_partitioner::{describe_files, partition, WorkAssignment};
use crate::shutdown_signal::ShutdownSignal;
use crate::transport::{recv_message, send_message, unexpected, Transport};
use crate::wire::Message;
use crate::word_shard_map::WordShardMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Elapsed counting and gathering time of every worker, indexed by worker id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionTimes(Vec<Duration>);

impl ExecutionTimes {
    pub fn new(times: Vec<Duration>) -> Self {
        Self(times)
    }

    pub fn get(&self, worker: WorkerId) -> Option<Duration> {
        self.0.get(worker).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerId, Duration)> + '_ {
        self.0.iter().copied().enumerate()
    }

    /// Time of the slowest worker
    pub fn max(&self) -> Duration {
        self.0.iter().copied().max().unwrap_or_default()
    }
}

/// Everything the coordinator knows once a job has completed
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub assignment: WorkAssignment,
    pub words: WordShardMap,
    pub execution_times: ExecutionTimes,
}

/// Ids of every worker but the coordinator
fn peers(workers_count: usize) -> impl Iterator<Item = WorkerId> {
    (0..workers_count).filter(|&worker| worker != COORDINATOR_ID)
}

/// Stats the input files and partitions them across `workers_count` workers.
/// Runs on the coordinator before anything is distributed.
pub fn prepare_assignment(
    files: &[String],
    workers_count: usize,
) -> Result<WorkAssignment, JobError> {
    let infos = describe_files(files)?;
    let assignment = partition(workers_count, &infos)?;

    info!(
        files = infos.len(),
        bytes = assignment.total_size(),
        workers = workers_count,
        "input partitioned"
    );

    Ok(assignment)
}

/// Runs the coordinator side of the job on worker [`COORDINATOR_ID`]
pub async fn run_coordinator<T, S>(
    transport: &mut T,
    assignment: WorkAssignment,
    signal: &S,
) -> Result<JobOutcome, JobError>
where
    T: Transport + ?Sized,
    S: ShutdownSignal,
{
    if transport.worker_id() != COORDINATOR_ID {
        return Err(JobError::RoleMismatch {
            worker: transport.worker_id(),
            expected: "worker",
        });
    }

    if assignment.workers_count() != transport.workers_count() {
        return Err(JobError::WorkersMismatch {
            assigned: assignment.workers_count(),
            connected: transport.workers_count(),
        });
    }

    let own_sections = distribute_assignment(transport, &assignment).await?;

    let started = Instant::now();
    let local = count_sections(COORDINATOR_ID, own_sections, signal.clone()).await?;
    let words = gather_shards(transport, &local, signal).await?;
    let elapsed = started.elapsed();

    let execution_times = collect_execution_times(transport, elapsed).await?;

    info!(
        words = words.total_count(),
        distinct = words.len(),
        "all shards gathered"
    );

    Ok(JobOutcome {
        assignment,
        words,
        execution_times,
    })
}

/// Runs the worker side of the job. Returns the time spent counting and sending shards.
pub async fn run_worker<T, S>(transport: &mut T, signal: &S) -> Result<Duration, JobError>
where
    T: Transport + ?Sized,
    S: ShutdownSignal,
{
    let worker = transport.worker_id();
    if worker == COORDINATOR_ID {
        return Err(JobError::RoleMismatch {
            worker,
            expected: "coordinator",
        });
    }

    let sections = receive_assignment(transport).await?;

    let started = Instant::now();
    let local = count_sections(worker, sections, signal.clone()).await?;
    send_shards(transport, &local, signal).await?;
    let elapsed = started.elapsed();

    send_message(transport, COORDINATOR_ID, &Message::ElapsedTime(elapsed)).await?;

    debug!(worker, elapsed = ?elapsed, "worker finished");
    Ok(elapsed)
}

/// Sends every worker its sections and returns the coordinator's own share
pub async fn distribute_assignment<T: Transport + ?Sized>(
    transport: &mut T,
    assignment: &WorkAssignment,
) -> Result<Vec<FileSection>, TransportError> {
    for worker in peers(assignment.workers_count()) {
        let sections = assignment.sections_for(worker).to_vec();
        debug!(worker, sections = sections.len(), "sending assignment");
        send_message(transport, worker, &Message::Assignment(sections)).await?;
    }

    Ok(assignment.sections_for(COORDINATOR_ID).to_vec())
}

pub async fn receive_assignment<T: Transport + ?Sized>(
    transport: &mut T,
) -> Result<Vec<FileSection>, TransportError> {
    match recv_message(transport, COORDINATOR_ID).await? {
        Message::Assignment(sections) => Ok(sections),
        other => Err(unexpected(COORDINATOR_ID, "Assignment", &other)),
    }
}

/// Counts `sections` in order into a fresh map on the blocking thread pool
pub async fn count_sections<S: ShutdownSignal>(
    worker: WorkerId,
    sections: Vec<FileSection>,
    signal: S,
) -> Result<WordShardMap, JobError> {
    info!(worker, sections = sections.len(), "counting assigned sections");

    let map = tokio::task::spawn_blocking(move || {
        let mut map = WordShardMap::new();
        for section in &sections {
            if signal.is_cancelled() {
                return Err(CounterError::Cancelled);
            }
            count_section(section, &mut map, &signal)?;
        }
        Ok(map)
    })
    .await
    .map_err(|error| JobError::WorkerFailed {
        worker,
        reason: error.to_string(),
    })??;

    debug!(worker, words = map.total_count(), "sections counted");
    Ok(map)
}

/// Streams `map` to the coordinator in bucket order
pub async fn send_shards<T, S>(
    transport: &mut T,
    map: &WordShardMap,
    signal: &S,
) -> Result<(), JobError>
where
    T: Transport + ?Sized,
    S: ShutdownSignal,
{
    let worker = transport.worker_id();

    for bucket in 0..map.bucket_count() {
        if signal.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let records = map.bucket(bucket);
        let bucket = wire_u32(worker, bucket)?;
        let count = wire_u32(worker, records.len())?;

        send_message(transport, COORDINATOR_ID, &Message::BucketCount { bucket, count }).await?;

        if count > 0 {
            let block = Message::WordBlock {
                bucket,
                records: records.to_vec(),
            };
            send_message(transport, COORDINATOR_ID, &block).await?;
        }
    }

    Ok(())
}

/// Folds the coordinator's `local` map and every worker's shards into one map,
/// bucket-major: for each bucket, local records first then workers by id.
pub async fn gather_shards<T, S>(
    transport: &mut T,
    local: &WordShardMap,
    signal: &S,
) -> Result<WordShardMap, JobError>
where
    T: Transport + ?Sized,
    S: ShutdownSignal,
{
    let mut words = WordShardMap::with_bucket_count(local.bucket_count())?;
    let workers_count = transport.workers_count();

    for bucket in 0..local.bucket_count() {
        if signal.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        words.merge_bucket(local.bucket(bucket))?;

        for worker in peers(workers_count) {
            let count = match recv_message(transport, worker).await? {
                Message::BucketCount { bucket: b, count } if b as usize == bucket => count,
                other => {
                    let expected = format!("BucketCount for bucket {bucket}");
                    return Err(unexpected(worker, &expected, &other).into());
                }
            };

            if count == 0 {
                continue;
            }

            let records = match recv_message(transport, worker).await? {
                Message::WordBlock { bucket: b, records }
                    if b as usize == bucket && records.len() == count as usize =>
                {
                    records
                }
                other => {
                    let expected = format!("WordBlock of {count} records for bucket {bucket}");
                    return Err(unexpected(worker, &expected, &other).into());
                }
            };

            // Both sides must agree on the bucket function or counts get corrupted
            if let Some(stray) = records.iter().find(|r| words.bucket_of(&r.word) != bucket) {
                return Err(TransportError::ProtocolViolation {
                    peer: worker,
                    expected: format!("words of bucket {bucket}"),
                    actual: format!("{:?} from bucket {}", stray.word, words.bucket_of(&stray.word)),
                }
                .into());
            }

            words.merge_bucket(&records)?;
        }

        debug!(bucket, "bucket gathered");
    }

    Ok(words)
}

/// Collects every worker's elapsed time next to the coordinator's own
pub async fn collect_execution_times<T: Transport + ?Sized>(
    transport: &mut T,
    own: Duration,
) -> Result<ExecutionTimes, TransportError> {
    let workers_count = transport.workers_count();
    let mut times = vec![Duration::ZERO; workers_count];
    times[COORDINATOR_ID] = own;

    for worker in peers(workers_count) {
        match recv_message(transport, worker).await? {
            Message::ElapsedTime(elapsed) => times[worker] = elapsed,
            other => return Err(unexpected(worker, "ElapsedTime", &other)),
        }
    }

    Ok(ExecutionTimes::new(times))
}

fn wire_u32(worker: WorkerId, value: usize) -> Result<u32, TransportError> {
    u32::try_from(value).map_err(|_| TransportError::Malformed {
        peer: worker,
        source: WireError::Overflow(value as u128),
    })
}
