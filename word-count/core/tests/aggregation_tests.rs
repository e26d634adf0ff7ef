// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use word_count_core::{
    aggregation::{collect_execution_times, distribute_assignment, gather_shards},
    error::{JobError, TransportError},
    partition, run_coordinator, run_worker,
    word_shard_map::bucket_index,
    FileInfo, FileSection, Message, NeverShutdown, Transport, WordCount, WordShardMap, WorkerId,
    BUCKET_COUNT,
};

/// Replays scripted frames and records what was sent
struct ScriptedTransport {
    worker_id: WorkerId,
    workers_count: usize,
    inbox: HashMap<WorkerId, VecDeque<Bytes>>,
    sent: Vec<(WorkerId, Message)>,
}

impl ScriptedTransport {
    fn new(worker_id: WorkerId, workers_count: usize) -> Self {
        Self {
            worker_id,
            workers_count,
            inbox: HashMap::new(),
            sent: Vec::new(),
        }
    }

    fn script(&mut self, from: WorkerId, message: Message) {
        self.inbox
            .entry(from)
            .or_default()
            .push_back(message.encode().unwrap());
    }

    /// Scripts the bucket-major stream a worker holding `map` sends
    fn script_shards(&mut self, from: WorkerId, map: &WordShardMap) {
        for bucket in 0..map.bucket_count() {
            let records = map.bucket(bucket).to_vec();
            self.script(
                from,
                Message::BucketCount {
                    bucket: bucket as u32,
                    count: records.len() as u32,
                },
            );
            if !records.is_empty() {
                self.script(
                    from,
                    Message::WordBlock {
                        bucket: bucket as u32,
                        records,
                    },
                );
            }
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    fn workers_count(&self) -> usize {
        self.workers_count
    }

    async fn send(&mut self, to: WorkerId, frame: Bytes) -> Result<(), TransportError> {
        self.sent.push((to, Message::decode(&frame).unwrap()));
        Ok(())
    }

    async fn recv(&mut self, from: WorkerId) -> Result<Bytes, TransportError> {
        self.inbox
            .get_mut(&from)
            .and_then(VecDeque::pop_front)
            .ok_or(TransportError::Disconnected { peer: from })
    }
}

fn word_in_bucket(bucket: usize) -> String {
    (0..)
        .map(|index| format!("w{index}"))
        .find(|word| bucket_index(word, BUCKET_COUNT) == bucket)
        .unwrap()
}

fn map_of(words: &[(&str, u64)]) -> WordShardMap {
    let mut map = WordShardMap::new();
    for (word, count) in words {
        map.update_with_count(word, *count).unwrap();
    }
    map
}

fn assert_violation(result: Result<WordShardMap, JobError>, worker: WorkerId) {
    match result {
        Err(JobError::Transport(TransportError::ProtocolViolation { peer, .. })) => {
            assert_eq!(peer, worker)
        }
        other => panic!("expected a protocol violation, got {other:?}"),
    }
}

// ============================================================
// Gathering
// ============================================================

#[tokio::test]
async fn test_gather_folds_local_and_remote_shards() {
    let local = map_of(&[("aa", 1), ("bb", 2)]);
    let mut transport = ScriptedTransport::new(0, 3);
    transport.script_shards(1, &map_of(&[("aa", 2), ("zz", 1)]));
    transport.script_shards(2, &WordShardMap::new());

    let words = gather_shards(&mut transport, &local, &NeverShutdown)
        .await
        .unwrap();

    assert_eq!(words, map_of(&[("aa", 3), ("bb", 2), ("zz", 1)]));
    assert!(transport.sent.is_empty());
}

#[tokio::test]
async fn test_gather_rejects_out_of_order_bucket() {
    let mut transport = ScriptedTransport::new(0, 2);
    transport.script(1, Message::BucketCount { bucket: 1, count: 0 });

    let result = gather_shards(&mut transport, &WordShardMap::new(), &NeverShutdown).await;
    assert_violation(result, 1);
}

#[tokio::test]
async fn test_gather_rejects_record_count_mismatch() {
    let word = word_in_bucket(0);
    let mut transport = ScriptedTransport::new(0, 2);
    transport.script(1, Message::BucketCount { bucket: 0, count: 2 });
    transport.script(
        1,
        Message::WordBlock {
            bucket: 0,
            records: vec![WordCount::new(word, 1)],
        },
    );

    let result = gather_shards(&mut transport, &WordShardMap::new(), &NeverShutdown).await;
    assert_violation(result, 1);
}

#[tokio::test]
async fn test_gather_rejects_word_from_another_bucket() {
    // "a" hashes to bucket 96
    let mut transport = ScriptedTransport::new(0, 2);
    transport.script(1, Message::BucketCount { bucket: 0, count: 1 });
    transport.script(
        1,
        Message::WordBlock {
            bucket: 0,
            records: vec![WordCount::new("a", 1)],
        },
    );

    let result = gather_shards(&mut transport, &WordShardMap::new(), &NeverShutdown).await;
    assert_violation(result, 1);
}

#[tokio::test]
async fn test_gather_reports_disconnected_worker() {
    let mut transport = ScriptedTransport::new(0, 2);

    let result = gather_shards(&mut transport, &WordShardMap::new(), &NeverShutdown).await;
    assert!(matches!(
        result,
        Err(JobError::Transport(TransportError::Disconnected { peer: 1 }))
    ));
}

// ============================================================
// Distribution and timing
// ============================================================

#[tokio::test]
async fn test_distribute_sends_every_worker_its_sections() {
    let assignment = partition(3, &[FileInfo::new("f", 9)]).unwrap();
    let mut transport = ScriptedTransport::new(0, 3);

    let own = distribute_assignment(&mut transport, &assignment).await.unwrap();

    assert_eq!(own, vec![FileSection::new("f", 0, 3)]);
    assert_eq!(
        transport.sent,
        vec![
            (1, Message::Assignment(vec![FileSection::new("f", 3, 6)])),
            (2, Message::Assignment(vec![FileSection::new("f", 6, 9)])),
        ]
    );
}

#[tokio::test]
async fn test_execution_times_are_indexed_by_worker() {
    let mut transport = ScriptedTransport::new(0, 3);
    transport.script(1, Message::ElapsedTime(Duration::from_millis(20)));
    transport.script(2, Message::ElapsedTime(Duration::from_millis(5)));

    let times = collect_execution_times(&mut transport, Duration::from_millis(10))
        .await
        .unwrap();

    assert_eq!(times.len(), 3);
    assert_eq!(times.get(0), Some(Duration::from_millis(10)));
    assert_eq!(times.get(1), Some(Duration::from_millis(20)));
    assert_eq!(times.get(2), Some(Duration::from_millis(5)));
    assert_eq!(times.max(), Duration::from_millis(20));
}

#[tokio::test]
async fn test_execution_time_must_follow_shards() {
    let mut transport = ScriptedTransport::new(0, 2);
    transport.script(1, Message::BucketCount { bucket: 0, count: 0 });

    let result = collect_execution_times(&mut transport, Duration::ZERO).await;
    assert!(matches!(
        result,
        Err(TransportError::ProtocolViolation { peer: 1, .. })
    ));
}

// ============================================================
// Roles
// ============================================================

#[tokio::test]
async fn test_coordinator_must_be_worker_zero() {
    let assignment = partition(2, &[FileInfo::new("f", 4)]).unwrap();
    let mut transport = ScriptedTransport::new(1, 2);

    let result = run_coordinator(&mut transport, assignment, &NeverShutdown).await;
    assert!(matches!(result, Err(JobError::RoleMismatch { worker: 1, .. })));
}

#[tokio::test]
async fn test_coordinator_checks_worker_count() {
    let assignment = partition(3, &[FileInfo::new("f", 4)]).unwrap();
    let mut transport = ScriptedTransport::new(0, 2);

    let result = run_coordinator(&mut transport, assignment, &NeverShutdown).await;
    assert!(matches!(
        result,
        Err(JobError::WorkersMismatch {
            assigned: 3,
            connected: 2
        })
    ));
    assert!(transport.sent.is_empty());
}

#[tokio::test]
async fn test_worker_zero_cannot_run_as_worker() {
    let mut transport = ScriptedTransport::new(0, 2);
    let result = run_worker(&mut transport, &NeverShutdown).await;
    assert!(matches!(result, Err(JobError::RoleMismatch { worker: 0, .. })));
}

// ============================================================
// Full worker and coordinator runs
// ============================================================

#[tokio::test]
async fn test_worker_counts_and_streams_its_shards() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.txt");
    std::fs::write(&path, "aa bb aa cc bb aa").unwrap();
    let name = path.to_string_lossy().into_owned();

    let mut transport = ScriptedTransport::new(1, 2);
    transport.script(0, Message::Assignment(vec![FileSection::new(name, 0, 17)]));

    run_worker(&mut transport, &NeverShutdown).await.unwrap();

    assert!(transport.sent.iter().all(|(to, _)| *to == 0));
    assert!(matches!(
        transport.sent.last(),
        Some((0, Message::ElapsedTime(_)))
    ));

    let counts: Vec<u32> = transport
        .sent
        .iter()
        .filter_map(|(_, message)| match message {
            Message::BucketCount { count, .. } => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(counts.len(), BUCKET_COUNT);

    let mut received = WordShardMap::new();
    for (_, message) in &transport.sent {
        if let Message::WordBlock { records, .. } = message {
            received.merge_bucket(records).unwrap();
        }
    }
    assert_eq!(received, map_of(&[("aa", 3), ("bb", 2), ("cc", 1)]));
}

#[tokio::test]
async fn test_coordinator_runs_a_two_worker_job() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.txt");
    std::fs::write(&path, "hello world ").unwrap();
    let name = path.to_string_lossy().into_owned();

    let assignment = partition(2, &[FileInfo::new(name, 12)]).unwrap();
    let mut transport = ScriptedTransport::new(0, 2);
    // Worker 1 counts "world" in the second half
    transport.script_shards(1, &map_of(&[("world", 1)]));
    transport.script(1, Message::ElapsedTime(Duration::from_millis(1)));

    let outcome = run_coordinator(&mut transport, assignment.clone(), &NeverShutdown)
        .await
        .unwrap();

    assert_eq!(outcome.assignment, assignment);
    assert_eq!(outcome.words, map_of(&[("hello", 1), ("world", 1)]));
    assert_eq!(outcome.execution_times.len(), 2);
    assert_eq!(
        outcome.execution_times.get(1),
        Some(Duration::from_millis(1))
    );
    assert_eq!(transport.sent.len(), 1);
}
