// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use bytes::Bytes;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use word_count_core::{
    count_section,
    error::{CounterError, JobError, PartitionError, TransportError, WordMapError},
    FileSection, JobConfig, JobOutcome, NeverShutdown, Transport, WordShardMap,
};
use word_count_task_channels::{channel_star, run_channel_job, ChannelShutdownSignal};

fn write_file(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn config(workers_count: usize, logs_dir: &Path) -> JobConfig {
    JobConfig {
        workers_count,
        logs_dir: logs_dir.to_path_buf(),
        print_results: false,
        channel_capacity: 4,
    }
}

async fn run(files: &[String], workers_count: usize, dir: &TempDir) -> Result<JobOutcome, JobError> {
    let config = config(workers_count, dir.path());
    run_channel_job(files, &config, ChannelShutdownSignal::default()).await
}

/// Counts every file in a single pass, without any partitioning
fn sequential_count(files: &[String]) -> WordShardMap {
    let mut map = WordShardMap::new();
    for file in files {
        let size = fs::metadata(file).unwrap().len();
        let section = FileSection::new(file.clone(), 0, size);
        count_section(&section, &mut map, &NeverShutdown).unwrap();
    }
    map
}

// ============================================================
// Channel star
// ============================================================

#[tokio::test]
async fn test_star_links_coordinator_and_workers() {
    let mut transports = channel_star(3, 2);
    assert_eq!(transports.len(), 3);

    let mut worker = transports.pop().unwrap();
    let mut coordinator = transports.remove(0);
    assert_eq!(worker.worker_id(), 2);
    assert_eq!(coordinator.workers_count(), 3);

    coordinator.send(2, Bytes::from_static(b"down")).await.unwrap();
    worker.send(0, Bytes::from_static(b"up")).await.unwrap();

    assert_eq!(worker.recv(0).await.unwrap(), Bytes::from_static(b"down"));
    assert_eq!(coordinator.recv(2).await.unwrap(), Bytes::from_static(b"up"));
}

#[tokio::test]
async fn test_workers_are_not_linked_to_each_other() {
    let mut transports = channel_star(3, 2);

    let result = transports[1].send(2, Bytes::new()).await;
    assert!(matches!(result, Err(TransportError::NoRoute { from: 1, to: 2 })));

    let result = transports[1].recv(2).await;
    assert!(matches!(result, Err(TransportError::NoRoute { from: 1, to: 2 })));
}

#[tokio::test]
async fn test_dropped_peer_is_reported() {
    let mut transports = channel_star(2, 2);
    let worker = transports.pop().unwrap();
    drop(worker);

    let mut coordinator = transports.pop().unwrap();
    assert!(matches!(
        coordinator.recv(1).await,
        Err(TransportError::Disconnected { peer: 1 })
    ));
    assert!(matches!(
        coordinator.send(1, Bytes::new()).await,
        Err(TransportError::Disconnected { peer: 1 })
    ));
}

// ============================================================
// Whole jobs
// ============================================================

#[tokio::test]
async fn test_counts_are_independent_of_worker_count() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![write_file(&dir, "input.txt", "aa bb aa cc bb aa")];

    for workers in 1..=6 {
        let outcome = run(&files, workers, &dir)
            .await
            .unwrap();

        assert_eq!(outcome.words.get("aa"), Some(3), "{workers} workers");
        assert_eq!(outcome.words.get("bb"), Some(2), "{workers} workers");
        assert_eq!(outcome.words.get("cc"), Some(1), "{workers} workers");
        assert_eq!(outcome.words.total_count(), 6, "{workers} workers");
        assert_eq!(outcome.execution_times.len(), workers);
        assert_eq!(outcome.assignment.workers_count(), workers);
    }
}

#[tokio::test]
async fn test_many_files_match_sequential_count() {
    let dir = tempfile::tempdir().unwrap();
    let line = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed DO eiusmod 2024\n";
    let files = vec![
        write_file(&dir, "one.txt", &line.repeat(300)),
        write_file(&dir, "empty.txt", ""),
        write_file(&dir, "two.txt", &line.repeat(17)),
        write_file(&dir, "three.txt", "tail words without newline"),
    ];
    let expected = sequential_count(&files);

    for workers in [2, 5, 16] {
        let outcome = run(&files, workers, &dir)
            .await
            .unwrap();
        assert_eq!(outcome.words, expected, "{workers} workers");
    }
}

#[tokio::test]
async fn test_only_empty_files() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![write_file(&dir, "empty.txt", "")];

    let outcome = run(&files, 3, &dir)
        .await
        .unwrap();

    assert!(outcome.words.is_empty());
    assert_eq!(outcome.assignment.total_size(), 0);
}

#[tokio::test]
async fn test_unreadable_file_fails_before_counting() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        write_file(&dir, "present.txt", "some words"),
        dir.path().join("missing.txt").to_string_lossy().into_owned(),
    ];

    let result = run(&files, 3, &dir).await;
    assert!(matches!(
        result,
        Err(JobError::Partition(PartitionError::FileUnreadable { .. }))
    ));
}

#[tokio::test]
async fn test_worker_failure_is_the_reported_cause() {
    let dir = tempfile::tempdir().unwrap();
    // The over-long word lies in worker 1's half
    let contents = format!("{}{}\n", "ok ".repeat(100), "x".repeat(100));
    let files = vec![write_file(&dir, "long.txt", &contents)];

    let result = run(&files, 2, &dir).await;
    assert!(matches!(
        result,
        Err(JobError::Counter(CounterError::Word(WordMapError::WordTooLong { .. })))
    ));
}

#[tokio::test]
async fn test_cancelled_job_stops() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![write_file(&dir, "input.txt", &"word ".repeat(1_000))];
    let signal = ChannelShutdownSignal::default();
    signal.token().cancel();

    let result = run_channel_job(&files, &config(2, dir.path()), signal).await;
    assert!(matches!(result, Err(JobError::Cancelled)));
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![write_file(&dir, "input.txt", "a")];

    let result = run(&files, 0, &dir).await;
    assert!(matches!(result, Err(JobError::Config(_))));
}
