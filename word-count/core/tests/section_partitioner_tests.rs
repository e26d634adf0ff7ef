// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::Write;
use word_count_core::{
    describe_files, error::PartitionError, partition, FileInfo, FileSection, WorkAssignment,
};

fn section(name: &str, start: u64, end: u64) -> FileSection {
    FileSection::new(name, start, end)
}

/// Every file is covered by contiguous sections, in worker order
fn assert_covers(assignment: &WorkAssignment, files: &[FileInfo]) {
    for file in files {
        let mut next = 0;
        for (_, sections) in assignment.iter() {
            for section in sections.iter().filter(|s| s.file_name == file.name) {
                assert_eq!(section.start, next, "gap or overlap in {}", file.name);
                assert!(section.end > section.start, "empty section emitted");
                next = section.end;
            }
        }
        assert_eq!(next, file.size, "{} not fully covered", file.name);
    }
}

fn assert_balanced(assignment: &WorkAssignment) {
    let bytes: Vec<u64> = (0..assignment.workers_count())
        .map(|worker| assignment.assigned_bytes(worker))
        .collect();
    let min = bytes.iter().min().copied().unwrap_or(0);
    let max = bytes.iter().max().copied().unwrap_or(0);

    assert!(max - min <= 1, "unbalanced shares {bytes:?}");
    assert_eq!(bytes.iter().sum::<u64>(), assignment.total_size());
    // Larger shares come first
    assert!(bytes.windows(2).all(|pair| pair[0] >= pair[1]));
}

// ============================================================
// Share computation
// ============================================================

#[test]
fn test_single_worker_takes_everything() {
    let files = vec![FileInfo::new("a", 10), FileInfo::new("b", 3)];
    let assignment = partition(1, &files).unwrap();

    assert_eq!(assignment.workers_count(), 1);
    assert_eq!(assignment.total_size(), 13);
    assert_eq!(
        assignment.sections_for(0),
        &[section("a", 0, 10), section("b", 0, 3)]
    );
}

#[test]
fn test_sections_cross_file_boundaries() {
    let files = vec![FileInfo::new("a", 10), FileInfo::new("b", 5)];
    let assignment = partition(4, &files).unwrap();

    // 15 bytes over 4 workers: 4, 4, 4, 3
    assert_eq!(assignment.sections_for(0), &[section("a", 0, 4)]);
    assert_eq!(assignment.sections_for(1), &[section("a", 4, 8)]);
    assert_eq!(
        assignment.sections_for(2),
        &[section("a", 8, 10), section("b", 0, 2)]
    );
    assert_eq!(assignment.sections_for(3), &[section("b", 2, 5)]);

    assert_covers(&assignment, &files);
    assert_balanced(&assignment);
}

#[test]
fn test_more_workers_than_bytes() {
    let files = vec![FileInfo::new("tiny", 3)];
    let assignment = partition(5, &files).unwrap();

    assert_eq!(assignment.sections_for(0), &[section("tiny", 0, 1)]);
    assert_eq!(assignment.sections_for(1), &[section("tiny", 1, 2)]);
    assert_eq!(assignment.sections_for(2), &[section("tiny", 2, 3)]);
    assert!(assignment.sections_for(3).is_empty());
    assert!(assignment.sections_for(4).is_empty());
}

#[test]
fn test_empty_files_produce_no_sections() {
    let files = vec![
        FileInfo::new("empty", 0),
        FileInfo::new("data", 4),
        FileInfo::new("also-empty", 0),
    ];
    let assignment = partition(2, &files).unwrap();

    assert_eq!(assignment.sections_for(0), &[section("data", 0, 2)]);
    assert_eq!(assignment.sections_for(1), &[section("data", 2, 4)]);
}

#[test]
fn test_no_bytes_at_all() {
    let files = vec![FileInfo::new("empty", 0)];
    let assignment = partition(3, &files).unwrap();

    assert_eq!(assignment.total_size(), 0);
    assert!(assignment.iter().all(|(_, sections)| sections.is_empty()));
}

#[test]
fn test_unknown_worker_has_no_sections() {
    let assignment = partition(2, &[FileInfo::new("a", 8)]).unwrap();
    assert!(assignment.sections_for(7).is_empty());
    assert_eq!(assignment.assigned_bytes(7), 0);
}

#[test]
fn test_random_inputs_are_covered_and_balanced() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let files: Vec<FileInfo> = (0..rng.random_range(1..8))
            .map(|index| FileInfo::new(format!("file-{index}"), rng.random_range(0..5_000)))
            .collect();
        let workers = rng.random_range(1..17);

        let assignment = partition(workers, &files).unwrap();

        assert_eq!(assignment.workers_count(), workers);
        assert_covers(&assignment, &files);
        assert_balanced(&assignment);
    }
}

// ============================================================
// Rejections
// ============================================================

#[test]
fn test_zero_workers_is_rejected() {
    assert!(matches!(
        partition(0, &[FileInfo::new("a", 1)]),
        Err(PartitionError::NoWorkers)
    ));
}

#[test]
fn test_long_file_name_is_rejected() {
    let name = "n".repeat(64);
    assert!(matches!(
        partition(2, &[FileInfo::new(name.clone(), 1)]),
        Err(PartitionError::NameTooLong(rejected)) if rejected == name
    ));
}

#[test]
fn test_describe_files_reads_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.txt");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"one two three")
        .unwrap();
    let name = path.to_string_lossy().into_owned();

    let infos = describe_files(&[name.clone()]).unwrap();
    assert_eq!(infos, vec![FileInfo::new(name, 13)]);
}

#[test]
fn test_describe_files_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt").to_string_lossy().into_owned();

    assert!(matches!(
        describe_files(&[missing.clone()]),
        Err(PartitionError::FileUnreadable { path, .. }) if path == missing
    ));
}
