// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::constants::{WorkerId, FILE_NAME_MAX_LENGTH};
use crate::error::PartitionError;
use crate::file_section::{FileInfo, FileSection};

/// Sections assigned to every worker, indexed by worker id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkAssignment {
    sections: Vec<Vec<FileSection>>,
    total_size: u64,
}

impl WorkAssignment {
    pub fn workers_count(&self) -> usize {
        self.sections.len()
    }

    /// Combined size of every partitioned file
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Sections of one worker, in file then offset order.
    /// Unknown workers have no sections.
    pub fn sections_for(&self, worker: WorkerId) -> &[FileSection] {
        self.sections
            .get(worker)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn assigned_bytes(&self, worker: WorkerId) -> u64 {
        self.sections_for(worker).iter().map(FileSection::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerId, &[FileSection])> + '_ {
        self.sections
            .iter()
            .enumerate()
            .map(|(worker, sections)| (worker, sections.as_slice()))
    }
}

/// Stats every named file, failing on the first unreadable one
pub fn describe_files(names: &[String]) -> Result<Vec<FileInfo>, PartitionError> {
    names.iter().map(|name| FileInfo::stat(name)).collect()
}

/// Splits `files` into contiguous sections so that every worker gets the same
/// number of bytes, give or take one.
///
/// With `total` bytes and `n` workers, the first `total % n` workers receive
/// `total / n + 1` bytes and the others `total / n`. Files are walked in order
/// and a worker keeps filling across file boundaries until its share is
/// reached, so a file can be split among several workers and a worker can own
/// sections of several files. Cuts ignore word boundaries.
pub fn partition(
    workers_count: usize,
    files: &[FileInfo],
) -> Result<WorkAssignment, PartitionError> {
    if workers_count == 0 {
        return Err(PartitionError::NoWorkers);
    }

    if let Some(file) = files
        .iter()
        .find(|file| file.name.len() >= FILE_NAME_MAX_LENGTH)
    {
        return Err(PartitionError::NameTooLong(file.name.clone()));
    }

    let total_size: u64 = files.iter().map(|file| file.size).sum();
    let base = total_size / workers_count as u64;
    let remainder = total_size % workers_count as u64;
    let share = |worker: WorkerId| base + u64::from((worker as u64) < remainder);

    let mut sections = vec![Vec::new(); workers_count];
    let mut worker = 0;
    let mut filled = 0;

    for file in files {
        let mut offset = 0;

        while offset < file.size {
            // Bytes are left, so some later worker still has room
            while filled >= share(worker) {
                worker += 1;
                filled = 0;
            }

            let cut = (offset + share(worker) - filled).min(file.size);
            sections[worker].push(FileSection::new(file.name.clone(), offset, cut));

            filled += cut - offset;
            offset = cut;
        }
    }

    Ok(WorkAssignment {
        sections,
        total_size,
    })
}
