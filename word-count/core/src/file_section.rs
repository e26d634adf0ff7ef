// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::constants::FILE_NAME_MAX_LENGTH;
use crate::error::PartitionError;
use std::fs::File;

/// Binds a file name to the file's size in bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Opens the file to make sure it is readable and records its size
    pub fn stat(name: &str) -> Result<Self, PartitionError> {
        if name.len() >= FILE_NAME_MAX_LENGTH {
            return Err(PartitionError::NameTooLong(name.to_string()));
        }

        let metadata = File::open(name)
            .and_then(|file| file.metadata())
            .map_err(|source| PartitionError::FileUnreadable {
                path: name.to_string(),
                source,
            })?;

        Ok(Self::new(name, metadata.len()))
    }
}

/// Half-open byte range `[start, end)` of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    pub file_name: String,
    pub start: u64,
    pub end: u64,
}

impl FileSection {
    pub fn new(file_name: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            file_name: file_name.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
