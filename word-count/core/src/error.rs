// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::constants::WorkerId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Bad usage or unreadable inputs, reported before any work starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to access the directory {}: {source}", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to read the index file {}: {source}", .path.display())]
    IndexFileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("the following file's name is too long: {0}")]
    FileNameTooLong(String),

    #[error("too many input files: {count} given, at most {max} supported")]
    TooManyFiles { count: usize, max: usize },

    #[error("no input files were given")]
    NoInputFiles,

    #[error("the number of workers must be at least 1")]
    NoWorkers,

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),

    #[error("unable to read the configuration file {}: {source}", .path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed configuration file {}: {source}", .path.display())]
    ConfigMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("the file {path} could not be opened: {source}")]
    FileUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("the file name {0} is too long to be assigned")]
    NameTooLong(String),

    #[error("at least one worker is required to partition the input")]
    NoWorkers,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordMapError {
    #[error("the word {word} is too long and can't be added to the map")]
    WordTooLong { word: String },

    #[error("invalid bucket count {0}: expected a value between 1 and 256")]
    InvalidBucketCount(usize),

    #[error("cannot merge a map of {actual} buckets into one of {expected} buckets")]
    BucketCountMismatch { expected: usize, actual: usize },
}

/// Violations of the fixed-layout frame format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("frame truncated: {needed} more bytes expected")]
    Truncated { needed: usize },

    #[error("unsupported wire version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown message kind {0}")]
    UnknownKind(u8),

    #[error("{0} trailing bytes after the message")]
    TrailingBytes(usize),

    #[error("a {len} byte string does not fit a {width} byte field")]
    FieldTooLong { len: usize, width: usize },

    #[error("string field is not zero terminated")]
    Unterminated,

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid section range {start}..{end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("invalid record: {0}")]
    InvalidRecord(&'static str),

    #[error("value {0} does not fit its wire field")]
    Overflow(u128),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no route from worker {from} to worker {to}")]
    NoRoute { from: WorkerId, to: WorkerId },

    #[error("worker {peer} disconnected")]
    Disconnected { peer: WorkerId },

    #[error("transport I/O with worker {peer} failed: {source}")]
    Io {
        peer: WorkerId,
        #[source]
        source: io::Error,
    },

    #[error("malformed frame from worker {peer}: {source}")]
    Malformed {
        peer: WorkerId,
        #[source]
        source: WireError,
    },

    #[error("unexpected message from worker {peer}: expected {expected}, got {actual}")]
    ProtocolViolation {
        peer: WorkerId,
        expected: String,
        actual: String,
    },
}

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("the file {path} could not be opened: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("reading the file {path} failed: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("the starting index {start} must not exceed the ending one {end}")]
    InvertedRange { start: u64, end: u64 },

    #[error(transparent)]
    Word(#[from] WordMapError),

    #[error("counting was cancelled")]
    Cancelled,
}

/// Every failure that terminates a job
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Counter(CounterError),

    #[error(transparent)]
    WordMap(#[from] WordMapError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("worker {worker} must run as the {expected}")]
    RoleMismatch {
        worker: WorkerId,
        expected: &'static str,
    },

    #[error("the input was partitioned for {assigned} workers but {connected} are connected")]
    WorkersMismatch { assigned: usize, connected: usize },

    #[error("worker {worker} failed: {reason}")]
    WorkerFailed { worker: WorkerId, reason: String },

    #[error("unable to start a worker runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("unable to write the execution report: {0}")]
    Report(#[source] io::Error),

    #[error("the job was cancelled")]
    Cancelled,
}

impl From<CounterError> for JobError {
    fn from(error: CounterError) -> Self {
        match error {
            CounterError::Cancelled => JobError::Cancelled,
            other => JobError::Counter(other),
        }
    }
}
