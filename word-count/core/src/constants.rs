// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Identifies a worker inside one job, `0..workers_count`
pub type WorkerId = usize;

/// The worker that partitions the input and gathers the results
pub const COORDINATOR_ID: WorkerId = 0;

/// Number of buckets in every map exchanged by the protocol.
/// Every process of a job must agree on this value.
pub const BUCKET_COUNT: usize = 128;

/// Words must be strictly shorter than this many bytes
pub const WORD_MAX_LENGTH: usize = 64;

/// File names must be strictly shorter than this many bytes
pub const FILE_NAME_MAX_LENGTH: usize = 64;

pub const FILE_MAX_COUNT: usize = 64;
