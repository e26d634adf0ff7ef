// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod constants;
pub use constants::{
    WorkerId, BUCKET_COUNT, COORDINATOR_ID, FILE_MAX_COUNT, FILE_NAME_MAX_LENGTH,
    WORD_MAX_LENGTH,
};

pub mod error;
pub use error::{
    ConfigError, CounterError, JobError, PartitionError, TransportError, WireError, WordMapError,
};

pub mod word_shard_map;
pub use word_shard_map::{WordCount, WordShardMap};

pub mod file_section;
pub use file_section::{FileInfo, FileSection};

pub mod section_partitioner;
pub use section_partitioner::{describe_files, partition, WorkAssignment};

pub mod section_counter;
pub use section_counter::{count_section, scan_section, ScanError};

pub mod wire;
pub use wire::Message;

pub mod transport;
pub use transport::Transport;

pub mod shutdown_signal;
pub use shutdown_signal::{NeverShutdown, ShutdownSignal};

pub mod aggregation;
pub use aggregation::{prepare_assignment, run_coordinator, run_worker, ExecutionTimes, JobOutcome};

pub mod worker_runtime;
pub use worker_runtime::{WorkerResult, WorkerRuntime};

pub mod job;
pub use job::run_job;

pub mod file_loader;
pub use file_loader::{load_input_files, InputSource};

pub mod execution_report;
pub use execution_report::{publish, render_word_table, ExecutionReport};

pub mod config;
pub use config::JobConfig;

pub mod cli;
pub use cli::JobArgs;

pub mod logging;
pub use logging::init_logging;
