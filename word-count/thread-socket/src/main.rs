// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, warn};
use word_count_core::{init_logging, load_input_files, publish, JobArgs, JobError};
use word_count_thread_socket::{run_socket_job, SocketShutdownSignal};

/// Counts the words of a set of files with one thread per worker, connected over TCP
#[derive(Debug, Parser)]
#[command(name = "word-count-thread-socket", version)]
struct Cli {
    #[command(flatten)]
    job: JobArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging("info");
    let cli = Cli::parse();

    match run(cli.job).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "word count failed");
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: JobArgs) -> Result<(), JobError> {
    let start_time = Instant::now();
    let config = args.resolve_config()?;
    let files = load_input_files(&args.input_source())?;

    println!("=== WORD COUNT (THREAD SOCKETS) ===");
    println!("Configuration:");
    println!("  - Workers: {}", config.workers_count);
    println!("  - Files: {}", files.len());
    println!("  - Logs directory: {}", config.logs_dir.display());

    let signal = SocketShutdownSignal::new();
    if let Err(error) = signal.install_ctrlc_handler() {
        warn!(%error, "Ctrl-C will not cancel the job");
    }

    let outcome = run_socket_job(&files, &config, signal).await?;
    publish(&outcome, &config, chrono::Local::now().naive_local())?;

    println!("\n=== COMPLETED ===");
    println!("Words: {}", outcome.words.total_count());
    println!("Distinct words: {}", outcome.words.len());
    println!("Total time: {:.3}s", start_time.elapsed().as_secs_f64());

    Ok(())
}
