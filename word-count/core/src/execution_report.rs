// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::aggregation::JobOutcome;
use crate::config::JobConfig;
use crate::error::JobError;
use crate::word_shard_map::WordShardMap;
use chrono::NaiveDateTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

pub const LINE_WIDTH: usize = 120;
const CONSOLE_LINE_WIDTH: usize = 90;

/// Text log of one completed job
pub struct ExecutionReport<'a> {
    outcome: &'a JobOutcome,
    date: NaiveDateTime,
}

impl<'a> ExecutionReport<'a> {
    pub fn new(outcome: &'a JobOutcome, date: NaiveDateTime) -> Self {
        Self { outcome, date }
    }

    /// `<date>-np<workers>.log`
    pub fn file_name(&self) -> String {
        format!(
            "{}-np{}.log",
            self.date.format("%Y-%m-%d_%H-%M-%S"),
            self.outcome.assignment.workers_count()
        )
    }

    pub fn render(&self) -> String {
        let dashed_line = "-".repeat(LINE_WIDTH);
        let assignment = &self.outcome.assignment;
        let mut lines = Vec::new();

        lines.push("Execution info".to_string());
        lines.push(dashed_line.clone());
        let date = self.date.format("%Y-%m-%d %H:%M:%S").to_string();
        lines.push(format!("{:<100}{:>20}", "Date of the test", date));
        lines.push(format!("{:<100}{:>20}", "Number of workers", assignment.workers_count()));
        lines.push(format!("{:<100}{:>20}", "Number of words", self.outcome.words.total_count()));
        lines.push(format!("{:<100}{:>20}", "Number of bytes", assignment.total_size()));
        lines.push(dashed_line.clone());
        lines.push(String::new());

        lines.push("Execution times".to_string());
        lines.push(dashed_line.clone());
        for (worker, elapsed) in self.outcome.execution_times.iter() {
            lines.push(format!("{:>6}{:>3}{:>110.6}s", "Worker", worker, elapsed.as_secs_f64()));
        }
        lines.push(dashed_line.clone());
        lines.push(String::new());

        lines.push("Workload distribution".to_string());
        lines.push(dashed_line.clone());
        lines.push(format!("{:>6} {:<95} {:>8} {:>8}", "Worker", "File", "Start", "End"));
        lines.push(dashed_line.clone());
        for (worker, sections) in assignment.iter() {
            for section in sections {
                lines.push(format!(
                    "{:>6} {:<95} {:>8} {:>8}",
                    worker, section.file_name, section.start, section.end
                ));
            }
        }
        lines.push(dashed_line.clone());
        lines.push(String::new());

        lines.push("Results".to_string());
        lines.push(dashed_line.clone());
        lines.push(format!("{:<108} {:>11}", "Word", "Occurrences"));
        lines.push(dashed_line.clone());
        for record in self.outcome.words.iter() {
            lines.push(format!("{:<108} {:>11}", record.word, record.count));
        }
        lines.push(dashed_line);
        lines.push(String::new());

        lines.join("\n")
    }

    /// Writes the report into `dir`, creating it when missing
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.render())?;
        Ok(path)
    }
}

/// Word table printed on the console at the end of a job
pub fn render_word_table(words: &WordShardMap) -> String {
    let dashed_line = "-".repeat(CONSOLE_LINE_WIDTH);
    let mut lines = vec![
        format!("{:<78} {:>11}", "Word", "Occurrences"),
        dashed_line.clone(),
    ];
    lines.extend(
        words
            .iter()
            .map(|record| format!("{:<78} {:>11}", record.word, record.count)),
    );
    lines.push(dashed_line);
    lines.join("\n")
}

/// Prints the results and writes the report of a successful job
pub fn publish(
    outcome: &JobOutcome,
    config: &JobConfig,
    date: NaiveDateTime,
) -> Result<PathBuf, JobError> {
    if config.print_results {
        println!("{}", render_word_table(&outcome.words));
    }

    let report = ExecutionReport::new(outcome, date);
    let path = report
        .write_to_dir(&config.logs_dir)
        .map_err(JobError::Report)?;

    info!(path = %path.display(), "execution report written");
    println!(
        "Full report available at the following file: \"{}\".",
        path.display()
    );

    Ok(path)
}
