// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::constants::WORD_MAX_LENGTH;
use crate::error::{CounterError, WordMapError};
use crate::file_section::FileSection;
use crate::shutdown_signal::ShutdownSignal;
use crate::word_shard_map::WordShardMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use thiserror::Error;

/// How many bytes are scanned between two cancellation checks
const CANCELLATION_CHECK_INTERVAL: u64 = 64 * 1024;

/// Counts the words of one file section into `map`
pub fn count_section<S: ShutdownSignal>(
    section: &FileSection,
    map: &mut WordShardMap,
    signal: &S,
) -> Result<(), CounterError> {
    let file = File::open(&section.file_name).map_err(|source| CounterError::Open {
        path: section.file_name.clone(),
        source,
    })?;

    scan_section(file, section.start, section.end, map, signal).map_err(|error| match error {
        ScanError::Io(source) => CounterError::Read {
            path: section.file_name.clone(),
            source,
        },
        ScanError::Counter(error) => error,
    })
}

/// Failure while scanning an already opened reader
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Counter(#[from] CounterError),
}

impl From<WordMapError> for ScanError {
    fn from(error: WordMapError) -> Self {
        ScanError::Counter(CounterError::Word(error))
    }
}

struct ByteScanner<R> {
    reader: BufReader<R>,
    position: u64,
}

impl<R: Read> ByteScanner<R> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.reader.fill_buf()?.first() {
            Some(&byte) => byte,
            None => return Ok(None),
        };
        self.reader.consume(1);
        self.position += 1;
        Ok(Some(byte))
    }
}

/// Scans the alphanumeric runs of `[start, end)` into `map`, lowercased.
///
/// A word is counted by the section holding its first byte. When `start > 0`
/// the run already in progress at `start - 1` is skipped, since the previous
/// section counts it; a run starting before `end` is read to its end even if
/// that lies past `end`.
pub fn scan_section<R: Read + Seek, S: ShutdownSignal>(
    mut reader: R,
    start: u64,
    end: u64,
    map: &mut WordShardMap,
    signal: &S,
) -> Result<(), ScanError> {
    if start > end {
        return Err(CounterError::InvertedRange { start, end }.into());
    }

    let mut position = 0;
    if start > 0 {
        position = reader.seek(SeekFrom::Start(start - 1))?;
    }

    let mut scanner = ByteScanner {
        reader: BufReader::new(reader),
        position,
    };

    if start > 0 {
        while let Some(byte) = scanner.next_byte()? {
            if !byte.is_ascii_alphanumeric() {
                break;
            }
        }
    }

    let mut word: Vec<u8> = Vec::with_capacity(WORD_MAX_LENGTH);
    let mut next_check = scanner.position + CANCELLATION_CHECK_INTERVAL;

    loop {
        if word.is_empty() && scanner.position >= end {
            break;
        }

        if scanner.position >= next_check {
            if signal.is_cancelled() {
                return Err(CounterError::Cancelled.into());
            }
            next_check = scanner.position + CANCELLATION_CHECK_INTERVAL;
        }

        match scanner.next_byte()? {
            Some(byte) if byte.is_ascii_alphanumeric() => {
                word.push(byte.to_ascii_lowercase());
                if word.len() >= WORD_MAX_LENGTH {
                    return Err(WordMapError::WordTooLong {
                        word: String::from_utf8_lossy(&word).into_owned(),
                    }
                    .into());
                }
            }
            Some(_) => flush_word(&mut word, map)?,
            None => {
                flush_word(&mut word, map)?;
                break;
            }
        }
    }

    Ok(())
}

fn flush_word(word: &mut Vec<u8>, map: &mut WordShardMap) -> Result<(), WordMapError> {
    if !word.is_empty() {
        map.update(&String::from_utf8_lossy(word))?;
        word.clear();
    }
    Ok(())
}
