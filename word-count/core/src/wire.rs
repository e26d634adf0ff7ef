// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fixed-layout frames exchanged between the coordinator and the workers.
//!
//! Every frame starts with the wire version and a message kind, followed by
//! the message payload. Integers are big-endian and strings are zero-padded
//! to their field width, so a frame never depends on the memory layout of the
//! process that produced it.

use crate::constants::{WorkerId, FILE_NAME_MAX_LENGTH, WORD_MAX_LENGTH};
use crate::error::WireError;
use crate::file_section::FileSection;
use crate::word_shard_map::WordCount;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::time::Duration;

pub const WIRE_VERSION: u8 = 1;

/// `file_name: [u8; 64]`, `start: i64`, `end: i64`
pub const SECTION_RECORD_LEN: usize = FILE_NAME_MAX_LENGTH + 8 + 8;

/// `word: [u8; 64]`, `count: u64`
pub const WORD_RECORD_LEN: usize = WORD_MAX_LENGTH + 8;

const HEADER_LEN: usize = 2;

const KIND_ASSIGNMENT: u8 = 1;
const KIND_BUCKET_COUNT: u8 = 2;
const KIND_WORD_BLOCK: u8 = 3;
const KIND_ELAPSED_TIME: u8 = 4;
const KIND_HELLO: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Sections a worker must count
    Assignment(Vec<FileSection>),
    /// Number of records a worker holds in one bucket
    BucketCount { bucket: u32, count: u32 },
    /// The records of one bucket
    WordBlock { bucket: u32, records: Vec<WordCount> },
    /// Time a worker spent counting and sending its shards
    ElapsedTime(Duration),
    /// First frame on a connection-oriented transport, naming the sender
    Hello { worker_id: u32 },
}

impl Message {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Message::Assignment(_) => "Assignment",
            Message::BucketCount { .. } => "BucketCount",
            Message::WordBlock { .. } => "WordBlock",
            Message::ElapsedTime(_) => "ElapsedTime",
            Message::Hello { .. } => "Hello",
        }
    }

    pub fn hello(worker_id: WorkerId) -> Result<Self, WireError> {
        let worker_id =
            u32::try_from(worker_id).map_err(|_| WireError::Overflow(worker_id as u128))?;
        Ok(Message::Hello { worker_id })
    }

    pub fn encode(&self) -> Result<Bytes, WireError> {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload_len());
        buf.put_u8(WIRE_VERSION);

        match self {
            Message::Assignment(sections) => {
                buf.put_u8(KIND_ASSIGNMENT);
                buf.put_u32(len_to_u32(sections.len())?);
                for section in sections {
                    put_section(&mut buf, section)?;
                }
            }
            Message::BucketCount { bucket, count } => {
                buf.put_u8(KIND_BUCKET_COUNT);
                buf.put_u32(*bucket);
                buf.put_u32(*count);
            }
            Message::WordBlock { bucket, records } => {
                buf.put_u8(KIND_WORD_BLOCK);
                buf.put_u32(*bucket);
                buf.put_u32(len_to_u32(records.len())?);
                for record in records {
                    put_word(&mut buf, record)?;
                }
            }
            Message::ElapsedTime(elapsed) => {
                buf.put_u8(KIND_ELAPSED_TIME);
                let nanos = elapsed.as_nanos();
                buf.put_u64(u64::try_from(nanos).map_err(|_| WireError::Overflow(nanos))?);
            }
            Message::Hello { worker_id } => {
                buf.put_u8(KIND_HELLO);
                buf.put_u32(*worker_id);
            }
        }

        Ok(buf.freeze())
    }

    pub fn decode(mut frame: &[u8]) -> Result<Self, WireError> {
        ensure_remaining(frame, HEADER_LEN)?;
        let version = frame.get_u8();
        if version != WIRE_VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }

        let message = match frame.get_u8() {
            KIND_ASSIGNMENT => {
                ensure_remaining(frame, 4)?;
                let count = frame.get_u32() as usize;
                ensure_remaining(frame, count.saturating_mul(SECTION_RECORD_LEN))?;
                let sections = (0..count)
                    .map(|_| get_section(&mut frame))
                    .collect::<Result<Vec<_>, _>>()?;
                Message::Assignment(sections)
            }
            KIND_BUCKET_COUNT => {
                ensure_remaining(frame, 8)?;
                Message::BucketCount {
                    bucket: frame.get_u32(),
                    count: frame.get_u32(),
                }
            }
            KIND_WORD_BLOCK => {
                ensure_remaining(frame, 8)?;
                let bucket = frame.get_u32();
                let count = frame.get_u32() as usize;
                ensure_remaining(frame, count.saturating_mul(WORD_RECORD_LEN))?;
                let records = (0..count)
                    .map(|_| get_word(&mut frame))
                    .collect::<Result<Vec<_>, _>>()?;
                Message::WordBlock { bucket, records }
            }
            KIND_ELAPSED_TIME => {
                ensure_remaining(frame, 8)?;
                Message::ElapsedTime(Duration::from_nanos(frame.get_u64()))
            }
            KIND_HELLO => {
                ensure_remaining(frame, 4)?;
                Message::Hello {
                    worker_id: frame.get_u32(),
                }
            }
            kind => return Err(WireError::UnknownKind(kind)),
        };

        if frame.has_remaining() {
            return Err(WireError::TrailingBytes(frame.remaining()));
        }

        Ok(message)
    }

    fn payload_len(&self) -> usize {
        match self {
            Message::Assignment(sections) => 4 + sections.len() * SECTION_RECORD_LEN,
            Message::BucketCount { .. } => 8,
            Message::WordBlock { records, .. } => 8 + records.len() * WORD_RECORD_LEN,
            Message::ElapsedTime(_) => 8,
            Message::Hello { .. } => 4,
        }
    }
}

fn len_to_u32(len: usize) -> Result<u32, WireError> {
    u32::try_from(len).map_err(|_| WireError::Overflow(len as u128))
}

fn ensure_remaining(frame: &[u8], needed: usize) -> Result<(), WireError> {
    if frame.len() < needed {
        return Err(WireError::Truncated {
            needed: needed - frame.len(),
        });
    }
    Ok(())
}

fn put_fixed_str(buf: &mut BytesMut, value: &str, width: usize) -> Result<(), WireError> {
    // One zero byte at least terminates the string
    if value.len() >= width {
        return Err(WireError::FieldTooLong {
            len: value.len(),
            width,
        });
    }
    buf.put_slice(value.as_bytes());
    buf.put_bytes(0, width - value.len());
    Ok(())
}

fn get_fixed_str(frame: &mut &[u8], width: usize) -> Result<String, WireError> {
    let field = &frame[..width];
    let len = field
        .iter()
        .position(|&byte| byte == 0)
        .ok_or(WireError::Unterminated)?;
    let value = std::str::from_utf8(&field[..len])
        .map_err(|_| WireError::InvalidUtf8)?
        .to_string();
    frame.advance(width);
    Ok(value)
}

fn put_offset(buf: &mut BytesMut, offset: u64) -> Result<(), WireError> {
    buf.put_i64(i64::try_from(offset).map_err(|_| WireError::Overflow(u128::from(offset)))?);
    Ok(())
}

fn put_section(buf: &mut BytesMut, section: &FileSection) -> Result<(), WireError> {
    put_fixed_str(buf, &section.file_name, FILE_NAME_MAX_LENGTH)?;
    put_offset(buf, section.start)?;
    put_offset(buf, section.end)
}

fn get_section(frame: &mut &[u8]) -> Result<FileSection, WireError> {
    let file_name = get_fixed_str(frame, FILE_NAME_MAX_LENGTH)?;
    let start = frame.get_i64();
    let end = frame.get_i64();

    if file_name.is_empty() {
        return Err(WireError::InvalidRecord("empty file name"));
    }
    if start < 0 || end < start {
        return Err(WireError::InvalidRange { start, end });
    }

    Ok(FileSection::new(file_name, start as u64, end as u64))
}

fn put_word(buf: &mut BytesMut, record: &WordCount) -> Result<(), WireError> {
    put_fixed_str(buf, &record.word, WORD_MAX_LENGTH)?;
    buf.put_u64(record.count);
    Ok(())
}

fn get_word(frame: &mut &[u8]) -> Result<WordCount, WireError> {
    let word = get_fixed_str(frame, WORD_MAX_LENGTH)?;
    let count = frame.get_u64();

    if word.is_empty() {
        return Err(WireError::InvalidRecord("empty word"));
    }
    if count == 0 {
        return Err(WireError::InvalidRecord("zero occurrence count"));
    }

    Ok(WordCount::new(word, count))
}
