// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::constants::{BUCKET_COUNT, WORD_MAX_LENGTH};
use crate::error::WordMapError;
use std::collections::HashMap;

/// Permutation of 0..=255 driving the Pearson digest.
/// Changing it changes every bucket assignment, so all processes must share it.
const PEARSON_TABLE: [u8; 256] = [
    98, 6, 85, 150, 36, 23, 112, 164, 135, 207, 169, 5, 26, 64, 165, 219, //
    61, 20, 68, 89, 130, 63, 52, 102, 24, 229, 132, 245, 80, 216, 195, 115, //
    90, 168, 156, 203, 177, 120, 2, 190, 188, 7, 100, 185, 174, 243, 162, 10, //
    237, 18, 253, 225, 8, 208, 172, 244, 255, 126, 101, 79, 145, 235, 228, 121, //
    123, 251, 67, 250, 161, 0, 107, 97, 241, 111, 181, 82, 249, 33, 69, 55, //
    59, 153, 29, 9, 213, 167, 84, 93, 30, 46, 94, 75, 151, 114, 73, 222, //
    197, 96, 210, 45, 16, 227, 248, 202, 51, 152, 252, 125, 81, 206, 215, 186, //
    39, 158, 178, 187, 131, 136, 1, 49, 50, 17, 141, 91, 47, 129, 60, 99, //
    154, 35, 86, 171, 105, 34, 38, 200, 147, 58, 77, 118, 173, 246, 76, 254, //
    133, 232, 196, 144, 198, 124, 53, 4, 108, 74, 223, 234, 134, 230, 157, 139, //
    189, 205, 199, 128, 176, 19, 211, 236, 127, 192, 231, 70, 233, 88, 146, 44, //
    183, 201, 22, 83, 13, 214, 116, 109, 159, 32, 95, 226, 140, 220, 57, 12, //
    221, 31, 209, 182, 143, 92, 149, 184, 148, 62, 113, 65, 37, 27, 106, 166, //
    3, 14, 204, 72, 21, 41, 56, 66, 28, 193, 40, 217, 25, 54, 179, 117, //
    238, 87, 240, 155, 180, 170, 242, 212, 191, 163, 78, 218, 137, 194, 175, 110, //
    43, 119, 224, 71, 122, 142, 42, 160, 104, 48, 247, 103, 15, 11, 138, 239, //
];

/// One-byte Pearson digest of the word's bytes
pub fn digest_word(word: &[u8]) -> u8 {
    word.iter()
        .fold(0u8, |hash, &byte| PEARSON_TABLE[usize::from(hash ^ byte)])
}

/// Bucket a word belongs to in a map of `bucket_count` buckets
pub fn bucket_index(word: &str, bucket_count: usize) -> usize {
    usize::from(digest_word(word.as_bytes())) % bucket_count
}

/// A word and the number of times it occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

impl WordCount {
    pub fn new(word: impl Into<String>, count: u64) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Bucket {
    records: Vec<WordCount>,
    positions: HashMap<String, usize>,
}

impl Bucket {
    fn add(&mut self, word: &str, count: u64) {
        match self.positions.get(word) {
            Some(&position) => self.records[position].count += count,
            None => {
                self.positions.insert(word.to_string(), self.records.len());
                self.records.push(WordCount::new(word, count));
            }
        }
    }

    fn get(&self, word: &str) -> Option<u64> {
        self.positions
            .get(word)
            .map(|&position| self.records[position].count)
    }
}

/// Word occurrence counts split into hash buckets.
///
/// A word always lives in the bucket chosen by [`bucket_index`], so two maps
/// built with the same bucket count can be merged one bucket at a time. The
/// protocol relies on this to fold shards as they arrive off the wire.
#[derive(Debug, Clone)]
pub struct WordShardMap {
    buckets: Vec<Bucket>,
    total_count: u64,
}

impl WordShardMap {
    /// Creates an empty map with the protocol's [`BUCKET_COUNT`] buckets
    pub fn new() -> Self {
        Self {
            buckets: vec![Bucket::default(); BUCKET_COUNT],
            total_count: 0,
        }
    }

    /// Creates an empty map with a custom number of buckets.
    /// The digest is a single byte, so at most 256 buckets can be addressed.
    pub fn with_bucket_count(bucket_count: usize) -> Result<Self, WordMapError> {
        if bucket_count == 0 || bucket_count > 256 {
            return Err(WordMapError::InvalidBucketCount(bucket_count));
        }

        Ok(Self {
            buckets: vec![Bucket::default(); bucket_count],
            total_count: 0,
        })
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_of(&self, word: &str) -> usize {
        bucket_index(word, self.buckets.len())
    }

    /// Records one occurrence of `word`
    pub fn update(&mut self, word: &str) -> Result<(), WordMapError> {
        self.update_with_count(word, 1)
    }

    /// Adds `count` occurrences of `word`, inserting it when it is new.
    /// Empty words and zero counts leave the map untouched.
    pub fn update_with_count(&mut self, word: &str, count: u64) -> Result<(), WordMapError> {
        if word.is_empty() || count == 0 {
            return Ok(());
        }

        if word.len() >= WORD_MAX_LENGTH {
            return Err(WordMapError::WordTooLong {
                word: word.to_string(),
            });
        }

        let bucket = self.bucket_of(word);
        self.buckets[bucket].add(word, count);
        self.total_count += count;

        Ok(())
    }

    /// Folds a block of records that all belong to `bucket`
    pub fn merge_bucket<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a WordCount>,
    ) -> Result<(), WordMapError> {
        for record in records {
            self.update_with_count(&record.word, record.count)?;
        }
        Ok(())
    }

    /// Builds a new map holding, for every word, the sum of its counts across `maps`.
    /// Inputs are traversed bucket by bucket.
    pub fn merge<'a>(
        maps: impl IntoIterator<Item = &'a WordShardMap>,
    ) -> Result<Self, WordMapError> {
        let maps: Vec<&WordShardMap> = maps.into_iter().collect();

        let mut merged = match maps.first() {
            Some(first) => Self::with_bucket_count(first.bucket_count())?,
            None => Self::new(),
        };

        for map in &maps {
            if map.bucket_count() != merged.bucket_count() {
                return Err(WordMapError::BucketCountMismatch {
                    expected: merged.bucket_count(),
                    actual: map.bucket_count(),
                });
            }
        }

        for bucket in 0..merged.bucket_count() {
            for map in &maps {
                merged.merge_bucket(map.bucket(bucket))?;
            }
        }

        Ok(merged)
    }

    /// Sum of every record's count
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        if word.is_empty() {
            return None;
        }
        self.buckets[self.bucket_of(word)].get(word)
    }

    /// Records of one bucket in insertion order.
    /// Panics if `index` is not below [`Self::bucket_count`].
    pub fn bucket(&self, index: usize) -> &[WordCount] {
        &self.buckets[index].records
    }

    /// Every record, by ascending bucket then insertion order
    pub fn iter(&self) -> impl Iterator<Item = &WordCount> + '_ {
        self.buckets.iter().flat_map(|bucket| bucket.records.iter())
    }
}

impl Default for WordShardMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Two maps are equal when they hold the same words with the same counts,
/// regardless of the order records were inserted in.
impl PartialEq for WordShardMap {
    fn eq(&self, other: &Self) -> bool {
        self.bucket_count() == other.bucket_count()
            && self.total_count == other.total_count
            && self.len() == other.len()
            && self
                .iter()
                .all(|record| other.get(&record.word) == Some(record.count))
    }
}

impl Eq for WordShardMap {}

impl<'a> IntoIterator for &'a WordShardMap {
    type Item = &'a WordCount;
    type IntoIter = Box<dyn Iterator<Item = &'a WordCount> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
