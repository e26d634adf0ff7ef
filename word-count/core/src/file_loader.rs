// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::constants::{FILE_MAX_COUNT, FILE_NAME_MAX_LENGTH};
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the names of the input files come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Explicit list of file names
    Files(Vec<String>),
    /// Every regular file directly inside a directory
    Directory(PathBuf),
    /// A file listing one input file name per line
    IndexFile(PathBuf),
}

/// Resolves `source` into the ordered list of files to count
pub fn load_input_files(source: &InputSource) -> Result<Vec<String>, ConfigError> {
    let files = match source {
        InputSource::Files(names) => {
            for name in names {
                check_name_length(name)?;
            }
            names.clone()
        }
        InputSource::Directory(path) => load_files_from_directory(path)?,
        InputSource::IndexFile(path) => load_files_from_index_file(path)?,
    };

    if files.is_empty() {
        return Err(ConfigError::NoInputFiles);
    }

    if files.len() > FILE_MAX_COUNT {
        return Err(ConfigError::TooManyFiles {
            count: files.len(),
            max: FILE_MAX_COUNT,
        });
    }

    Ok(files)
}

/// Lists the regular files directly inside `directory`, sorted by name
pub fn load_files_from_directory(directory: &Path) -> Result<Vec<String>, ConfigError> {
    let unreadable = |source| ConfigError::DirectoryUnreadable {
        path: directory.to_path_buf(),
        source,
    };

    let mut base = directory.to_string_lossy().into_owned();
    if !base.ends_with('/') {
        base.push('/');
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        // Follows symlinks, like stat
        let metadata = fs::metadata(entry.path()).map_err(unreadable)?;
        if !metadata.is_file() {
            continue;
        }

        let name = format!("{base}{}", entry.file_name().to_string_lossy());
        check_name_length(&name)?;
        files.push(name);
    }

    files.sort();
    Ok(files)
}

/// Reads one file name per line, skipping empty lines
pub fn load_files_from_index_file(index_file: &Path) -> Result<Vec<String>, ConfigError> {
    let contents =
        fs::read_to_string(index_file).map_err(|source| ConfigError::IndexFileUnreadable {
            path: index_file.to_path_buf(),
            source,
        })?;

    contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| {
            check_name_length(line)?;
            Ok(line.to_string())
        })
        .collect()
}

fn check_name_length(name: &str) -> Result<(), ConfigError> {
    if name.len() >= FILE_NAME_MAX_LENGTH {
        return Err(ConfigError::FileNameTooLong(name.to_string()));
    }
    Ok(())
}
