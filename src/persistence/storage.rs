// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! String key-value backends for [`LocalSession`](super::LocalSession).

use super::PersistenceError;
use ahash::RandomState;
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

/// A flat string key-value store, the equivalent of a browser's local storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set_item(&mut self, key: &str, value: String) -> Result<(), PersistenceError>;

    /// Removing a key that does not exist is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// An in-process [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String, RandomState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), PersistenceError> {
        self.items.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.items.remove(key);
        Ok(())
    }
}

/// A [`KeyValueStore`] keeping one file per key inside a directory.
///
/// Keys are mapped to file names by percent-escaping every byte outside
/// `[A-Za-z0-9._-]` (dots too when the key is at most two bytes long, to rule
/// out `.` and `..`), so any key is a valid, distinct file name.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| PersistenceError::Io {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(escape_key(key))
    }
}

fn escape_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => name.push(byte as char),
            // '.' alone would allow "." and ".." as names
            b'.' if key.len() > 2 => name.push('.'),
            _ => name.push_str(&format!("%{byte:02X}")),
        }
    }
    name
}

fn io_error(path: &Path, source: io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path, err)),
        }
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        // write-then-rename so a crash never leaves a truncated entry behind.
        // '~' never occurs in an escaped key.
        let staging = self.root.join(format!("{}~", escape_key(key)));
        fs::write(&staging, value).map_err(|err| io_error(&staging, err))?;
        fs::rename(&staging, &path).map_err(|err| {
            // the rename error is the one reported
            let _ = fs::remove_file(&staging);
            io_error(&path, err)
        })
    }

    fn remove_item(&mut self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path, err)),
        }
    }
}
