// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Crash recovery for editing sessions.
//!
//! A [`Tracker`](crate::transaction::Tracker) writes its log and pointer
//! through a [`SessionStore`] every time the pointer moves, and an
//! [`Editor`](crate::editor::Editor) additionally writes the full model after
//! each edit. After a reload the editor can then pick up where the user left
//! off, see [`Editor::restore_session`](crate::editor::Editor::restore_session).
//!
//! Persistence is strictly best-effort: errors returned by a store are logged
//! and otherwise ignored by the tracker and the editor, so a failing store only
//! costs the recovery data, never an edit.
//!
//! The main entry points are:
//!
//! - [`SessionStore`], the port implemented by storage backends.
//! - [`NoPersistence`], the store that does nothing, used by default.
//! - [`LocalSession`], a store that lays sessions out over any string
//!   [`KeyValueStore`] (the local-storage equivalent), with
//!   [`MemoryStore`] and [`FileStore`] as backends.

use crate::{Model, transaction::Transaction};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt};

mod session;
mod storage;

pub use session::LocalSession;
pub use storage::{FileStore, KeyValueStore, MemoryStore};

/// Identifies one editing session: a user editing one model.
///
/// The key is computed by the caller from whatever identity it has at hand; it
/// is never derived from global state. It renders as `{user}-{identifier}`,
/// with `anonymous` standing in for a missing user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SessionKey {
    user: Option<String>,
    identifier: String,
}

impl SessionKey {
    pub fn new(user: Option<impl Into<String>>, identifier: impl Into<String>) -> Self {
        Self {
            user: user.map(Into::into),
            identifier: identifier.into(),
        }
    }

    /// A session that is not tied to an authenticated user.
    pub fn anonymous(identifier: impl Into<String>) -> Self {
        Self {
            user: None,
            identifier: identifier.into(),
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.user.as_deref().unwrap_or("anonymous"),
            self.identifier
        )
    }
}

/// A transaction log and pointer as read back from a [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedHistory {
    pub transactions: Vec<Transaction>,
    pub pointer: isize,
}

/// Error produced by the bundled stores.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to access session storage at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed session entry {key}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage port for editing sessions.
///
/// Only [`save`](SessionStore::save) and [`load`](SessionStore::load) are
/// required; a store that also keeps the model should override the model
/// methods so that [`has_session`](SessionStore::has_session) can report a
/// complete session.
#[expect(unused_variables)]
pub trait SessionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist the transaction log and the pointer into it.
    fn save(
        &mut self,
        key: &SessionKey,
        transactions: &[Transaction],
        pointer: isize,
    ) -> Result<(), Self::Error>;

    /// Read back what [`save`](SessionStore::save) stored, if anything.
    fn load(&self, key: &SessionKey) -> Result<Option<SavedHistory>, Self::Error>;

    /// Persist the full model being edited.
    fn save_model(&mut self, key: &SessionKey, model: &Model) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Read back what [`save_model`](SessionStore::save_model) stored, if anything.
    fn load_model(&self, key: &SessionKey) -> Result<Option<Model>, Self::Error> {
        Ok(None)
    }

    /// True if both a model and a history can be restored for `key`.
    fn has_session(&self, key: &SessionKey) -> Result<bool, Self::Error> {
        Ok(self.load_model(key)?.is_some() && self.load(key)?.is_some())
    }

    /// Forget everything stored for `key`.
    fn clear(&mut self, key: &SessionKey) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A store that does nothing.
///
/// This is the default store of trackers and editors that don't need crash
/// recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

impl SessionStore for NoPersistence {
    type Error = Infallible;

    fn save(&mut self, _: &SessionKey, _: &[Transaction], _: isize) -> Result<(), Self::Error> {
        Ok(())
    }

    fn load(&self, _: &SessionKey) -> Result<Option<SavedHistory>, Self::Error> {
        Ok(None)
    }
}
