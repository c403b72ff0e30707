use super::{KeyValueStore, PersistenceError, SavedHistory, SessionKey, SessionStore};
use crate::{Model, transaction::Transaction};
use serde::{Serialize, de::DeserializeOwned};

const MODEL_SUFFIX: &str = "model";
const TRANSACTIONS_SUFFIX: &str = "transactions";
const POINTER_SUFFIX: &str = "transactionPointer";

/// Lays editing sessions out over a [`KeyValueStore`].
///
/// Each session occupies three JSON-encoded entries:
///
/// | key                              | value                  |
/// |----------------------------------|------------------------|
/// | `{session}-model`                | the full model         |
/// | `{session}-transactions`         | the transaction log    |
/// | `{session}-transactionPointer`   | the pointer, `-1` based |
///
/// where `{session}` is the [`SessionKey`] rendering, `{user}-{identifier}`.
#[derive(Debug, Clone, Default)]
pub struct LocalSession<S> {
    storage: S,
}

impl<S: KeyValueStore> LocalSession<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn get<T: DeserializeOwned>(
        &self,
        key: &SessionKey,
        suffix: &str,
    ) -> Result<Option<T>, PersistenceError> {
        let key = entry_key(key, suffix);
        let Some(raw) = self.storage.get_item(&key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| PersistenceError::Json { key, source })
    }

    fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &SessionKey,
        suffix: &str,
        value: &T,
    ) -> Result<(), PersistenceError> {
        let key = entry_key(key, suffix);
        let raw = serde_json::to_string(value)
            .map_err(|source| PersistenceError::Json { key: key.clone(), source })?;
        self.storage.set_item(&key, raw)
    }
}

fn entry_key(key: &SessionKey, suffix: &str) -> String {
    format!("{key}-{suffix}")
}

impl<S: KeyValueStore> SessionStore for LocalSession<S> {
    type Error = PersistenceError;

    fn save(
        &mut self,
        key: &SessionKey,
        transactions: &[Transaction],
        pointer: isize,
    ) -> Result<(), Self::Error> {
        self.set(key, TRANSACTIONS_SUFFIX, transactions)?;
        self.set(key, POINTER_SUFFIX, &pointer)
    }

    fn load(&self, key: &SessionKey) -> Result<Option<SavedHistory>, Self::Error> {
        let transactions: Option<Vec<Transaction>> = self.get(key, TRANSACTIONS_SUFFIX)?;
        let pointer: Option<isize> = self.get(key, POINTER_SUFFIX)?;
        Ok(transactions
            .zip(pointer)
            .map(|(transactions, pointer)| SavedHistory {
                transactions,
                pointer,
            }))
    }

    fn save_model(&mut self, key: &SessionKey, model: &Model) -> Result<(), Self::Error> {
        self.set(key, MODEL_SUFFIX, model)
    }

    fn load_model(&self, key: &SessionKey) -> Result<Option<Model>, Self::Error> {
        self.get(key, MODEL_SUFFIX)
    }

    fn clear(&mut self, key: &SessionKey) -> Result<(), Self::Error> {
        for suffix in [MODEL_SUFFIX, TRANSACTIONS_SUFFIX, POINTER_SUFFIX] {
            self.storage.remove_item(&entry_key(key, suffix))?;
        }
        Ok(())
    }
}
