use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Snapshot, StoreError};

/// Private working copy handed to a [`crate::Store::transaction`] closure.
#[derive(Debug)]
pub struct Transaction {
    snapshot: Snapshot,
    dirty: bool,
}

impl Transaction {
    pub(crate) fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            dirty: false,
        }
    }

    /// Decode the value under `key`. `Ok(None)` when the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.snapshot
            .get(key)
            .map(|value| {
                T::deserialize(value).map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn put<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.snapshot.insert(key.to_string(), encoded);
        self.dirty = true;
        Ok(())
    }

    /// The modified snapshot, or `None` if nothing was written.
    pub(crate) fn into_changes(self) -> Option<Snapshot> {
        self.dirty.then_some(self.snapshot)
    }
}
