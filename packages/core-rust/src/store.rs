//! In-memory apple collection keyed by name.
//!
//! [`AppleStore`] owns an ordered `Vec<Apple>` and enforces the only
//! invariant of the collection: no two apples share a `name`. Every lookup is
//! a linear scan, which is fine for the handful of records this service
//! holds.
//!
//! The store is synchronous and not internally synchronized. Its writes are
//! check-then-act sequences, so a concurrent caller must serialize access to
//! the whole store (the server keeps it behind a single mutex).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Conflict, StoreError};
use crate::types::{Apple, NAME_FIELD};
use crate::value::{is_truthy, render};

/// Confirmation returned by [`AppleStore::delete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReceipt {
    pub message: String,
}

/// Ordered collection of apples with unique names.
#[derive(Debug, Default)]
pub struct AppleStore {
    apples: Vec<Apple>,
}

impl AppleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All apples in collection order.
    #[must_use]
    pub fn list(&self) -> &[Apple] {
        &self.apples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.apples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apples.is_empty()
    }

    /// Returns the apple called `name`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no apple has that name.
    pub fn get(&self, name: &str) -> Result<&Apple, StoreError> {
        self.position(name)
            .map(|idx| &self.apples[idx])
            .ok_or_else(|| StoreError::not_found(name))
    }

    /// Appends `apple` to the end of the collection.
    ///
    /// # Errors
    ///
    /// [`Conflict::Duplicate`] if an apple with the same name already exists.
    /// Two apples without a `name` field count as sharing a name.
    pub fn create(&mut self, apple: Apple) -> Result<&Apple, StoreError> {
        if self.position_of(apple.name()).is_some() {
            return Err(Conflict::Duplicate {
                name: apple.display_name(),
            }
            .into());
        }
        debug!(name = %apple.display_name(), "creating apple");
        self.apples.push(apple);
        let idx = self.apples.len() - 1;
        Ok(&self.apples[idx])
    }

    /// Overwrites the apple called `name` with `apple`, keeping its position.
    ///
    /// Fields missing from `apple` are dropped. The caller is responsible for
    /// checking that `apple` still carries `name`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no apple has that name.
    pub fn replace(&mut self, name: &str, apple: Apple) -> Result<&Apple, StoreError> {
        let idx = self
            .position(name)
            .ok_or_else(|| StoreError::not_found(name))?;
        debug!(name, "replacing apple");
        self.apples[idx] = apple;
        Ok(&self.apples[idx])
    }

    /// Shallow-merges `partial` over the apple called `name`.
    ///
    /// A truthy `name` in `partial` renames the apple as a side effect.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no apple has that name, or
    /// [`Conflict::Rename`] if `partial` renames it onto another apple.
    pub fn merge(&mut self, name: &str, partial: Apple) -> Result<&Apple, StoreError> {
        let idx = self
            .position(name)
            .ok_or_else(|| StoreError::not_found(name))?;

        if let Some(new_name) = partial.name().filter(|v| is_truthy(v)) {
            let renames = !matches!(new_name, Value::String(s) if s == name);
            if renames && self.position_of(Some(new_name)).is_some() {
                return Err(Conflict::Rename {
                    from: name.to_string(),
                    to: render(new_name),
                }
                .into());
            }
        }

        debug!(name, fields = partial.fields().len(), "merging apple");
        self.apples[idx].merge(partial);
        Ok(&self.apples[idx])
    }

    /// Renames the apple called `old_name` in place.
    ///
    /// An empty `new_name` clears the name instead of failing.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if `old_name` is absent, or
    /// [`Conflict::Rename`] if a different apple already uses `new_name`.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<&Apple, StoreError> {
        let idx = self
            .position(old_name)
            .ok_or_else(|| StoreError::not_found(old_name))?;

        if !new_name.is_empty() && self.position(new_name).is_some_and(|other| other != idx) {
            return Err(Conflict::Rename {
                from: old_name.to_string(),
                to: new_name.to_string(),
            }
            .into());
        }

        debug!(old_name, new_name, "renaming apple");
        self.apples[idx].set(NAME_FIELD, new_name);
        Ok(&self.apples[idx])
    }

    /// Removes the apple called `name`. Absent names are not an error.
    pub fn delete(&mut self, name: &str) -> DeleteReceipt {
        if let Some(idx) = self.position(name) {
            debug!(name, "deleting apple");
            self.apples.remove(idx);
        }
        DeleteReceipt {
            message: format!("Apple \"{name}\" deleted"),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.apples.iter().position(|apple| apple.has_name(name))
    }

    fn position_of(&self, name: Option<&Value>) -> Option<usize> {
        self.apples.iter().position(|apple| apple.name() == name)
    }
}
