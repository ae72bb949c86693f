//! Error types returned by [`AppleStore`](crate::AppleStore) operations.

/// Failure of a record store operation.
///
/// There are exactly two kinds: the referenced apple does not exist, or the
/// write would leave two apples sharing a name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Apple \"{name}\" not found")]
    NotFound { name: String },
    #[error(transparent)]
    Conflict(#[from] Conflict),
}

/// Why a write was rejected as a duplicate name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    /// `create` with a name that is already taken.
    #[error("Apple {name} already exists")]
    Duplicate { name: String },
    /// `merge` or `rename` into a name owned by another apple.
    #[error("Cannot change \"{from}\" to \"{to}\" because an apple with that name already exists")]
    Rename { from: String, to: String },
}

impl StoreError {
    pub(crate) fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
