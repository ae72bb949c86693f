//! Apples core: the in-memory apple collection and query filtering.
//!
//! Everything here is synchronous and free of I/O. The HTTP layer in
//! `apples-server` owns an [`AppleStore`] and runs list results through
//! [`filter::apply`].

pub mod error;
pub mod filter;
pub mod store;
pub mod types;
pub mod value;

pub use error::{Conflict, StoreError};
pub use filter::{FilterFailure, FilterMap, FilterOutcome};
pub use store::{AppleStore, DeleteReceipt};
pub use types::Apple;
