//! Persistent collections with copy-on-write semantics.
//!
//! Every element is held behind an `Arc`, so a transform hands back a new
//! collection while untouched elements stay the same allocation as in the
//! source. Neither collection exposes in-place mutation.

mod list;
mod map;

pub use list::List;
pub use map::Map;

use thiserror::Error as ThisError;

///
/// CollectionError
///
/// Access failures on `List` and `Map`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CollectionError {
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("collection is empty")]
    EmptyCollection,

    #[error("key not found: {key}")]
    KeyNotFound { key: String },
}
