//! ## Crate layout
//! - `core`: collections, schemas, model instances, derived fields and the
//!   serialization contract.
//!
//! The `prelude` module carries the vocabulary used when declaring schemas
//! and working with instances; serialization helpers stay under
//! `core::serialize`.

pub use strata_core as core;

/// re-exports
///
/// resolvers return boxed futures; this saves callers a direct dependency
pub mod __reexports {
    pub use futures;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::error::{Error, ErrorKind};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        collection::{List, Map},
        derive::{Dependency, KeyPath, compute, has_changed, stateful_compute},
        model::{Fields, Model, Schema, Shape},
        serialize::{
            AsyncDeserializer as _, Deserializer as _, Serializable as _, SerializedValue,
        },
        value::{FromValue, Value},
    };
}
