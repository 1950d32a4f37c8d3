//! Core runtime for Strata: immutable collections, schema-driven model
//! instances with memoized derived fields, and the serialization contract
//! used to move instances across process boundaries.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod collection;
pub mod config;
pub mod derive;
pub mod error;
pub mod model;
pub mod serialize;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// Errors, codecs and bulk helpers stay in their modules.
///

pub mod prelude {
    pub use crate::{
        collection::{List, Map},
        derive::{Dependency, KeyPath, compute, has_changed, stateful_compute},
        model::{Fields, Model, Schema, Shape},
        serialize::{Deserializer, Serializable, SerializedValue},
        value::{FromValue, Value},
    };
}
