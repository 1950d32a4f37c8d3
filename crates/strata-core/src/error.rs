use crate::{
    collection::CollectionError, config::ConfigError, model::ModelError,
    serialize::{CodecError, DeserializeError},
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Aggregate of every subsystem error, for callers that want one type.
/// Each subsystem keeps returning its own error; `?` lifts into this one.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Deserialize(#[from] DeserializeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Collection(err) => err.kind(),
            Self::Model(err) => err.kind(),
            Self::Deserialize(err) => err.kind(),
            Self::Codec(_) => ErrorKind::Codec,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Collection(_) => ErrorOrigin::Collection,
            Self::Model(_) => ErrorOrigin::Model,
            Self::Deserialize(_) | Self::Codec(_) => ErrorOrigin::Serialize,
            Self::Config(_) => ErrorOrigin::Config,
        }
    }
}

///
/// ErrorKind
/// Stable classification across subsystems.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    MissingRequiredField,
    InvalidFieldAccess,
    InvalidDerivedFieldAccess,
    TypeMismatch,
    SchemaDefinition,
    KeyNotFound,
    IndexOutOfRange,
    EmptyCollection,
    Deserialization,
    Codec,
    Config,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingRequiredField => "missing_required_field",
            Self::InvalidFieldAccess => "invalid_field_access",
            Self::InvalidDerivedFieldAccess => "invalid_derived_field_access",
            Self::TypeMismatch => "type_mismatch",
            Self::SchemaDefinition => "schema_definition",
            Self::KeyNotFound => "key_not_found",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::EmptyCollection => "empty_collection",
            Self::Deserialization => "deserialization",
            Self::Codec => "codec",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorOrigin {
    Collection,
    Model,
    Serialize,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Collection => "collection",
            Self::Model => "model",
            Self::Serialize => "serialize",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

impl CollectionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::EmptyCollection => ErrorKind::EmptyCollection,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_lift_through_aggregate() {
        let err: Error = ModelError::missing("Person", "id").into();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
        assert_eq!(err.origin().to_string(), "model");
        assert_eq!(err.to_string(), "Person: missing required field 'id'");

        let err: Error = CollectionError::EmptyCollection.into();
        assert_eq!(err.kind().to_string(), "empty_collection");
    }

    #[test]
    fn decode_failures_are_deserialization_errors() {
        let inner = DeserializeError::from(ModelError::missing("Role", "name"))
            .with_index(2)
            .with_field("default_roles");
        assert_eq!(
            inner.leaf(),
            &DeserializeError::Model(ModelError::missing("Role", "name"))
        );

        let err: Error = inner.into();
        assert_eq!(err.kind(), ErrorKind::Deserialization);
        assert_eq!(err.origin(), ErrorOrigin::Serialize);
    }
}
