//! Schemas and model instances.
//!
//! A [`Schema`] is built once from ordered field declarations and shared by
//! every instance created from it. A [`Model`] is an immutable record of base
//! slots plus cached derived slots; every update returns a new instance.

mod deep;
mod fields;
mod instance;
mod schema;


pub use deep::DeepUpdate;
pub use fields::Fields;
pub use instance::Model;
pub use schema::{Schema, SchemaBuilder, SchemaDef, Shape};

pub(crate) use schema::FieldTable;

use crate::error::ErrorKind;
use thiserror::Error as ThisError;

///
/// ModelError
///
/// Construction, access and schema-definition failures.
/// Every variant names the schema and the offending field.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("{schema}: missing required field '{field}'")]
    MissingRequiredField { schema: String, field: String },

    #[error("{schema}: unknown field '{field}'")]
    InvalidFieldAccess { schema: String, field: String },

    #[error("{schema}: derived field '{field}' cannot be assigned or tracked")]
    InvalidDerivedFieldAccess { schema: String, field: String },

    #[error("{schema}: field '{field}' declared more than once")]
    DuplicateField { schema: String, field: String },

    #[error("{schema}: field '{field}' does not hold a nested model")]
    NotNestedModel { schema: String, field: String },

    #[error("{schema}: field '{field}' expects {expected}, found {actual}")]
    TypeMismatch {
        schema: String,
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl ModelError {
    pub(crate) fn missing(schema: &str, field: &str) -> Self {
        Self::MissingRequiredField {
            schema: schema.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn unknown(schema: &str, field: &str) -> Self {
        Self::InvalidFieldAccess {
            schema: schema.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn derived(schema: &str, field: &str) -> Self {
        Self::InvalidDerivedFieldAccess {
            schema: schema.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn not_nested(schema: &str, field: &str) -> Self {
        Self::NotNestedModel {
            schema: schema.to_string(),
            field: field.to_string(),
        }
    }

    /// Name of the field the error refers to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::MissingRequiredField { field, .. }
            | Self::InvalidFieldAccess { field, .. }
            | Self::InvalidDerivedFieldAccess { field, .. }
            | Self::DuplicateField { field, .. }
            | Self::NotNestedModel { field, .. }
            | Self::TypeMismatch { field, .. } => field,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::InvalidFieldAccess { .. } | Self::NotNestedModel { .. } => {
                ErrorKind::InvalidFieldAccess
            }
            Self::InvalidDerivedFieldAccess { .. } => ErrorKind::InvalidDerivedFieldAccess,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::DuplicateField { .. } => ErrorKind::SchemaDefinition,
        }
    }
}
