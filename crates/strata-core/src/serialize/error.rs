use crate::{error::ErrorKind, model::ModelError, serialize::CodecError};
use thiserror::Error as ThisError;

///
/// DeserializeError
///
/// Failures rebuilding instances from boundary values.
/// Nested failures are wrapped in `Context` with a dotted/indexed path.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DeserializeError {
    #[error("invalid shape: expected {expected}, found {actual}")]
    InvalidShape {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("no instance found for key {key}")]
    MissingKey { key: String },

    #[error("schema '{schema}' holds references and must be deserialized asynchronously")]
    AsyncRequired { schema: String },

    #[error("nesting exceeds maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("reference resolution failed: {0}")]
    Resolve(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("payload size limit exceeded: {len} bytes (limit {max_bytes})")]
    SizeLimitExceeded { len: usize, max_bytes: usize },

    #[error("deserialize failed at {path}: {source}")]
    Context {
        path: String,
        #[source]
        source: Box<Self>,
    },
}

impl DeserializeError {
    pub(crate) const fn shape(expected: &'static str, actual: &'static str) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Prepend a field segment to the error path.
    #[must_use]
    pub fn with_field(self, field: impl AsRef<str>) -> Self {
        self.with_path_segment(field.as_ref())
    }

    /// Prepend an index segment to the error path.
    #[must_use]
    pub fn with_index(self, index: usize) -> Self {
        self.with_path_segment(format!("[{index}]"))
    }

    /// Full contextual path, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&str> {
        match self {
            Self::Context { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Innermost, non-context error.
    #[must_use]
    pub fn leaf(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.leaf(),
            _ => self,
        }
    }

    /// Every failure on the decode path is a deserialization error, including
    /// model errors raised while rebuilding an instance; `leaf` keeps the
    /// underlying cause.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.leaf() {
            Self::Codec(_) | Self::SizeLimitExceeded { .. } => ErrorKind::Codec,
            _ => ErrorKind::Deserialization,
        }
    }

    fn with_path_segment(self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        match self {
            Self::Context { path, source } => Self::Context {
                path: Self::join_segments(&segment, &path),
                source,
            },
            source => Self::Context {
                path: segment,
                source: Box::new(source),
            },
        }
    }

    fn join_segments(prefix: &str, suffix: &str) -> String {
        if suffix.starts_with('[') {
            format!("{prefix}{suffix}")
        } else {
            format!("{prefix}.{suffix}")
        }
    }
}

impl From<CodecError> for DeserializeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::SizeLimitExceeded { len, max_bytes } => {
                Self::SizeLimitExceeded { len, max_bytes }
            }
            other => Self::Codec(other.to_string()),
        }
    }
}
