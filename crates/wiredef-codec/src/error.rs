use std::fmt;

use serde_json::Value;

/// Recoverable failure returned as a value from `read` and `write`.
///
/// Composite types inspect these and decide locally whether to abort or
/// report a partial result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// No type is registered under the given name.
    #[error("missing data type: {0}")]
    MissingType(String),

    /// The buffer ended before the type could read or write its bytes.
    #[error("unexpected end of buffer at offset {at}: need {need} bytes, {remaining} remaining")]
    UnexpectedEof {
        at: usize,
        need: usize,
        remaining: usize,
    },

    /// The value or argument does not fit the type.
    #[error("invalid value: expected {expected}, found {found}")]
    InvalidValue { expected: String, found: String },

    /// A field reference could not be resolved through the context.
    #[error("missing referenced field: {0}")]
    MissingField(String),

    /// Breadcrumb wrapper added by composite types.
    #[error("{field}: {source}")]
    Field {
        field: String,
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Out-of-bounds access of `need` bytes at `at` in a buffer of `len` bytes.
    pub fn eof(at: usize, need: usize, len: usize) -> Self {
        Self::UnexpectedEof {
            at,
            need,
            remaining: len.saturating_sub(at),
        }
    }

    /// `found` does not satisfy `expected`.
    pub fn invalid(expected: impl Into<String>, found: &Value) -> Self {
        Self::InvalidValue {
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Prefix the breadcrumb with an enclosing field name.
    pub fn in_field(self, field: impl fmt::Display) -> Self {
        match self {
            Self::Field {
                field: inner,
                source,
            } => Self::Field {
                field: format!("{field}.{inner}"),
                source,
            },
            other => Self::Field {
                field: field.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Dotted field path, if the error happened inside a composite.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Self::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The error without its breadcrumb wrapper.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            Self::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Stage of a packet operation, reported in envelope faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SizeOf,
    Write,
    Read,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::SizeOf => "SizeOf",
            Stage::Write => "Write",
            Stage::Read => "Read",
        })
    }
}

/// Unrecoverable failure that aborts the whole packet operation.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// `size_of` was asked for an unregistered type.
    #[error("missing data type: {0}")]
    MissingType(String),

    /// A reader reported consuming more bytes than the buffer holds.
    #[error(
        "reader for {descriptor} returned size {size} at offset {offset} \
         with only {remaining} bytes remaining"
    )]
    MalformedRead {
        descriptor: String,
        offset: usize,
        size: usize,
        remaining: usize,
    },

    /// A read/write error value escalated by a composite or the envelope.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Breadcrumb wrapper added by composite types.
    #[error("{field}: {source}")]
    Field { field: String, source: Box<Fault> },

    /// Annotated failure surfaced by the packet envelope.
    #[error("{stage} error for {field} : {message}")]
    Packet {
        stage: Stage,
        field: String,
        message: String,
    },

    /// A writer filled a different number of bytes than `size_of` reported.
    #[error("write produced {written} bytes, expected {expected}")]
    SizeMismatch { expected: usize, written: usize },

    /// The computed packet size exceeds the configured maximum.
    #[error("packet too large ({size} bytes, max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// A protocol entry is neither a descriptor nor `"native"`.
    #[error("invalid type spec for {name}: {reason}")]
    InvalidTypeSpec { name: String, reason: String },

    /// A protocol document could not be loaded.
    #[error("failed to load protocol: {0}")]
    LoadFailed(String),

    /// A protocol document is not valid JSON.
    #[error("protocol is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl Fault {
    /// Prefix the breadcrumb with an enclosing field name.
    pub fn in_field(self, field: impl fmt::Display) -> Self {
        match self {
            Self::Field {
                field: inner,
                source,
            } => Self::Field {
                field: format!("{field}.{inner}"),
                source,
            },
            Self::Codec(err) => Self::Codec(err.in_field(field)),
            other => Self::Field {
                field: field.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Dotted field path, if the fault happened inside a composite.
    pub fn field_path(&self) -> Option<String> {
        self.split().0
    }

    /// Rewrite into an envelope fault naming the stage and field path.
    ///
    /// `root` stands in for the path when the fault is not inside a field.
    pub fn annotate(self, stage: Stage, root: &str) -> Self {
        let (field, message) = self.split();
        Self::Packet {
            stage,
            field: field.unwrap_or_else(|| root.to_string()),
            message,
        }
    }

    fn split(&self) -> (Option<String>, String) {
        match self {
            Self::Field { field, source } => {
                let (inner, message) = source.split();
                let path = match inner {
                    Some(inner) => format!("{field}.{inner}"),
                    None => field.clone(),
                };
                (Some(path), message)
            }
            Self::Codec(err) => (
                err.field_path().map(str::to_string),
                err.root_cause().to_string(),
            ),
            other => (None, other.to_string()),
        }
    }
}

/// Thrown channel: faults short-circuit with `?`.
pub type Result<T> = std::result::Result<T, Fault>;

/// Returned channel: read/write error values composites may inspect.
pub type Outcome<T> = std::result::Result<T, CodecError>;
