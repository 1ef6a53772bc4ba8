//! Errors that can occur while registering schemas, and while packing or
//! unpacking values.
use thiserror::Error;

/// Result of packing, unpacking or parsing a value. This is a simple wrapper
/// around `Result` that fixes the error type to be [AbiError].
pub type ParseResult<T> = Result<T, AbiError>;

/// Coarse classification of an [AbiError]. Callers that only care about
/// which class of failure occurred, e.g., to decide whether to ask the user
/// for corrected input, should match on this rather than on [AbiError].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A struct field was absent from the input record.
    MissingField,
    /// A type name is neither a primitive, a struct, nor an array of either.
    UnknownType,
    /// A numeric literal does not fit in the target type.
    Overflow,
    /// A literal is malformed, e.g., bad hex, an invalid symbol, or the wrong
    /// JSON shape for the declared type.
    FormatError,
    /// The ABI JSON is malformed, or the contract has no registered ABI.
    SchemaError,
    /// Reading or writing the underlying bytes failed, e.g., a short read.
    UnderlyingCodecError,
    /// Struct nesting is deeper than the configured maximum.
    DepthExceeded,
}

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("Missing field '{field}' of struct '{structure}'.")]
    MissingField { structure: String, field: String },
    #[error("Unknown type '{0}'.")]
    UnknownType(String),
    #[error("Contract '{contract}' declares no action '{action}' with a known struct.")]
    UnknownAction { contract: String, action: String },
    #[error("Value {value} is out of range for type '{ty}'.")]
    Overflow { ty: String, value: String },
    #[error("Invalid value {value} for type '{ty}': {reason}.")]
    Format {
        ty:     String,
        value:  String,
        reason: String,
    },
    #[error("Malformed JSON arguments: {0}")]
    MalformedArguments(#[source] serde_json::Error),
    #[error("Malformed ABI: {0}")]
    MalformedAbi(#[source] serde_json::Error),
    #[error("No ABI is registered for contract '{0}'.")]
    UnregisteredContract(String),
    #[error("Byte codec failure: {0}")]
    Codec(#[from] std::io::Error),
    #[error("Struct nesting exceeds the maximum depth of {0}.")]
    DepthExceeded(usize),
    #[error("In field '{path}': {source}")]
    Field {
        path:   String,
        #[source]
        source: Box<AbiError>,
    },
}

impl AbiError {
    pub(crate) fn overflow(ty: impl Into<String>, value: impl ToString) -> Self {
        AbiError::Overflow {
            ty:    ty.into(),
            value: value.to_string(),
        }
    }

    pub(crate) fn format(
        ty: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AbiError::Format {
            ty:     ty.into(),
            value:  value.into(),
            reason: reason.into(),
        }
    }

    /// Attach the name of the struct field whose value caused the error.
    /// Errors that already carry a field path get the new name prepended, so
    /// that nested failures read as `outer.inner`.
    pub(crate) fn in_field(self, field: &str) -> Self {
        match self {
            AbiError::Field { path, source } => AbiError::Field {
                path: format!("{}.{}", field, path),
                source,
            },
            other => AbiError::Field {
                path:   field.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The class of the error. Field context is looked through.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AbiError::MissingField { .. } => ErrorKind::MissingField,
            AbiError::UnknownType(_) | AbiError::UnknownAction { .. } => ErrorKind::UnknownType,
            AbiError::Overflow { .. } => ErrorKind::Overflow,
            AbiError::Format { .. } | AbiError::MalformedArguments(_) => ErrorKind::FormatError,
            AbiError::MalformedAbi(_) | AbiError::UnregisteredContract(_) => ErrorKind::SchemaError,
            AbiError::Codec(_) => ErrorKind::UnderlyingCodecError,
            AbiError::DepthExceeded(_) => ErrorKind::DepthExceeded,
            AbiError::Field { source, .. } => source.kind(),
        }
    }

    /// The dotted path of struct fields leading to the failure, if the error
    /// arose inside a struct.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            AbiError::Field { path, .. } => Some(path),
            _ => None,
        }
    }
}
