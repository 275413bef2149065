use thiserror::Error;

/// Alias for `Result<T, wirebson::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `wirebson` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "error at key \"{key}\": ")?;
        } else if let Some(index) = self.index {
            write!(f, "error at array index {index}: ")?;
        }

        write!(f, "{}", self.kind)
    }
}

/// The types of errors that can occur in the `wirebson` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed BSON bytes were encountered.
    #[error("malformed BSON: {message}")]
    #[non_exhaustive]
    InvalidBson { message: String },

    /// A caller-supplied value failed a precondition.
    #[error("invalid argument: {message}")]
    #[non_exhaustive]
    InvalidArgument { message: String },

    /// A value could not satisfy the shape requested of it.
    #[error("type mismatch: {message}")]
    #[non_exhaustive]
    TypeMismatch { message: String },

    /// A buffer invariant was violated. Seeing this error indicates a bug in
    /// this crate.
    #[error("internal error: {message}")]
    #[non_exhaustive]
    Internal { message: String },

    /// A recognized element type that this crate does not provide a value
    /// representation for.
    #[error("unsupported element type {element_type:#04x}")]
    #[non_exhaustive]
    UnsupportedType { element_type: u8 },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            index: None,
        }
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        if self.key.is_none() {
            self.key = Some(key.into());
        }
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        if self.key.is_none() && self.index.is_none() {
            self.index = Some(index);
        }
        self
    }

    pub(crate) fn invalid_bson(message: impl ToString) -> Self {
        ErrorKind::InvalidBson {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn invalid_argument(message: impl ToString) -> Self {
        ErrorKind::InvalidArgument {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn type_mismatch(message: impl ToString) -> Self {
        ErrorKind::TypeMismatch {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn internal(message: impl ToString) -> Self {
        ErrorKind::Internal {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn unsupported_type(element_type: u8) -> Self {
        ErrorKind::UnsupportedType { element_type }.into()
    }

    #[cfg(test)]
    pub(crate) fn is_invalid_bson(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidBson { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_type_mismatch(&self) -> bool {
        matches!(self.kind, ErrorKind::TypeMismatch { .. })
    }
}

impl serde::ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::invalid_argument(msg)
    }
}

impl serde::de::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::type_mismatch(msg)
    }
}
