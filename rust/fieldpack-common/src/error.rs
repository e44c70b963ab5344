use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// An unsigned value that does not fit the storage type it is being packed as.
    ///
    /// Reported as [`ErrorKind::InvalidArgument`], with the target type as the argument
    /// name and the offending value in the message.
    pub fn value_out_of_range(value: i64, target: &str, range: &str) -> Error {
        Error::invalid_arg(
            target,
            format!("value {value} is out of range {range} for type {target}"),
        )
    }

    pub fn buffer_overflow(position: usize, requested: usize, capacity: usize) -> Error {
        Error(
            ErrorKind::BufferOverflow {
                position,
                requested,
                capacity,
            }
            .into(),
        )
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }

    pub fn is_buffer_overflow(&self) -> bool {
        matches!(self.kind(), ErrorKind::BufferOverflow { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error(
        "buffer overflow: writing {requested} bytes at position {position} \
         exceeds capacity {capacity}"
    )]
    BufferOverflow {
        position: usize,
        requested: usize,
        capacity: usize,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
