//! Error and status types shared by fields, messages and protocol layers

use std::fmt;

use thiserror::Error;

/// Failures reported by field, message and layer operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// Input ended before a complete value or frame was available
    #[error("not enough data{}", fmt_missing(.missing))]
    NotEnoughData {
        /// Minimum number of additional bytes required, when known
        missing: Option<usize>,
    },

    /// Framing mismatch (sync pattern, checksum, malformed size)
    #[error("protocol error")]
    ProtocolError,

    /// Message identifier is not part of the catalog
    #[error("invalid message id")]
    InvalidMsgId,

    /// Message or field contents are not acceptable
    #[error("invalid message data")]
    InvalidMsgData,

    /// The message slot is occupied or allocation failed
    #[error("message allocation failure")]
    MsgAllocFailure,

    /// Output buffer or fixed storage is too small
    #[error("buffer overflow")]
    BufferOverflow,

    /// The operation is not provided by this message or layer
    #[error("operation not supported")]
    NotSupported,
}

fn fmt_missing(missing: &Option<usize>) -> String {
    match missing {
        Some(bytes) => format!(": at least {bytes} more bytes required"),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for a `NotEnoughData` with a known minimum shortfall
    #[must_use]
    pub const fn missing(bytes: usize) -> Self {
        Self::NotEnoughData {
            missing: Some(bytes),
        }
    }

    /// Boundary status code for this error
    #[must_use]
    pub const fn status(self) -> ErrorStatus {
        match self {
            Self::NotEnoughData { .. } => ErrorStatus::NotEnoughData,
            Self::ProtocolError => ErrorStatus::ProtocolError,
            Self::InvalidMsgId => ErrorStatus::InvalidMsgId,
            Self::InvalidMsgData => ErrorStatus::InvalidMsgData,
            Self::MsgAllocFailure => ErrorStatus::MsgAllocFailure,
            Self::BufferOverflow => ErrorStatus::BufferOverflow,
            Self::NotSupported => ErrorStatus::NotSupported,
        }
    }

    /// Whether retrying with more input can succeed
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::NotEnoughData { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Successful write outcome
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteStatus {
    /// All bytes of the frame are final
    Complete,
    /// Placeholders were written; an `update` pass over the written bytes is required
    UpdateRequired,
}

impl WriteStatus {
    /// Combine the status of an inner write with this layer's own
    pub(crate) const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Complete, Self::Complete) => Self::Complete,
            _ => Self::UpdateRequired,
        }
    }
}

/// Flat status code observable at the protocol boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorStatus {
    /// Operation completed
    Success,
    /// Write completed with placeholders; call `update`
    UpdateRequired,
    /// More input is required
    NotEnoughData,
    /// Framing mismatch
    ProtocolError,
    /// Unknown message identifier
    InvalidMsgId,
    /// Unacceptable message contents
    InvalidMsgData,
    /// Message slot occupied or allocation failed
    MsgAllocFailure,
    /// Output space exhausted
    BufferOverflow,
    /// Operation not provided
    NotSupported,
}

/// Coarse classification of a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// No failure
    None,
    /// Input too short, retry with more bytes
    Insufficiency,
    /// Input does not follow the protocol
    Malformed,
    /// Storage or allocation exhausted
    Resource,
    /// A follow-up call is required
    Deferred,
    /// Capability missing
    Unsupported,
}

impl ErrorStatus {
    /// Status of a read-style result
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => err.status(),
        }
    }

    /// Status of a write-style result
    #[must_use]
    pub fn of_write(result: &Result<WriteStatus>) -> Self {
        match result {
            Ok(WriteStatus::Complete) => Self::Success,
            Ok(WriteStatus::UpdateRequired) => Self::UpdateRequired,
            Err(err) => err.status(),
        }
    }

    /// Error class of this status
    #[must_use]
    pub const fn class(self) -> ErrorClass {
        match self {
            Self::Success => ErrorClass::None,
            Self::NotEnoughData => ErrorClass::Insufficiency,
            Self::ProtocolError | Self::InvalidMsgId | Self::InvalidMsgData => {
                ErrorClass::Malformed
            }
            Self::MsgAllocFailure | Self::BufferOverflow => ErrorClass::Resource,
            Self::UpdateRequired => ErrorClass::Deferred,
            Self::NotSupported => ErrorClass::Unsupported,
        }
    }

    /// Whether the status denotes a completed operation
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<Error> for ErrorStatus {
    fn from(err: Error) -> Self {
        err.status()
    }
}

impl From<WriteStatus> for ErrorStatus {
    fn from(status: WriteStatus) -> Self {
        match status {
            WriteStatus::Complete => Self::Success,
            WriteStatus::UpdateRequired => Self::UpdateRequired,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::UpdateRequired => "UpdateRequired",
            Self::NotEnoughData => "NotEnoughData",
            Self::ProtocolError => "ProtocolError",
            Self::InvalidMsgId => "InvalidMsgId",
            Self::InvalidMsgData => "InvalidMsgData",
            Self::MsgAllocFailure => "MsgAllocFailure",
            Self::BufferOverflow => "BufferOverflow",
            Self::NotSupported => "NotSupported",
        };
        write!(f, "{name}")
    }
}
