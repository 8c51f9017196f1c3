/*!
 * Error types for descriptor construction, frame encoding/decoding and candump parsing
 */

use thiserror::Error;

/// Errors raised while building descriptors or running the codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A signal, message or database definition breaks a descriptor invariant.
    /// Only ever raised at construction time.
    #[error("invalid descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    /// A physical value fell outside the signal's declared bounds.
    #[error("signal '{signal}' value {value} outside [{minimum}, {maximum}]")]
    RangeViolation {
        signal: String,
        value: f64,
        minimum: f64,
        maximum: f64,
    },

    #[error("message '{message}' has no signal named '{signal}'")]
    UnknownSignal { message: String, signal: String },

    #[error("no message with id 0x{0:X}")]
    UnknownMessage(u32),

    #[error("no message named '{0}'")]
    UnknownMessageName(String),

    /// The received frame carries fewer payload bytes than the message declares.
    #[error("frame 0x{id:X} too short: need {expected} bytes, got {actual}")]
    ShortFrame { id: u32, expected: u8, actual: u8 },
}

impl CodecError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        CodecError::InvalidDescriptor {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while parsing a candump text line.
#[derive(Debug, Error)]
pub enum FrameParseError {
    #[error("missing {field} in line '{line}'")]
    MissingField { field: &'static str, line: String },

    #[error("bad timestamp '{0}'")]
    Timestamp(String),

    #[error("bad CAN id: {0}")]
    Id(#[source] std::num::ParseIntError),

    #[error("CAN id 0x{0:X} does not fit in 29 bits")]
    IdOutOfRange(u32),

    #[error("bad payload hex '{0}'")]
    Payload(String),

    #[error("payload of {0} bytes exceeds classic CAN maximum of 8")]
    PayloadTooLong(usize),
}
