use crate::constants::limits;
use crate::exception::ExceptionCode;

/// The single error channel of every session and master operation
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// An I/O error occurred on the serial link. The session is faulted afterwards.
    #[error("i/o error: {0}")]
    Io(std::io::ErrorKind),
    /// The slave replied with an exception response
    #[error("slave exception: {0}")]
    Exception(ExceptionCode),
    /// The request was rejected before anything was written to the link
    #[error("invalid request: {0}")]
    BadRequest(#[from] InvalidRequest),
    /// The received bytes do not form a valid RTU frame
    #[error("bad frame: {0}")]
    BadFrame(#[from] FrameParseError),
    /// The frame was valid, but it is not a valid response to the request
    #[error("bad response: {0}")]
    BadResponse(#[from] AduParseError),
    /// An internal error that indicates a bug in the library
    #[error("internal error: {0}")]
    Internal(#[from] InternalError),
    /// No complete response arrived before the read timeout elapsed
    #[error("timeout occurred before receiving a complete response from the slave")]
    ResponseTimeout,
    /// The session has not been opened
    #[error("session is not open")]
    NoConnection,
    /// The session is already open and must be closed first
    #[error("session is already open, close it first")]
    AlreadyOpen,
    /// Another request is in flight and the session is configured to fail fast
    #[error("another request is in flight")]
    SessionBusy,
    /// A previous transport error faulted the session
    #[error("session faulted after a transport error, close and re-open it")]
    SessionFaulted,
}

impl From<std::io::Error> for RequestError {
    fn from(err: std::io::Error) -> Self {
        RequestError::Io(err.kind())
    }
}

impl From<ExceptionCode> for RequestError {
    fn from(err: ExceptionCode) -> Self {
        RequestError::Exception(err)
    }
}

impl From<scursor::ReadError> for RequestError {
    fn from(_: scursor::ReadError) -> Self {
        RequestError::BadResponse(AduParseError::InsufficientBytes)
    }
}

impl From<scursor::TrailingBytes> for RequestError {
    fn from(x: scursor::TrailingBytes) -> Self {
        RequestError::BadResponse(AduParseError::TrailingBytes(x.count.get()))
    }
}

impl RequestError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Io(_) => ErrorKind::Transport,
            RequestError::Exception(_) => ErrorKind::SlaveException,
            RequestError::BadRequest(_) => ErrorKind::InvalidArgument,
            RequestError::BadFrame(FrameParseError::FrameTooShort(_)) => ErrorKind::FrameTooShort,
            RequestError::BadFrame(FrameParseError::FrameTooLong(_, _)) => ErrorKind::FrameTooLong,
            RequestError::BadFrame(FrameParseError::CrcMismatch { .. }) => ErrorKind::CrcMismatch,
            RequestError::BadResponse(AduParseError::AddressMismatch { .. }) => {
                ErrorKind::AddressMismatch
            }
            RequestError::BadResponse(AduParseError::FunctionCodeMismatch { .. }) => {
                ErrorKind::FunctionCodeMismatch
            }
            RequestError::BadResponse(_) => ErrorKind::BadResponse,
            RequestError::Internal(_) => ErrorKind::Internal,
            RequestError::ResponseTimeout => ErrorKind::Timeout,
            RequestError::NoConnection => ErrorKind::NotOpen,
            RequestError::AlreadyOpen => ErrorKind::AlreadyOpen,
            RequestError::SessionBusy => ErrorKind::SessionBusy,
            RequestError::SessionFaulted => ErrorKind::SessionFaulted,
        }
    }

    /// True if the error leaves the session faulted
    pub fn is_fatal(&self) -> bool {
        matches!(self, RequestError::Io(_))
    }
}

/// Coarse classification of a [`RequestError`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// link-level I/O failure
    Transport,
    /// no or partial response within the deadline
    Timeout,
    /// the CRC of the response did not match
    CrcMismatch,
    /// the response was shorter than the smallest possible frame
    FrameTooShort,
    /// the response announced a length above the RTU frame ceiling
    FrameTooLong,
    /// the response came from another slave address
    AddressMismatch,
    /// the response carried another function code
    FunctionCodeMismatch,
    /// the response body did not match the request
    BadResponse,
    /// the slave rejected the request with an exception code
    SlaveException,
    /// the caller violated the request contract
    InvalidArgument,
    /// another request is in flight
    SessionBusy,
    /// a transport error faulted the session
    SessionFaulted,
    /// the session is not open
    NotOpen,
    /// the session is already open
    AlreadyOpen,
    /// a bug in the library
    Internal,
}

/// Diagnostic snapshot of the last failure, bounded to
/// [`MAX_ERROR_MESSAGE_LENGTH`](crate::constants::limits::MAX_ERROR_MESSAGE_LENGTH) bytes of UTF-8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// classification of the failure
    pub kind: ErrorKind,
    /// human readable description, never longer than the limit
    pub message: String,
}

impl ErrorReport {
    /// Create a report, truncating the message on a character boundary if required
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.len() > limits::MAX_ERROR_MESSAGE_LENGTH {
            let mut end = limits::MAX_ERROR_MESSAGE_LENGTH;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }
        Self { kind, message }
    }
}

impl From<&RequestError> for ErrorReport {
    fn from(err: &RequestError) -> Self {
        ErrorReport::new(err.kind(), err.to_string())
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors that occur while delimiting or validating an RTU frame
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameParseError {
    /// Fewer bytes than the minimum frame (address, function code, CRC)
    #[error("frame of {0} bytes is too short to be valid")]
    FrameTooShort(usize),
    /// Frame length exceeds the maximum allowed size (actual, maximum)
    #[error("frame length ({0}) exceeds the maximum allowed length ({1})")]
    FrameTooLong(usize, usize),
    /// Received CRC does not match the CRC computed over the frame
    #[error("received crc {received:#06X} does not match calculated crc {expected:#06X}")]
    CrcMismatch {
        /// CRC found in the frame
        received: u16,
        /// CRC computed over the frame
        expected: u16,
    },
}

/// Errors that occur while matching a valid frame against the request
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AduParseError {
    /// Response came from a different slave address
    #[error("expected response from slave {expected:#04X} but received {received:#04X}")]
    AddressMismatch {
        /// address of the request
        expected: u8,
        /// address in the response
        received: u8,
    },
    /// Response carried an unexpected function code
    #[error("expected function code {expected:#04X} but received {received:#04X}")]
    FunctionCodeMismatch {
        /// function code of the request
        expected: u8,
        /// function code in the response
        received: u8,
    },
    /// Response is too short to be valid
    #[error("response is too short to be valid")]
    InsufficientBytes,
    /// Byte count doesn't match what is expected based on request (expected, actual)
    #[error("byte count ({1}) doesn't match what is expected based on request ({0})")]
    RequestByteCountMismatch(usize, usize),
    /// Response contains extra trailing bytes
    #[error("response contains {0} extra trailing bytes")]
    TrailingBytes(usize),
    /// A parameter expected to be echoed in the reply did not match
    #[error("a parameter expected to be echoed in the reply did not match")]
    ReplyEchoMismatch,
}

/// Errors that result from bad request parameters
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    /// Request contains a count of zero
    #[error("request contains a count of zero")]
    CountOfZero,
    /// Count exceeds the maximum for the request type (count, max)
    #[error("the request count of {0} exceeds maximum allowed count of {1} for this type")]
    CountTooBigForType(usize, u16),
    /// Start and count overflow the 16-bit address space (start, count)
    #[error("start == {0} and count == {1} would overflow the representation of u16")]
    AddressOverflow(u16, u16),
    /// Payload exceeds the RTU frame ceiling (length, max)
    #[error("payload of {0} bytes exceeds the maximum of {1} bytes")]
    PayloadTooLarge(usize, usize),
    /// CRC byte order token is not `<` or `>`
    #[error("invalid crc byte order, use '<' (little endian) or '>' (big endian)")]
    UnknownCrcOrder,
    /// A serial link parameter could not be parsed
    #[error("invalid serial parameter: {0}")]
    BadSerialParameter(&'static str),
}

/// Errors that indicate a bug in the library
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    /// Attempted to write more bytes than allowed (requested, remaining)
    #[error("attempted to write {0} bytes with {1} bytes remaining")]
    InsufficientWriteSpace(usize, usize),
    /// Attempted to read more bytes than present (requested, remaining)
    #[error("attempted to read {0} bytes with only {1} remaining")]
    InsufficientBytesForRead(usize, usize),
}
