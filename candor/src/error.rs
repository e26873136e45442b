use std::fmt;
use std::str::Utf8Error;
use std::string::FromUtf8Error;

/// Coarse classification of every error this crate can produce.
///
/// These mirror the error codes other Ethereum libraries report, so callers can
/// branch on the category without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    MissingArgument,
    UnexpectedArgument,
    NumericFault,
    BufferOverrun,
    UnsupportedOperation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::MissingArgument => "MISSING_ARGUMENT",
            ErrorKind::UnexpectedArgument => "UNEXPECTED_ARGUMENT",
            ErrorKind::NumericFault => "NUMERIC_FAULT",
            ErrorKind::BufferOverrun => "BUFFER_OVERRUN",
            ErrorKind::UnsupportedOperation => "UNSUPPORTED_OPERATION",
        };
        write!(f, "{code}")
    }
}

/// Custom error implementation that describes possible
/// error states.
///
/// This is shared by a whole crate.
#[derive(Debug)]
pub enum Error {
    InvalidV,
    InvalidR,
    InvalidS,
    ZeroPrivKey,
    InvalidPrivKeyLength { got: usize, expected: usize },
    DecodePrivKey(secp256k1::Error),
    InvalidPublicKey(secp256k1::Error),
    /// A digest to sign or recover from that is not 32 bytes
    InvalidHashLength(usize),
    ParseRecoverableSignature(secp256k1::Error),
    RecoverSignature(secp256k1::Error),
    InvalidAddressLength { got: usize, expected: usize },
    InvalidUtf8(Utf8Error),
    /// A character that is not a hex digit, at this index of the digits
    InvalidHex(usize),
    OddHexLength(usize),
    InvalidEip55,
    InvalidSignatureLength,
    /// Structurally valid RLP that does not have the expected shape
    DeserializeRlp,
    /// An RLP length prefix points past the end of the input
    RlpTooShort { needed: usize, available: usize },
    /// A long-form RLP length carried leading zero bytes
    RlpNonCanonical,
    /// Bytes left over after the top level RLP item
    RlpTrailingBytes(usize),
    /// A raw transaction that is neither the 6 nor the 9 field legacy form
    InvalidTransactionLength(usize),
    /// A transaction field that does not fit its declared width
    InvalidTransactionField(&'static str),
    InvalidAbiType(String),
    InvalidSignature(String),
    InvalidAbiJson(String),
    MissingArgument { expected: usize, got: usize },
    UnexpectedArgument { expected: usize, got: usize },
    NumericFault { ty: String, value: String },
    BufferOverrun { offset: usize, length: usize, available: usize },
    TokenMismatch { expected: String, got: String },
    InvalidFixedBytesLength { ty: String, got: usize },
    InvalidArrayLength { ty: String, expected: usize, got: usize },
    UnknownFunction(String),
    UnknownEvent(String),
    UnknownSelector([u8; 4]),
    UnknownTopic([u8; 32]),
    DuplicateFragment(String),
    TopicMismatch { expected: usize, got: usize },
    NoConstructor,
    UnsupportedOperation(String),
}

impl Error {
    /// Classify this error into one of the [ErrorKind] categories
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingArgument { .. } => ErrorKind::MissingArgument,
            Error::UnexpectedArgument { .. } => ErrorKind::UnexpectedArgument,
            Error::NumericFault { .. } => ErrorKind::NumericFault,
            Error::BufferOverrun { .. } | Error::RlpTooShort { .. } => ErrorKind::BufferOverrun,
            Error::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidV => write!(f, "Invalid V value"),
            Error::InvalidR => write!(f, "Invalid R value"),
            Error::InvalidS => write!(f, "Invalid S value"),
            Error::ZeroPrivKey => write!(f, "Zero priv key cannot sign"),
            Error::InvalidPrivKeyLength { got, expected } => write!(
                f,
                "Invalid private key length, got {got} expected {expected}"
            ),
            Error::DecodePrivKey(_) => write!(f, "Failed to decode private key"),
            Error::InvalidPublicKey(_) => write!(f, "Failed to decode public key"),
            Error::InvalidHashLength(len) => {
                write!(f, "Message digest should be 32 bytes, got {len}")
            }
            Error::ParseRecoverableSignature(_) => {
                write!(f, "Failed to parse recoverable signature")
            }
            Error::RecoverSignature(_) => write!(f, "Failed to recover signature"),
            Error::InvalidAddressLength { got, expected } => {
                write!(f, "Invalid address length, got {got}, expected {expected}")
            }
            Error::InvalidUtf8(_) => write!(f, "Failed to parse bytes as utf8"),
            Error::InvalidHex(at) => write!(f, "Invalid hex character at {at}"),
            Error::OddHexLength(len) => write!(f, "Hex string has odd length {len}"),
            Error::InvalidEip55 => write!(f, "Invalid EIP-55 Address encoding"),
            Error::InvalidSignatureLength => write!(f, "Signature should be exactly 65 bytes long"),
            Error::DeserializeRlp => write!(f, "failed to deserialize using RLP-encoding"),
            Error::RlpTooShort { needed, available } => write!(
                f,
                "RLP data too short, needed {needed} bytes but only {available} available"
            ),
            Error::RlpNonCanonical => write!(f, "RLP length has leading zero bytes"),
            Error::RlpTrailingBytes(n) => write!(f, "{n} unconsumed bytes after RLP item"),
            Error::InvalidTransactionLength(n) => {
                write!(f, "Invalid raw transaction, expected 6 or 9 fields got {n}")
            }
            Error::InvalidTransactionField(name) => write!(f, "Invalid length for {name}"),
            Error::InvalidAbiType(ty) => write!(f, "Invalid ABI type {ty}"),
            Error::InvalidSignature(sig) => write!(f, "Invalid ABI signature {sig}"),
            Error::InvalidAbiJson(msg) => write!(f, "Invalid ABI JSON: {msg}"),
            Error::MissingArgument { expected, got } => {
                write!(f, "Missing argument, expected {expected} values got {got}")
            }
            Error::UnexpectedArgument { expected, got } => {
                write!(f, "Too many arguments, expected {expected} values got {got}")
            }
            Error::NumericFault { ty, value } => {
                write!(f, "Value {value} is out of range for {ty}")
            }
            Error::BufferOverrun {
                offset,
                length,
                available,
            } => write!(
                f,
                "Insufficient data, reading {length} bytes at offset {offset} of {available}"
            ),
            Error::TokenMismatch { expected, got } => {
                write!(f, "Invalid value for {expected}, got {got}")
            }
            Error::InvalidFixedBytesLength { ty, got } => {
                write!(f, "Invalid length {got} for {ty}")
            }
            Error::InvalidArrayLength { ty, expected, got } => write!(
                f,
                "Invalid array length for {ty}, expected {expected} got {got}"
            ),
            Error::UnknownFunction(name) => write!(f, "No function named {name}"),
            Error::UnknownEvent(name) => write!(f, "No event named {name}"),
            Error::UnknownSelector(sel) => write!(
                f,
                "No function with selector 0x{}",
                crate::utils::bytes_to_hex_str(sel)
            ),
            Error::UnknownTopic(topic) => write!(
                f,
                "No event with topic 0x{}",
                crate::utils::bytes_to_hex_str(topic)
            ),
            Error::DuplicateFragment(sig) => write!(f, "Duplicate ABI fragment {sig}"),
            Error::TopicMismatch { expected, got } => {
                write!(f, "Expected {expected} topics got {got}")
            }
            Error::NoConstructor => write!(f, "Interface has no constructor"),
            Error::UnsupportedOperation(what) => write!(f, "Unsupported operation: {what}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DecodePrivKey(inner) => Some(inner),
            Error::InvalidPublicKey(inner) => Some(inner),
            Error::ParseRecoverableSignature(inner) => Some(inner),
            Error::RecoverSignature(inner) => Some(inner),
            Error::InvalidUtf8(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Self {
        Error::InvalidUtf8(e)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(e: FromUtf8Error) -> Self {
        Error::InvalidUtf8(e.utf8_error())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidAbiJson(e.to_string())
    }
}

#[test]
fn kinds() {
    assert_eq!(
        Error::NumericFault {
            ty: "uint8".into(),
            value: "256".into()
        }
        .kind(),
        ErrorKind::NumericFault
    );
    assert_eq!(
        Error::RlpTooShort {
            needed: 2,
            available: 1
        }
        .kind(),
        ErrorKind::BufferOverrun
    );
    assert_eq!(Error::RlpNonCanonical.kind(), ErrorKind::InvalidArgument);
    assert_eq!(ErrorKind::MissingArgument.to_string(), "MISSING_ARGUMENT");
}
