use std::fmt;
use std::io;

/// Error type for the whole crate.
///
/// The factoring driver recovers internally from algorithmic failure
/// (a Pollard rho attempt that goes nowhere falls back to trial division);
/// everything listed here is surfaced to the caller unchanged.
#[derive(Debug)]
pub enum Error {
    /// Malformed numeric or polynomial input.
    Parse(String),
    /// An argument outside the operation's domain: modulus below 1,
    /// division by zero, 0^0, an element with no inverse.
    Domain(String),
    /// A BigInt value does not fit the requested machine word.
    Overflow(String),
    /// Subtraction below zero, or decrement of zero.
    Underflow(String),
    /// A factor table is missing or fails verification.
    FactorTable(String),
    /// I/O failure while searching for or reading a factor table.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(msg) => write!(f, "parse error: {}", msg),
            Error::Domain(msg) => write!(f, "domain error: {}", msg),
            Error::Overflow(msg) => write!(f, "overflow: {}", msg),
            Error::Underflow(msg) => write!(f, "underflow: {}", msg),
            Error::FactorTable(msg) => write!(f, "factor table: {}", msg),
            Error::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
