//! Parse error types.
//!
//! Every fallible operation in the crate surfaces one of these error kinds
//! together with the byte offset it was detected at. Allocation failure is a
//! reportable error here, not a process abort: the growable structures the
//! parser manages itself (table storage, string scratch) reserve through
//! `try_reserve` and let the caller decide what to do.

use std::fmt;

/// Error kinds for parsing and table allocation.
///
/// Using a fieldless enum instead of String eliminates heap allocation for
/// error messages; the offset lives on [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Backing storage could not be allocated or grown.
    AllocationFailure = 0,
    /// Input ended inside an unfinished construct.
    UnexpectedEndOfInput,
    /// A byte that no production accepts at this position.
    UnexpectedToken,
    /// A backslash escape outside the JSON escape set, or an unpaired
    /// `\uXXXX` surrogate.
    InvalidEscapeSequence,
    /// A number token with no digits, or malformed fraction/exponent syntax.
    InvalidNumberFormat,
    /// Bracket nesting exceeded the configured depth limit.
    NestingTooDeep,
}

impl ErrorKind {
    /// Get a human-readable message for this error kind.
    pub fn message(self) -> &'static str {
        match self {
            Self::AllocationFailure => "allocation failure",
            Self::UnexpectedEndOfInput => "unexpected end of input",
            Self::UnexpectedToken => "unexpected token",
            Self::InvalidEscapeSequence => "invalid escape sequence",
            Self::InvalidNumberFormat => "invalid number format",
            Self::NestingTooDeep => "nesting too deep",
        }
    }
}

/// Error returned when parsing fails.
///
/// `offset` is the byte position in the input at which the error was
/// detected. For [`ErrorKind::AllocationFailure`] raised by a bare table
/// operation (outside any parse) the offset is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind.message(), self.offset)
    }
}

impl std::error::Error for ParseError {}
