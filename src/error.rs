//! Error taxonomy per spec §7.
//!
//! Only [`PrinterError::StreamTruncation`] and [`PrinterError::MissingEncoding`]
//! ever escape [`crate::dispatch::Interpreter::run`]. Every other condition
//! (unknown command, unknown graphics opcode, out-of-range parameter) is
//! absorbed by the dispatcher: it logs at `warn` and keeps going, so that
//! any valid-looking printer byte stream still produces a PDF.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrinterError {
    /// A command declared a parameter block longer than the remaining
    /// stream. Fatal: the partial page is finalized and the run stops.
    #[error("stream truncated mid-command after {consumed} of {declared} declared parameter bytes")]
    StreamTruncation { declared: usize, consumed: usize },

    /// The configuration named a character table the encoding registry
    /// does not know. Fatal at startup.
    #[error("unknown character encoding table: {0}")]
    MissingEncoding(String),

    /// The input stream could not be read.
    #[error("unreadable input: {0}")]
    UnreadableInput(#[source] std::io::Error),

    /// The output destination could not be written.
    #[error("unwritable output: {0}")]
    UnwritableOutput(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PrinterError>;
