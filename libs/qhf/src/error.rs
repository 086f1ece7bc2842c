use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CursorError {
    #[error(
        "read out of bounds at offset {offset:?} (wanted {wanted:?} bytes, buffer is {length:?} bytes)"
    )]
    #[diagnostic(code(libqhf::out_of_bounds))]
    OutOfBounds {
        offset: usize,
        wanted: usize,
        length: usize,
    },

    #[error(
        "implausible length prefix at offset {offset:?} (declared {received:?} bytes, {remaining:?} bytes remain)"
    )]
    #[diagnostic(code(libqhf::invalid_length))]
    InvalidLength {
        offset: usize,
        received: u32,
        remaining: usize,
    },

    #[error("invalid UTF-8 sequence at offset {offset:?}")]
    #[diagnostic(code(libqhf::invalid_encoding))]
    InvalidEncoding { offset: usize },
}

#[derive(Error, Diagnostic, Debug)]
pub enum DecodeError {
    #[error("incorrect magic bytes (expected \"QHF\", received {received:?})")]
    #[diagnostic(code(libqhf::bad_magic))]
    BadMagic { received: [u8; 3] },

    #[error("error decoding the history header")]
    #[diagnostic(code(libqhf::header_error))]
    Header(#[source] CursorError),

    #[error("error decoding message {index:?}")]
    #[diagnostic(code(libqhf::message_error))]
    Message {
        index: usize,
        #[source]
        source: CursorError,
    },
}
