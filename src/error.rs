use std::io;

use crate::writer::WriterState;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A writer method was called in a state that does not allow it.
    #[error("{op} failed: writer is {state}")]
    ProtocolState {
        op: &'static str,
        state: WriterState,
    },
    #[error("invalid event: {0}")]
    Validation(&'static str),
    /// The collector answered outside of `[200, 300)`.
    #[error("http status {status}")]
    Http { status: u16, body: Option<String> },
    #[error("transport: {0}")]
    Transport(#[from] io::Error),
    #[error("value {0} has no json representation")]
    InvalidValue(f64),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
