//! Error type shared by every layer of the crate.
use alloc::string::String;

use thiserror::Error;

use crate::statemachine::JtagState;

#[derive(Debug, Error)]
pub enum Error {
    /// A D2XX call on the bridge chip returned a non-OK status.
    #[cfg(feature = "std")]
    #[error("FTDI driver error: {0}")]
    Ftdi(#[from] libftd2xx::FtStatus),

    #[error("no bridge device matched the selector")]
    DeviceNotFound,

    #[error("bridge device is disconnected")]
    Disconnected,

    #[error("short write: {actual} of {expected} bytes accepted")]
    ShortWrite { expected: usize, actual: usize },

    #[error("short read: {actual} of {expected} bytes received")]
    ShortRead { expected: usize, actual: usize },

    #[error("read of {requested} bytes exceeds the per-transfer ceiling of {max}")]
    ReadTooLarge { requested: usize, max: usize },

    /// A TAP operation was issued from a state it is not defined for.  `actual` is `None` once
    /// a failed transfer has left the TAP state indeterminate.
    #[error("{operation} requires {expected:?}, TAP is in {actual:?}")]
    IllegalState {
        operation: &'static str,
        expected: JtagState,
        actual: Option<JtagState>,
    },

    /// A fixed clock sequence would not take the TAP to the state its operation is
    /// documented to reach.
    #[error("{operation} would leave the TAP in {actual:?} instead of {expected:?}")]
    WrongSuccessor {
        operation: &'static str,
        expected: JtagState,
        actual: Option<JtagState>,
    },

    #[error("target code {0:#04x} does not fit the 7-bit selector")]
    TargetCodeOutOfRange(u8),

    #[error("read unit of {0} bytes is not a positive multiple of the 4-byte word")]
    InvalidReadUnit(usize),

    #[error("unknown access target `{0}`")]
    UnknownTarget(String),
}

pub type Result<T> = core::result::Result<T, Error>;
