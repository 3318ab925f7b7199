//! Error types for uftp-rudp.

use std::io;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RudpError>;

#[derive(Debug, Error)]
pub enum RudpError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("payload chunk of {size} bytes does not fit a single frame")]
    PayloadTooLarge { size: usize },

    #[error("no ack within {timeout:?}, giving up")]
    SenderTimeout { timeout: Duration },

    #[error("no in-order message within {timeout:?}")]
    ReceiverTimeout { timeout: Duration },

    #[error("buffer of {capacity} bytes too small, need {needed}")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("frame truncated: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },

    #[error("header data_size {data_size} invalid for a {len} byte frame")]
    InvalidDataSize { data_size: i32, len: usize },
}
