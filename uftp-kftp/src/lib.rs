//! # uftp-kftp
//!
//! File streaming over the reliable datagram channel.
//!
//! A transfer is a length-prefixed byte stream: the first reliable message
//! carries a 4-byte header announcing the file size followed by the first
//! slice of content, every later message carries content only. The length
//! prefix is the sole terminator; there is no trailer or framing character.
//! Both sides stream, holding at most one message worth of file bytes in
//! memory at a time.

mod header;

pub use header::{KftpHeader, KFTP_HEADER_SIZE};

use std::io::{self, Read, Seek, SeekFrom, Write};

use thiserror::Error;
use tracing::debug;
use uftp_rudp::{Endpoint, RudpChannel, RudpError, MAX_DATA_SIZE, MAX_PAYLOAD_SIZE};

pub type Result<T> = std::result::Result<T, KftpError>;

#[derive(Debug, Error)]
pub enum KftpError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Transport(#[from] RudpError),

    #[error("file of {size} bytes exceeds the transfer size limit")]
    FileTooLarge { size: u64 },

    #[error("file shrank mid-transfer: wanted {expected} bytes, read {got}")]
    FileChanged { expected: usize, got: usize },

    #[error("transfer header truncated: {len} bytes")]
    TruncatedHeader { len: usize },

    #[error("transfer header data_size {0} is negative")]
    InvalidSize(i32),

    #[error("empty message mid-transfer")]
    EmptyChunk,
}

/// Stream the contents of `file` to the peer.
///
/// The size is fixed up front by seeking to the end and back; a short read
/// afterwards means the file changed underneath us and aborts the transfer.
pub fn send_file<E, R>(channel: &mut RudpChannel<E>, file: &mut R) -> Result<()>
where
    E: Endpoint,
    R: Read + Seek,
{
    let file_size = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(0))?;
    if file_size > i32::MAX as u64 {
        return Err(KftpError::FileTooLarge { size: file_size });
    }
    let file_size = file_size as usize;

    let header = KftpHeader {
        data_size: file_size as i32,
    };

    // The first message carries the header, so it has reduced capacity for
    // file content.
    let mut chunk = [0u8; MAX_DATA_SIZE];
    let prefix = header.encode_into(&mut chunk)?;
    let first_content = file_size.min(MAX_DATA_SIZE - prefix);
    read_exactly(file, &mut chunk[prefix..prefix + first_content])?;
    channel.send(&chunk[..prefix + first_content])?;

    let mut remaining = file_size - first_content;
    while remaining > 0 {
        debug!(
            percent = 100 - remaining * 100 / file_size,
            remaining, "sending file"
        );

        let want = remaining.min(MAX_DATA_SIZE);
        read_exactly(file, &mut chunk[..want])?;
        channel.send(&chunk[..want])?;
        remaining -= want;
    }

    Ok(())
}

/// Receive one streamed file from the peer into `file`.
///
/// The first message's header fixes the total size; content is appended
/// until exactly that many bytes have arrived.
pub fn recv_file<E, W>(channel: &mut RudpChannel<E>, file: &mut W) -> Result<()>
where
    E: Endpoint,
    W: Write,
{
    let mut buf = [0u8; MAX_PAYLOAD_SIZE];
    let received = channel.recv(&mut buf)?;

    let header = KftpHeader::decode(&buf[..received])?;
    let total = header.data_size as usize;

    let first_content = received - KFTP_HEADER_SIZE;
    file.write_all(&buf[KFTP_HEADER_SIZE..received])?;
    let mut remaining = total.saturating_sub(first_content);

    while remaining > 0 {
        debug!(
            percent = 100 - remaining * 100 / total,
            remaining, "receiving file"
        );

        let received = channel.recv(&mut buf)?;
        if received == 0 {
            return Err(KftpError::EmptyChunk);
        }
        file.write_all(&buf[..received])?;
        remaining = remaining.saturating_sub(received);
    }

    Ok(())
}

// `Read::read_exact` reports plain `UnexpectedEof`; the distinction between
// transport problems and the file changing size matters here.
fn read_exactly<R: Read>(file: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(KftpError::FileChanged {
                expected: buf.len(),
                got: filled,
            });
        }
        filled += n;
    }
    Ok(())
}
