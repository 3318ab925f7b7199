//! Length-prefix codec for file transfers.
//!
//! Only the header needs a codec: the file content itself travels as raw
//! bytes spread over successive reliable messages.

use crate::{KftpError, Result};

/// Encoded header size in bytes.
pub const KFTP_HEADER_SIZE: usize = 4;

/// Transfer header carried at the start of the first reliable message,
/// announcing how many file bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KftpHeader {
    /// Total file size in bytes.
    pub data_size: i32,
}

impl KftpHeader {
    /// Encode into the front of `buf`, returning the encoded length.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < KFTP_HEADER_SIZE {
            return Err(KftpError::TruncatedHeader { len: buf.len() });
        }
        buf[..KFTP_HEADER_SIZE].copy_from_slice(&self.data_size.to_be_bytes());
        Ok(KFTP_HEADER_SIZE)
    }

    /// Decode from the front of `buf`, rejecting negative sizes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < KFTP_HEADER_SIZE {
            return Err(KftpError::TruncatedHeader { len: buf.len() });
        }
        let data_size = i32::from_be_bytes(buf[..KFTP_HEADER_SIZE].try_into().unwrap());
        if data_size < 0 {
            return Err(KftpError::InvalidSize(data_size));
        }
        Ok(Self { data_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let header = KftpHeader { data_size: 987_654 };
        let mut buf = [0u8; KFTP_HEADER_SIZE];
        assert_eq!(header.encode_into(&mut buf).unwrap(), KFTP_HEADER_SIZE);
        assert_eq!(KftpHeader::decode(&buf).unwrap(), header);
    }

    #[test]
    fn encodes_big_endian() {
        let header = KftpHeader {
            data_size: 0x01020304,
        };
        let mut buf = [0u8; KFTP_HEADER_SIZE];
        header.encode_into(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn rejects_short_buffers() {
        let header = KftpHeader { data_size: 1 };
        let mut buf = [0u8; KFTP_HEADER_SIZE - 1];
        assert!(matches!(
            header.encode_into(&mut buf),
            Err(KftpError::TruncatedHeader { .. })
        ));
        assert!(matches!(
            KftpHeader::decode(&buf),
            Err(KftpError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn rejects_negative_size() {
        let buf = (-5i32).to_be_bytes();
        assert!(matches!(
            KftpHeader::decode(&buf),
            Err(KftpError::InvalidSize(-5))
        ));
    }
}
