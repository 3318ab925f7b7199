//! Wire codec for reliable datagram frames.
//!
//! Every frame starts with a fixed 12-byte header of three big-endian signed
//! 32-bit fields, followed by exactly `data_size` payload bytes. A frame with
//! `seq_num == 0` is an acknowledgement: it carries no payload and its
//! `ack_num` names the acknowledged sequence. Real payloads are numbered
//! from 1.

use crate::error::{Result, RudpError};
use crate::{HEADER_SIZE, MAX_DATA_SIZE};

/// Fixed-size frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RudpHeader {
    pub seq_num: i32,
    pub ack_num: i32,
    /// Payload length in bytes, `0..=MAX_DATA_SIZE` on a valid frame.
    pub data_size: i32,
}

impl RudpHeader {
    /// Header for a data frame carrying `data_size` payload bytes.
    pub fn data(seq_num: i32, data_size: i32) -> Self {
        Self {
            seq_num,
            ack_num: 0,
            data_size,
        }
    }

    /// Header for an ack frame acknowledging `seq`.
    pub fn ack(seq: i32) -> Self {
        Self {
            seq_num: 0,
            ack_num: seq,
            data_size: 0,
        }
    }

    /// Ack frames are distinguished by sequence zero.
    pub fn is_ack(&self) -> bool {
        self.seq_num == 0
    }

    /// Encode into the front of `buf`, returning the encoded length.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < HEADER_SIZE {
            return Err(RudpError::BufferTooSmall {
                needed: HEADER_SIZE,
                capacity: buf.len(),
            });
        }
        buf[0..4].copy_from_slice(&self.seq_num.to_be_bytes());
        buf[4..8].copy_from_slice(&self.ack_num.to_be_bytes());
        buf[8..12].copy_from_slice(&self.data_size.to_be_bytes());
        Ok(HEADER_SIZE)
    }

    /// Decode from the front of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(RudpError::Truncated {
                len: buf.len(),
                needed: HEADER_SIZE,
            });
        }
        Ok(Self {
            seq_num: i32::from_be_bytes(buf[0..4].try_into().unwrap()),
            ack_num: i32::from_be_bytes(buf[4..8].try_into().unwrap()),
            data_size: i32::from_be_bytes(buf[8..12].try_into().unwrap()),
        })
    }
}

/// Encode a full frame (header plus payload) into `buf`, returning the wire
/// length. The header's `data_size` must match the payload length.
pub fn encode_frame(header: &RudpHeader, payload: &[u8], buf: &mut [u8]) -> Result<usize> {
    if header.data_size < 0
        || header.data_size as usize != payload.len()
        || payload.len() > MAX_DATA_SIZE
    {
        return Err(RudpError::InvalidDataSize {
            data_size: header.data_size,
            len: payload.len(),
        });
    }

    let total = HEADER_SIZE + payload.len();
    if buf.len() < total {
        return Err(RudpError::BufferTooSmall {
            needed: total,
            capacity: buf.len(),
        });
    }

    header.encode_into(buf)?;
    buf[HEADER_SIZE..total].copy_from_slice(payload);
    Ok(total)
}

/// Decode a frame, borrowing the payload out of `buf`.
///
/// Rejects negative `data_size` outright and frames whose declared payload
/// extends past the supplied bytes.
pub fn decode_frame(buf: &[u8]) -> Result<(RudpHeader, &[u8])> {
    let header = RudpHeader::decode(buf)?;
    if header.data_size < 0 {
        return Err(RudpError::InvalidDataSize {
            data_size: header.data_size,
            len: buf.len(),
        });
    }

    let end = HEADER_SIZE + header.data_size as usize;
    if buf.len() < end {
        return Err(RudpError::Truncated {
            len: buf.len(),
            needed: end,
        });
    }
    Ok((header, &buf[HEADER_SIZE..end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PAYLOAD_SIZE;

    #[test]
    fn header_round_trip() {
        let header = RudpHeader {
            seq_num: 123,
            ack_num: 456,
            data_size: 789,
        };
        let mut buf = [0u8; HEADER_SIZE];
        assert_eq!(header.encode_into(&mut buf).unwrap(), HEADER_SIZE);
        assert_eq!(RudpHeader::decode(&buf).unwrap(), header);
    }

    #[test]
    fn zero_header_round_trip() {
        let header = RudpHeader {
            seq_num: 0,
            ack_num: 0,
            data_size: 0,
        };
        let mut buf = [0u8; HEADER_SIZE];
        header.encode_into(&mut buf).unwrap();
        assert_eq!(buf, [0u8; HEADER_SIZE]);
        assert_eq!(RudpHeader::decode(&buf).unwrap(), header);
    }

    #[test]
    fn header_encodes_big_endian() {
        let header = RudpHeader {
            seq_num: 1,
            ack_num: 0x01020304,
            data_size: 2,
        };
        let mut buf = [0u8; HEADER_SIZE];
        header.encode_into(&mut buf).unwrap();
        assert_eq!(&buf[0..4], &[0, 0, 0, 1]);
        assert_eq!(&buf[4..8], &[1, 2, 3, 4]);
        assert_eq!(&buf[8..12], &[0, 0, 0, 2]);
    }

    #[test]
    fn frame_round_trip() {
        let payload = b"some data";
        let header = RudpHeader::data(3, payload.len() as i32);
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];

        let len = encode_frame(&header, payload, &mut buf).unwrap();
        assert_eq!(len, HEADER_SIZE + payload.len());

        let (decoded, data) = decode_frame(&buf[..len]).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(data, payload);
    }

    #[test]
    fn empty_frame_round_trip() {
        let header = RudpHeader::data(1, 0);
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        let len = encode_frame(&header, &[], &mut buf).unwrap();
        assert_eq!(len, HEADER_SIZE);

        let (decoded, data) = decode_frame(&buf[..len]).unwrap();
        assert_eq!(decoded, header);
        assert!(data.is_empty());
    }

    #[test]
    fn max_size_frame_round_trip() {
        let payload = vec![0x41u8; MAX_DATA_SIZE];
        let header = RudpHeader::data(1, MAX_DATA_SIZE as i32);
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];

        let len = encode_frame(&header, &payload, &mut buf).unwrap();
        assert_eq!(len, MAX_PAYLOAD_SIZE);

        let (_, data) = decode_frame(&buf).unwrap();
        assert_eq!(data, &payload[..]);
    }

    #[test]
    fn encode_rejects_small_buffer() {
        let header = RudpHeader::data(1, 4);
        let mut buf = [0u8; HEADER_SIZE + 2];
        assert!(matches!(
            encode_frame(&header, b"abcd", &mut buf),
            Err(RudpError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn encode_rejects_size_mismatch() {
        let header = RudpHeader::data(1, 3);
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        assert!(matches!(
            encode_frame(&header, b"abcd", &mut buf),
            Err(RudpError::InvalidDataSize { .. })
        ));
    }

    #[test]
    fn encode_rejects_oversize_payload() {
        let payload = vec![0u8; MAX_DATA_SIZE + 1];
        let header = RudpHeader::data(1, payload.len() as i32);
        let mut buf = [0u8; MAX_PAYLOAD_SIZE + HEADER_SIZE];
        assert!(matches!(
            encode_frame(&header, &payload, &mut buf),
            Err(RudpError::InvalidDataSize { .. })
        ));
    }

    #[test]
    fn decode_rejects_truncated_header() {
        assert!(matches!(
            RudpHeader::decode(&[0u8; HEADER_SIZE - 1]),
            Err(RudpError::Truncated { .. })
        ));
    }

    #[test]
    fn decode_rejects_negative_data_size() {
        let header = RudpHeader {
            seq_num: 1,
            ack_num: 0,
            data_size: -1,
        };
        let mut buf = [0u8; HEADER_SIZE];
        header.encode_into(&mut buf).unwrap();
        assert!(matches!(
            decode_frame(&buf),
            Err(RudpError::InvalidDataSize { .. })
        ));
    }

    #[test]
    fn decode_rejects_payload_past_buffer() {
        let header = RudpHeader::data(1, 64);
        let mut buf = [0u8; HEADER_SIZE + 10];
        header.encode_into(&mut buf).unwrap();
        assert!(matches!(
            decode_frame(&buf),
            Err(RudpError::Truncated { .. })
        ));
    }

    #[test]
    fn ack_classification() {
        assert!(RudpHeader::ack(7).is_ack());
        assert!(!RudpHeader::data(1, 0).is_ack());
        assert_eq!(RudpHeader::ack(7).ack_num, 7);
        assert_eq!(RudpHeader::ack(7).data_size, 0);
    }
}
