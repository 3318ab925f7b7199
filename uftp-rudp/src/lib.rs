//! # uftp-rudp
//!
//! Reliable, in-order delivery of discrete messages over an unreliable
//! datagram transport.
//!
//! The protocol is stop-and-wait: the sender keeps exactly one frame in
//! flight and retransmits it on an interval until the matching ack arrives.
//! Payloads larger than one frame are fragmented into consecutively numbered
//! chunks. Acks are fire-and-forget; a receiver re-acks recently acknowledged
//! sequences (the old-ack window) so a peer whose acks were lost can still
//! make progress.
//!
//! ```rust,no_run
//! use uftp_rudp::{RudpChannel, UdpEndpoint};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = UdpEndpoint::connect(("127.0.0.1", 7070))?;
//! let mut channel = RudpChannel::new(endpoint);
//! channel.send(b"ls")?;
//!
//! let mut reply = [0u8; 1024];
//! let n = channel.recv(&mut reply)?;
//! println!("{}", String::from_utf8_lossy(&reply[..n]));
//! # Ok(())
//! # }
//! ```

mod endpoint;
mod error;
mod header;

pub use endpoint::{Endpoint, UdpEndpoint};
pub use error::{Result, RudpError};
pub use header::{decode_frame, encode_frame, RudpHeader};

use std::time::Duration;
use tracing::{debug, warn};

/// Max size of one encoded frame on the wire.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Encoded header size in bytes.
pub const HEADER_SIZE: usize = 12;

/// Max payload bytes a single data frame can carry.
pub const MAX_DATA_SIZE: usize = MAX_PAYLOAD_SIZE - HEADER_SIZE;

/// Default retransmission interval for an unacknowledged frame.
pub const MESSAGE_TIMEOUT: Duration = Duration::from_millis(200);

/// Default per-chunk deadline after which a send gives up.
pub const SENDER_TIMEOUT: Duration = Duration::from_millis(5000);

/// Width of the old-ack window: a receiver still acks sequences up to this
/// far below its last delivered sequence.
pub const ACK_WINDOW: i32 = 100;

/// Channel timer configuration.
#[derive(Debug, Clone)]
pub struct RudpConfig {
    /// Retransmission interval for an unacknowledged frame.
    pub message_timeout: Duration,
    /// Per-chunk deadline after which a send fails with
    /// [`RudpError::SenderTimeout`]. The timer restarts for every chunk of a
    /// fragmented payload.
    pub sender_timeout: Duration,
    /// Optional deadline for [`RudpChannel::recv`]; `None` waits
    /// indefinitely.
    pub receiver_timeout: Option<Duration>,
}

impl Default for RudpConfig {
    fn default() -> Self {
        Self {
            message_timeout: MESSAGE_TIMEOUT,
            sender_timeout: SENDER_TIMEOUT,
            receiver_timeout: None,
        }
    }
}

/// Reliable stop-and-wait channel over a datagram endpoint.
///
/// The sequence counters are never reset; a fresh channel is required per
/// session.
pub struct RudpChannel<E: Endpoint> {
    endpoint: E,
    config: RudpConfig,
    /// Highest sequence number the peer has acknowledged. Monotonic.
    last_ack: i32,
    /// Highest in-order sequence number delivered to the caller. Monotonic.
    last_received: i32,
}

impl<E: Endpoint> RudpChannel<E> {
    pub fn new(endpoint: E) -> Self {
        Self::with_config(endpoint, RudpConfig::default())
    }

    pub fn with_config(endpoint: E, config: RudpConfig) -> Self {
        Self {
            endpoint,
            config,
            last_ack: 0,
            last_received: 0,
        }
    }

    /// Highest sequence number acknowledged by the peer.
    pub fn last_ack(&self) -> i32 {
        self.last_ack
    }

    /// Highest in-order sequence number delivered to the caller.
    pub fn last_received(&self) -> i32 {
        self.last_received
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }

    /// Send `payload` reliably, fragmenting into chunks of at most
    /// [`MAX_DATA_SIZE`] bytes. Returns once every chunk has been
    /// acknowledged; sender state carries across chunks.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if payload.is_empty() {
            // A zero-length payload still produces one (empty) frame.
            return self.send_chunk(&[]);
        }

        for chunk in payload.chunks(MAX_DATA_SIZE) {
            self.send_chunk(chunk)?;
        }
        Ok(())
    }

    /// Stop-and-wait delivery of one chunk: transmit, wait up to the
    /// retransmission interval for the ack, repeat. Gives up once
    /// `sender_timeout` has elapsed for this chunk.
    fn send_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.len() > MAX_DATA_SIZE {
            return Err(RudpError::PayloadTooLarge { size: chunk.len() });
        }

        let header = RudpHeader::data(self.last_ack + 1, chunk.len() as i32);
        let mut wire = [0u8; MAX_PAYLOAD_SIZE];
        let wire_len = encode_frame(&header, chunk, &mut wire)?;

        let start = self.endpoint.now();
        loop {
            self.check_sender_deadline(start)?;

            if let Err(e) = self.endpoint.send(&wire[..wire_len]) {
                warn!(seq = header.seq_num, error = %e, "send failed, retrying");
                continue;
            }

            // Wait for the ack; drop unrelated frames without restarting the
            // retransmission timer.
            loop {
                self.check_sender_deadline(start)?;

                match self.endpoint.wait_readable(self.config.message_timeout) {
                    Err(e) => {
                        warn!(error = %e, "wait for ack failed, retransmitting");
                        break;
                    }
                    Ok(false) => {
                        debug!(seq = header.seq_num, "no ack yet, retransmitting");
                        break;
                    }
                    Ok(true) => {}
                }

                let mut buf = [0u8; MAX_PAYLOAD_SIZE];
                let n = match self.endpoint.recv(&mut buf) {
                    Ok(n) => n,
                    Err(e) => {
                        warn!(error = %e, "receive failed, retransmitting");
                        break;
                    }
                };

                let received = match decode_frame(&buf[..n]) {
                    Ok((received, _)) => received,
                    Err(e) => {
                        debug!(error = %e, "skipping undecodable frame");
                        continue;
                    }
                };

                if received.ack_num == self.last_ack + 1 {
                    self.last_ack += 1;
                    return Ok(());
                }

                // A peer still retransmitting an already-delivered message
                // has lost our ack; answer it, then retransmit our own frame
                // so both sides keep moving.
                if self.in_old_ack_window(&received) {
                    if let Err(e) = self.send_ack(received.seq_num) {
                        warn!(seq = received.seq_num, error = %e, "re-ack failed");
                    }
                    break;
                }

                debug!(
                    seq = received.seq_num,
                    ack = received.ack_num,
                    "dropping unrelated frame"
                );
            }
        }
    }

    /// Receive the next in-order message into `buf`, returning its length.
    ///
    /// Every in-order or old-window frame is acked before this returns;
    /// anything else is dropped silently. Fails with
    /// [`RudpError::BufferTooSmall`] if the frame's payload does not fit
    /// `buf`, and with [`RudpError::ReceiverTimeout`] if a receive deadline
    /// is configured and expires.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let start = self.endpoint.now();
        loop {
            if let Some(timeout) = self.config.receiver_timeout {
                if self.endpoint.now().duration_since(start) > timeout {
                    return Err(RudpError::ReceiverTimeout { timeout });
                }
            }

            if !self.endpoint.wait_readable(self.config.message_timeout)? {
                continue;
            }

            let mut frame_buf = [0u8; MAX_PAYLOAD_SIZE];
            let n = match self.endpoint.recv(&mut frame_buf) {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "receive failed, retrying");
                    continue;
                }
            };

            let (received, payload) = match decode_frame(&frame_buf[..n]) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!(error = %e, "skipping undecodable frame");
                    continue;
                }
            };

            if received.data_size as usize > buf.len() {
                return Err(RudpError::BufferTooSmall {
                    needed: received.data_size as usize,
                    capacity: buf.len(),
                });
            }

            let next_in_order = received.seq_num == self.last_received + 1;
            if next_in_order || self.in_old_ack_window(&received) {
                if let Err(e) = self.send_ack(received.seq_num) {
                    warn!(seq = received.seq_num, error = %e, "ack send failed");
                    continue;
                }

                if next_in_order {
                    self.last_received += 1;
                    let size = received.data_size as usize;
                    buf[..size].copy_from_slice(payload);
                    return Ok(size);
                }
                debug!(seq = received.seq_num, "re-acked already delivered frame");
            } else {
                debug!(
                    seq = received.seq_num,
                    last_received = self.last_received,
                    "dropping out-of-window frame"
                );
            }
        }
    }

    /// Drain straggler retransmissions after an exchange completes.
    ///
    /// A peer whose final ack was lost keeps retransmitting its last
    /// message; answer those until the transport stays quiet for one
    /// retransmission interval. Returns the number of acks sent.
    pub fn check_acks(&mut self) -> Result<usize> {
        let mut handled = 0;
        loop {
            if !self.endpoint.wait_readable(self.config.message_timeout)? {
                return Ok(handled);
            }

            let mut frame_buf = [0u8; MAX_PAYLOAD_SIZE];
            let n = match self.endpoint.recv(&mut frame_buf) {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "receive failed while draining acks");
                    continue;
                }
            };

            let received = match decode_frame(&frame_buf[..n]) {
                Ok((received, _)) => received,
                Err(e) => {
                    debug!(error = %e, "skipping undecodable frame");
                    continue;
                }
            };

            if self.in_old_ack_window(&received) {
                match self.send_ack(received.seq_num) {
                    Ok(()) => handled += 1,
                    Err(e) => {
                        warn!(seq = received.seq_num, error = %e, "re-ack failed while draining")
                    }
                }
            } else {
                debug!(seq = received.seq_num, "dropping frame outside ack window");
            }
        }
    }

    fn check_sender_deadline(&self, start: std::time::Instant) -> Result<()> {
        let elapsed = self.endpoint.now().duration_since(start);
        if elapsed > self.config.sender_timeout {
            return Err(RudpError::SenderTimeout {
                timeout: self.config.sender_timeout,
            });
        }
        Ok(())
    }

    /// A data frame whose sequence falls within [`ACK_WINDOW`] at or below
    /// the last delivered sequence. Such frames were already delivered; the
    /// peer is retransmitting because our ack was lost.
    fn in_old_ack_window(&self, header: &RudpHeader) -> bool {
        if header.is_ack() {
            return false;
        }
        let delta = self.last_received - header.seq_num;
        (0..ACK_WINDOW).contains(&delta)
    }

    /// Acks are fire-and-forget: no retry, no confirmation. Recovery relies
    /// on the old-ack window instead.
    fn send_ack(&mut self, seq: i32) -> Result<()> {
        let header = RudpHeader::ack(seq);
        let mut wire = [0u8; HEADER_SIZE];
        let len = header.encode_into(&mut wire)?;
        self.endpoint.send(&wire[..len])?;
        Ok(())
    }
}
