//! Loss-injecting wrapper around a real endpoint.

use std::io;
use std::time::{Duration, Instant};

use crate::LossGenerator;
use uftp_rudp::{Endpoint, RudpHeader};

/// Wraps an endpoint and silently swallows outbound frames according to a
/// [`LossGenerator`], reporting success so the channel's retransmission
/// logic has to recover.
pub struct LossyEndpoint<E> {
    inner: E,
    outbound: LossGenerator,
}

impl<E: Endpoint> LossyEndpoint<E> {
    pub fn new(inner: E, outbound: LossGenerator) -> Self {
        Self { inner, outbound }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn loss(&self) -> &LossGenerator {
        &self.outbound
    }
}

impl<E: Endpoint> Endpoint for LossyEndpoint<E> {
    fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        // Acks decode with sequence zero, which the patterns treat like any
        // other sequence.
        let seq = RudpHeader::decode(frame).map(|h| h.seq_num).unwrap_or(0);
        if self.outbound.should_drop(seq) {
            return Ok(frame.len());
        }
        self.inner.send(frame)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.recv(buf)
    }

    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        self.inner.wait_readable(timeout)
    }

    fn now(&self) -> Instant {
        self.inner.now()
    }
}
