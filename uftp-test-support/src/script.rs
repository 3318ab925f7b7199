//! Scripted endpoint with a virtual clock.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use uftp_rudp::{decode_frame, encode_frame, Endpoint, RudpHeader, MAX_PAYLOAD_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Ready,
    TimedOut,
}

/// Deterministic in-memory endpoint for driving the channel engine.
///
/// Incoming frames are queued ahead of time and outgoing frames are
/// recorded. The clock is virtual: it advances by the wait timeout whenever
/// a wait times out, so timeout paths run instantly. Unscripted waits report
/// ready while queued frames remain and time out once the queue is empty.
pub struct ScriptedEndpoint {
    incoming: VecDeque<Vec<u8>>,
    script: VecDeque<Wait>,
    sent: Vec<Vec<u8>>,
    started: Instant,
    now: Instant,
}

impl Default for ScriptedEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        let started = Instant::now();
        Self {
            incoming: VecDeque::new(),
            script: VecDeque::new(),
            sent: Vec::new(),
            started,
            now: started,
        }
    }

    /// Queue a raw frame for a later `recv`.
    pub fn push_frame(&mut self, frame: Vec<u8>) {
        self.incoming.push_back(frame);
    }

    /// Queue an encoded data frame.
    pub fn push_data(&mut self, seq: i32, payload: &[u8]) {
        let header = RudpHeader::data(seq, payload.len() as i32);
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        let len = encode_frame(&header, payload, &mut buf).expect("frame fits");
        self.push_frame(buf[..len].to_vec());
    }

    /// Queue an encoded ack frame.
    pub fn push_ack(&mut self, seq: i32) {
        let header = RudpHeader::ack(seq);
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        let len = encode_frame(&header, &[], &mut buf).expect("frame fits");
        self.push_frame(buf[..len].to_vec());
    }

    /// Script the next `count` waits to time out regardless of queued
    /// frames, simulating in-flight loss.
    pub fn script_timeouts(&mut self, count: usize) {
        for _ in 0..count {
            self.script.push_back(Wait::TimedOut);
        }
    }

    /// Script the next `count` waits to report ready. Useful for pinning
    /// down exactly which wait a later scripted timeout lands on.
    pub fn script_ready(&mut self, count: usize) {
        for _ in 0..count {
            self.script.push_back(Wait::Ready);
        }
    }

    /// Raw recorded outbound frames, in send order.
    pub fn sent_raw(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Recorded outbound frames, decoded.
    pub fn sent_frames(&self) -> Vec<(RudpHeader, Vec<u8>)> {
        self.sent
            .iter()
            .map(|frame| {
                let (header, payload) = decode_frame(frame).expect("recorded frame decodes");
                (header, payload.to_vec())
            })
            .collect()
    }

    /// Virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        self.now.duration_since(self.started)
    }
}

impl Endpoint for ScriptedEndpoint {
    fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        self.sent.push(frame.to_vec());
        Ok(frame.len())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.incoming.pop_front() {
            Some(frame) => {
                if frame.len() > buf.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "queued frame larger than receive buffer",
                    ));
                }
                buf[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            None => Err(io::Error::new(io::ErrorKind::WouldBlock, "nothing queued")),
        }
    }

    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let outcome = self.script.pop_front().unwrap_or_else(|| {
            if self.incoming.is_empty() {
                Wait::TimedOut
            } else {
                Wait::Ready
            }
        });

        match outcome {
            Wait::Ready => Ok(true),
            Wait::TimedOut => {
                self.now += timeout;
                Ok(false)
            }
        }
    }

    fn now(&self) -> Instant {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sent_frames() {
        let mut endpoint = ScriptedEndpoint::new();
        let header = RudpHeader::data(1, 3);
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        let len = encode_frame(&header, b"abc", &mut buf).unwrap();
        endpoint.send(&buf[..len]).unwrap();

        let frames = endpoint.sent_frames();
        assert_eq!(frames, vec![(header, b"abc".to_vec())]);
    }

    #[test]
    fn queued_frames_are_delivered_in_order() {
        let mut endpoint = ScriptedEndpoint::new();
        endpoint.push_ack(1);
        endpoint.push_ack(2);

        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        endpoint.recv(&mut buf).unwrap();
        assert_eq!(RudpHeader::decode(&buf).unwrap().ack_num, 1);
        endpoint.recv(&mut buf).unwrap();
        assert_eq!(RudpHeader::decode(&buf).unwrap().ack_num, 2);
        assert!(endpoint.recv(&mut buf).is_err());
    }

    #[test]
    fn timed_out_waits_advance_the_clock() {
        let mut endpoint = ScriptedEndpoint::new();
        assert!(!endpoint.wait_readable(Duration::from_millis(200)).unwrap());
        assert!(!endpoint.wait_readable(Duration::from_millis(200)).unwrap());
        assert_eq!(endpoint.elapsed(), Duration::from_millis(400));
    }

    #[test]
    fn scripted_timeouts_override_queued_frames() {
        let mut endpoint = ScriptedEndpoint::new();
        endpoint.push_ack(1);
        endpoint.script_timeouts(1);

        assert!(!endpoint.wait_readable(Duration::from_millis(200)).unwrap());
        assert!(endpoint.wait_readable(Duration::from_millis(200)).unwrap());
    }
}
