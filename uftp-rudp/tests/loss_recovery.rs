//! Retransmission recovery over real sockets with injected loss.

use std::thread;
use std::time::Duration;

use uftp_rudp::{RudpChannel, RudpConfig, UdpEndpoint, MAX_DATA_SIZE};
use uftp_test_support::{LossGenerator, LossyEndpoint};

fn localhost_pair() -> (UdpEndpoint, UdpEndpoint) {
    // The receiver learns its peer from the first datagram, like the server.
    let receiver = UdpEndpoint::bind(0).unwrap();
    let port = receiver.local_addr().unwrap().port();
    let sender = UdpEndpoint::connect(("127.0.0.1", port)).unwrap();
    (sender, receiver)
}

fn fast_config() -> RudpConfig {
    RudpConfig {
        message_timeout: Duration::from_millis(40),
        sender_timeout: Duration::from_secs(5),
        receiver_timeout: None,
    }
}

#[test]
fn messages_survive_periodic_loss() {
    let (sender_ep, receiver_ep) = localhost_pair();

    // Drop every third outbound frame from the sender, data and acks alike.
    let lossy = LossyEndpoint::new(sender_ep, LossGenerator::periodic(3));
    let mut sender = RudpChannel::with_config(lossy, fast_config());
    let mut receiver = RudpChannel::with_config(receiver_ep, fast_config());

    let messages: Vec<Vec<u8>> = (0u8..20)
        .map(|i| vec![i; (i as usize % MAX_DATA_SIZE).max(1)])
        .collect();
    let expected = messages.clone();

    let receiver_thread = thread::spawn(move || {
        let mut delivered = Vec::new();
        let mut buf = [0u8; MAX_DATA_SIZE];
        for _ in 0..20 {
            let n = receiver.recv(&mut buf).unwrap();
            delivered.push(buf[..n].to_vec());
        }
        receiver.check_acks().unwrap();
        delivered
    });

    for message in &messages {
        sender.send(message).unwrap();
    }
    sender.check_acks().unwrap();

    let delivered = receiver_thread.join().unwrap();
    assert_eq!(delivered, expected);
    assert_eq!(sender.last_ack(), 20);
    assert!(sender.endpoint().loss().dropped() > 0);
}

#[test]
fn fragmented_payload_survives_specific_loss() {
    let (sender_ep, receiver_ep) = localhost_pair();

    // Drop the first transmission of both fragments.
    let lossy = LossyEndpoint::new(sender_ep, LossGenerator::specific([1, 2]));
    let mut sender = RudpChannel::with_config(lossy, fast_config());
    let mut receiver = RudpChannel::with_config(receiver_ep, fast_config());

    let mut payload = vec![0x41u8; MAX_DATA_SIZE + 10];
    payload[MAX_DATA_SIZE..].fill(0x42);
    let expected = payload.clone();

    let receiver_thread = thread::spawn(move || {
        let mut assembled = Vec::new();
        let mut buf = [0u8; MAX_DATA_SIZE];
        while assembled.len() < expected.len() {
            let n = receiver.recv(&mut buf).unwrap();
            assembled.extend_from_slice(&buf[..n]);
        }
        receiver.check_acks().unwrap();
        assembled
    });

    sender.send(&payload).unwrap();
    sender.check_acks().unwrap();

    let assembled = receiver_thread.join().unwrap();
    assert_eq!(assembled, payload);
    assert_eq!(sender.last_ack(), 2);
    assert_eq!(sender.endpoint().loss().dropped(), 2);
}
