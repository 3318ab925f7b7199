//! Datagram endpoint abstraction.
//!
//! The channel engine is generic over [`Endpoint`] so that tests can drive it
//! with scripted traffic and a virtual clock. [`UdpEndpoint`] is the real
//! implementation over a non-blocking UDP socket.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, Socket, Type};

/// Capability set the reliable channel needs from the transport.
///
/// Reads and writes never block; all blocking is externalised into
/// [`wait_readable`](Endpoint::wait_readable).
pub trait Endpoint {
    /// Send one datagram to the peer.
    fn send(&mut self, frame: &[u8]) -> io::Result<usize>;

    /// Receive one datagram into `buf`, returning the byte count.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Wait until a datagram is available to read, or until `timeout`
    /// elapses. Returns `false` on timeout.
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Monotonic clock the channel timers run against.
    fn now(&self) -> Instant;
}

/// UDP endpoint talking to a single peer at a time.
pub struct UdpEndpoint {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
}

impl UdpEndpoint {
    /// Client-side constructor: resolve the server address and fix it as the
    /// peer, binding an ephemeral local port.
    pub fn connect<A: ToSocketAddrs>(server: A) -> io::Result<Self> {
        let peer = server.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "hostname did not resolve")
        })?;

        let local_ip = if peer.is_ipv4() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        };
        let socket = UdpSocket::bind(SocketAddr::new(local_ip, 0))?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            socket,
            peer: Some(peer),
        })
    }

    /// Server-side constructor: bind the port on all interfaces.
    ///
    /// `SO_REUSEADDR` is set before binding so the server can be restarted
    /// without waiting out the old socket. The peer is learned from incoming
    /// datagrams, so replies go back to whichever client is talking.
    pub fn bind(port: u16) -> io::Result<Self> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;

        let socket: UdpSocket = socket.into();
        socket.set_nonblocking(true)?;

        Ok(Self { socket, peer: None })
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Current peer, if one is known.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl Endpoint for UdpEndpoint {
    fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        match self.peer {
            Some(peer) => self.socket.send_to(frame, peer),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no peer to send to",
            )),
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (len, src) = self.socket.recv_from(buf)?;
        self.peer = Some(src);
        Ok(len)
    }

    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        // poll(2) on the raw fd; std sockets expose no readiness wait.
        use std::os::unix::io::AsRawFd;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let mut fds = libc::pollfd {
                fd: self.socket.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            };
            let timeout_ms = remaining.as_millis().min(i32::MAX as u128) as libc::c_int;

            match unsafe { libc::poll(&mut fds, 1, timeout_ms) } {
                -1 => {
                    let err = io::Error::last_os_error();
                    if err.kind() == io::ErrorKind::Interrupted {
                        continue;
                    }
                    return Err(err);
                }
                0 => return Ok(false),
                _ => return Ok(true),
            }
        }
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}
