//! UDP sockets: creation, binding, and single-datagram transfer.
//!
//! Endpoints are [`DatagramAddress`] values; convert them with
//! [`to_bytes()`](DatagramAddress::to_bytes) where they have to travel as octet strings.

use crate::{
    addr::{make_sockaddr_in, DatagramAddress},
    misc::TransientErrorExt,
    os::unix::{c_wrappers, unixprelude::*, FdOps},
    resolve,
};
use std::io;

/// Largest datagram [`udp_recvfrom()`] can receive in one piece. Anything longer is truncated by
/// the kernel.
pub const UDP_PACKET_MAX_SIZE: usize = 64 * 1024;

/// Creates an unbound UDP socket for sending.
pub fn udp_client_socket() -> io::Result<OwnedFd> {
    log_err!(c_wrappers::create_inet_socket(SOCK_DGRAM), "couldn't create a UDP socket")
}

/// Creates a UDP socket bound to `port` on `interface`.
///
/// `interface` is a host name or dotted-quad; `"*"` binds to all interfaces. Whatever the outcome,
/// no descriptor is left behind on failure.
///
/// # System calls
/// - `socket`
/// - `getaddrinfo` (unless `interface` is `"*"`)
/// - `bind`
pub fn udp_bind(port: u16, interface: &str) -> io::Result<OwnedFd> {
    let fd = udp_client_socket()?;
    let addr = log_err!(
        resolve::resolve_interface(interface),
        "couldn't resolve interface `{interface}' for UDP"
    )?;
    let sin = make_sockaddr_in(addr, port);
    log_err!(
        c_wrappers::bind_v4(fd.as_fd(), &sin),
        "couldn't bind a UDP socket to port {port}"
    )?;
    log::debug!("UDP socket bound to {addr}:{port} (fd {})", fd.as_raw_fd());
    Ok(fd)
}

/// Sends `datagram` to `addr` as a single packet.
///
/// Only IPv4 targets are supported; an IPv6 one fails with
/// [`Unsupported`](io::ErrorKind::Unsupported). A short send is reported as
/// [`WriteZero`](io::ErrorKind::WriteZero), since a datagram can't be continued.
pub fn udp_sendto(fd: impl AsFd, datagram: &[u8], addr: &DatagramAddress) -> io::Result<()> {
    let ops = FdOps(fd.as_fd());
    let sent = loop {
        match ops.send_to(datagram, addr) {
            Err(e) if e.is_interrupted() => continue,
            els => break log_err!(els, "couldn't send UDP packet to {addr}")?,
        }
    };
    if sent < datagram.len() {
        log::error!("UDP packet to {addr} truncated: {sent} of {} bytes sent", datagram.len());
        return Err(io::Error::from(io::ErrorKind::WriteZero));
    }
    Ok(())
}

/// Receives one datagram of up to [`UDP_PACKET_MAX_SIZE`] bytes, along with its sender.
///
/// `EINTR` is retried. `EAGAIN` on a nonblocking socket is returned without being logged, since
/// "nothing there yet" is the normal outcome of polling; every other error is logged. A
/// zero-length datagram is a successful receive of an empty buffer.
#[inline]
pub fn udp_recvfrom(fd: impl AsFd) -> io::Result<(Vec<u8>, DatagramAddress)> {
    udp_recvfrom_with_capacity(fd, UDP_PACKET_MAX_SIZE)
}

/// Like [`udp_recvfrom()`], with a caller-chosen buffer size.
///
/// Longer datagrams are truncated to `capacity` bytes.
pub fn udp_recvfrom_with_capacity(
    fd: impl AsFd,
    capacity: usize,
) -> io::Result<(Vec<u8>, DatagramAddress)> {
    let ops = FdOps(fd.as_fd());
    let mut buf = vec![0; capacity];
    loop {
        match ops.recv_from(&mut buf) {
            Ok((n, from)) => {
                buf.truncate(n);
                return Ok((buf, from));
            }
            Err(e) if e.is_interrupted() => continue,
            Err(e) if e.is_would_block() => return Err(e),
            Err(e) => {
                log::error!("couldn't receive UDP packet on fd {}: {e}", ops.raw());
                return Err(e);
            }
        }
    }
}
