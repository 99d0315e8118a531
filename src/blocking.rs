//! Blocking-mode control and socket address introspection.

use crate::os::unix::{c_wrappers, unixprelude::*};
use std::{io, net::Ipv4Addr};

/// Returns `true` if `fd` is in blocking mode (`O_NONBLOCK` clear), `false` if it is nonblocking.
pub fn query_blocking(fd: impl AsFd) -> io::Result<bool> {
    let fd = fd.as_fd();
    let flags = c_wrappers::get_status_flags(fd).map_err(|e| {
        log::warn!("cannot tell if fd {} is blocking: {e}", fd.as_raw_fd());
        e
    })?;
    Ok(flags & O_NONBLOCK == 0)
}

/// Puts `fd` into blocking (`true`) or nonblocking (`false`) mode.
///
/// Does not touch the descriptor if it is already in the requested mode.
pub fn set_blocking(fd: impl AsFd, blocking: bool) -> io::Result<()> {
    let fd = fd.as_fd();
    let raw = fd.as_raw_fd();
    let flags = log_err!(c_wrappers::get_status_flags(fd), "cannot get flags for fd {raw}")?;
    let new_flags = if blocking { flags & !O_NONBLOCK } else { flags | O_NONBLOCK };
    if new_flags != flags {
        log_err!(c_wrappers::set_status_flags(fd, new_flags), "cannot set flags for fd {raw}")?;
    }
    Ok(())
}

/// Dotted-quad form of the address `s` is bound to on this side of the connection.
///
/// If the address can't be retrieved, the error is logged and `"0.0.0.0"` is returned.
///
/// # Panics
/// If `s` is not an IPv4 socket.
pub fn local_ip(s: impl AsFd) -> String { inet_name(s.as_fd(), false) }

/// Dotted-quad form of the address of the remote end `s` is connected to.
///
/// Falls back to `"0.0.0.0"` like [`local_ip()`], e.g. if `s` isn't connected.
///
/// # Panics
/// If `s` is not an IPv4 socket.
pub fn remote_ip(s: impl AsFd) -> String { inet_name(s.as_fd(), true) }

fn inet_name(fd: BorrowedFd<'_>, peer: bool) -> String {
    let opname = if peer { "getpeername" } else { "getsockname" };
    let (storage, _) = match c_wrappers::socket_name(fd, peer) {
        Ok(name) => name,
        Err(e) => {
            log::error!("{opname} failed: {e}");
            return Ipv4Addr::UNSPECIFIED.to_string();
        }
    };
    assert_eq!(
        c_int::from(storage.ss_family),
        AF_INET,
        "{opname} returned a non-IPv4 address"
    );
    // SAFETY: the family says this is a sockaddr_in; sockaddr_storage is large and aligned enough
    let sin = unsafe { &*(&storage as *const sockaddr_storage).cast::<sockaddr_in>() };
    crate::netaddr::host_ip(sin)
}
