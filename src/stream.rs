//! TCP server and client sockets, and the blocking I/O loops used on them.
//!
//! Every helper here absorbs `EINTR`, so a signal landing in the middle of a transfer never shows
//! up as a failure. Hard errors are logged where they happen and returned.

use crate::{
    addr::{make_sockaddr_in, DatagramAddress},
    misc::{invalid_input, retry_interrupted, TransientErrorExt},
    os::unix::{
        c_wrappers::{self, FdSet},
        unixprelude::*,
        FdOps,
    },
    resolve,
};
use std::{
    io::{self, prelude::*},
    net::Ipv4Addr,
};

/// Backlog [`make_server_socket()`] listens with.
pub const DEFAULT_BACKLOG: c_int = 10;
/// Growth step of the buffer [`read_to_eof()`] fills.
pub const READ_TO_EOF_CHUNK: usize = 16 * 1024;

/// A builder for listening TCP sockets.
///
/// [`make_server_socket()`] is `ServerOptions::new().port(port).create()`.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub(crate) port: u16,
    pub(crate) interface: Ipv4Addr,
    pub(crate) backlog: c_int,
    pub(crate) reuse_address: bool,
}

/// Creation.
impl ServerOptions {
    /// Creates an options table with default values: port 0, any interface, a backlog of
    /// [`DEFAULT_BACKLOG`], and `SO_REUSEADDR` enabled.
    #[inline]
    pub const fn new() -> Self {
        Self {
            port: 0,
            interface: Ipv4Addr::UNSPECIFIED,
            backlog: DEFAULT_BACKLOG,
            reuse_address: true,
        }
    }
}

/// Option setters.
impl ServerOptions {
    builder_setters! {
        /// Sets the port to listen on. Port 0 lets the kernel pick one; use
        /// [`local_port()`](crate::stream::local_port) to find out which.
        port: u16,
        /// Sets the address to bind to. The default is the any-interface address.
        interface: Ipv4Addr,
        /// Sets the maximum number of pending connections.
        backlog: c_int,
        /// Sets whether `SO_REUSEADDR` is enabled before binding.
        reuse_address: bool,
    }
}

impl ServerOptions {
    /// Creates, configures, binds and starts listening on the socket.
    ///
    /// The error from whichever step failed is logged and returned; the descriptor created on the
    /// way is closed.
    ///
    /// # System calls
    /// - `socket`
    /// - `setsockopt` (if `reuse_address` is set)
    /// - `bind`
    /// - `listen`
    pub fn create(self) -> io::Result<OwnedFd> {
        let fd = log_err!(c_wrappers::create_inet_socket(SOCK_STREAM), "socket failed")?;
        if self.reuse_address {
            log_err!(
                c_wrappers::set_reuseaddr(fd.as_fd(), true),
                "setsockopt failed for server address"
            )?;
        }
        let sin = make_sockaddr_in(self.interface, self.port);
        log_err!(c_wrappers::bind_v4(fd.as_fd(), &sin), "bind failed")?;
        log_err!(c_wrappers::listen(fd.as_fd(), self.backlog), "listen failed")?;
        log::debug!("listening on {}:{} (fd {})", self.interface, self.port, fd.as_raw_fd());
        Ok(fd)
    }
}
impl Default for ServerOptions {
    #[inline]
    fn default() -> Self { Self::new() }
}

/// Client-side builder for outgoing TCP connections.
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) local_port: u16,
}

/// Creation.
impl ConnectOptions {
    /// Returns a default set of client options, targeting `localhost` port 0 from an ephemeral
    /// local port.
    #[inline]
    pub fn new() -> Self { Self { host: String::from("localhost"), port: 0, local_port: 0 } }
}

/// Option setters.
impl ConnectOptions {
    builder_setters! {
        /// Sets the host name or dotted-quad to connect to.
        host: String,
        /// Sets the remote port.
        port: u16,
        /// Sets the local port to bind to before connecting. 0, the default, leaves the choice to
        /// the kernel and skips the bind entirely.
        local_port: u16,
    }
}

impl ConnectOptions {
    /// Resolves the host and connects to it.
    ///
    /// On failure, the low-level cause and a summary naming the host and port are both logged.
    ///
    /// # System calls
    /// - `socket`
    /// - `getaddrinfo`
    /// - `setsockopt` and `bind` (if `local_port` is nonzero)
    /// - `connect`
    pub fn connect(self) -> io::Result<OwnedFd> {
        self.connect_inner().map_err(|e| {
            log::error!("error connecting to server `{}' at port `{}'", self.host, self.port);
            e
        })
    }
    fn connect_inner(&self) -> io::Result<OwnedFd> {
        let fd = log_err!(
            c_wrappers::create_inet_socket(SOCK_STREAM),
            "couldn't create new socket"
        )?;
        let he = log_err!(resolve::lookup_host(&self.host), "gethostbyname failed")?;

        if self.local_port > 0 {
            log_err!(c_wrappers::set_reuseaddr(fd.as_fd(), true), "setsockopt failed before bind")?;
            let local = make_sockaddr_in(Ipv4Addr::UNSPECIFIED, self.local_port);
            log_err!(
                c_wrappers::bind_v4(fd.as_fd(), &local),
                "bind to local port {} failed",
                self.local_port
            )?;
        }

        let remote = make_sockaddr_in(he.primary(), self.port);
        log_err!(retry_connect(fd.as_fd(), &remote), "connect failed")?;
        log::debug!("connected to {}:{} (fd {})", he.primary(), self.port, fd.as_raw_fd());
        Ok(fd)
    }
}
impl Default for ConnectOptions {
    #[inline]
    fn default() -> Self { Self::new() }
}

/// A connect interrupted by a signal keeps going in the background; restarting it would fail
/// with `EALREADY`, so the interrupted case waits for completion instead.
fn retry_connect(fd: BorrowedFd<'_>, addr: &sockaddr_in) -> io::Result<()> {
    match c_wrappers::connect_v4(fd, addr) {
        Err(e) if e.is_interrupted() => {
            wait_writable(fd)?;
            match c_wrappers::take_socket_error(fd)? {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
        els => els,
    }
}

/// Creates a TCP socket listening on `port` on all interfaces.
///
/// `SO_REUSEADDR` is set and the backlog is [`DEFAULT_BACKLOG`]. Use [`ServerOptions`] for
/// anything else.
#[inline]
pub fn make_server_socket(port: u16) -> io::Result<OwnedFd> {
    ServerOptions::new().port(port).create()
}

/// Connects to `host:port` from an ephemeral local port.
#[inline]
pub fn tcpip_connect_to_server(host: &str, port: u16) -> io::Result<OwnedFd> {
    tcpip_connect_to_server_with_port(host, port, 0)
}

/// Connects to `host:port`, first binding to `local_port` on all interfaces if it is nonzero.
#[inline]
pub fn tcpip_connect_to_server_with_port(
    host: &str,
    port: u16,
    local_port: u16,
) -> io::Result<OwnedFd> {
    ConnectOptions::new().host(host.to_owned()).port(port).local_port(local_port).connect()
}

/// The port a socket is bound to locally.
pub fn local_port(s: impl AsFd) -> io::Result<u16> {
    let (storage, len) = c_wrappers::socket_name(s.as_fd(), false)?;
    DatagramAddress::from_storage(&storage, len).map(|a| a.port())
}

/// Writes all of `bytes` to `s`.
///
/// Short writes are continued from where they stopped and `EINTR` is retried. On a nonblocking
/// descriptor, `EAGAIN` waits for the socket to become writable instead of spinning.
pub fn write_to_socket(s: impl AsFd, bytes: &[u8]) -> io::Result<()> {
    let fd = s.as_fd();
    let mut ops = FdOps(fd);
    let mut rem = bytes;
    while !rem.is_empty() {
        match ops.write(rem) {
            Ok(0) => {
                let e = io::Error::from(io::ErrorKind::WriteZero);
                log::error!("writing to socket failed: {e}");
                return Err(e);
            }
            Ok(n) => rem = rem.get(n..).unwrap_or_default(),
            Err(e) if e.is_interrupted() => continue,
            Err(e) if e.is_would_block() => {
                log_err!(wait_writable(fd), "waiting for socket to drain failed")?
            }
            Err(e) => {
                log::error!("writing to socket failed: {e}");
                return Err(e);
            }
        }
    }
    Ok(())
}

fn wait_writable(fd: BorrowedFd<'_>) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    if !c_wrappers::fits_fd_set(raw) {
        return Err(invalid_input("descriptor out of select() range"));
    }
    retry_interrupted(|| {
        let mut set = FdSet::with(raw);
        // raw < FD_SETSIZE, so this can't overflow
        #[allow(clippy::arithmetic_side_effects)]
        let nfds = raw + 1;
        c_wrappers::select(nfds, None, Some(&mut set), None).map(drop)
    })
}

/// Outcome of [`read_line()`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReadLine {
    /// A line was read. The value is its length, with the line terminator stripped; the byte
    /// right after it in the buffer is a NUL.
    Line(usize),
    /// The stream ended before any byte was read.
    Eof,
}

/// Reads one line from `fd` into `buf`, one byte at a time.
///
/// Reading stops after a `\n`, at end of stream, or once `buf.len() - 1` bytes have been
/// consumed (the last byte is reserved for the NUL terminator). A trailing `\n`, and a `\r`
/// before it, are stripped from the result. `EINTR` and `EAGAIN` are retried.
///
/// Reading one byte at a time means nothing past the line is consumed, so the descriptor can be
/// handed to other code afterwards.
///
/// # Errors
/// [`InvalidInput`](io::ErrorKind::InvalidInput) if `buf` is shorter than two bytes; otherwise
/// whatever `read` fails with.
pub fn read_line(fd: impl AsFd, buf: &mut [u8]) -> io::Result<ReadLine> {
    let max = match buf.len().checked_sub(1) {
        Some(m) if m > 0 => m,
        _ => return Err(invalid_input("line buffer must have room for a byte and a terminator")),
    };
    let mut ops = FdOps(fd.as_fd());
    let mut len = 0;
    let mut byte = [0_u8];
    while len < max {
        match ops.read(&mut byte) {
            Ok(0) => break,
            Ok(..) => {
                let [b] = byte;
                if let Some(slot) = buf.get_mut(len) {
                    *slot = b;
                }
                len += 1;
                if b == b'\n' {
                    break;
                }
            }
            Err(e) if e.is_transient() => continue,
            Err(e) => {
                log::error!("read failed: {e}");
                return Err(e);
            }
        }
    }
    if len == 0 {
        return Ok(ReadLine::Eof);
    }

    let line = buf.get(..len).unwrap_or_default();
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let len = line.len();
    if let Some(slot) = buf.get_mut(len) {
        *slot = 0;
    }
    Ok(ReadLine::Line(len))
}

/// Reads from `fd` until end of stream.
///
/// The buffer grows in steps of [`READ_TO_EOF_CHUNK`]. `EINTR` and `EAGAIN` are retried. On
/// error, whatever was read so far is discarded.
pub fn read_to_eof(fd: impl AsFd) -> io::Result<Vec<u8>> {
    let mut ops = FdOps(fd.as_fd());
    let mut data = Vec::new();
    let mut len = 0;
    loop {
        if len == data.len() {
            data.resize(len + READ_TO_EOF_CHUNK, 0);
        }
        let spare = data.get_mut(len..).unwrap_or_default();
        match ops.read(spare) {
            Ok(0) => break,
            Ok(n) => len += n,
            Err(e) if e.is_transient() => continue,
            Err(e) => {
                log::error!("error while reading: {e}");
                return Err(e);
            }
        }
    }
    data.truncate(len);
    Ok(data)
}
