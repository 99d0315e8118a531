//! Datagram endpoint addresses and their opaque byte form.
//!
//! Internally an endpoint is the typed [`DatagramAddress`]. Code that has to move endpoints through
//! byte-oriented plumbing (queues, message envelopes, anything that only knows about octet strings)
//! converts at the boundary with [`to_bytes()`](DatagramAddress::to_bytes) and
//! [`from_bytes()`](DatagramAddress::from_bytes). The byte form is exactly the in-memory image of
//! the platform's `sockaddr_in` (or `sockaddr_in6`): address family, port in network byte order,
//! address in network byte order, padding. Consumers should not pick it apart themselves; the
//! [`udp_get_port()`] and [`udp_get_ip()`] accessors exist for that.

use crate::{
    os::unix::{c_wrappers::socklen_of, unixprelude::*},
    resolve,
};
use std::{
    fmt::{self, Display, Formatter},
    io,
    mem::{size_of, zeroed},
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6},
    ptr, slice,
};

/// Width of the opaque IPv4 form, i.e. `size_of::<sockaddr_in>()`.
pub const DATAGRAM_ADDRESS_V4_LEN: usize = size_of::<sockaddr_in>();
/// Width of the opaque IPv6 form, i.e. `size_of::<sockaddr_in6>()`.
pub const DATAGRAM_ADDRESS_V6_LEN: usize = size_of::<sockaddr_in6>();

/// A resolved datagram endpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DatagramAddress {
    /// An IPv4 endpoint. This is the only kind the datagram helpers can send to.
    V4 {
        /// The IPv4 address.
        addr: Ipv4Addr,
        /// The port, in host byte order.
        port: u16,
    },
    /// An IPv6 endpoint, carried for completeness of the byte form.
    V6 {
        /// The IPv6 address.
        addr: Ipv6Addr,
        /// The port, in host byte order.
        port: u16,
        /// The `sin6_flowinfo` field.
        flowinfo: u32,
        /// The `sin6_scope_id` field.
        scope_id: u32,
    },
}

impl DatagramAddress {
    /// The any-interface IPv4 endpoint on the given port.
    #[inline]
    pub const fn wildcard(port: u16) -> Self { Self::V4 { addr: Ipv4Addr::UNSPECIFIED, port } }

    /// The port in host byte order.
    #[inline]
    pub const fn port(&self) -> u16 {
        match self {
            Self::V4 { port, .. } | Self::V6 { port, .. } => *port,
        }
    }

    /// The textual form of the address part: dotted-quad for IPv4, RFC 5952 for IPv6.
    pub fn ip_text(&self) -> String {
        match self {
            Self::V4 { addr, .. } => addr.to_string(),
            Self::V6 { addr, .. } => addr.to_string(),
        }
    }

    /// Encodes the endpoint into its opaque byte form.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.to_sockaddr_in() {
            Some(sin) => pod_bytes(&sin).to_vec(),
            None => pod_bytes(&self.to_sockaddr_in6_unchecked()).to_vec(),
        }
    }

    /// Decodes the opaque byte form.
    ///
    /// The length must be exactly that of `sockaddr_in` or `sockaddr_in6`, and the family field
    /// must agree with it; otherwise an error of kind [`InvalidData`](io::ErrorKind::InvalidData)
    /// is returned.
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        match bytes.len() {
            DATAGRAM_ADDRESS_V4_LEN => {
                // SAFETY: length checked, sockaddr_in is POD
                let sin = unsafe { ptr::read_unaligned(bytes.as_ptr().cast::<sockaddr_in>()) };
                if c_int::from(sin.sin_family) != AF_INET {
                    return Err(invalid_data("address bytes of IPv4 width carry a foreign family"));
                }
                Ok(Self::from_sockaddr_in(&sin))
            }
            DATAGRAM_ADDRESS_V6_LEN => {
                // SAFETY: as above
                let sin6 = unsafe { ptr::read_unaligned(bytes.as_ptr().cast::<sockaddr_in6>()) };
                if c_int::from(sin6.sin6_family) != AF_INET6 {
                    return Err(invalid_data("address bytes of IPv6 width carry a foreign family"));
                }
                Ok(Self::from_sockaddr_in6(&sin6))
            }
            _ => Err(invalid_data("address bytes have the wrong width")),
        }
    }

    pub(crate) fn from_sockaddr_in(sin: &sockaddr_in) -> Self {
        Self::V4 {
            addr: Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)),
            port: u16::from_be(sin.sin_port),
        }
    }
    fn from_sockaddr_in6(sin6: &sockaddr_in6) -> Self {
        Self::V6 {
            addr: Ipv6Addr::from(sin6.sin6_addr.s6_addr),
            port: u16::from_be(sin6.sin6_port),
            flowinfo: sin6.sin6_flowinfo,
            scope_id: sin6.sin6_scope_id,
        }
    }

    /// Reads whatever `recvfrom`/`getsockname` left in a storage buffer.
    pub(crate) fn from_storage(storage: &sockaddr_storage, len: socklen_t) -> io::Result<Self> {
        let family = c_int::from(storage.ss_family);
        if family == AF_INET && len >= socklen_of::<sockaddr_in>() {
            // SAFETY: the family says this is a sockaddr_in; storage is large and aligned enough
            let sin = unsafe { &*(storage as *const sockaddr_storage).cast::<sockaddr_in>() };
            Ok(Self::from_sockaddr_in(sin))
        } else if family == AF_INET6 && len >= socklen_of::<sockaddr_in6>() {
            // SAFETY: as above
            let sin6 = unsafe { &*(storage as *const sockaddr_storage).cast::<sockaddr_in6>() };
            Ok(Self::from_sockaddr_in6(sin6))
        } else {
            Err(io::Error::from_raw_os_error(libc::EAFNOSUPPORT))
        }
    }

    /// The `sockaddr_in` for IPv4 endpoints, `None` for IPv6 ones.
    pub(crate) fn to_sockaddr_in(&self) -> Option<sockaddr_in> {
        match *self {
            Self::V4 { addr, port } => Some(make_sockaddr_in(addr, port)),
            Self::V6 { .. } => None,
        }
    }
    fn to_sockaddr_in6_unchecked(&self) -> sockaddr_in6 {
        let Self::V6 { addr, port, flowinfo, scope_id } = *self else {
            unreachable!("IPv4 endpoint passed to the IPv6 encoder")
        };
        // SAFETY: sockaddr_in6 is a C struct with primitive integer/array fields.
        let mut sin6 = unsafe { zeroed::<sockaddr_in6>() };
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        ))]
        {
            sin6.sin6_len = DATAGRAM_ADDRESS_V6_LEN as u8;
        }
        sin6.sin6_family = AF_INET6 as libc::sa_family_t;
        sin6.sin6_port = port.to_be();
        sin6.sin6_addr = libc::in6_addr { s6_addr: addr.octets() };
        sin6.sin6_flowinfo = flowinfo;
        sin6.sin6_scope_id = scope_id;
        sin6
    }
}

/// Builds a zeroed `sockaddr_in` for `addr:port`.
pub(crate) fn make_sockaddr_in(addr: Ipv4Addr, port: u16) -> sockaddr_in {
    // SAFETY: sockaddr_in is a C struct with primitive integer fields.
    let mut sin = unsafe { zeroed::<sockaddr_in>() };
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        sin.sin_len = DATAGRAM_ADDRESS_V4_LEN as u8;
    }
    sin.sin_family = AF_INET as libc::sa_family_t;
    sin.sin_port = port.to_be();
    sin.sin_addr = libc::in_addr { s_addr: u32::from(addr).to_be() };
    sin
}

fn pod_bytes<T: Copy>(val: &T) -> &[u8] {
    // SAFETY: only called on zero-initialized libc address structs, so padding is initialized
    unsafe { slice::from_raw_parts((val as *const T).cast::<u8>(), size_of::<T>()) }
}

fn invalid_data(msg: &'static str) -> io::Error { io::Error::new(io::ErrorKind::InvalidData, msg) }

impl From<SocketAddr> for DatagramAddress {
    fn from(sa: SocketAddr) -> Self {
        match sa {
            SocketAddr::V4(v4) => Self::V4 { addr: *v4.ip(), port: v4.port() },
            SocketAddr::V6(v6) => Self::V6 {
                addr: *v6.ip(),
                port: v6.port(),
                flowinfo: v6.flowinfo(),
                scope_id: v6.scope_id(),
            },
        }
    }
}
impl From<DatagramAddress> for SocketAddr {
    fn from(da: DatagramAddress) -> Self {
        match da {
            DatagramAddress::V4 { addr, port } => SocketAddrV4::new(addr, port).into(),
            DatagramAddress::V6 { addr, port, flowinfo, scope_id } => {
                SocketAddrV6::new(addr, port, flowinfo, scope_id).into()
            }
        }
    }
}
impl Display for DatagramAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&SocketAddr::from(*self), f)
    }
}

/// Resolves `host_or_ip` and pairs it with `port`.
///
/// The literal `"*"` stands for the any-interface address and is never looked up. Resolution
/// failures are logged before being returned.
pub fn udp_create_address(host_or_ip: &str, port: u16) -> io::Result<DatagramAddress> {
    let addr = log_err!(
        resolve::resolve_interface(host_or_ip),
        "couldn't find the IP number of `{host_or_ip}'"
    )?;
    Ok(DatagramAddress::V4 { addr, port })
}

/// Port of an opaque IPv4 address, in host byte order.
///
/// # Panics
/// If `bytes` is not exactly as wide as `sockaddr_in`.
pub fn udp_get_port(bytes: &[u8]) -> u16 { sockaddr_in_from_opaque(bytes).port() }

/// Dotted-quad address of an opaque IPv4 address.
///
/// # Panics
/// If `bytes` is not exactly as wide as `sockaddr_in`.
pub fn udp_get_ip(bytes: &[u8]) -> String { sockaddr_in_from_opaque(bytes).ip_text() }

fn sockaddr_in_from_opaque(bytes: &[u8]) -> DatagramAddress {
    assert_eq!(
        bytes.len(),
        DATAGRAM_ADDRESS_V4_LEN,
        "opaque datagram address must be exactly sockaddr_in wide"
    );
    // SAFETY: length asserted, sockaddr_in is POD
    let sin = unsafe { ptr::read_unaligned(bytes.as_ptr().cast::<sockaddr_in>()) };
    DatagramAddress::from_sockaddr_in(&sin)
}
