//! Raw network addresses to text.

use crate::os::unix::unixprelude::*;
use std::{fmt::Write as _, net::Ipv4Addr};

/// Formats a raw network-order address of the given family.
///
/// `AF_INET` takes 4 bytes and yields a dotted-quad. `AF_INET6` takes 16 bytes and yields
/// [`ipv6_to_text`]'s legacy form. Other families, and slices too short for the family, yield
/// `None`. Extra trailing bytes are ignored.
pub fn netaddr_to_text(family: c_int, raw: &[u8]) -> Option<String> {
    match family {
        AF_INET => raw.get(..4)?.try_into().ok().map(ipv4_to_text),
        AF_INET6 => raw.get(..16)?.try_into().ok().map(ipv6_to_text),
        _ => None,
    }
}

/// `a.b.c.d`.
pub fn ipv4_to_text(octets: &[u8; 4]) -> String { Ipv4Addr::from(*octets).to_string() }

/// Sixteen lowercase hex fields, one per byte, separated by colons, without zero padding.
///
/// This is not RFC 5952 notation (`Ipv6Addr`'s `Display` is), but it is what downstream consumers
/// of this text have always been given.
pub fn ipv6_to_text(octets: &[u8; 16]) -> String {
    let mut out = String::with_capacity(16 * 3);
    for (i, b) in octets.iter().enumerate() {
        if i != 0 {
            out.push(':');
        }
        let _ = write!(out, "{b:x}");
    }
    out
}

/// Dotted-quad form of a socket address's IPv4 part.
pub fn host_ip(addr: &sockaddr_in) -> String {
    Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr)).to_string()
}
