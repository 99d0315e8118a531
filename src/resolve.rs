//! Thread-safe IPv4 name resolution on top of `getaddrinfo(3)`.

use crate::os::unix::{
    c_wrappers::{gai_error_text, AddrInfoList},
    unixprelude::*,
};
use std::{ffi::CString, io, net::Ipv4Addr};

/// The interface sentinel that means "any interface".
pub const WILDCARD: &str = "*";

/// What the resolver knows about a host.
///
/// Only [`lookup_host()`] builds these, so there is always at least one address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEntry {
    canonical_name: String,
    primary: Ipv4Addr,
    addrs: Vec<Ipv4Addr>,
}
impl HostEntry {
    /// The resolver's canonical name for the host, or the queried name if it didn't give one.
    #[inline]
    pub fn canonical_name(&self) -> &str { &self.canonical_name }
    /// The first (primary) address.
    #[inline]
    pub fn primary(&self) -> Ipv4Addr { self.primary }
    /// IPv4 addresses in resolver order, without duplicates.
    #[inline]
    pub fn addrs(&self) -> &[Ipv4Addr] { &self.addrs }
    /// Splits the entry into its canonical name and primary address.
    #[inline]
    pub fn into_name_and_primary(self) -> (String, Ipv4Addr) { (self.canonical_name, self.primary) }
}

/// Resolves a host name or dotted-quad to its IPv4 addresses and canonical name.
pub fn lookup_host(name: &str) -> io::Result<HostEntry> {
    let cname = CString::new(name)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "host name contains a nul byte"))?;
    let list = AddrInfoList::lookup_v4(&cname).map_err(gai_error)?;

    let mut addrs = list.ipv4_addrs();
    // One entry per socket type is common; keep the first occurrence of each.
    let mut seen = Vec::with_capacity(addrs.len());
    addrs.retain(|a| {
        let fresh = !seen.contains(a);
        if fresh {
            seen.push(*a);
        }
        fresh
    });
    let Some(&primary) = addrs.first() else {
        let msg = format!("`{name}' has no IPv4 address");
        return Err(io::Error::new(io::ErrorKind::NotFound, msg));
    };
    let canonical_name = list.canonical_name().unwrap_or_else(|| name.to_owned());
    log::trace!("resolved `{name}' to {canonical_name} {addrs:?}");
    Ok(HostEntry { canonical_name, primary, addrs })
}

/// Maps a bind/target interface to an address: `"*"` is the wildcard, anything else is looked up
/// and its primary address taken.
pub fn resolve_interface(interface: &str) -> io::Result<Ipv4Addr> {
    if interface == WILDCARD {
        return Ok(Ipv4Addr::UNSPECIFIED);
    }
    lookup_host(interface).map(|he| he.primary())
}

fn gai_error(code: c_int) -> io::Error {
    if code == libc::EAI_SYSTEM {
        return io::Error::last_os_error();
    }
    let kind = match code {
        libc::EAI_NONAME => io::ErrorKind::NotFound,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, gai_error_text(code))
}
