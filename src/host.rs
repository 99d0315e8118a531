//! This host's canonical name and primary IPv4 address.
//!
//! There are two ways to use this module. An application that wants to own the state can call
//! [`HostIdentity::detect()`] and pass the handle around. Code written against the process-wide
//! model calls [`init()`] once at startup, reads through [`official_name()`]/[`official_ip()`]
//! from anywhere, and calls [`shutdown()`] on the way out. Reading before `init()` or after
//! `shutdown()` is a bug in the caller and panics.

use crate::{os::unix::c_wrappers, resolve};
use std::{
    net::Ipv4Addr,
    sync::{Arc, PoisonError, RwLock},
};

/// Address reported when the node name can't be resolved.
pub const FALLBACK_IP: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// The canonical name and primary IPv4 address of this host, as resolved once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostIdentity {
    name: Arc<str>,
    ip: Ipv4Addr,
    ip_text: Arc<str>,
}
impl HostIdentity {
    /// Queries the kernel for the node name and resolves it.
    ///
    /// If the name doesn't resolve, the unresolved node name and `127.0.0.1` are used instead and
    /// a warning is logged.
    ///
    /// # Panics
    /// If `uname(2)` fails, which it has no documented reason to do.
    pub fn detect() -> Self {
        let nodename = match c_wrappers::uname_nodename() {
            Ok(n) => n,
            Err(e) => panic!("uname failed, cannot determine this host's name: {e}"),
        };
        match resolve::lookup_host(&nodename) {
            Ok(he) => {
                let (name, ip) = he.into_name_and_primary();
                Self::new(name, ip)
            }
            Err(e) => {
                log::warn!(
                    "can't find out official hostname for this host ({e}), using `{nodename}' \
                     instead"
                );
                Self::new(nodename, FALLBACK_IP)
            }
        }
    }
    /// Assembles an identity from already-known values.
    pub fn new(name: impl Into<String>, ip: Ipv4Addr) -> Self {
        let name: String = name.into();
        Self { name: name.into(), ip, ip_text: ip.to_string().into() }
    }

    /// The canonical host name.
    #[inline]
    pub fn official_name(&self) -> &str { &self.name }
    /// The primary address in dotted-quad form.
    #[inline]
    pub fn official_ip(&self) -> &str { &self.ip_text }
    /// The primary address.
    #[inline]
    pub fn ip_addr(&self) -> Ipv4Addr { self.ip }
}

static IDENTITY: RwLock<Option<Arc<HostIdentity>>> = RwLock::new(None);

/// Detects this host's identity and makes it available process-wide.
///
/// # Panics
/// If the identity is already initialized, or if [`HostIdentity::detect()`] panics.
pub fn init() {
    let mut slot = IDENTITY.write().unwrap_or_else(PoisonError::into_inner);
    assert!(slot.is_none(), "host identity initialized twice");
    let identity = HostIdentity::detect();
    log::debug!("host identity: {} [{}]", identity.official_name(), identity.official_ip());
    *slot = Some(Arc::new(identity));
}

/// Forgets the process-wide identity. Both the name and the address are dropped.
pub fn shutdown() {
    let old = IDENTITY.write().unwrap_or_else(PoisonError::into_inner).take();
    if old.is_some() {
        log::debug!("host identity cleared");
    }
}

/// Whether [`init()`] has run without a matching [`shutdown()`].
pub fn is_initialized() -> bool {
    IDENTITY.read().unwrap_or_else(PoisonError::into_inner).is_some()
}

/// A shared handle to the process-wide identity.
///
/// # Panics
/// Before [`init()`] or after [`shutdown()`].
pub fn identity() -> Arc<HostIdentity> {
    let slot = IDENTITY.read().unwrap_or_else(PoisonError::into_inner);
    match &*slot {
        Some(id) => Arc::clone(id),
        None => panic!("host identity used before init() or after shutdown()"),
    }
}

/// This host's canonical name.
///
/// # Panics
/// Before [`init()`] or after [`shutdown()`].
pub fn official_name() -> Arc<str> { Arc::clone(&identity().name) }

/// This host's primary address in dotted-quad form.
///
/// # Panics
/// Before [`init()`] or after [`shutdown()`].
pub fn official_ip() -> Arc<str> { Arc::clone(&identity().ip_text) }
