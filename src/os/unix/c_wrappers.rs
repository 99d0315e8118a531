use super::unixprelude::*;
use std::{
    ffi::{c_void, CStr},
    io,
    mem::{size_of, zeroed},
    net::Ipv4Addr,
    ptr,
};

#[allow(clippy::cast_possible_truncation)] // socket address structures are tiny
pub(crate) const fn socklen_of<T>() -> socklen_t { size_of::<T>() as socklen_t }

/// Creates an `AF_INET` socket of the given type with close-on-exec set.
pub(crate) fn create_inet_socket(ty: c_int) -> io::Result<OwnedFd> {
    #[allow(unused_mut, clippy::let_and_return)]
    let ty = {
        let mut ty = ty;
        #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
        {
            ty |= libc::SOCK_CLOEXEC;
        }
        ty
    };
    let fd = unsafe { libc::socket(AF_INET, ty, 0) }.fd_or_errno()?;
    // SAFETY: we just created this descriptor
    let fd = unsafe { OwnedFd::from_raw_fd(fd) };
    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    {
        set_cloexec(fd.as_fd())?;
    }
    Ok(fd)
}

pub(crate) fn set_reuseaddr(fd: BorrowedFd<'_>, reuse: bool) -> io::Result<()> {
    let reuse = c_int::from(reuse);
    let success = unsafe {
        libc::setsockopt(
            fd.as_raw_fd(),
            SOL_SOCKET,
            SO_REUSEADDR,
            (&reuse as *const c_int).cast::<c_void>(),
            socklen_of::<c_int>(),
        ) != -1
    };
    ok_or_errno!(success => ())
}

pub(crate) fn bind_v4(fd: BorrowedFd<'_>, addr: &sockaddr_in) -> io::Result<()> {
    let success = unsafe {
        libc::bind(
            fd.as_raw_fd(),
            (addr as *const sockaddr_in).cast::<sockaddr>(),
            socklen_of::<sockaddr_in>(),
        ) != -1
    };
    ok_or_errno!(success => ())
}

pub(crate) fn connect_v4(fd: BorrowedFd<'_>, addr: &sockaddr_in) -> io::Result<()> {
    let success = unsafe {
        libc::connect(
            fd.as_raw_fd(),
            (addr as *const sockaddr_in).cast::<sockaddr>(),
            socklen_of::<sockaddr_in>(),
        ) != -1
    };
    ok_or_errno!(success => ())
}

pub(crate) fn listen(fd: BorrowedFd<'_>, backlog: c_int) -> io::Result<()> {
    let success = unsafe { libc::listen(fd.as_raw_fd(), backlog) != -1 };
    ok_or_errno!(success => ())
}

/// `getsockname` (or `getpeername` if `peer` is set) into a generic storage buffer.
pub(crate) fn socket_name(
    fd: BorrowedFd<'_>,
    peer: bool,
) -> io::Result<(sockaddr_storage, socklen_t)> {
    // SAFETY: sockaddr_storage is POD
    let mut storage = unsafe { zeroed::<sockaddr_storage>() };
    let mut len = socklen_of::<sockaddr_storage>();
    let addr_ptr = (&mut storage as *mut sockaddr_storage).cast::<sockaddr>();
    let success = unsafe {
        if peer {
            libc::getpeername(fd.as_raw_fd(), addr_ptr, &mut len)
        } else {
            libc::getsockname(fd.as_raw_fd(), addr_ptr, &mut len)
        }
    } != -1;
    ok_or_errno!(success => (storage, len))
}

/// Takes the pending error off the socket (`SO_ERROR`), e.g. the outcome of a connect that
/// completed in the background.
pub(crate) fn take_socket_error(fd: BorrowedFd<'_>) -> io::Result<Option<io::Error>> {
    let mut err: c_int = 0;
    let mut len = socklen_of::<c_int>();
    let success = unsafe {
        libc::getsockopt(
            fd.as_raw_fd(),
            SOL_SOCKET,
            libc::SO_ERROR,
            (&mut err as *mut c_int).cast::<c_void>(),
            &mut len,
        ) != -1
    };
    ok_or_errno!(success => (err != 0).then(|| io::Error::from_raw_os_error(err)))
}

pub(crate) fn get_status_flags(fd: BorrowedFd<'_>) -> io::Result<c_int> {
    let flags = unsafe {
        // SAFETY: F_GETFL takes no argument; the null pointer is ignored.
        libc::fcntl(fd.as_raw_fd(), F_GETFL, ptr::null::<c_void>())
    };
    ok_or_errno!(flags != -1 => flags)
}
pub(crate) fn set_status_flags(fd: BorrowedFd<'_>, flags: c_int) -> io::Result<()> {
    let success = unsafe {
        // SAFETY: new flags are a c_int, as documented in the manpage.
        libc::fcntl(fd.as_raw_fd(), F_SETFL, flags)
    } != -1;
    ok_or_errno!(success => ())
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn set_cloexec(fd: BorrowedFd<'_>) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFD, 0) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    let success =
        unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, flags | libc::FD_CLOEXEC) } != -1;
    ok_or_errno!(success => ())
}

/// A single-descriptor `fd_set`.
pub(crate) struct FdSet(fd_set);
impl FdSet {
    /// The caller must have checked that `fd` is in `0..FD_SETSIZE`.
    pub(crate) fn with(fd: c_int) -> Self {
        // SAFETY: fd_set is POD, FD_ZERO initializes it anyway
        let mut set = unsafe { zeroed::<fd_set>() };
        unsafe {
            libc::FD_ZERO(&mut set);
            libc::FD_SET(fd, &mut set);
        }
        Self(set)
    }
    pub(crate) fn contains(&self, fd: c_int) -> bool { unsafe { libc::FD_ISSET(fd, &self.0) } }
    fn as_mut_ptr(&mut self) -> *mut fd_set { &mut self.0 }
}

/// Whether `fd` can be placed in an `fd_set` at all.
pub(crate) fn fits_fd_set(fd: c_int) -> bool {
    usize::try_from(fd).map_or(false, |fd| fd < FD_SETSIZE as usize)
}

/// Raw `select(2)` over at most one read set and one write set. Returns the ready count.
///
/// The sets and the timeout are passed through as-is, so the kernel's modifications (including
/// the remaining time on Linux) are visible to the caller afterwards.
pub(crate) fn select(
    nfds: c_int,
    read: Option<&mut FdSet>,
    write: Option<&mut FdSet>,
    timeout: Option<&mut timeval>,
) -> io::Result<c_int> {
    let read = read.map_or(ptr::null_mut(), FdSet::as_mut_ptr);
    let write = write.map_or(ptr::null_mut(), FdSet::as_mut_ptr);
    let timeout = timeout.map_or(ptr::null_mut(), |t| t as *mut timeval);
    let ret = unsafe { libc::select(nfds, read, write, ptr::null_mut(), timeout) };
    ok_or_errno!(ret != -1 => ret)
}

pub(crate) fn sendto_v4(fd: BorrowedFd<'_>, buf: &[u8], addr: &sockaddr_in) -> io::Result<usize> {
    let (success, sent) = unsafe {
        let ret = libc::sendto(
            fd.as_raw_fd(),
            buf.as_ptr().cast(),
            buf.len(),
            0,
            (addr as *const sockaddr_in).cast::<sockaddr>(),
            socklen_of::<sockaddr_in>(),
        );
        (ret >= 0, ret as usize)
    };
    ok_or_errno!(success => sent)
}

pub(crate) fn recvfrom(
    fd: BorrowedFd<'_>,
    buf: &mut [u8],
) -> io::Result<(usize, sockaddr_storage, socklen_t)> {
    // SAFETY: sockaddr_storage is POD
    let mut storage = unsafe { zeroed::<sockaddr_storage>() };
    let mut len = socklen_of::<sockaddr_storage>();
    let (success, received) = unsafe {
        let ret = libc::recvfrom(
            fd.as_raw_fd(),
            buf.as_mut_ptr().cast(),
            buf.len(),
            0,
            (&mut storage as *mut sockaddr_storage).cast::<sockaddr>(),
            &mut len,
        );
        (ret >= 0, ret as usize)
    };
    ok_or_errno!(success => (received, storage, len))
}

/// The kernel's idea of this machine's node name.
pub(crate) fn uname_nodename() -> io::Result<String> {
    // SAFETY: utsname is a bunch of char arrays
    let mut uts = unsafe { zeroed::<libc::utsname>() };
    let success = unsafe { libc::uname(&mut uts) } != -1;
    ok_or_errno!(success => ())?;
    // SAFETY: uname() NUL-terminates every field it fills in
    let name = unsafe { CStr::from_ptr(uts.nodename.as_ptr()) };
    Ok(name.to_string_lossy().into_owned())
}

/// An owned `getaddrinfo(3)` result list.
pub(crate) struct AddrInfoList(*mut addrinfo);
impl AddrInfoList {
    /// Looks up IPv4 stream addresses for `host`, asking for the canonical name.
    ///
    /// On failure, the `getaddrinfo` error code is returned as-is, since it lives in its own
    /// namespace rather than errno's.
    pub(crate) fn lookup_v4(host: &CStr) -> Result<Self, c_int> {
        // SAFETY: addrinfo is POD, zero is the documented "no preference" for every hint
        let mut hints = unsafe { zeroed::<addrinfo>() };
        hints.ai_family = AF_INET;
        hints.ai_socktype = libc::SOCK_STREAM;
        hints.ai_flags = libc::AI_CANONNAME;

        let mut res = ptr::null_mut::<addrinfo>();
        let err = unsafe { libc::getaddrinfo(host.as_ptr(), ptr::null(), &hints, &mut res) };
        if err == 0 {
            Ok(Self(res))
        } else {
            Err(err)
        }
    }
    /// The canonical name, which only the first entry carries.
    pub(crate) fn canonical_name(&self) -> Option<String> {
        // SAFETY: the list is live until we drop it
        let first = unsafe { self.0.as_ref() }?;
        if first.ai_canonname.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(first.ai_canonname) };
        Some(name.to_string_lossy().into_owned())
    }
    /// All IPv4 addresses in resolver order.
    pub(crate) fn ipv4_addrs(&self) -> Vec<Ipv4Addr> {
        let mut out = Vec::new();
        let mut cur = self.0;
        // SAFETY: every node is live until we drop the list
        while let Some(ai) = unsafe { cur.as_ref() } {
            if ai.ai_family == AF_INET && !ai.ai_addr.is_null() {
                let sin = unsafe { ptr::read_unaligned(ai.ai_addr.cast::<sockaddr_in>()) };
                out.push(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
            }
            cur = ai.ai_next;
        }
        out
    }
}
impl Drop for AddrInfoList {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { libc::freeaddrinfo(self.0) };
        }
    }
}

/// `gai_strerror` text for a `getaddrinfo` error code.
pub(crate) fn gai_error_text(code: c_int) -> String {
    let msg = unsafe { libc::gai_strerror(code) };
    if msg.is_null() {
        return format!("getaddrinfo error {code}");
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}
