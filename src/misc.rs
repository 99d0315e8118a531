use std::{io, os::fd::RawFd};

pub(crate) trait OrErrno<T>: Sized {
    fn true_or_errno(self, f: impl FnOnce() -> T) -> io::Result<T>;
    #[inline(always)]
    fn true_val_or_errno(self, value: T) -> io::Result<T> { self.true_or_errno(|| value) }
}
impl<B: ToBool, T> OrErrno<T> for B {
    #[inline]
    fn true_or_errno(self, f: impl FnOnce() -> T) -> io::Result<T> {
        if self.to_bool() {
            Ok(f())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

pub(crate) trait FdOrErrno: Sized {
    fn fd_or_errno(self) -> io::Result<Self>;
}
impl FdOrErrno for RawFd {
    #[inline]
    fn fd_or_errno(self) -> io::Result<Self> { (self != -1).true_val_or_errno(self) }
}

pub(crate) trait ToBool {
    fn to_bool(self) -> bool;
}
impl ToBool for bool {
    #[inline(always)]
    fn to_bool(self) -> bool { self }
}

/// Classifies errors the stream and datagram loops treat as "try again".
pub(crate) trait TransientErrorExt {
    fn is_interrupted(&self) -> bool;
    fn is_would_block(&self) -> bool;
    #[inline]
    fn is_transient(&self) -> bool { self.is_interrupted() || self.is_would_block() }
}
impl TransientErrorExt for io::Error {
    #[inline]
    fn is_interrupted(&self) -> bool { self.kind() == io::ErrorKind::Interrupted }
    #[inline]
    fn is_would_block(&self) -> bool {
        // EWOULDBLOCK is EAGAIN everywhere we build, but not by definition.
        self.kind() == io::ErrorKind::WouldBlock
    }
}

pub(crate) trait RawOsErrorExt {
    fn eeq(self, other: i32) -> bool;
}
impl RawOsErrorExt for Option<i32> {
    #[inline(always)]
    fn eeq(self, other: i32) -> bool { self == Some(other) }
}


/// Runs `f` until it returns something other than `EINTR`.
#[inline]
pub(crate) fn retry_interrupted<T>(mut f: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match f() {
            Err(e) if e.is_interrupted() => continue,
            els => break els,
        }
    }
}

/// Splits a microsecond budget into the `timeval` shape `select(2)` wants.
pub(crate) fn timeval_from_usec(usec: u64) -> libc::timeval {
    const USEC_PER_SEC: u64 = 1_000_000;
    let secs = usec / USEC_PER_SEC;
    // Always below 10^6, so this fits whatever suseconds_t is.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let rem = (usec % USEC_PER_SEC) as libc::suseconds_t;
    let tv_sec = libc::time_t::try_from(secs).unwrap_or(libc::time_t::MAX);
    libc::timeval { tv_sec, tv_usec: rem }
}

pub(crate) fn invalid_input(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}
