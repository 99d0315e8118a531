//! Bounded wait for a single descriptor to become readable.

use crate::{
    misc::{invalid_input, timeval_from_usec, RawOsErrorExt, TransientErrorExt},
    os::unix::{
        c_wrappers::{self, FdSet},
        unixprelude::*,
    },
};
use std::io;

/// Outcome of [`read_available()`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Readiness {
    /// The descriptor can be read from without blocking.
    ///
    /// Also reported when `select(2)` itself fails with `EAGAIN`; a nonblocking descriptor can
    /// therefore turn out to have no data after all, and callers must be ready for that.
    Ready,
    /// The wait budget ran out.
    TimedOut,
}
impl Readiness {
    /// `true` for [`Ready`](Self::Ready).
    #[inline]
    pub const fn is_ready(self) -> bool { matches!(self, Self::Ready) }
}

const THREE_YEARS_SECS: i64 = 10_000_000;
const USEC_PER_SEC: i64 = 1_000_000;

/// Waits up to `wait_usec` microseconds for `fd` to become readable.
///
/// An interrupting signal does not restart the wait from scratch: the retry continues with
/// whatever time the kernel says is left, so the total wait stays close to the budget on
/// platforms that report it (Linux does).
///
/// `EBADF` and `EINVAL` are logged with hints at what the caller might have gotten wrong before
/// being returned. Descriptors that can't be placed in an `fd_set` are rejected up front with
/// [`InvalidInput`](io::ErrorKind::InvalidInput).
pub fn read_available(fd: impl AsFd, wait_usec: u64) -> io::Result<Readiness> {
    let raw = fd.as_fd().as_raw_fd();
    if !c_wrappers::fits_fd_set(raw) {
        log::warn!("fd {raw} can't be waited on with select()");
        return Err(invalid_input("descriptor out of select() range"));
    }

    let mut timeout = timeval_from_usec(wait_usec);
    loop {
        let mut set = FdSet::with(raw);
        // raw < FD_SETSIZE, so this can't overflow
        #[allow(clippy::arithmetic_side_effects)]
        let nfds = raw + 1;
        match c_wrappers::select(nfds, Some(&mut set), None, Some(&mut timeout)) {
            Ok(n) if n > 0 && set.contains(raw) => return Ok(Readiness::Ready),
            Ok(..) => return Ok(Readiness::TimedOut),
            Err(e) if e.is_interrupted() => {
                log::trace!(
                    "select on fd {raw} interrupted, {}.{:06}s left",
                    timeout.tv_sec,
                    timeout.tv_usec
                );
                continue;
            }
            Err(e) if e.is_would_block() => return Ok(Readiness::Ready),
            Err(e) => {
                diagnose(raw, &set, &timeout, &e);
                return Err(e);
            }
        }
    }
}

fn diagnose(raw: c_int, set: &FdSet, timeout: &timeval, e: &io::Error) {
    let errno = e.raw_os_error();
    if errno.eeq(libc::EBADF) {
        if set.contains(raw) {
            log::warn!("tried to select on invalid fd {raw}");
        } else {
            log::warn!("tried to select on fd {raw}, not in the set");
        }
    } else if errno.eeq(libc::EINVAL) {
        if i64::from(timeout.tv_sec) > THREE_YEARS_SECS {
            log::warn!("wait more than three years for a select?");
        }
        if i64::from(timeout.tv_usec) >= USEC_PER_SEC {
            log::warn!("there are only 1000000 usec in a second...");
        }
    }
    log::error!("select on fd {raw} failed: {e}");
}
