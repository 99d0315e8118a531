use super::{c_wrappers, unixprelude::*};
use crate::DatagramAddress;
use std::io::{self, prelude::*};

/// Plain `read`/`write` on a descriptor the caller keeps ownership of.
///
/// No retrying happens at this level: `EINTR` and `EAGAIN` surface as-is so that each helper can
/// apply its own policy.
#[derive(Copy, Clone, Debug)]
#[repr(transparent)]
pub(crate) struct FdOps<'fd>(pub(crate) BorrowedFd<'fd>);
impl FdOps<'_> {
    #[inline]
    pub(crate) fn raw(self) -> RawFd { self.0.as_raw_fd() }

    pub(crate) fn send_to(self, buf: &[u8], addr: &DatagramAddress) -> io::Result<usize> {
        let sin = addr.to_sockaddr_in().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Unsupported, "IPv6 datagram targets are not supported")
        })?;
        c_wrappers::sendto_v4(self.0, buf, &sin)
    }
    pub(crate) fn recv_from(self, buf: &mut [u8]) -> io::Result<(usize, DatagramAddress)> {
        let (received, storage, len) = c_wrappers::recvfrom(self.0, buf)?;
        let addr = DatagramAddress::from_storage(&storage, len)?;
        Ok((received, addr))
    }
}

impl Read for FdOps<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let length_to_read = buf.len();

        let (success, bytes_read) = unsafe {
            let size_or_err = libc::read(self.raw(), buf.as_mut_ptr().cast(), length_to_read);
            (size_or_err >= 0, size_or_err as usize)
        };
        ok_or_errno!(success => bytes_read)
    }
}
impl Write for FdOps<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let length_to_write = buf.len();

        let (success, bytes_written) = unsafe {
            let size_or_err = libc::write(self.raw(), buf.as_ptr().cast(), length_to_write);
            (size_or_err >= 0, size_or_err as usize)
        };
        ok_or_errno!(success => bytes_written)
    }
    // Sockets have nothing to flush; fsync would fail with EINVAL.
    #[inline]
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
