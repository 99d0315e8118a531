//! Unix implementation details: raw `libc` calls and the descriptor I/O view built on them.

pub(crate) mod c_wrappers;
mod fdops;

pub(crate) use fdops::FdOps;

pub(crate) mod unixprelude {
    #[allow(unused_imports)]
    pub(crate) use {
        crate::{FdOrErrno, OrErrno},
        libc::{
            addrinfo, c_int, fd_set, sockaddr, sockaddr_in, sockaddr_in6, sockaddr_storage,
            socklen_t, timeval, AF_INET, AF_INET6, FD_SETSIZE, F_GETFL, F_SETFL, O_NONBLOCK,
            SOCK_DGRAM, SOCK_STREAM, SOL_SOCKET, SO_REUSEADDR,
        },
        std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd},
    };
}
