//! Test utilities for standing up loopback servers and spawning clients to connect to them.
#![allow(dead_code, unused_macros)]

/// Like `assert_eq!`, but fails the test through its `TestResult` with both values printed.
macro_rules! ensure_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => ::color_eyre::eyre::ensure!(
                left == right,
                "`{}` != `{}`\n  left: `{:?}`\n right: `{:?}`",
                stringify!($left),
                stringify!($right),
                left,
                right,
            ),
        }
    };
}

mod drive;

pub use drive::*;

use {
    crate::stream::{self, ServerOptions},
    color_eyre::eyre::WrapErr,
    std::{
        io,
        net::{Ipv4Addr, TcpListener},
        os::fd::{FromRawFd, OwnedFd},
        sync::Once,
    },
};

pub type TestResult<T = ()> = color_eyre::eyre::Result<T>;

fn intvar(nam: &str) -> Option<u32> {
    let val = std::env::var(nam).ok()?;
    val.trim().parse().ok()
}
pub fn num_clients() -> u32 { intvar("GWSOCK_TEST_NUM_CLIENTS").filter(|n| *n > 0).unwrap_or(8) }

/// Installs the `color-eyre` report handler once per test binary.
pub fn testinit() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = color_eyre::install();
    });
}

pub fn message(server: bool, terminator: Option<char>) -> String {
    let sc = if server { "server" } else { "client" };
    let mut msg = format!("Hello from {sc}!");
    if let Some(t) = terminator {
        msg.push(t);
    }
    msg
}

/// A TCP listener on an ephemeral loopback port, wrapped in the std type so tests can accept.
pub fn loopback_listener() -> TestResult<(TcpListener, u16)> {
    let fd = ServerOptions::new()
        .interface(Ipv4Addr::LOCALHOST)
        .create()
        .context("listener creation failed")?;
    let port = stream::local_port(&fd).context("listener port query failed")?;
    Ok((TcpListener::from(fd), port))
}

/// Read and write ends of a fresh pipe.
pub fn pipe() -> TestResult<(OwnedFd, OwnedFd)> {
    let mut fds = [0; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
        return Err(io::Error::last_os_error()).context("pipe creation failed");
    }
    let [r, w] = fds;
    // SAFETY: pipe() just handed us both descriptors
    Ok(unsafe { (OwnedFd::from_raw_fd(r), OwnedFd::from_raw_fd(w)) })
}
