use {
    crate::{read_available, tests::util::*, Readiness},
    color_eyre::eyre::{ensure, WrapErr},
    std::{
        fs::File,
        io::{self, Write},
        net::TcpStream,
        os::fd::{BorrowedFd, RawFd},
        time::{Duration, Instant},
    },
};

#[test]
fn times_out_on_silent_pipe() -> TestResult {
    testinit();
    let (r, _w) = pipe()?;
    let start = Instant::now();
    let res = read_available(&r, 50_000).context("wait failed")?;
    let elapsed = start.elapsed();
    ensure_eq!(res, Readiness::TimedOut);
    ensure!(elapsed >= Duration::from_millis(45), "returned early, after {elapsed:?}");
    ensure!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
    Ok(())
}

#[test]
fn zero_budget_polls() -> TestResult {
    testinit();
    let (r, _w) = pipe()?;
    ensure_eq!(read_available(&r, 0)?, Readiness::TimedOut);
    Ok(())
}

#[test]
fn ready_pipe() -> TestResult {
    testinit();
    let (r, w) = pipe()?;
    File::from(w).write_all(b"x")?;
    let res = read_available(&r, 1_000_000)?;
    ensure!(res.is_ready());
    Ok(())
}

#[test]
fn listener_ready_after_connect() -> TestResult {
    testinit();
    let (listener, port) = loopback_listener()?;
    ensure_eq!(read_available(&listener, 10_000)?, Readiness::TimedOut);
    let _client = TcpStream::connect(("127.0.0.1", port))?;
    ensure_eq!(read_available(&listener, 1_000_000)?, Readiness::Ready);
    Ok(())
}

#[test]
fn descriptor_out_of_select_range() -> TestResult {
    testinit();
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let raw = libc::FD_SETSIZE as RawFd + 3;
    // Never reaches a system call
    let fd = unsafe { BorrowedFd::borrow_raw(raw) };
    let err = read_available(fd, 1000).unwrap_err();
    ensure_eq!(err.kind(), io::ErrorKind::InvalidInput);
    Ok(())
}

#[test]
fn unopened_descriptor_is_an_error() -> TestResult {
    testinit();
    // The highest descriptor select() accepts, which nothing in the test binary gets near
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let raw = libc::FD_SETSIZE as RawFd - 1;
    let unused = unsafe { libc::fcntl(raw, libc::F_GETFD) } == -1;
    ensure!(unused, "fd {raw} is open, can't test with it");

    let fd = unsafe { BorrowedFd::borrow_raw(raw) };
    let err = read_available(fd, 1000).unwrap_err();
    ensure_eq!(err.raw_os_error(), Some(libc::EBADF));
    Ok(())
}
