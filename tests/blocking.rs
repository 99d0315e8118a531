use {
    crate::{
        blocking::{local_ip, query_blocking, remote_ip, set_blocking},
        tests::util::*,
        udp_client_socket,
    },
    color_eyre::eyre::WrapErr,
};

#[test]
fn toggle() -> TestResult {
    testinit();
    let (r, _w) = pipe()?;
    ensure_eq!(query_blocking(&r)?, true);

    set_blocking(&r, false).context("switch to nonblocking failed")?;
    ensure_eq!(query_blocking(&r)?, false);
    // Already nonblocking, nothing changes
    set_blocking(&r, false)?;
    ensure_eq!(query_blocking(&r)?, false);

    set_blocking(&r, true).context("switch back to blocking failed")?;
    ensure_eq!(query_blocking(&r)?, true);
    Ok(())
}

#[test]
fn unconnected_socket_names() -> TestResult {
    testinit();
    let s = udp_client_socket()?;
    ensure_eq!(local_ip(&s), "0.0.0.0");
    // getpeername fails with ENOTCONN, which falls back
    ensure_eq!(remote_ip(&s), "0.0.0.0");
    Ok(())
}
