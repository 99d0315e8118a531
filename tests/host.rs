use {
    crate::{
        host::{self, HostIdentity},
        tests::util::*,
    },
    color_eyre::eyre::{ensure, WrapErr},
    std::{net::Ipv4Addr, panic},
};

#[test]
fn explicit_identity() -> TestResult {
    testinit();
    let id = HostIdentity::new("gw.example.org", Ipv4Addr::new(192, 0, 2, 7));
    ensure_eq!(id.official_name(), "gw.example.org");
    ensure_eq!(id.official_ip(), "192.0.2.7");
    ensure_eq!(id.ip_addr(), Ipv4Addr::new(192, 0, 2, 7));
    Ok(())
}

#[test]
fn detected_identity_is_consistent() -> TestResult {
    testinit();
    let id = HostIdentity::detect();
    ensure!(!id.official_name().is_empty(), "empty host name");
    let ip: Ipv4Addr = id.official_ip().parse().context("official IP isn't a dotted-quad")?;
    ensure_eq!(ip, id.ip_addr());
    Ok(())
}

// The only test that touches the process-wide identity, so nothing races with it.
#[test]
fn global_lifecycle() -> TestResult {
    testinit();
    ensure!(!host::is_initialized());
    ensure!(panic::catch_unwind(host::official_name).is_err(), "read before init succeeded");

    host::init();
    ensure!(host::is_initialized());
    let detected = HostIdentity::detect();
    ensure_eq!(&*host::official_name(), detected.official_name());
    ensure_eq!(&*host::official_ip(), detected.official_ip());
    ensure!(panic::catch_unwind(host::init).is_err(), "second init succeeded");
    // Still usable after the rejected init
    ensure_eq!(&*host::official_name(), detected.official_name());

    host::shutdown();
    ensure!(!host::is_initialized());
    ensure!(panic::catch_unwind(host::official_ip).is_err(), "read after shutdown succeeded");
    // Idempotent
    host::shutdown();
    Ok(())
}
