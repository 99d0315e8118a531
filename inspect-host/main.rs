//! Prints what the socket helpers see on this machine: address structure sizes, the detected host
//! identity, and the result of a loopback round trip.
#![allow(clippy::incompatible_msrv)]

#[macro_use]
mod util;

use {
    gwsock::{
        addr::{DATAGRAM_ADDRESS_V4_LEN, DATAGRAM_ADDRESS_V6_LEN},
        blocking, readiness, resolve, stream, udp_bind, udp_recvfrom, udp_sendto,
        DatagramAddress, HostIdentity,
    },
    libc::{fd_set, sockaddr_in, sockaddr_in6, sockaddr_storage, timeval},
    std::net::Ipv4Addr,
    util::*,
};

fn main() {
    print_sizes(&sizes!(sockaddr_in, sockaddr_in6, sockaddr_storage, fd_set, timeval));
    print_values(&[
        ("FD_SETSIZE", libc::FD_SETSIZE.to_string()),
        ("opaque IPv4 address", format!("{DATAGRAM_ADDRESS_V4_LEN} bytes")),
        ("opaque IPv6 address", format!("{DATAGRAM_ADDRESS_V6_LEN} bytes")),
    ]);
    println!();

    let id = HostIdentity::detect();
    print_values(&[("official name", id.official_name()), ("official IP", id.official_ip())]);
    if let Some(he) = resolve::lookup_host("localhost").or_report("Failed to resolve localhost") {
        println!("localhost resolves to {:?} as `{}'", he.addrs(), he.canonical_name());
    }
    println!();

    tcp_probe();
    udp_probe();
}

fn tcp_probe() {
    let Some(listener) = stream::ServerOptions::new()
        .interface(Ipv4Addr::LOCALHOST)
        .create()
        .or_report("Failed to create a loopback TCP listener")
    else {
        return;
    };
    let Some(port) = stream::local_port(&listener).or_report("Failed to query the listener's port")
    else {
        return;
    };
    println!("TCP listener on {}:{port}", blocking::local_ip(&listener));

    let Some(client) = stream::tcpip_connect_to_server("127.0.0.1", port)
        .or_report("Failed to connect to the loopback listener")
    else {
        return;
    };
    println!(
        "Client {}:{} connected to {}",
        blocking::local_ip(&client),
        stream::local_port(&client).unwrap_or(0),
        blocking::remote_ip(&client),
    );
    if let Some(r) = readiness::read_available(&listener, 100_000)
        .or_report("Failed to wait on the listener")
    {
        println!("Listener readiness after connect: {r:?}");
    }
    if let Some(b) = blocking::query_blocking(&client).or_report("Failed to query blocking mode") {
        println!("Client socket is {}blocking", if b { "" } else { "non" });
    }
}

fn udp_probe() {
    let Some(sock) = udp_bind(0, "127.0.0.1").or_report("Failed to bind a loopback UDP socket")
    else {
        return;
    };
    let Some(port) = stream::local_port(&sock).or_report("Failed to query the UDP port") else {
        return;
    };
    let to = DatagramAddress::V4 { addr: Ipv4Addr::LOCALHOST, port };
    if udp_sendto(&sock, b"ping", &to).or_report("Failed to send a UDP packet").is_none() {
        return;
    }
    if let Some((data, from)) = udp_recvfrom(&sock).or_report("Failed to receive a UDP packet") {
        println!("UDP round trip: {} bytes from {from}", data.len());
    }
}
