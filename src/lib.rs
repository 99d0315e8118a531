#![doc = include_str!("../README.md")]
// If this was in Cargo.toml, it would cover the binary as well
#![warn(
    missing_docs,
    clippy::panic_in_result_fn,
    clippy::missing_assert_message,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

mod platform_check;

#[macro_use]
mod macros;

pub mod addr;
pub mod blocking;
pub mod datagram;
pub mod host;
pub mod netaddr;
pub mod readiness;
pub mod resolve;
pub mod stream;

/// Platform-specific plumbing shared by the socket helpers.
///
/// Only the Unix flavor exists; everything in it is crate-private and wraps `libc` calls one to
/// one, leaving policy (retries, logging, cleanup) to the public modules.
pub(crate) mod os {
    #[cfg(unix)]
    pub(crate) mod unix;
}

mod misc;
pub(crate) use misc::*;

pub use {
    addr::{udp_create_address, udp_get_ip, udp_get_port, DatagramAddress},
    blocking::{local_ip, query_blocking, remote_ip, set_blocking},
    datagram::{
        udp_bind, udp_client_socket, udp_recvfrom, udp_recvfrom_with_capacity, udp_sendto,
        UDP_PACKET_MAX_SIZE,
    },
    host::{official_ip, official_name, HostIdentity},
    netaddr::netaddr_to_text,
    readiness::{read_available, Readiness},
    stream::{
        make_server_socket, read_line, read_to_eof, tcpip_connect_to_server,
        tcpip_connect_to_server_with_port, write_to_socket, ConnectOptions, ReadLine,
        ServerOptions,
    },
};

#[cfg(test)]
#[path = "../tests/index.rs"]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests;
