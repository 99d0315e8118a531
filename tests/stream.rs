use {
    crate::{
        blocking::{local_ip, remote_ip, set_blocking},
        make_server_socket, read_line, read_to_eof,
        stream::local_port,
        tcpip_connect_to_server, tcpip_connect_to_server_with_port,
        tests::util::*,
        write_to_socket, ReadLine, ServerOptions,
    },
    color_eyre::eyre::{bail, ensure, WrapErr},
    std::{
        io::{self, Write},
        net::{Ipv4Addr, TcpStream},
        sync::mpsc::Sender,
    },
};

#[test]
fn server_lifecycle() -> TestResult {
    testinit();
    let listener = make_server_socket(0).context("server socket creation failed")?;
    let port = local_port(&listener)?;
    ensure!(port != 0);
    ensure_eq!(local_ip(&listener), "0.0.0.0");

    let client = tcpip_connect_to_server("127.0.0.1", port).context("connect failed")?;
    ensure_eq!(local_ip(&client), "127.0.0.1");
    ensure_eq!(remote_ip(&client), "127.0.0.1");
    Ok(())
}

#[test]
fn connect_by_name() -> TestResult {
    testinit();
    let (_listener, port) = loopback_listener()?;
    let client = tcpip_connect_to_server("localhost", port).context("connect failed")?;
    ensure_eq!(remote_ip(&client), "127.0.0.1");
    Ok(())
}

#[test]
fn connect_from_fixed_local_port() -> TestResult {
    testinit();
    let (_listener, port) = loopback_listener()?;
    let local = {
        // Borrow a port the kernel considers free, then give it back
        let probe = ServerOptions::new().interface(Ipv4Addr::LOCALHOST).create()?;
        local_port(&probe)?
    };
    let client = tcpip_connect_to_server_with_port("127.0.0.1", port, local)
        .context("connect with local port failed")?;
    ensure_eq!(local_port(&client)?, local);
    Ok(())
}

#[test]
fn connect_refused() -> TestResult {
    testinit();
    let port = {
        let (_listener, port) = loopback_listener()?;
        port
    };
    let err = tcpip_connect_to_server("127.0.0.1", port).unwrap_err();
    ensure_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    Ok(())
}

#[test]
fn lines() -> TestResult {
    testinit();
    drive_server_and_client(
        |port_sender: Sender<u16>| {
            let (listener, port) = loopback_listener()?;
            let _ = port_sender.send(port);
            let (mut conn, _) = listener.accept().context("accept failed")?;
            conn.write_all(b"HELLO\r\nWORLD\nABCDEFG\n")?;
            Ok(())
        },
        |port| {
            let conn = tcpip_connect_to_server("127.0.0.1", port)?;
            let mut buf = [0xaa_u8; 64];

            ensure_eq!(read_line(&conn, &mut buf)?, ReadLine::Line(5));
            ensure_eq!(&buf[..6], b"HELLO\0");
            ensure_eq!(read_line(&conn, &mut buf)?, ReadLine::Line(5));
            ensure_eq!(&buf[..6], b"WORLD\0");

            // Three bytes and the terminator at a time
            let mut small = [0_u8; 4];
            ensure_eq!(read_line(&conn, &mut small)?, ReadLine::Line(3));
            ensure_eq!(&small, b"ABC\0");
            ensure_eq!(read_line(&conn, &mut small)?, ReadLine::Line(3));
            ensure_eq!(&small, b"DEF\0");
            ensure_eq!(read_line(&conn, &mut small)?, ReadLine::Line(1));
            ensure_eq!(&small[..2], b"G\0");

            ensure_eq!(read_line(&conn, &mut buf)?, ReadLine::Eof);
            Ok(())
        },
    )
}

#[test]
fn line_buffer_too_small() -> TestResult {
    testinit();
    let (r, _w) = pipe()?;
    let err = read_line(&r, &mut [0; 1]).unwrap_err();
    ensure_eq!(err.kind(), io::ErrorKind::InvalidInput);
    let err = read_line(&r, &mut []).unwrap_err();
    ensure_eq!(err.kind(), io::ErrorKind::InvalidInput);
    Ok(())
}

fn pattern(len: usize) -> Vec<u8> { (0..len).map(|i| (i % 251) as u8).collect() }

#[test]
fn read_everything() -> TestResult {
    testinit();
    const LEN: usize = 40_000;
    drive_server_and_client(
        |port_sender: Sender<u16>| {
            let (listener, port) = loopback_listener()?;
            let _ = port_sender.send(port);
            let (conn, _) = listener.accept().context("accept failed")?;
            write_to_socket(&conn, &pattern(LEN)).context("write failed")?;
            Ok(())
        },
        |port| {
            let conn = tcpip_connect_to_server("127.0.0.1", port)?;
            let data = read_to_eof(&conn).context("read failed")?;
            ensure_eq!(data.len(), LEN);
            ensure!(data == pattern(LEN), "data corrupted in transit");
            Ok(())
        },
    )
}

#[test]
fn write_waits_on_full_nonblocking_socket() -> TestResult {
    testinit();
    // Far more than any default socket buffer
    const LEN: usize = 8 * 1024 * 1024;
    drive_server_and_client(
        |port_sender: Sender<u16>| {
            let (listener, port) = loopback_listener()?;
            let _ = port_sender.send(port);
            let (conn, _) = listener.accept().context("accept failed")?;
            set_blocking(&conn, false)?;
            write_to_socket(&conn, &pattern(LEN)).context("write failed")?;
            Ok(())
        },
        |port| {
            let conn = TcpStream::connect(("127.0.0.1", port))?;
            let data = read_to_eof(&conn)?;
            ensure_eq!(data.len(), LEN);
            ensure!(data == pattern(LEN), "data corrupted in transit");
            Ok(())
        },
    )
}

#[test]
fn many_clients() -> TestResult {
    testinit();
    drive_server_and_multiple_clients(
        |port_sender: Sender<u16>, num_clients| {
            let (listener, port) = loopback_listener()?;
            let _ = port_sender.send(port);
            let mut buf = [0; 128];
            for _ in 0..num_clients {
                let (conn, _) = listener.accept().context("accept failed")?;
                let ReadLine::Line(len) = read_line(&conn, &mut buf)? else {
                    bail!("client hung up without a greeting");
                };
                ensure_eq!(&buf[..len], message(false, None).as_bytes());
                write_to_socket(&conn, message(true, Some('\n')).as_bytes())?;
            }
            Ok(())
        },
        |port: &u16| {
            let conn = tcpip_connect_to_server("localhost", *port).context("connect failed")?;
            write_to_socket(&conn, message(false, Some('\n')).as_bytes())?;
            let mut buf = [0; 128];
            let ReadLine::Line(len) = read_line(&conn, &mut buf)? else {
                bail!("server hung up without a reply");
            };
            ensure_eq!(&buf[..len], message(true, None).as_bytes());
            Ok(())
        },
    )
}
