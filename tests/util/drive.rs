use {
    super::{num_clients, TestResult},
    color_eyre::eyre::{bail, eyre, WrapErr},
    std::{
        sync::{
            mpsc::{self, Sender},
            Arc,
        },
        thread::{self, JoinHandle},
    },
};

/// Runs `server` on its own thread, waits for it to announce its address (usually a port), then
/// runs [`num_clients()`] instances of `client` concurrently against it.
pub fn drive_server_and_multiple_clients<T, Srv, Cli>(server: Srv, client: Cli) -> TestResult
where
    T: Send + Sync + 'static,
    Srv: FnOnce(Sender<T>, u32) -> TestResult + Send + 'static,
    Cli: Fn(&T) -> TestResult + Send + Sync + 'static,
{
    let num_clients = num_clients();
    let (sender, receiver) = mpsc::channel();
    let srv = thread::Builder::new()
        .name("server".to_owned())
        .spawn(move || server(sender, num_clients))
        .context("server thread spawn failed")?;

    let Ok(addr) = receiver.recv() else {
        join(srv, "server")?;
        bail!("server exited without announcing its address");
    };
    let (addr, client) = (Arc::new(addr), Arc::new(client));

    let clients = (0..num_clients)
        .map(|i| {
            let (addr, client) = (Arc::clone(&addr), Arc::clone(&client));
            thread::Builder::new().name(format!("client {i}")).spawn(move || client(&addr))
        })
        .collect::<Result<Vec<_>, _>>()
        .context("client thread spawn failed")?;
    for c in clients {
        join(c, "client")?;
    }
    join(srv, "server")
}

/// Runs one server and one client, the client getting whatever the server announces.
pub fn drive_server_and_client<T, Srv, Cli>(server: Srv, client: Cli) -> TestResult
where
    T: Send + 'static,
    Srv: FnOnce(Sender<T>) -> TestResult + Send + 'static,
    Cli: FnOnce(T) -> TestResult,
{
    let (sender, receiver) = mpsc::channel();
    let srv = thread::Builder::new()
        .name("server".to_owned())
        .spawn(move || server(sender))
        .context("server thread spawn failed")?;
    let Ok(addr) = receiver.recv() else {
        join(srv, "server")?;
        bail!("server exited without announcing its address");
    };
    client(addr)?;
    join(srv, "server")
}

pub fn join(h: JoinHandle<TestResult>, who: &str) -> TestResult {
    h.join().map_err(|_| eyre!("{who} thread panicked"))?
}
