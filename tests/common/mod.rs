//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use request_echo::config::{EchoConfig, Transport};
use request_echo::lifecycle::{startup, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Start an echo server on an ephemeral loopback port.
pub async fn start_server(transport: Transport) -> (SocketAddr, Shutdown) {
    start_server_with(transport, |_| {}).await
}

/// Start an echo server after adjusting its configuration.
pub async fn start_server_with<F>(transport: Transport, adjust: F) -> (SocketAddr, Shutdown)
where
    F: FnOnce(&mut EchoConfig),
{
    let mut config = EchoConfig::default();
    config.listener.hostname = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.listener.transport = transport;
    adjust(&mut config);

    let listener = startup::bind(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = startup::serve(listener, config, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that never pools or proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Write raw bytes, half-close, and collect everything the server sends back.
#[allow(dead_code)]
pub async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut received = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut received))
        .await
        .expect("server did not close the connection")
        .unwrap();
    received
}

/// Split a raw HTTP response into its head text and body bytes.
#[allow(dead_code)]
pub fn split_response(wire: &[u8]) -> (String, Vec<u8>) {
    let end = wire
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no end of response head");
    (
        String::from_utf8(wire[..end].to_vec()).unwrap(),
        wire[end + 4..].to_vec(),
    )
}

/// Length of the first complete response in `wire`, if it has fully arrived.
#[allow(dead_code)]
pub fn split_response_complete(wire: &[u8]) -> Option<usize> {
    let end = wire.windows(4).position(|w| w == b"\r\n\r\n")?;
    let head = String::from_utf8_lossy(&wire[..end]);
    let length: usize = head
        .lines()
        .find_map(|line| line.strip_prefix("Content-Length: "))?
        .trim()
        .parse()
        .ok()?;

    let total = end + 4 + length;
    (wire.len() >= total).then_some(total)
}
