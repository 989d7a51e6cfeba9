//! Node readiness probe
//!
//! A freshly launched node takes a moment to open its RPC port. The
//! probe polls the port until it accepts a TCP connection or the
//! deadline passes, so dependent steps never race the node's boot.

use crate::node::NodeError;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

/// Poll a local port until it accepts connections
pub async fn wait_ready(port: u16, timeout: Duration, interval: Duration) -> Result<(), NodeError> {
    let deadline = Instant::now() + timeout;

    loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(_) => return Ok(()),
            Err(e) => debug!("Port {} not ready yet: {}", port, e),
        }

        if Instant::now() + interval > deadline {
            return Err(NodeError::NotReady {
                port,
                timeout_secs: timeout.as_secs(),
            });
        }
        tokio::time::sleep(interval).await;
    }
}
