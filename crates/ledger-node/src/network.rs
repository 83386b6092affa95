//! Peer messaging: one JSON-encoded [`Message`] per TCP connection.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time::timeout,
};
use tracing::{debug, warn};

use crate::constants::{MAX_MESSAGE_SIZE, PEER_CONNECT_TIMEOUT_SECS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub command: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct Network {
    peers: Vec<String>,
}

impl Network {
    pub fn new(peers: Vec<String>) -> Self {
        Self { peers }
    }

    /// Sends `data` tagged with `command` to every peer. Unreachable peers are
    /// skipped; returns how many peers accepted the message.
    pub async fn broadcast(&self, command: &str, data: &[u8]) -> Result<usize> {
        let payload = serde_json::to_vec(&Message {
            command: command.to_string(),
            data: data.to_vec(),
        })
        .context("encoding peer message")?;

        let mut delivered = 0;
        for peer in &self.peers {
            match send(peer, &payload).await {
                Ok(()) => {
                    debug!(%peer, command, "message delivered");
                    delivered += 1;
                }
                Err(e) => warn!(%peer, command, error = %e, "peer unreachable"),
            }
        }
        Ok(delivered)
    }

    /// Accepts peer connections forever, decoding one message per connection
    /// and passing it to `handler`.
    pub async fn serve<F>(listener: TcpListener, handler: F) -> Result<()>
    where
        F: Fn(Message, SocketAddr) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "failed to accept peer connection");
                    continue;
                }
            };
            let handler = handler.clone();
            tokio::spawn(async move {
                match read_message(stream).await {
                    Ok(msg) => handler(msg, addr),
                    Err(e) => warn!(%addr, error = %e, "dropping malformed peer message"),
                }
            });
        }
    }
}

async fn send(peer: &str, payload: &[u8]) -> Result<()> {
    let mut stream = timeout(
        Duration::from_secs(PEER_CONNECT_TIMEOUT_SECS),
        TcpStream::connect(peer),
    )
    .await
    .context("connect timed out")??;
    stream.write_all(payload).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn read_message(stream: TcpStream) -> Result<Message> {
    let mut buf = Vec::new();
    stream.take(MAX_MESSAGE_SIZE).read_to_end(&mut buf).await?;
    serde_json::from_slice(&buf).context("decoding peer message")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn spawn_listener() -> (SocketAddr, mpsc::UnboundedReceiver<Message>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Network::serve(listener, move |msg, _from| {
            let _ = tx.send(msg);
        }));
        (addr, rx)
    }

    #[tokio::test]
    async fn broadcast_reaches_listening_peer() {
        let (addr, mut rx) = spawn_listener().await;
        let network = Network::new(vec![addr.to_string()]);

        let delivered = network.broadcast("block", b"payload").await.unwrap();
        assert_eq!(delivered, 1);

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.command, "block");
        assert_eq!(msg.data, b"payload");
    }

    #[tokio::test]
    async fn unreachable_peers_are_skipped() {
        let (addr, mut rx) = spawn_listener().await;
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);

        let network = Network::new(vec![dead_addr.to_string(), addr.to_string()]);
        let delivered = network.broadcast("message", b"hello").await.unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await.unwrap().data, b"hello");
    }

    #[tokio::test]
    async fn no_peers_delivers_nothing() {
        let network = Network::default();
        assert_eq!(network.broadcast("block", b"x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_message_is_dropped() {
        let (addr, mut rx) = spawn_listener().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"garbage").await.unwrap();
        stream.shutdown().await.unwrap();

        let network = Network::new(vec![addr.to_string()]);
        network.broadcast("block", b"ok").await.unwrap();
        assert_eq!(rx.recv().await.unwrap().data, b"ok");
    }
}
