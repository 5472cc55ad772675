//! A thin demo front-end: accept TCP connections, decode RESP messages off
//! each one with [`respincr::codec::RespCodec`], and forward each message's
//! captured wire-byte spans straight back out once it's `Ready` — no
//! re-encoding, since this crate does not build a RESP encoder (see the
//! crate's non-goals). The higher-level command dispatch that would give
//! those messages semantic meaning (SET/GET/etc.) is explicitly out of
//! scope; this binary only exists to give the parser a socket to read from.

use std::net::SocketAddr;

use anyhow::Context;
use futures::StreamExt;
use respincr::codec::RespCodec;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;
use tracing::{error, info, warn};

async fn process(stream: TcpStream, peer: SocketAddr) {
    let (read_half, mut write_half) = stream.into_split();
    let mut frames = FramedRead::new(read_half, RespCodec::new());

    loop {
        match frames.next().await {
            Some(Ok((_value, spans))) => {
                for span in spans {
                    if let Err(err) = write_half.write_all(&span).await {
                        warn!(%peer, error = %err, "failed writing forwarded bytes");
                        return;
                    }
                }
            }
            Some(Err(err)) => {
                error!(%peer, error = %err, "RESP protocol violation, closing connection");
                return;
            }
            None => {
                info!(%peer, "connection closed");
                return;
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let addr = "127.0.0.1:6379";
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "respincr-proxy listening");

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(%peer, "accepted connection");
                tokio::spawn(process(stream, peer));
            }
            Err(err) => {
                error!(error = %err, "failed to accept connection");
                return Err(err).context("accept loop failed");
            }
        }
    }
}
