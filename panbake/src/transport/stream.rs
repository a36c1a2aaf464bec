//! Transport over any async byte stream.
//!
//! Useful for appliances reached through a console server or a raw TCP
//! bridge, where the shell is already running at the other end of a plain
//! stream.

use std::time::Duration;

use bytes::BytesMut;
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Transport;
use crate::error::{ChannelError, Result, TransportError};

/// [`Transport`] implementation for a tokio `AsyncRead + AsyncWrite` stream.
pub struct StreamTransport<S> {
    stream: Option<S>,
    pending: BytesMut,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
            pending: BytesMut::with_capacity(4096),
        }
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(ChannelError::Closed)?;
        stream.write_all(data).await.map_err(TransportError::Io)?;
        stream.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }

    async fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }

        let stream = self.stream.as_mut().ok_or(ChannelError::Closed)?;

        // read_buf is cancel safe, so a timeout never loses bytes
        match tokio::time::timeout(timeout, stream.read_buf(&mut self.pending)).await {
            Err(_) => Ok(false),
            Ok(Ok(0)) => Err(ChannelError::Closed.into()),
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(TransportError::Io(e).into()),
        }
    }

    async fn recv(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        let n = max_bytes.min(self.pending.len());
        Ok(self.pending.split_to(n).to_vec())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            // The peer may already have hung up
            if let Err(e) = stream.shutdown().await {
                debug!("error shutting down stream: {}", e);
            }
        }
        self.pending.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}
