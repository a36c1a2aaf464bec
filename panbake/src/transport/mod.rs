//! Transport layer: the byte channel to the appliance.
//!
//! A [`Transport`] is one interactive shell. It knows nothing about prompts
//! or commands; it only moves bytes and lets the caller wait for incoming
//! data with a bound. A [`Connector`] knows how to produce a fresh
//! transport, which is what the reconnect machinery needs after the device
//! reboots.

pub mod config;
#[cfg(test)]
pub(crate) mod mock;
mod ssh;
mod stream;

use std::future::Future;
use std::time::Duration;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
pub use stream::StreamTransport;

use crate::error::Result;

/// A bidirectional byte channel to an interactive shell.
pub trait Transport: Send {
    /// Write raw bytes to the shell.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait up to `timeout` for data to become available.
    ///
    /// Returns `Ok(false)` if nothing arrived in time. A channel closed by
    /// the peer is an error.
    fn wait_readable(&mut self, timeout: Duration) -> impl Future<Output = Result<bool>> + Send;

    /// Take up to `max_bytes` of already-available data without blocking.
    fn recv(&mut self, max_bytes: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Close the channel. Safe to call more than once.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Whether the channel is still open from our side.
    fn is_open(&self) -> bool;
}

/// Produces connected transports for one device.
pub trait Connector: Send + Sync {
    /// Transport type produced by this connector.
    type Transport: Transport;

    /// Open a new connection and shell.
    fn connect(&self) -> impl Future<Output = Result<Self::Transport>> + Send;

    /// Host this connector targets, for logging and errors.
    fn host(&self) -> &str;
}

impl Connector for SshConfig {
    type Transport = SshTransport;

    async fn connect(&self) -> Result<SshTransport> {
        SshTransport::connect(self.clone()).await
    }

    fn host(&self) -> &str {
        &self.host
    }
}
