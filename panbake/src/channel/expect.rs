//! Expect-style waiting on a transport.

use std::time::Duration;

use log::trace;
use serde::Deserialize;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::patterns::TerminatorSet;
use crate::error::Result;
use crate::transport::Transport;

/// Tuning for the expect loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExpectConfig {
    /// Pause before reading, giving the device time to start writing.
    pub settle_delay: Duration,

    /// Upper bound for a single readiness wait.
    pub read_interval: Duration,

    /// Maximum bytes taken from the transport per read.
    pub max_read: usize,

    /// Bytes from the end of the buffer searched for terminators.
    pub search_depth: usize,
}

impl Default for ExpectConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            read_interval: Duration::from_secs(10),
            max_read: 4096,
            search_depth: 1000,
        }
    }
}

/// Result of one [`ExpectEngine::wait_for`] call.
#[derive(Debug, Clone)]
pub struct ExpectOutcome {
    /// Whether a terminator completed the output before the deadline.
    pub matched: bool,

    /// Everything captured (decoded, escape sequences removed).
    pub text: String,

    /// Index of the first pattern in set order found in the output.
    pub index: Option<usize>,
}

/// Accumulates shell output until a terminator matches or time runs out.
///
/// One engine belongs to one session; its buffer is never shared.
pub struct ExpectEngine {
    config: ExpectConfig,
    buffer: PatternBuffer,
}

impl ExpectEngine {
    /// Create an engine with the given tuning.
    pub fn new(config: ExpectConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(config.search_depth),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExpectConfig {
        &self.config
    }

    /// Read from `transport` until `terminators` match the end of the
    /// captured output or `timeout` elapses.
    ///
    /// A timeout is not an error here: the outcome reports `matched: false`
    /// together with whatever was captured. Transport failures (including
    /// the peer closing the channel) are errors.
    pub async fn wait_for<T: Transport>(
        &mut self,
        transport: &mut T,
        terminators: &TerminatorSet,
        timeout: Duration,
    ) -> Result<ExpectOutcome> {
        self.buffer.clear();
        tokio::time::sleep(self.config.settle_delay).await;

        let deadline = Instant::now() + timeout;

        loop {
            let now = Instant::now();
            if now >= deadline {
                let text = self.buffer.take();
                trace!("expect: timed out after {:?} with {} bytes", timeout, text.len());
                return Ok(ExpectOutcome {
                    matched: false,
                    index: None,
                    text,
                });
            }

            let wait = (deadline - now).min(self.config.read_interval);
            if !transport.wait_readable(wait).await? {
                continue;
            }

            let chunk = transport.recv(self.config.max_read).await?;
            self.buffer.extend(&chunk);
            trace!("expect: +{} bytes, buffer {} bytes", chunk.len(), self.buffer.len());

            if terminators.matches_end(self.buffer.tail()) {
                let text = self.buffer.take();
                return Ok(ExpectOutcome {
                    matched: true,
                    index: terminators.first_found(&text),
                    text,
                });
            }
        }
    }
}

impl Default for ExpectEngine {
    fn default() -> Self {
        Self::new(ExpectConfig::default())
    }
}
