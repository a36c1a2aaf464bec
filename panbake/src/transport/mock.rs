//! Scripted in-memory transport for unit tests.
//!
//! Every `send` consumes the next scripted [`Reply`]. Text replies become
//! readable immediately; silent replies leave the shell quiet so the
//! caller's timeout fires (instantly, under a paused tokio clock).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Connector, Transport};
use crate::error::{ChannelError, Result, TransportError};

pub(crate) const PROMPT: &str = "admin@PA-VM>";

/// What the fake device does in response to one `send`.
pub(crate) enum Reply {
    /// Output delivered as separate chunks.
    Chunks(Vec<String>),
    /// Nothing is ever written back.
    Silent,
    /// The peer drops the channel.
    Hangup,
}

impl Reply {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Reply::Chunks(vec![text.into()])
    }
}

/// Echo, body and operational prompt, the way the appliance answers.
pub(crate) fn answer(command: &str, body: &str) -> Reply {
    if body.is_empty() {
        Reply::text(format!("{command}\r\n\r\n{PROMPT} "))
    } else {
        Reply::text(format!("{command}\r\n{body}\r\n\r\n{PROMPT} "))
    }
}

/// Echo and body followed by the configuration prompt.
pub(crate) fn config_answer(command: &str, body: &str) -> Reply {
    let prompt = format!("{}#", &PROMPT[..PROMPT.len() - 1]);
    if body.is_empty() {
        Reply::text(format!("{command}\r\n\r\n[edit]\r\n{prompt} "))
    } else {
        Reply::text(format!("{command}\r\n{body}\r\n\r\n[edit]\r\n{prompt} "))
    }
}

/// Shared view of what the fake device saw.
#[derive(Clone, Default)]
pub(crate) struct MockHandle {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockHandle {
    /// Everything written to the transport, one entry per `send`.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent entries with the trailing newline removed, setup commands skipped.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .skip(crate::platform::panos::SETUP_COMMANDS.len())
            .map(|s| s.trim_end_matches('\n').to_string())
            .collect()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockTransport {
    pending: VecDeque<Vec<u8>>,
    replies: VecDeque<Reply>,
    hung_up: bool,
    open: bool,
    handle: MockHandle,
}

impl MockTransport {
    /// A transport with no login banner and no scripted replies.
    pub(crate) fn new() -> (Self, MockHandle) {
        let handle = MockHandle::default();
        let transport = Self {
            pending: VecDeque::new(),
            replies: VecDeque::new(),
            hung_up: false,
            open: true,
            handle: handle.clone(),
        };
        (transport, handle)
    }

    /// A transport that shows a login banner and answers the CLI setup
    /// commands, ready for `Session::establish`.
    pub(crate) fn booted() -> (Self, MockHandle) {
        let (mut transport, handle) = Self::new();
        transport
            .pending
            .push_back(format!("Welcome admin.\r\n\r\n{PROMPT} ").into_bytes());
        for command in crate::platform::panos::SETUP_COMMANDS {
            transport.push(answer(command, ""));
        }
        (transport, handle)
    }

    pub(crate) fn push(&mut self, reply: Reply) -> &mut Self {
        self.replies.push_back(reply);
        self
    }
}

impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.open || self.hung_up {
            return Err(ChannelError::Closed.into());
        }
        self.handle
            .sent
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(data).into_owned());

        match self.replies.pop_front() {
            Some(Reply::Chunks(chunks)) => {
                self.pending
                    .extend(chunks.into_iter().map(String::into_bytes));
            }
            Some(Reply::Hangup) => self.hung_up = true,
            Some(Reply::Silent) | None => {}
        }
        Ok(())
    }

    async fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        if self.hung_up || !self.open {
            return Err(ChannelError::Closed.into());
        }
        tokio::time::sleep(timeout).await;
        Ok(false)
    }

    async fn recv(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        let Some(mut chunk) = self.pending.pop_front() else {
            return Ok(Vec::new());
        };
        if chunk.len() > max_bytes {
            let rest = chunk.split_off(max_bytes);
            self.pending.push_front(rest);
        }
        Ok(chunk)
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        self.handle.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Hands out pre-built transports; `None` entries fail to connect.
pub(crate) struct MockConnector {
    transports: Mutex<VecDeque<Option<MockTransport>>>,
    attempts: AtomicU32,
}

impl MockConnector {
    pub(crate) fn new(transports: Vec<Option<MockTransport>>) -> Self {
        Self {
            transports: Mutex::new(transports.into()),
            attempts: AtomicU32::new(0),
        }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self) -> Result<MockTransport> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.transports.lock().unwrap().pop_front().flatten();
        next.ok_or_else(|| {
            TransportError::ConnectionFailed {
                host: "mock".to_string(),
                port: 22,
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            }
            .into()
        })
    }

    fn host(&self) -> &str {
        "mock"
    }
}
