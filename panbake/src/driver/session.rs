//! One logged-in CLI session and the factory that builds it.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use super::prompt::{PromptTracker, last_line};
use super::request::CommandRequest;
use crate::channel::{ExpectConfig, ExpectEngine, TerminatorSet};
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{Connector, Transport};

/// Command timeouts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Timeout for commands that do not request their own.
    pub command: Duration,

    /// Lower bound applied to every command timeout.
    pub floor: Duration,

    /// How long to wait for the first prompt after login.
    pub login: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(300),
            floor: Duration::from_secs(100),
            login: Duration::from_secs(60),
        }
    }
}

impl Timeouts {
    /// The timeout a command actually gets.
    pub fn effective(&self, requested: Option<Duration>) -> Duration {
        requested.unwrap_or(self.command).max(self.floor)
    }
}

/// Session tuning.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Command and login timeouts.
    pub timeouts: Timeouts,

    /// Expect-loop tuning.
    pub expect: ExpectConfig,
}

/// A logged-in, set-up CLI session on one device.
///
/// Commands are issued through [`Session::execute`], which takes `&mut self`:
/// there is never more than one command in flight.
pub struct Session<T: Transport> {
    pub(crate) host: String,
    pub(crate) transport: T,
    pub(crate) engine: ExpectEngine,
    pub(crate) prompt: PromptTracker,
    pub(crate) platform: Arc<PlatformDefinition>,
    pub(crate) options: SessionOptions,
    pub(crate) connected: bool,
}

impl<T: Transport> Session<T> {
    /// Take over a freshly opened shell: wait for the login prompt, run the
    /// platform's setup commands and learn the operational prompt.
    pub async fn establish(
        host: impl Into<String>,
        transport: T,
        platform: Arc<PlatformDefinition>,
        options: SessionOptions,
    ) -> Result<Self> {
        let host = host.into();
        let mut session = Self {
            engine: ExpectEngine::new(options.expect.clone()),
            prompt: PromptTracker::new(platform.config_prompt_indicator),
            host,
            transport,
            platform,
            options,
            connected: true,
        };

        if let Err(err) = session.bootstrap().await {
            session.connected = false;
            if let Err(close_err) = session.transport.close().await {
                debug!("{}: error closing half-open shell: {}", session.host, close_err);
            }
            return Err(err);
        }
        info!(
            "{}: session ready, prompt {:?}",
            session.host,
            session.prompt.operational().unwrap_or_default()
        );
        Ok(session)
    }

    async fn bootstrap(&mut self) -> Result<()> {
        let generic = self.generic_terminators()?;
        let outcome = self
            .engine
            .wait_for(&mut self.transport, &generic, self.options.timeouts.login)
            .await?;
        if !outcome.matched {
            return Err(DriverError::PromptNotDetected {
                host: self.host.clone(),
            }
            .into());
        }
        debug!("{}: login banner: {:?}", self.host, outcome.text);

        let commands = self.platform.setup_commands.clone();
        let mut last = None;
        for command in &commands {
            last = Some(self.execute(CommandRequest::new(command).raw_output(true)).await?);
        }

        let prompt = last
            .as_ref()
            .and_then(|output| last_line(&output.raw_result))
            .or_else(|| last_line(&outcome.text))
            .filter(|line| generic.matches_end(line))
            .map(str::to_string)
            .ok_or_else(|| DriverError::PromptNotDetected {
                host: self.host.clone(),
            })?;

        self.prompt.observe(prompt);
        Ok(())
    }

    /// Terminators matching any prompt, for use before the real one is known.
    pub(crate) fn generic_terminators(&self) -> Result<TerminatorSet> {
        Ok(TerminatorSet::new().regex(&self.platform.prompt_pattern)?)
    }

    /// Terminators for the prompt of the current mode.
    pub(crate) fn default_terminators(&self) -> Result<TerminatorSet> {
        match self.prompt.current() {
            Some(prompt) => Ok(TerminatorSet::literals([prompt])?),
            None => self.generic_terminators(),
        }
    }

    /// Host this session is connected to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The prompt tracker.
    pub fn prompt(&self) -> &PromptTracker {
        &self.prompt
    }

    /// The platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// The session options.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Whether the session is connected and the channel is still open.
    pub fn is_alive(&self) -> bool {
        self.connected && self.transport.is_open()
    }

    /// Close the channel. Safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        if self.connected {
            debug!("{}: closing session", self.host);
            self.connected = false;
        }
        self.transport.close().await
    }
}

/// Builds complete sessions: connect, then set up the CLI.
///
/// This is the only way a session comes into existence, both for the first
/// connection and after a reboot.
pub struct SessionFactory<C: Connector> {
    connector: C,
    platform: Arc<PlatformDefinition>,
    options: SessionOptions,
}

impl<C: Connector> SessionFactory<C> {
    /// Create a factory.
    pub fn new(connector: C, platform: PlatformDefinition, options: SessionOptions) -> Self {
        Self {
            connector,
            platform: Arc::new(platform),
            options,
        }
    }

    /// Connect and establish a new session.
    pub async fn open(&self) -> Result<Session<C::Transport>> {
        info!("Connecting to {}", self.connector.host());
        let transport = self.connector.connect().await?;
        Session::establish(
            self.connector.host(),
            transport,
            self.platform.clone(),
            self.options.clone(),
        )
        .await
    }

    /// Host the factory connects to.
    pub fn host(&self) -> &str {
        self.connector.host()
    }

    /// The connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }
}
