//! Configuration-mode session guard.
//!
//! A configuration session is a short transaction: enter configuration
//! mode, apply lines, optionally commit, and leave. The guard holds
//! `&mut Session`, so nothing else can be sent while it exists, and
//! [`ConfigSession::exit`] consumes it.
//!
//! # Example
//!
//! ```rust,no_run
//! use panbake::driver::{ConfigSession, Session};
//! use panbake::transport::Transport;
//!
//! # async fn example<T: Transport>(session: &mut Session<T>) -> Result<(), panbake::Error> {
//! let mut config = ConfigSession::enter(session).await?;
//! config
//!     .apply(&["set deviceconfig system hostname fw01"], true)
//!     .await?;
//! config.exit().await?;
//! # Ok(())
//! # }
//! ```

use log::{info, warn};

use super::prompt::Mode;
use super::response::Output;
use super::session::Session;
use crate::error::{DriverError, Result};
use crate::transport::Transport;

/// RAII guard for configuration mode.
pub struct ConfigSession<'a, T: Transport> {
    session: &'a mut Session<T>,
    consumed: bool,
}

impl<'a, T: Transport> ConfigSession<'a, T> {
    /// Enter configuration mode.
    ///
    /// If the configuration prompt does not appear, the session stays in
    /// operational mode and [`DriverError::ModeEntryFailure`] is returned.
    pub async fn enter(session: &'a mut Session<T>) -> Result<Self> {
        if !session.prompt.is_bootstrapped() {
            return Err(DriverError::PromptNotDetected {
                host: session.host.clone(),
            }
            .into());
        }

        session.prompt.set_mode(Mode::Configuration);
        let command = session.platform.configure_command.clone();
        let entered = session.send_command(&command).await;

        match entered {
            Ok(output) if output.is_success() => {
                info!("{}: entered configuration mode", session.host);
                Ok(Self {
                    session,
                    consumed: false,
                })
            }
            Ok(output) => {
                session.prompt.set_mode(Mode::Operational);
                Err(DriverError::ModeEntryFailure {
                    message: output.result,
                }
                .into())
            }
            Err(err) if err.is_timeout() => {
                session.prompt.set_mode(Mode::Operational);
                Err(DriverError::ModeEntryFailure {
                    message: err.to_string(),
                }
                .into())
            }
            Err(err) => {
                session.prompt.set_mode(Mode::Operational);
                Err(err)
            }
        }
    }

    /// Send one command in configuration mode.
    pub async fn send_command(&mut self, command: &str) -> Result<Output> {
        self.session.send_command(command).await
    }

    /// Apply configuration lines in order, then optionally commit.
    ///
    /// Stops at the first line the device rejects; later lines are not
    /// sent and nothing is committed.
    pub async fn apply<S: AsRef<str>>(&mut self, lines: &[S], commit: bool) -> Result<Vec<Output>> {
        let mut outputs = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let output = self.session.send_command(line).await?;
            if let Some(failure) = &output.failure_message {
                warn!(
                    "{}: configuration line {} '{}' rejected: {}",
                    self.session.host, index, line, failure
                );
                return Err(DriverError::ConfigLineFailed {
                    index,
                    line: line.to_string(),
                    message: output.result,
                }
                .into());
            }
            outputs.push(output);
        }

        if commit {
            outputs.push(self.commit().await?);
        }
        Ok(outputs)
    }

    /// Commit the candidate configuration.
    pub async fn commit(&mut self) -> Result<Output> {
        let command = self.session.platform.commit_command.clone();
        let output = self.session.send_command(&command).await?;

        if !output.contains(&self.session.platform.commit_success) {
            return Err(DriverError::CommitFailure {
                output: output.result,
            }
            .into());
        }
        info!("{}: configuration committed", self.session.host);
        Ok(output)
    }

    /// Leave configuration mode and return to the operational prompt.
    pub async fn exit(mut self) -> Result<()> {
        self.consumed = true;
        self.session.prompt.set_mode(Mode::Operational);
        let command = self.session.platform.exit_command.clone();
        self.session.send_command(&command).await?;
        Ok(())
    }
}

impl<T: Transport> Drop for ConfigSession<'_, T> {
    fn drop(&mut self) {
        if !self.consumed {
            warn!(
                "{}: configuration session dropped without exit",
                self.session.host
            );
        }
    }
}
