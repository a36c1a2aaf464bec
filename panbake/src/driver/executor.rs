//! Command execution: send one line, collect its response.

use log::{debug, info, trace};
use regex::Regex;
use tokio::time::Instant;

use super::request::CommandRequest;
use super::response::Output;
use super::session::Session;
use crate::channel::{TerminatorRole, TerminatorSet};
use crate::error::{ChannelError, DriverError, Result};
use crate::transport::Transport;

impl<T: Transport> Session<T> {
    /// Run a command and wait for the current prompt.
    pub async fn send_command(&mut self, command: &str) -> Result<Output> {
        self.execute(CommandRequest::new(command)).await
    }

    /// Run several commands in order, stopping at the first error.
    pub async fn send_commands(&mut self, commands: &[&str]) -> Result<Vec<Output>> {
        let mut outputs = Vec::with_capacity(commands.len());
        for command in commands {
            outputs.push(self.send_command(command).await?);
        }
        Ok(outputs)
    }

    /// Execute a command request.
    ///
    /// Paginated output is continued automatically and the pages are
    /// concatenated. Unless the request asks for raw output, the echoed
    /// command line and the trailing terminator line are removed.
    ///
    /// Fails with a pattern timeout when no terminator matches in time and
    /// with [`DriverError::UnexpectedResponse`] when the reported terminator
    /// is a failure terminator. An output containing one of the platform's
    /// failure strings is returned with `is_success() == false`.
    pub async fn execute(&mut self, request: impl Into<CommandRequest>) -> Result<Output> {
        let request = request.into();
        if !self.connected {
            return Err(DriverError::NotConnected.into());
        }

        let command = request.text().to_string();
        info!("{}: command: {}", self.host, command);
        self.transport
            .send(format!("{command}\n").as_bytes())
            .await?;

        if request.is_suppressed() {
            return Ok(Output::empty(command));
        }

        let requested = match request.terminator_set() {
            Some(set) => set.clone(),
            None => self.default_terminators()?,
        };
        let marker = self.platform.pagination_marker.clone();
        let terminators = if marker.is_empty() {
            requested
        } else {
            requested.continuation_literal(&marker)?
        };
        let timeout = self.options.timeouts.effective(request.requested_timeout());

        let start = Instant::now();
        let mut raw = String::new();
        let index = loop {
            let outcome = self
                .engine
                .wait_for(&mut self.transport, &terminators, timeout)
                .await?;

            if !outcome.matched {
                raw.push_str(&outcome.text);
                debug!(
                    "{}: sent '{}', expected [{}], received: {:?}",
                    self.host,
                    command,
                    terminators.describe(),
                    raw
                );
                return Err(ChannelError::PatternTimeout {
                    command,
                    timeout,
                    output: raw,
                }
                .into());
            }

            if !marker.is_empty() && outcome.text.contains(&marker) {
                trace!("{}: paginated output, continuing", self.host);
                raw.push_str(&strip_marker(&outcome.text, &marker));
                self.transport
                    .send(self.platform.continuation_keystroke.as_bytes())
                    .await?;
                continue;
            }

            raw.push_str(&outcome.text);
            break outcome.index;
        };
        let elapsed = start.elapsed();

        if let Some(i) = index {
            if terminators.role(i) == Some(TerminatorRole::Failure) {
                return Err(DriverError::UnexpectedResponse {
                    command,
                    output: raw,
                }
                .into());
            }
        }

        let result = if request.is_raw() {
            raw.clone()
        } else {
            normalize(&raw, &command, &terminators)?
        };
        debug!("{}: output:\n{}", self.host, result);

        let output = Output::new(&command, result, raw, index, elapsed);
        match self.platform.detect_failure(&output.result) {
            Some(failure) => {
                let failure = failure.to_string();
                Ok(output.with_failure(failure))
            }
            None => Ok(output),
        }
    }
}

/// Remove the pagination marker together with the line break before it.
fn strip_marker(page: &str, marker: &str) -> String {
    let with_break = format!("\n{marker}");
    if page.contains(&with_break) {
        page.replace(&with_break, "")
    } else {
        page.replace(marker, "")
    }
}

/// Remove the echoed command and the trailing terminator line.
fn normalize(raw: &str, command: &str, terminators: &TerminatorSet) -> Result<String> {
    let echo = Regex::new(&format!(r"{}[ \t]?\r*\n", regex::escape(command)))
        .map_err(ChannelError::from)?;
    let body = echo.replacen(raw, 1, "");

    let end = match terminators.end_match_start(&body) {
        Some(start) => memchr::memrchr(b'\n', &body.as_bytes()[..start]).unwrap_or(0),
        None => body.len(),
    };

    Ok(body[..end].trim_end_matches(['\r', '\n']).to_string())
}
