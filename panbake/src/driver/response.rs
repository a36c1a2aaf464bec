//! Output type for command execution results.

use std::time::Duration;

/// Output of one command execution.
#[derive(Debug, Clone)]
pub struct Output {
    /// The command that was executed.
    pub command: String,

    /// The command output (normalized - command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// Index of the terminator reported for the match, in request order.
    pub index: Option<usize>,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure message if the command failed (based on failure patterns).
    pub failure_message: Option<String>,
}

impl Output {
    /// Create a new successful output.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        index: Option<usize>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            index,
            elapsed,
            failure_message: None,
        }
    }

    /// Output of a command sent without reading a response.
    pub fn empty(command: impl Into<String>) -> Self {
        Self::new(command, "", "", None, Duration::ZERO)
    }

    /// Mark the output as failed.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Check if the output indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Job id announced by an asynchronous command.
    ///
    /// The device prints the id on the last line of the response, e.g.
    /// `Download job enqueued with jobid 1423`. Returns the number after
    /// `jobid` when present, otherwise the whole last line.
    pub fn job_id(&self) -> Option<String> {
        let last = self
            .result
            .lines()
            .map(|line| line.trim_end_matches('\r').trim())
            .rfind(|line| !line.is_empty())?;

        match last.split_once("jobid") {
            Some((_, id)) => id
                .split_whitespace()
                .next()
                .map(|id| id.trim_end_matches('.').to_string()),
            None => Some(last.to_string()),
        }
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
