//! Typed command requests.

use std::time::Duration;

use crate::channel::TerminatorSet;

/// One command to run on the device, with how to wait for its completion.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use panbake::driver::CommandRequest;
///
/// let request = CommandRequest::new("show jobs all")
///     .timeout(Duration::from_secs(600))
///     .raw_output(true);
/// assert_eq!(request.text(), "show jobs all");
/// ```
#[derive(Debug, Clone)]
pub struct CommandRequest {
    text: String,
    terminators: Option<TerminatorSet>,
    timeout: Option<Duration>,
    raw_output: bool,
    suppress_response: bool,
}

impl CommandRequest {
    /// Create a request that waits for the current prompt.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            terminators: None,
            timeout: None,
            raw_output: false,
            suppress_response: false,
        }
    }

    /// Wait for these terminators instead of the current prompt.
    pub fn terminators(mut self, terminators: TerminatorSet) -> Self {
        self.terminators = Some(terminators);
        self
    }

    /// Override the session's default command timeout.
    ///
    /// Values below the session's floor are raised to the floor.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keep the echoed command and trailing prompt in the result.
    pub fn raw_output(mut self, raw: bool) -> Self {
        self.raw_output = raw;
        self
    }

    /// Send without reading anything back.
    pub fn suppress_response(mut self, suppress: bool) -> Self {
        self.suppress_response = suppress;
        self
    }

    /// The command line, without newline.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn terminator_set(&self) -> Option<&TerminatorSet> {
        self.terminators.as_ref()
    }

    pub(crate) fn requested_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn is_raw(&self) -> bool {
        self.raw_output
    }

    pub(crate) fn is_suppressed(&self) -> bool {
        self.suppress_response
    }
}

impl From<&str> for CommandRequest {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for CommandRequest {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
