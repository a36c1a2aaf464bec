//! Error types for panbake.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for panbake operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors (connect failures)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors (pattern matching, timeouts)
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Device job errors
    #[error("Job error: {0}")]
    Job(#[from] JobError),
}

impl Error {
    /// Whether this error is a command timeout (no terminator matched in time).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::PatternTimeout { .. }))
    }

    /// Whether this error means the device dropped the connection.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::Closed) | Error::Transport(TransportError::Disconnected)
        )
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts (strict verification)
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key does not match the recorded key
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts lookup or update failed
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, shell I/O).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No terminator matched before the deadline
    #[error("'{command}': no terminator matched within {timeout:?}")]
    PatternTimeout {
        command: String,
        timeout: Duration,
        /// Everything captured before the deadline.
        output: String,
    },

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (command execution, configuration mode, reconnect).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Device not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Device already connected")]
    AlreadyConnected,

    /// The response matched a terminator that signals failure
    #[error("Unexpected response to '{command}': {output}")]
    UnexpectedResponse { command: String, output: String },

    /// `configure` did not reach the configuration prompt
    #[error("Unable to enter configuration mode: {message}")]
    ModeEntryFailure { message: String },

    /// A configuration line was rejected by the device
    #[error("Configuration line {index} '{line}' failed: {message}")]
    ConfigLineFailed {
        index: usize,
        line: String,
        message: String,
    },

    /// `commit` did not report success
    #[error("Commit failed: {output}")]
    CommitFailure { output: String },

    /// No prompt could be read after session setup
    #[error("Unable to detect the CLI prompt on {host}")]
    PromptNotDetected { host: String },

    /// The device never came back after a disruptive operation
    #[error("Unable to reconnect to {host} after {attempts} attempts: {source}")]
    ReconnectExhausted {
        host: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// A system verification step failed
    #[error("System check failed: {message}")]
    SystemCheck { message: String },

    /// Invalid configuration in the device builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Device job errors.
#[derive(Error, Debug)]
pub enum JobError {
    /// The device has no job with this id
    #[error("Job {id} not found")]
    NotFound { id: String },

    /// The job did not finish within the retry budget
    #[error("Job {id} did not complete after {checks} checks")]
    Timeout { id: String, checks: u32 },

    /// The command output carried no job id
    #[error("No job id in output of '{command}'")]
    MissingId { command: String },
}

/// Result type alias using panbake's Error.
pub type Result<T> = std::result::Result<T, Error>;
