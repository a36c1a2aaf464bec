//! Builder for creating PAN-OS device handles.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::device::PanosDevice;
use super::job::JobPolicy;
use super::reconnect::ReconnectPolicy;
use super::session::{SessionFactory, SessionOptions};
use crate::error::{DriverError, Result};
use crate::platform::{PlatformDefinition, panos};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for constructing device handles over SSH.
///
/// # Example
///
/// ```rust,no_run
/// use panbake::DeviceBuilder;
///
/// # async fn example() -> Result<(), panbake::Error> {
/// let mut device = DeviceBuilder::new("203.0.113.10")
///     .username("admin")
///     .private_key("/home/me/.ssh/vmseries.pem")
///     .build()?;
///
/// device.open_when_ready().await?;
/// device.verify_system().await?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: Option<AuthMethod>,
    platform: Option<PlatformDefinition>,
    connect_timeout: Duration,
    keepalive_interval: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    options: SessionOptions,
    reconnect: ReconnectPolicy,
    boot: ReconnectPolicy,
    jobs: JobPolicy,
}

impl DeviceBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: None,
            platform: None,
            connect_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(15),
            host_key_verification: HostKeyVerification::Disabled,
            known_hosts_path: None,
            options: SessionOptions::default(),
            reconnect: ReconnectPolicy::default(),
            boot: ReconnectPolicy::boot(),
            jobs: JobPolicy::default(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password(SecretString::from(password.into())));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        });
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        });
        self
    }

    /// Use a custom platform definition instead of PAN-OS.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the SSH keepalive interval.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Set host key verification (default: `Disabled`).
    ///
    /// Restarts keep the host key, but a private-data reset regenerates it,
    /// so a pinning mode makes the reconnect after a reset fail.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Set the default command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeouts.command = timeout;
        self
    }

    /// Replace all session options.
    pub fn session_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the policy used after restarts.
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Set the policy used by `open_when_ready`.
    pub fn boot_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.boot = policy;
        self
    }

    /// Set the job polling policy.
    pub fn job_policy(mut self, policy: JobPolicy) -> Self {
        self.jobs = policy;
        self
    }

    /// Build the device handle.
    ///
    /// This does not connect. Call `open()` or `open_when_ready()` on the
    /// returned device.
    pub fn build(self) -> Result<PanosDevice<SshConfig>> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;
        let auth = self.auth.ok_or_else(|| DriverError::InvalidConfig {
            message: "A password or private key is required".to_string(),
        })?;
        if self.host.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: "Host is required".to_string(),
            }
            .into());
        }

        let platform = self.platform.unwrap_or_else(panos::platform);

        let mut ssh = SshConfig::new(self.host, username, auth);
        ssh.port = self.port;
        ssh.timeout = self.connect_timeout;
        ssh.keepalive_interval = self.keepalive_interval;
        ssh.terminal_width = platform.terminal_width;
        ssh.terminal_height = platform.terminal_height;
        ssh.host_key_verification = self.host_key_verification;
        ssh.known_hosts_path = self.known_hosts_path;

        let factory = SessionFactory::new(ssh, platform, self.options);
        Ok(PanosDevice::new(factory, self.reconnect, self.boot, self.jobs))
    }
}
