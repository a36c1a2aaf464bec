//! Reconnect after disruptive commands.
//!
//! Restarting the appliance (or resetting its private data) kills the SSH
//! session. The [`ReconnectManager`] sends the disruptive command, treats
//! the loss of the session as confirmation, waits for the device to boot
//! and then builds a brand-new session through the [`SessionFactory`].
//!
//! ```text
//! Active -> Disrupting -> WaitingWarmup -> Reconnecting -> Active
//!               |                               |
//!               +-> Active (command refused)    +-> Failed
//! ```

use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;

use super::request::CommandRequest;
use super::session::{Session, SessionFactory};
use crate::channel::TerminatorSet;
use crate::error::{DriverError, Error, Result};
use crate::transport::Connector;

/// Timing for reconnect attempts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Wait after the session drops, before the first attempt.
    pub warmup: Duration,

    /// Wait between failed attempts.
    pub retry_delay: Duration,

    /// Connection attempts after the warm-up.
    pub attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(660),
            retry_delay: Duration::from_secs(120),
            attempts: 2,
        }
    }
}

impl ReconnectPolicy {
    /// Policy for a freshly launched appliance whose management plane may
    /// take several boots' worth of time to come up.
    pub fn boot() -> Self {
        Self {
            attempts: 6,
            ..Self::default()
        }
    }
}

/// Where the manager is in the reconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectState {
    /// A usable session exists.
    Active,
    /// The disruptive command is in flight.
    Disrupting,
    /// The device is rebooting.
    WaitingWarmup,
    /// Connection attempts are running.
    Reconnecting,
    /// Every attempt failed.
    Failed,
}

/// Drives the disrupt / wait / reconnect cycle.
#[derive(Debug, Clone)]
pub struct ReconnectManager {
    policy: ReconnectPolicy,
    state: ReconnectState,
    history: Vec<ReconnectState>,
}

impl ReconnectManager {
    /// Create a manager in the `Active` state.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ReconnectState::Active,
            history: vec![ReconnectState::Active],
        }
    }

    /// Current state.
    pub fn state(&self) -> ReconnectState {
        self.state
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> &[ReconnectState] {
        &self.history
    }

    /// The policy.
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    fn transition(&mut self, state: ReconnectState) {
        self.state = state;
        self.history.push(state);
    }

    /// Send a command that reboots the device, then replace `session` with
    /// a new one once the device is back.
    ///
    /// A reboot banner, a timeout or the channel dropping all count as the
    /// reboot having started. If the device answers with its prompt instead
    /// (the command was refused), the error is returned and `session` is
    /// left as it was.
    pub async fn disrupt<C: Connector>(
        &mut self,
        factory: &SessionFactory<C>,
        session: &mut Session<C::Transport>,
        command: &str,
    ) -> Result<()> {
        self.transition(ReconnectState::Disrupting);

        let mut terminators = TerminatorSet::literals(&session.platform.reboot_banners)?;
        if let Some(prompt) = session.prompt.operational() {
            terminators = terminators.failure_literal(prompt)?;
        }

        let request = CommandRequest::new(command).terminators(terminators);
        match session.execute(request).await {
            Ok(_) => info!("{}: device is rebooting", session.host),
            Err(err) if err.is_timeout() || err.is_disconnect() => {
                info!("{}: device is rebooting ({})", session.host, err);
            }
            Err(err) => {
                self.transition(ReconnectState::Active);
                return Err(err);
            }
        }

        if let Err(err) = session.close().await {
            warn!("{}: error closing session: {}", session.host, err);
        }

        *session = self.wait_and_reconnect(factory).await?;
        Ok(())
    }

    /// Wait for the device to boot, then try to open a session.
    pub async fn wait_and_reconnect<C: Connector>(
        &mut self,
        factory: &SessionFactory<C>,
    ) -> Result<Session<C::Transport>> {
        self.transition(ReconnectState::WaitingWarmup);
        info!(
            "{}: waiting {:?} for the device to restart",
            factory.host(),
            self.policy.warmup
        );
        tokio::time::sleep(self.policy.warmup).await;

        self.transition(ReconnectState::Reconnecting);
        let mut last_error: Option<Error> = None;

        for attempt in 1..=self.policy.attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.retry_delay).await;
            }

            match factory.open().await {
                Ok(session) => {
                    info!("{}: reconnected on attempt {}", factory.host(), attempt);
                    self.transition(ReconnectState::Active);
                    return Ok(session);
                }
                Err(err) => {
                    warn!(
                        "{}: unable to connect (attempt {}/{}): {}; retrying in {:?}",
                        factory.host(),
                        attempt,
                        self.policy.attempts,
                        err,
                        self.policy.retry_delay
                    );
                    last_error = Some(err);
                }
            }
        }

        self.transition(ReconnectState::Failed);
        Err(DriverError::ReconnectExhausted {
            host: factory.host().to_string(),
            attempts: self.policy.attempts,
            source: Box::new(last_error.unwrap_or_else(|| DriverError::NotConnected.into())),
        }
        .into())
    }
}

impl Default for ReconnectManager {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::driver::session::SessionOptions;
    use crate::driver::session::tests::session_with;
    use crate::platform::panos;
    use crate::transport::mock::{MockConnector, MockTransport, Reply, answer};

    use super::ReconnectState::*;

    fn factory(transports: Vec<Option<MockTransport>>) -> SessionFactory<MockConnector> {
        SessionFactory::new(
            MockConnector::new(transports),
            panos::platform(),
            SessionOptions::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_confirms_reboot() {
        let (mut session, old) = session_with(vec![Reply::Silent]).await;
        let (fresh, new) = MockTransport::booted();
        let factory = factory(vec![Some(fresh)]);
        let mut manager = ReconnectManager::default();

        let start = Instant::now();
        manager
            .disrupt(&factory, &mut session, "request restart system")
            .await
            .unwrap();

        assert_eq!(
            manager.history(),
            &[Active, Disrupting, WaitingWarmup, Reconnecting, Active]
        );
        assert!(old.is_closed());
        assert!(start.elapsed() >= Duration::from_secs(660));
        assert_eq!(new.sent().len(), panos::SETUP_COMMANDS.len());
        assert!(session.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_confirms_reboot() {
        let (mut session, _) = session_with(vec![Reply::text(
            "request restart system\r\n\r\nBroadcast message from root (Mon Oct 19 10:00:00 2026):\r\n\r\nThe system is going down for reboot NOW!",
        )])
        .await;
        let (fresh, _) = MockTransport::booted();
        let factory = factory(vec![Some(fresh)]);
        let mut manager = ReconnectManager::default();

        let start = Instant::now();
        manager
            .disrupt(&factory, &mut session, "request restart system")
            .await
            .unwrap();

        assert_eq!(manager.state(), Active);
        // No command timeout, only the warm-up
        assert!(start.elapsed() < Duration::from_secs(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hangup_confirms_reboot() {
        let (mut session, _) = session_with(vec![Reply::Hangup]).await;
        let (fresh, _) = MockTransport::booted();
        let factory = factory(vec![Some(fresh)]);
        let mut manager = ReconnectManager::default();

        manager
            .disrupt(&factory, &mut session, "request system private-data-reset")
            .await
            .unwrap();
        assert_eq!(manager.state(), Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_command_never_waits() {
        let (mut session, old) = session_with(vec![answer(
            "request restart system",
            "Server error : permission denied",
        )])
        .await;
        let factory = factory(vec![]);
        let mut manager = ReconnectManager::default();

        let err = manager
            .disrupt(&factory, &mut session, "request restart system")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Driver(DriverError::UnexpectedResponse { .. })
        ));
        assert_eq!(manager.history(), &[Active, Disrupting, Active]);
        assert!(!manager.history().contains(&WaitingWarmup));
        assert!(!old.is_closed());
        assert_eq!(factory.connector().attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_failed_attempt() {
        let (mut session, _) = session_with(vec![Reply::Hangup]).await;
        let (fresh, _) = MockTransport::booted();
        let factory = factory(vec![None, Some(fresh)]);
        let mut manager = ReconnectManager::default();

        let start = Instant::now();
        manager
            .disrupt(&factory, &mut session, "request restart system")
            .await
            .unwrap();

        assert_eq!(factory.connector().attempts(), 2);
        assert!(start.elapsed() >= Duration::from_secs(660 + 120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_up_attempt_is_closed() {
        let (mut session, _) = session_with(vec![Reply::Hangup]).await;
        let (half_up, half_up_handle) = MockTransport::new();
        let (fresh, _) = MockTransport::booted();
        let factory = factory(vec![Some(half_up), Some(fresh)]);
        let mut manager = ReconnectManager::default();

        manager
            .disrupt(&factory, &mut session, "request restart system")
            .await
            .unwrap();

        assert!(half_up_handle.is_closed());
        assert!(session.is_alive());
        assert_eq!(factory.connector().attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted() {
        let (mut session, _) = session_with(vec![Reply::Hangup]).await;
        let factory = factory(vec![None, None]);
        let mut manager = ReconnectManager::default();

        let err = manager
            .disrupt(&factory, &mut session, "request restart system")
            .await
            .unwrap_err();

        match err {
            Error::Driver(DriverError::ReconnectExhausted { attempts, source, .. }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*source, Error::Transport(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(manager.state(), Failed);
        assert_eq!(factory.connector().attempts(), 2);
    }

    #[test]
    fn test_boot_policy() {
        let policy = ReconnectPolicy::boot();
        assert_eq!(policy.attempts, 6);
        assert_eq!(policy.warmup, Duration::from_secs(660));
        assert_eq!(policy.retry_delay, Duration::from_secs(120));
    }
}
