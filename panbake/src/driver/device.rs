//! The PAN-OS device facade.

use std::time::Duration;

use log::{error, info, warn};

use super::config_session::ConfigSession;
use super::job::{Job, JobPoller, JobPolicy};
use super::package::Package;
use super::reconnect::{ReconnectManager, ReconnectPolicy, ReconnectState};
use super::request::CommandRequest;
use super::response::Output;
use super::session::{Session, SessionFactory};
use super::system_info::SystemInfo;
use crate::error::{DriverError, JobError, Result};
use crate::transport::Connector;

/// Pause between fetching a license and restarting.
const LICENSE_SETTLE: Duration = Duration::from_secs(5);

/// A PAN-OS appliance reached through one interactive CLI session.
///
/// Every operation takes `&mut self`; commands are strictly sequential.
/// Operations that reboot the device replace the session transparently.
pub struct PanosDevice<C: Connector> {
    factory: SessionFactory<C>,
    session: Option<Session<C::Transport>>,
    reconnect: ReconnectManager,
    boot: ReconnectPolicy,
    jobs: JobPolicy,
}

impl<C: Connector> PanosDevice<C> {
    /// Create a device handle. Nothing is connected until [`open`](Self::open).
    pub fn new(
        factory: SessionFactory<C>,
        reconnect: ReconnectPolicy,
        boot: ReconnectPolicy,
        jobs: JobPolicy,
    ) -> Self {
        Self {
            factory,
            session: None,
            reconnect: ReconnectManager::new(reconnect),
            boot,
            jobs,
        }
    }

    /// Connect and set up the CLI.
    pub async fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }
        self.session = Some(self.factory.open().await?);
        info!("*** Connection to {} successful ***", self.factory.host());
        Ok(())
    }

    /// Connect to an appliance that may still be booting.
    ///
    /// Tries once; if that fails, waits for the boot warm-up and retries on
    /// the boot policy.
    pub async fn open_when_ready(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        match self.factory.open().await {
            Ok(session) => self.session = Some(session),
            Err(err) => {
                info!(
                    "{}: device not ready ({}), waiting for it to boot",
                    self.factory.host(),
                    err
                );
                let mut manager = ReconnectManager::new(self.boot.clone());
                self.session = Some(manager.wait_and_reconnect(&self.factory).await?);
            }
        }
        info!("*** {} is up and running ***", self.factory.host());
        Ok(())
    }

    /// Close the session.
    pub async fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(mut session) => session.close().await,
            None => Ok(()),
        }
    }

    /// Whether a session exists.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the session exists and its channel is still open.
    pub fn is_alive(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_alive)
    }

    /// Host this device connects to.
    pub fn host(&self) -> &str {
        self.factory.host()
    }

    /// The current session.
    pub fn session(&mut self) -> Result<&mut Session<C::Transport>> {
        self.session
            .as_mut()
            .ok_or_else(|| DriverError::NotConnected.into())
    }

    /// The factory that opens sessions for this device.
    pub fn factory(&self) -> &SessionFactory<C> {
        &self.factory
    }

    /// State of the reconnect cycle.
    pub fn reconnect_state(&self) -> ReconnectState {
        self.reconnect.state()
    }

    /// Reconnect states entered so far.
    pub fn reconnect_history(&self) -> &[ReconnectState] {
        self.reconnect.history()
    }

    /// Run a command at the current prompt.
    pub async fn exec(&mut self, command: &str) -> Result<Output> {
        self.session()?.send_command(command).await
    }

    /// Run a command and turn a failure reported by the device into
    /// [`DriverError::UnexpectedResponse`].
    pub async fn exec_checked(&mut self, command: &str) -> Result<Output> {
        let output = self.exec(command).await?;
        if let Some(failure) = &output.failure_message {
            error!("'{}' failed: {}", command, failure);
            return Err(DriverError::UnexpectedResponse {
                command: command.to_string(),
                output: output.result,
            }
            .into());
        }
        Ok(output)
    }

    /// Run a command request.
    pub async fn execute(&mut self, request: impl Into<CommandRequest>) -> Result<Output> {
        self.session()?.execute(request).await
    }

    /// Apply configuration lines, optionally committing them.
    ///
    /// On failure the session still tries to leave configuration mode
    /// before the error is returned.
    pub async fn config<S: AsRef<str>>(&mut self, lines: &[S], commit: bool) -> Result<Vec<Output>> {
        let session = self.session()?;
        let mut config = ConfigSession::enter(session).await?;

        match config.apply(lines, commit).await {
            Ok(outputs) => {
                config.exit().await?;
                Ok(outputs)
            }
            Err(err) => {
                if let Err(exit_err) = config.exit().await {
                    warn!("unable to leave configuration mode: {}", exit_err);
                }
                Err(err)
            }
        }
    }

    /// Wait for a device job to finish.
    pub async fn check_job(&mut self, id: &str) -> Result<Job> {
        let policy = self.jobs.clone();
        JobPoller::new(self.session()?, policy).check_job(id).await
    }

    /// Run a command that starts a job and wait for the job.
    pub async fn run_job(&mut self, command: &str) -> Result<Job> {
        let output = self.exec_checked(command).await?;
        let id = output.job_id().ok_or_else(|| JobError::MissingId {
            command: command.to_string(),
        })?;
        self.check_job(&id).await
    }

    /// Restart the appliance and reconnect once it is back.
    pub async fn restart_system(&mut self) -> Result<()> {
        self.disrupt("request restart system").await
    }

    /// Wipe logs, configuration and keys, then reconnect.
    ///
    /// The host key changes, so the connector must not pin it. Devices built
    /// with [`DeviceBuilder`](super::DeviceBuilder) accept any key unless
    /// told otherwise.
    pub async fn private_data_reset(&mut self) -> Result<()> {
        self.disrupt("request system private-data-reset").await
    }

    async fn disrupt(&mut self, command: &str) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or(DriverError::NotConnected)?;
        self.reconnect.disrupt(&self.factory, session, command).await
    }

    /// Fetch a license with `auth_code` and restart to apply it.
    ///
    /// An empty code skips licensing.
    pub async fn license(&mut self, auth_code: &str) -> Result<()> {
        if auth_code.is_empty() {
            info!("*** No auth-code provided. Licensing skipped ***");
            return Ok(());
        }

        info!("*** Licensing VM-Series ***");
        self.exec_checked(&format!("request license fetch auth-code {auth_code}"))
            .await?;

        tokio::time::sleep(LICENSE_SETTLE).await;
        info!("*** Waiting for VM-Series to boot up with the new license ***");
        self.restart_system().await?;
        info!("*** Licensing is complete ***");
        Ok(())
    }

    /// Release the VM capacity license back to the licensing server.
    ///
    /// An empty API key skips delicensing.
    pub async fn delicense(&mut self, api_key: &str) -> Result<()> {
        if api_key.is_empty() {
            info!("*** No API key provided. Delicensing skipped ***");
            return Ok(());
        }

        info!("*** Delicensing VM-Series ***");
        self.exec_checked(&format!("request license api-key set key {api_key}"))
            .await?;
        self.exec_checked("request license deactivate VM-Capacity mode auto")
            .await?;
        Ok(())
    }

    /// Read `show system info`.
    pub async fn system_info(&mut self) -> Result<SystemInfo> {
        let output = self.exec("show system info").await?;
        Ok(SystemInfo::parse(&output.result))
    }

    /// Check that the appliance is licensed and has a serial number.
    pub async fn verify_system(&mut self) -> Result<SystemInfo> {
        let info = self.system_info().await?;

        match info.vm_license() {
            None | Some("none") => {
                return Err(DriverError::SystemCheck {
                    message: "VM-Series instance is not licensed".to_string(),
                }
                .into());
            }
            Some(_) => {}
        }
        match info.serial() {
            None | Some("unknown") => {
                return Err(DriverError::SystemCheck {
                    message: "VM-Series instance does not have a serial".to_string(),
                }
                .into());
            }
            Some(_) => {}
        }

        info!("*** System check passed ***");
        Ok(info)
    }

    /// Check the installed PAN-OS version and, if given, plugin version.
    pub async fn verify_versions(&mut self, sw: &str, plugin: Option<&str>) -> Result<SystemInfo> {
        let info = self.system_info().await?;

        if !info.sw_version().is_some_and(|v| v.contains(sw)) {
            return Err(DriverError::SystemCheck {
                message: format!("PAN-OS version {sw} is not installed"),
            }
            .into());
        }
        if let Some(plugin) = plugin {
            if !info.plugin_version().is_some_and(|v| v.contains(plugin)) {
                return Err(DriverError::SystemCheck {
                    message: format!("plugin version {plugin} is not installed"),
                }
                .into());
            }
        }

        info!("*** Version check passed ***");
        Ok(info)
    }

    /// Check for, download and install `package`.
    ///
    /// Software images are followed by a restart.
    pub async fn install(&mut self, package: &Package) -> Result<()> {
        info!("*** Checking for available {} ***", package);
        self.exec_checked(&package.check_command()).await?;

        info!("*** Downloading {} ***", package);
        self.run_job(&package.download_command()).await?;

        info!("*** Installing {} ***", package);
        self.run_job(&package.install_command()).await?;
        info!("*** {} installation complete ***", package);

        if package.requires_restart() {
            self.restart_system().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::Error;
    use crate::driver::session::SessionOptions;
    use crate::platform::panos;
    use crate::transport::mock::{
        MockConnector, MockHandle, MockTransport, Reply, answer, config_answer,
    };

    fn device(transports: Vec<Option<MockTransport>>) -> PanosDevice<MockConnector> {
        let factory = SessionFactory::new(
            MockConnector::new(transports),
            panos::platform(),
            SessionOptions::default(),
        );
        PanosDevice::new(
            factory,
            ReconnectPolicy::default(),
            ReconnectPolicy::boot(),
            JobPolicy::default(),
        )
    }

    fn scripted(replies: Vec<Reply>) -> (MockTransport, MockHandle) {
        let (mut transport, handle) = MockTransport::booted();
        for reply in replies {
            transport.push(reply);
        }
        (transport, handle)
    }

    fn system_info(license: &str, serial: &str) -> Reply {
        answer(
            "show system info",
            &format!(
                "hostname: PA-VM\r\nserial: {serial}\r\nsw-version: 10.1.3\r\n\
                 vm-license: {license}\r\nvm_series: vm_series-2.1.3"
            ),
        )
    }

    fn job_started(command: &str, id: &str) -> Reply {
        answer(command, &format!("Download job enqueued with jobid {id}"))
    }

    fn job_finished(id: &str) -> Reply {
        answer(&format!("show jobs id {id}"), &format!("{id} Downld FIN OK"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_system_unlicensed() {
        let (transport, _) = scripted(vec![system_info("none", "007951000123456")]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        let err = device.verify_system().await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::SystemCheck { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_system_without_serial() {
        let (transport, _) = scripted(vec![system_info("VM-300", "unknown")]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        assert!(device.verify_system().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_system_passes() {
        let (transport, _) = scripted(vec![system_info("VM-300", "007951000123456")]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        let info = device.verify_system().await.unwrap();
        assert_eq!(info.vm_license(), Some("VM-300"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_versions() {
        let (transport, _) = scripted(vec![
            system_info("VM-300", "1"),
            system_info("VM-300", "1"),
        ]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        device
            .verify_versions("10.1.3", Some("2.1.3"))
            .await
            .unwrap();
        let err = device.verify_versions("11.0.0", None).await.unwrap_err();
        assert!(err.to_string().contains("11.0.0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_failure_leaves_configuration_mode() {
        let (transport, handle) = scripted(vec![
            config_answer("configure", ""),
            config_answer("set a 1", ""),
            config_answer("bad-line", "Invalid syntax."),
            answer("exit", ""),
        ]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        let err = device
            .config(&["set a 1", "bad-line", "set b 2"], true)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Driver(DriverError::ConfigLineFailed { index: 1, .. })
        ));
        assert_eq!(
            handle.commands(),
            vec!["configure", "set a 1", "bad-line", "exit"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_install_content() {
        let (transport, handle) = scripted(vec![
            answer("request content upgrade check", ""),
            job_started("request content upgrade download latest", "11"),
            job_finished("11"),
            job_started("request content upgrade install version latest", "12"),
            job_finished("12"),
        ]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        device.install(&Package::Content).await.unwrap();

        assert_eq!(
            handle.commands(),
            vec![
                "request content upgrade check",
                "request content upgrade download latest",
                "show jobs id 11",
                "request content upgrade install version latest",
                "show jobs id 12",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_job_id() {
        let (transport, _) = scripted(vec![answer("request content upgrade download latest", "")]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        let err = device
            .run_job("request content upgrade download latest")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Job(JobError::MissingId { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_software_install_restarts() {
        let (transport, old) = scripted(vec![
            answer("request system software check", ""),
            job_started("request system software download file PanOS_vm-10.1.3", "21"),
            job_finished("21"),
            job_started("request system software install version 10.1.3", "22"),
            job_finished("22"),
            Reply::Hangup,
        ]);
        let (fresh, _) = MockTransport::booted();
        let mut device = device(vec![Some(transport), Some(fresh)]);
        device.open().await.unwrap();

        device
            .install(&Package::Software("PanOS_vm-10.1.3".into()))
            .await
            .unwrap();

        assert_eq!(
            old.commands().last().map(String::as_str),
            Some("request restart system")
        );
        assert_eq!(device.reconnect_state(), ReconnectState::Active);
        assert!(device.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_license_restarts() {
        let (transport, old) = scripted(vec![
            answer("request license fetch auth-code I1234567", "VM Device License installed"),
            Reply::Silent,
        ]);
        let (fresh, _) = MockTransport::booted();
        let mut device = device(vec![Some(transport), Some(fresh)]);
        device.open().await.unwrap();

        device.license("I1234567").await.unwrap();

        assert_eq!(
            old.commands(),
            vec!["request license fetch auth-code I1234567", "request restart system"]
        );
        assert!(old.is_closed());
        assert!(device.reconnect_history().contains(&ReconnectState::WaitingWarmup));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_auth_code_skips() {
        let (transport, handle) = scripted(vec![]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        device.license("").await.unwrap();
        device.delicense("").await.unwrap();
        assert!(handle.commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delicense() {
        let (transport, handle) = scripted(vec![
            answer("request license api-key set key abc123", "API key is set"),
            answer("request license deactivate VM-Capacity mode auto", "Success"),
        ]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        device.delicense("abc123").await.unwrap();
        assert_eq!(handle.commands().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_delicense_fails() {
        let (transport, handle) = scripted(vec![
            answer("request license api-key set key bad", "API key is set"),
            answer(
                "request license deactivate VM-Capacity mode auto",
                "Server error : Failed to deactivate",
            ),
        ]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        let err = device.delicense("bad").await.unwrap_err();
        match err {
            Error::Driver(DriverError::UnexpectedResponse { command, output }) => {
                assert_eq!(command, "request license deactivate VM-Capacity mode auto");
                assert!(output.contains("Failed to deactivate"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(handle.commands().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_api_key_stops_delicensing() {
        let (transport, handle) = scripted(vec![answer(
            "request license api-key set key bad",
            "Server error : invalid api key",
        )]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        assert!(device.delicense("bad").await.is_err());
        assert_eq!(handle.commands(), vec!["request license api-key set key bad"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_license_fetch_keeps_response() {
        let (transport, handle) = scripted(vec![answer(
            "request license fetch auth-code I0000000",
            "Server error : Invalid auth code",
        )]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        let err = device.license("I0000000").await.unwrap_err();
        match err {
            Error::Driver(DriverError::UnexpectedResponse { output, .. }) => {
                assert!(output.contains("Invalid auth code"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(handle.commands().len(), 1);
        assert_eq!(device.reconnect_state(), ReconnectState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_update_check_stops_install() {
        let (transport, handle) = scripted(vec![answer(
            "request content upgrade check",
            "Server error : Failed to check content upgrade info",
        )]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        let err = device.install(&Package::Content).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Driver(DriverError::UnexpectedResponse { .. })
        ));
        assert_eq!(handle.commands(), vec!["request content upgrade check"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_when_ready_closes_half_up_shell() {
        let (half_up, half_up_handle) = MockTransport::new();
        let (fresh, _) = MockTransport::booted();
        let mut device = device(vec![Some(half_up), Some(fresh)]);

        device.open_when_ready().await.unwrap();

        assert!(half_up_handle.is_closed());
        assert!(device.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_when_ready_waits_for_boot() {
        let (fresh, _) = MockTransport::booted();
        let mut device = device(vec![None, None, Some(fresh)]);

        let start = Instant::now();
        device.open_when_ready().await.unwrap();

        assert!(device.is_alive());
        assert!(start.elapsed() >= Duration::from_secs(660 + 120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_twice() {
        let (transport, _) = scripted(vec![]);
        let mut device = device(vec![Some(transport)]);
        device.open().await.unwrap();

        let err = device.open().await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::AlreadyConnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_connected() {
        let mut device = device(vec![]);
        let err = device.exec("show clock").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
        device.close().await.unwrap();
    }
}
